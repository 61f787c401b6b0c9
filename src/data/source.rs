use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use bytes::Bytes;

use crate::error::LoadError;

use super::derive::derive_metrics;
use super::loader::parse_rows_from_sheet;
use super::model::{SalesRow, SalesTable};

// ---------------------------------------------------------------------------
// Data formats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
    Json,
    Parquet,
    Excel,
}

impl DataFormat {
    /// Guess the format from a file path or URL by its extension.  Query
    /// strings and fragments are ignored.
    pub fn from_location(location: &str) -> Option<Self> {
        let path = location
            .split(['?', '#'])
            .next()
            .unwrap_or(location);
        let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
        let (_, ext) = file_name.rsplit_once('.')?;

        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(DataFormat::Csv),
            "json" => Some(DataFormat::Json),
            "parquet" | "pq" => Some(DataFormat::Parquet),
            "xlsx" | "xlsm" | "xls" => Some(DataFormat::Excel),
            _ => None,
        }
    }

    fn for_location(location: &str) -> Result<Self, LoadError> {
        Self::from_location(location).ok_or_else(|| LoadError::UnsupportedFormat(location.to_string()))
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataFormat::Csv => write!(f, "CSV"),
            DataFormat::Json => write!(f, "JSON"),
            DataFormat::Parquet => write!(f, "Parquet"),
            DataFormat::Excel => write!(f, "Excel"),
        }
    }
}

// ---------------------------------------------------------------------------
// TableSource – where the sales table comes from
// ---------------------------------------------------------------------------

/// A backing medium able to produce the raw sales rows.
pub trait TableSource {
    /// Human-readable location, used in logs and the status bar.
    fn describe(&self) -> String;

    fn read(&self) -> Result<Vec<SalesRow>, LoadError>;
}

/// A file on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSource {
    pub path: PathBuf,
    /// Worksheet to read from a workbook; the first one when `None`.
    pub sheet: Option<String>,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource {
            path: path.into(),
            sheet: None,
        }
    }

    pub fn with_sheet(mut self, sheet: Option<String>) -> Self {
        self.sheet = sheet;
        self
    }
}

impl TableSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> Result<Vec<SalesRow>, LoadError> {
        let resource = self.describe();
        let format = DataFormat::for_location(&resource)?;
        let data = std::fs::read(&self.path).map_err(|source| LoadError::Io { resource, source })?;
        parse_rows_from_sheet(format, Bytes::from(data), self.sheet.as_deref())
    }
}

/// A remote object fetched over HTTP(S).
#[derive(Debug, Clone)]
pub struct UrlSource {
    pub url: String,
    pub sheet: Option<String>,
}

impl UrlSource {
    pub fn new(url: impl Into<String>) -> Self {
        UrlSource {
            url: url.into(),
            sheet: None,
        }
    }

    pub fn with_sheet(mut self, sheet: Option<String>) -> Self {
        self.sheet = sheet;
        self
    }
}

impl TableSource for UrlSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn read(&self) -> Result<Vec<SalesRow>, LoadError> {
        let format = DataFormat::for_location(&self.url)?;
        let http_err = |source| LoadError::Http {
            url: self.url.clone(),
            source,
        };

        let client = reqwest::blocking::Client::new();
        let resp = client.get(&self.url).send().map_err(http_err)?;
        if !resp.status().is_success() {
            return Err(LoadError::HttpStatus {
                url: self.url.clone(),
                status: resp.status().as_u16(),
            });
        }
        let data = resp.bytes().map_err(http_err)?;
        parse_rows_from_sheet(format, data, self.sheet.as_deref())
    }
}

/// Bytes already in memory, e.g. a resource bundled into the binary.
#[derive(Debug, Clone)]
pub struct EmbeddedSource {
    pub name: String,
    pub format: DataFormat,
    pub data: Bytes,
}

impl EmbeddedSource {
    pub fn new(name: impl Into<String>, format: DataFormat, data: impl Into<Bytes>) -> Self {
        EmbeddedSource {
            name: name.into(),
            format,
            data: data.into(),
        }
    }
}

impl TableSource for EmbeddedSource {
    fn describe(&self) -> String {
        format!("{} (embedded)", self.name)
    }

    fn read(&self) -> Result<Vec<SalesRow>, LoadError> {
        parse_rows_from_sheet(self.format, self.data.clone(), None)
    }
}

/// Pick a source for a command-line location: `http(s)://` URLs are fetched,
/// anything else is a local path.  `sheet` selects a workbook worksheet.
pub fn source_for_location(location: &str, sheet: Option<&str>) -> Box<dyn TableSource> {
    let sheet = sheet.map(str::to_string);
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(UrlSource::new(location).with_sheet(sheet))
    } else {
        Box::new(FileSource::new(location).with_sheet(sheet))
    }
}

/// Read a source and derive the metric columns.
pub fn load_table(source: &dyn TableSource) -> Result<SalesTable, LoadError> {
    let rows = source.read()?;
    let table = derive_metrics(rows);
    log::info!(
        "Loaded {} records from {} ({} departments, {} segments, years {:?})",
        table.len(),
        source.describe(),
        table.departments.len(),
        table.segments.len(),
        table.years
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// DatasetCache – load once, share read-only
// ---------------------------------------------------------------------------

/// Owns a source and the table loaded from it.  The source is read on the
/// first successful [`DatasetCache::get`]; later calls return the same table.
pub struct DatasetCache {
    source: Box<dyn TableSource>,
    table: OnceLock<Arc<SalesTable>>,
}

impl DatasetCache {
    pub fn new(source: Box<dyn TableSource>) -> Self {
        DatasetCache {
            source,
            table: OnceLock::new(),
        }
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }

    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }

    pub fn get(&self) -> Result<Arc<SalesTable>, LoadError> {
        if let Some(table) = self.table.get() {
            return Ok(Arc::clone(table));
        }
        let loaded = Arc::new(load_table(self.source.as_ref())?);
        Ok(Arc::clone(self.table.get_or_init(|| loaded)))
    }
}

impl fmt::Debug for DatasetCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetCache")
            .field("source", &self.source.describe())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
