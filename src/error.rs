use thiserror::Error;

use crate::data::source::DataFormat;

/// Failure to produce a sales table from a resource.  Always fatal for the
/// resource in question; nothing is retried.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {resource}: {source}")]
    Io {
        resource: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("unsupported data format for '{0}' (expected .csv, .json, .parquet, .pq, .xlsx or .xls)")]
    UnsupportedFormat(String),

    #[error("dataset is missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("row {row}, column '{column}': {problem}")]
    InvalidValue {
        row: usize,
        column: &'static str,
        problem: String,
    },

    #[error("worksheet '{sheet}' not found (available: {})", .available.join(", "))]
    MissingSheet { sheet: String, available: Vec<String> },

    #[error("malformed {format} data: {message}")]
    Malformed { format: DataFormat, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Excel error: {0}")]
    Excel(#[from] calamine::Error),
}

/// Invalid dashboard configuration (config file or command line).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("growth years must satisfy earlier < later (got {earlier} and {later})")]
    GrowthYearOrder { earlier: i32, later: i32 },

    #[error("--earlier-year and --later-year must be given together")]
    IncompleteGrowthYears,
}
