use std::path::Path;

use serde::Deserialize;

use crate::cli::Args;
use crate::data::aggregate::GrowthYears;
use crate::error::ConfigError;

/// Growth comparison years as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrowthYearsFile {
    pub earlier: i32,
    pub later: i32,
}

/// On-disk configuration.  Every key is optional.
///
/// ```json
/// { "data": "sales.xlsx", "sheet": "Sheet1", "growth": { "earlier": 2022, "later": 2023 }, "year": 2023 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default)]
    pub growth: Option<GrowthYearsFile>,
    #[serde(default)]
    pub year: Option<i32>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Resolved dashboard settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Dataset location opened at startup.
    pub data: Option<String>,
    /// Worksheet read when `data` is a workbook.
    pub sheet: Option<String>,
    /// Explicit growth years; `None` means the table's first and last year.
    pub growth_years: Option<GrowthYears>,
    /// Initially selected year.
    pub initial_year: Option<i32>,
}

impl DashboardConfig {
    /// Merge the optional config file with command-line flags (flags win).
    pub fn resolve(args: &Args) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };
        Self::merge(file, args)
    }

    fn merge(file: ConfigFile, args: &Args) -> Result<Self, ConfigError> {
        let growth_years = match (args.earlier_year, args.later_year) {
            (Some(earlier), Some(later)) => Some(GrowthYears::new(earlier, later)?),
            (None, None) => match file.growth {
                Some(g) => Some(GrowthYears::new(g.earlier, g.later)?),
                None => None,
            },
            _ => return Err(ConfigError::IncompleteGrowthYears),
        };

        Ok(DashboardConfig {
            data: args.data.clone().or(file.data),
            sheet: args.sheet.clone().or(file.sheet),
            growth_years,
            initial_year: args.year.or(file.year),
        })
    }
}
