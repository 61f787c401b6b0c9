//! Sales dashboard: load a department sales table, filter it by year,
//! department and customer segment, and aggregate it into the figures the
//! dashboard charts.
//!
//! The binary target renders these figures with egui; everything in this
//! library is rendering-agnostic.

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;

pub use cli::Args;
pub use config::DashboardConfig;
pub use dashboard::DashboardView;
pub use data::aggregate::GrowthYears;
pub use data::filter::{filter_records, FilterSelection};
pub use data::model::{SalesRecord, SalesRow, SalesTable};
pub use data::source::{load_table, DataFormat, DatasetCache, EmbeddedSource, FileSource, TableSource, UrlSource};
pub use error::{ConfigError, LoadError};
