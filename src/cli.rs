//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;

/// Interactive sales dashboard: filter a department sales table by year,
/// department and segment and explore the derived charts.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Dataset to open at startup: a local .csv/.json/.parquet/.xlsx path or an http(s) URL
    #[arg(short, long)]
    pub data: Option<String>,

    /// Worksheet to read from an Excel workbook (defaults to the first sheet)
    #[arg(long)]
    pub sheet: Option<String>,

    /// JSON config file; command-line flags take precedence over it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Earlier year of the growth comparison (requires --later-year)
    #[arg(long)]
    pub earlier_year: Option<i32>,

    /// Later year of the growth comparison (requires --earlier-year)
    #[arg(long)]
    pub later_year: Option<i32>,

    /// Year selected when the dashboard opens (defaults to the latest year)
    #[arg(long)]
    pub year: Option<i32>,
}
