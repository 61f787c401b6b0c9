mod app;
mod color;
mod state;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;

use app::SalesDashboardApp;
use sales_dashboard::data::source::source_for_location;
use sales_dashboard::{Args, DashboardConfig, DatasetCache};
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = DashboardConfig::resolve(&args).context("invalid configuration")?;

    let mut state = AppState::new(&config);
    if let Some(location) = &config.data {
        // A configured dataset that cannot be loaded aborts startup.
        let dataset = DatasetCache::new(source_for_location(location, config.sheet.as_deref()));
        dataset
            .get()
            .with_context(|| format!("loading dataset from {location}"))?;
        state.set_dataset(dataset, config.initial_year);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Sales Performance Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(SalesDashboardApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("dashboard window failed: {e}"))
}
