//! Minger Insights - Sales & Association Rule Insights Dashboard
//!
//! Loads the sales and association-rule tables and shows them as a single
//! scrollable page of tables and charts.

mod charts;
mod config;
mod dashboard;
mod data;
mod export;
mod graph;
mod gui;

use anyhow::Result;
use config::{AppConfig, CONFIG_FILE};
use eframe::egui;
use gui::DashboardApp;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load_or_default(Path::new(CONFIG_FILE))?;

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title(dashboard::PAGE_TITLE),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        dashboard::PAGE_TITLE,
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
