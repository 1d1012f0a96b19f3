#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod backend;
mod config;
mod error;
mod io;
mod model;
mod service;
mod ui;

use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    let config_path = config::AppConfig::default_path();
    let config = config::AppConfig::load_or_default(&config_path);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1440.0, 800.0])
            .with_min_inner_size([900.0, 480.0])
            .with_title("Production Gantt"),
        ..Default::default()
    };

    eframe::run_native(
        "Production Gantt",
        options,
        Box::new(move |cc| Ok(Box::new(app::GanttApp::new(cc, config, config_path)?))),
    )
}
