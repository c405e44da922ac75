//! VizCraft - CSV Data Analysis & Interactive Visualization
//!
//! Load a CSV file, explore it with charts, clean and aggregate it, and
//! produce a full profiling report.

mod charts;
mod config;
mod data;
mod gui;
mod report;
mod stats;

use clap::Parser;
use config::{AppConfig, ConfigLoadResult};
use eframe::egui;
use gui::VizCraftApp;
use std::path::PathBuf;

/// Interactive CSV exploration, cleaning and profiling.
#[derive(Parser)]
#[command(name = "vizcraft", version)]
struct Cli {
    /// Path to the JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use vizcraft.json from current directory (dev mode)
    #[arg(long)]
    dev: bool,

    /// CSV file to open at start-up
    csv: Option<PathBuf>,
}

fn load_config(path: &std::path::Path) -> AppConfig {
    match AppConfig::try_load(path) {
        ConfigLoadResult::Loaded(config) => {
            tracing::info!("Config loaded successfully");
            config
        }
        ConfigLoadResult::Missing => {
            tracing::info!("Config missing, writing defaults");
            let config = AppConfig::default();
            if let Err(e) = config.save(path) {
                tracing::warn!("Could not write default config: {}", e);
            }
            config
        }
        ConfigLoadResult::Invalid(e) => {
            tracing::warn!("Config invalid, using defaults: {}", e);
            AppConfig::default()
        }
    }
}

fn main() -> eframe::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("VizCraft starting...");

    let config_path = match (cli.config, cli.dev) {
        (Some(path), _) => path,
        (None, true) => {
            tracing::info!("Dev mode: loading config from current directory");
            PathBuf::from("vizcraft.json")
        }
        (None, false) => AppConfig::default_path(),
    };
    tracing::info!("Config path: {:?}", config_path);
    let config = load_config(&config_path);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([1100.0, 650.0])
            .with_title("VizCraft: CSV Data Analysis"),
        ..Default::default()
    };

    let initial_csv = cli.csv;
    eframe::run_native(
        "VizCraft",
        options,
        Box::new(move |cc| Ok(Box::new(VizCraftApp::new(cc, config, initial_csv)))),
    )
}
