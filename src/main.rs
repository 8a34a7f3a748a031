mod app;
mod state;
mod ui;

use std::path::PathBuf;

use app::TimmermanApp;
use clap::Parser;
use eframe::egui;

use timmerman_finder::config::{APP_TITLE, DEFAULT_DATA_FILE};

/// Look up SBRT organ-at-risk dose constraints by fractionation scheme.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Constraint table (CSV) to load.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_DATA_FILE)]
    data: PathBuf,

    /// Log at debug level regardless of RUST_LOG.
    #[arg(long)]
    debug: bool,
}

fn main() -> eframe::Result {
    let cli = Cli::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.debug {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    log::info!("Starting {APP_TITLE} with table {}", cli.data.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(move |_cc| Ok(Box::new(TimmermanApp::new(cli.data)))),
    )
}
