mod app;
mod chart;
mod color;
mod config;
mod data;
mod state;
mod ui;

use app::SsdExplorerApp;
use clap::Parser;
use config::Cli;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let cli = Cli::parse();
    let paths = cli.data_paths();

    // Without data there is nothing to explore: fail before opening a window.
    let state = match AppState::load(paths) {
        Ok(state) => state,
        Err(e) => {
            log::error!("Failed to load data: {e:#}");
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "SSD Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(SsdExplorerApp::new(state)))),
    )
}
