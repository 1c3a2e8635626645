mod app;
mod data;
mod error;
mod state;
mod ui;

use app::SheetSieveApp;
use clap::Parser;
use eframe::egui;

/// Spreadsheet viewer with null / not-null row filtering
#[derive(Parser, Debug)]
#[command(name = "sheet-sieve")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Spreadsheet to open on start-up (local path or http(s) URL)
    #[arg(value_name = "SOURCE")]
    source: Option<String>,

    /// Initial window width
    #[arg(long, default_value_t = 1200.0)]
    width: f32,

    /// Initial window height
    #[arg(long, default_value_t = 800.0)]
    height: f32,
}

fn main() -> eframe::Result {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("{cli:?}");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([cli.width, cli.height])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Sheet Sieve – Spreadsheet Filter",
        options,
        Box::new(move |cc| Ok(Box::new(SheetSieveApp::new(&cc.egui_ctx, cli.source)))),
    )
}
