//! Montage Studio - assemble trimmed clips into one video
//!
//! Entry point: logging, configuration, worker runtime and the main window.

mod app;
mod surface;

use anyhow::{Context, Result};
use app::MontageApp;
use eframe::egui;
use montage_core::MontageConfig;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Montage Studio starting...");

    let config = MontageConfig::discover().context("failed to load configuration")?;

    // Probing and export run here, off the UI thread
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("montage-worker")
        .build()
        .context("failed to start worker runtime")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 680.0])
            .with_title("Montage Studio"),
        renderer: eframe::Renderer::Wgpu,
        ..Default::default()
    };

    eframe::run_native(
        "Montage Studio",
        options,
        Box::new(move |cc| Ok(Box::new(MontageApp::new(cc, config, runtime)))),
    )?;

    Ok(())
}
