#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use anyhow::Result;
use eframe::egui;
use heic_jpeg::config::{AppConfig, PROGRAM_NAME};
use heic_jpeg::{ConverterApp, HeifCodec, ImageCodec};
use shared_utils::logging::init_logging;
use std::sync::Arc;
use tracing::info;

fn main() -> Result<()> {
    let config = AppConfig::default();
    init_logging(PROGRAM_NAME, config.log.clone())?;
    info!(version = env!("CARGO_PKG_VERSION"), "Starting {}", PROGRAM_NAME);

    let codec: Arc<dyn ImageCodec> = Arc::new(HeifCodec::new());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(config.window_title.as_str())
            .with_inner_size(config.window_size),
        ..Default::default()
    };

    let title = config.window_title.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(ConverterApp::new(config, codec)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI failed: {}", e))?;

    info!("Exiting");
    Ok(())
}
