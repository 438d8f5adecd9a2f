// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! reviewmark - markup editor for screenshot and frame reviews
//!
//! A cross-platform desktop tool for drawing review annotations
//! (rectangles, circles, arrows, freehand strokes, highlights and text
//! labels) on top of an image, saving each one to a review server.

mod app;
mod config;
mod editor;
mod io;
mod models;
mod ui;
mod util;

use anyhow::Result;
use app::ReviewApp;
use clap::Parser;
use config::{Cli, EditorConfig};
use std::path::Path;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = EditorConfig::from_cli(&cli)?;
    let gateway = config.gateway();
    let target = cli.target();

    if let Some(output) = &cli.export {
        return export_headless(&cli.image, output, &target, &config, gateway.as_ref());
    }

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title(format!("reviewmark - {}", target)),
        ..Default::default()
    };

    let image = cli.image.clone();
    eframe::run_native(
        "reviewmark",
        options,
        Box::new(move |_cc| Ok(Box::new(ReviewApp::new(config, gateway, target, image)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}

/// Render the stored annotations over the image into a PNG, without a window.
fn export_headless(
    image_path: &Path,
    output: &Path,
    target: &str,
    config: &EditorConfig,
    gateway: &dyn io::gateway::PersistenceGateway,
) -> Result<()> {
    let image = io::media::load_image(image_path)?;
    let records = io::gateway::load_or_empty(gateway, target);

    let mut next = 0;
    let annotations = io::wire::records_into_annotations(records, || {
        next += 1;
        models::annotation::LocalKey(next)
    });

    io::export::export_annotated_png(output, &image, &annotations, &config.renderer())?;
    Ok(())
}
