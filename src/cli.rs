// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for the headless frame pipeline
//!
//! This module provides command-line functionality for:
//! - Running the live feed against an offscreen surface
//! - Saving a rendered snapshot as a PNG

use chrono::Local;
use edgeview::capture::{CaptureLoopController, TestPatternSource};
use edgeview::config::Config;
use edgeview::pipeline::FramePipeline;
use edgeview::render::{FrameBridge, Viewfinder};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default folder name for saving snapshots
const DEFAULT_SAVE_FOLDER: &str = "EdgeView";

/// Run the pipeline end to end for a fixed number of frames
///
/// Capture runs on its own thread against the synthetic source; the render
/// loop ticks here until every accepted frame had a chance to reach the
/// surface. Prints feed statistics on exit.
pub fn run_preview(config: &Config, frames: u64) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    let (mut viewfinder, pipeline, controller) = start_feed(config, frames)?;

    println!(
        "Feed: {}x{} rotation {} filter {}",
        config.frame_width,
        config.frame_height,
        config.rotation_degrees,
        if config.apply_filter { "on" } else { "off" },
    );

    let mut rendered = 0u64;
    let deadline = Instant::now() + Duration::from_secs(30);
    while Instant::now() < deadline {
        if viewfinder.tick() {
            rendered += 1;
        }
        if let Some(e) = viewfinder.take_error() {
            eprintln!("Render error: {}", e);
        }
        if pipeline.frames_submitted() >= frames {
            break;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    controller.stop();
    // Drain whatever the capture thread published last
    if viewfinder.tick() {
        rendered += 1;
    }

    println!(
        "Captured {} frames, rendered {}, superseded {}",
        pipeline.frames_submitted(),
        rendered,
        pipeline.bridge().discarded_count(),
    );
    Ok(())
}

/// Capture, render, and save one frame as a PNG
pub fn take_snapshot(
    config: &Config,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    let (mut viewfinder, pipeline, controller) = start_feed(config, 1)?;

    // Wait for the frame to arrive, then draw it
    let deadline = Instant::now() + Duration::from_secs(5);
    while pipeline.frames_submitted() < 1 {
        if Instant::now() >= deadline {
            controller.stop();
            return Err("No frame delivered within 5s".into());
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    controller.stop();
    if !viewfinder.tick() {
        return Err("Render loop produced no frame".into());
    }

    let pixels = pollster::block_on(viewfinder.read_pixels())?;
    let (width, height) = viewfinder.surface_size();

    let output_path = resolve_output_path(config, output)?;
    let image =
        image::RgbaImage::from_raw(width, height, pixels).ok_or("Readback size mismatch")?;

    let rt = tokio::runtime::Runtime::new()?;
    let save_path = output_path.clone();
    rt.block_on(async move {
        tokio::task::spawn_blocking(move || image.save(&save_path))
            .await
            .map_err(|e| format!("snapshot save task failed: {}", e))?
            .map_err(|e| format!("snapshot save failed: {}", e))
    })?;

    println!("Snapshot saved: {}", output_path.display());
    Ok(())
}

/// Start the capture thread and render context for `max_frames` frames
fn start_feed(
    config: &Config,
    max_frames: u64,
) -> Result<(Viewfinder, Arc<FramePipeline>, CaptureLoopController), Box<dyn std::error::Error>> {
    let bridge = Arc::new(FrameBridge::new());
    let pipeline = Arc::new(FramePipeline::new(Arc::clone(&bridge), config.apply_filter));

    // Rotated quadrants swap the surface aspect
    let (surface_w, surface_h) = match config.rotation_degrees {
        90 | 270 => (config.frame_height, config.frame_width),
        _ => (config.frame_width, config.frame_height),
    };

    let viewfinder = pollster::block_on(Viewfinder::new(bridge, surface_w, surface_h))?;

    let source = TestPatternSource::moving_gradient(
        config.frame_width,
        config.frame_height,
        config.rotation(),
    );
    let controller = pipeline.spawn_capture(source, Some(max_frames));

    Ok((viewfinder, pipeline, controller))
}

/// Resolve the snapshot path from the CLI argument, the config, or the
/// default pictures folder
fn resolve_output_path(
    config: &Config,
    output: Option<PathBuf>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(path) = output {
        if path.is_dir() {
            return Ok(path.join(timestamped_name()));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        return Ok(path);
    }

    let dir = config
        .output_dir
        .clone()
        .unwrap_or_else(default_snapshot_dir);
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join(timestamped_name()))
}

fn timestamped_name() -> String {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    format!("snapshot_{}.png", timestamp)
}

/// Get default snapshot directory
fn default_snapshot_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(DEFAULT_SAVE_FOLDER)
}
