// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use edgeview::config::Config;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "edgeview")]
#[command(about = "Real-time camera frame pipeline with GPU edge-overlay preview")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Config file path (default: platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable the edge-detection filter
    #[arg(long, global = true)]
    no_filter: bool,

    /// Capture width in pixels
    #[arg(long, global = true)]
    width: Option<u32>,

    /// Capture height in pixels
    #[arg(long, global = true)]
    height: Option<u32>,

    /// Rotation hint in degrees (0, 90, 180, 270)
    #[arg(long, global = true)]
    rotation: Option<u32>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live feed against an offscreen surface
    Preview {
        /// Number of frames to capture
        #[arg(short, long, default_value = "120")]
        frames: u64,
    },

    /// Capture one frame and save it as a PNG
    Snapshot {
        /// Output file path (default: ~/Pictures/EdgeView/snapshot_TIMESTAMP.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=edgeview=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let args = Cli::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    if args.no_filter {
        config.apply_filter = false;
    }
    if let Some(width) = args.width {
        config.frame_width = width;
    }
    if let Some(height) = args.height {
        config.frame_height = height;
    }
    if let Some(rotation) = args.rotation {
        config.rotation_degrees = rotation;
    }

    match args.command {
        Some(Commands::Preview { frames }) => cli::run_preview(&config, frames),
        Some(Commands::Snapshot { output }) => cli::take_snapshot(&config, output),
        None => cli::run_preview(&config, 120),
    }
}
