// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use selfie_cam::app::PageController;
use selfie_cam::backends::camera::{CameraBackendManager, CameraBackendType};
use selfie_cam::config::Config;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "selfie-cam")]
#[command(about = "Webcam photo booth: live preview, camera switching, filters and snapshots")]
#[command(version = selfie_cam::constants::app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Camera backend (v4l2 or virtual), overrides the config file
    #[arg(short, long, global = true)]
    backend: Option<CameraBackendType>,

    /// Config file (default: ~/.config/selfie-cam/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Take a photo without the interactive page
    Snap {
        /// Camera index to use (from 'selfie-cam list')
        #[arg(short = 'i', long, default_value = "0")]
        camera: usize,

        /// Output file or directory (default: save directory, IMG_TIMESTAMP.jpg)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=selfie_cam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    let manager = CameraBackendManager::new(config.backend, config.backend_options());

    match cli.command {
        Some(Commands::List) => cli::list_cameras(&manager),
        Some(Commands::Snap { camera, output }) => cli::snap(&manager, &config, camera, output),
        None => selfie_cam::terminal::run(PageController::new(manager, config)),
    }
}
