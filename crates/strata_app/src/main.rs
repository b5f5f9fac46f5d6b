//! Strata viewer
//!
//! Opens the page in a desktop window.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use strata_app::config::StrataConfig;

#[derive(Parser)]
#[command(name = "strata")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scroll-synchronized 3D page viewer", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./strata.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Window width in logical pixels
    #[arg(long)]
    width: Option<u32>,

    /// Window height in logical pixels
    #[arg(long)]
    height: Option<u32>,

    /// Log filter directives, e.g. "strata_animation=debug"
    #[arg(long)]
    log: Option<String>,
}

fn load_config(cli: &Cli) -> Result<StrataConfig> {
    let mut config = match &cli.config {
        Some(path) => StrataConfig::load(path)?,
        None => {
            let cwd = std::env::current_dir().context("Failed to read working directory")?;
            StrataConfig::load_from_dir(&cwd)?
        }
    };
    if let Some(width) = cli.width {
        config.window.width = width;
    }
    if let Some(height) = cli.height {
        config.window.height = height;
    }
    if let Some(filter) = &cli.log {
        config.log.filter = filter.clone();
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    strata_app::logging::init(&config.log.filter);

    tracing::info!(
        "Starting Strata {}x{}",
        config.window.width,
        config.window.height
    );
    strata_app::windowed::run(config)?;
    Ok(())
}
