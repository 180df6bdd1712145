//! devwatch - development orchestrator for multi-process desktop apps.
//!
//! Serves the renderer with live reload, rebuilds the worker bundle and
//! reloads pages after each build, rebuilds the main bundle and relaunches
//! the host process after each build.

mod actor;
mod build;
mod cli;
mod config;
mod core;
mod embed;
mod logger;
mod process;
mod reload;
mod server;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::DevConfig;
use tokio::sync::mpsc;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    if let Some(Commands::Init { force }) = &cli.command {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        cli::init::write_config(&cwd, *force)?;
        return Ok(());
    }

    let config = Arc::new(DevConfig::load(&cli)?);
    dev(config)
}

/// Run the dev session until Ctrl+C.
fn dev(config: Arc<DevConfig>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
    core::register_shutdown(shutdown_tx);

    runtime.block_on(actor::Coordinator::new(config).run(shutdown_rx))
}
