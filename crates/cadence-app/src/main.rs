//! `cadence`: recompute, export and import rule sets from the command line.

mod cli;
mod commands;

use std::path::Path;

use anyhow::{Context, Result};
use cadence_core::config::load_config;
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

fn main() -> Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();

    let config = load_config()?;

    tracing::debug!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let mut output = match cli.command {
        Commands::Recompute { path, at } => {
            commands::recompute(&read(&path)?, at.unwrap_or_else(Utc::now), &config)?
        }
        Commands::Export { path, dtstamp } => {
            commands::export(&read(&path)?, dtstamp.unwrap_or_else(Utc::now), &config)?
        }
        Commands::Import { path } => commands::import(&read(&path)?)?,
    };

    if !output.ends_with('\n') {
        output.push('\n');
    }
    print!("{output}");

    Ok(())
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
