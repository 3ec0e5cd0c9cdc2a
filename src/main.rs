//! IronTrack - Triathlon Training Log
//!
//! Main entry point for the command-line application.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use irontrack::storage::config::{load_config, load_config_from};
use irontrack::storage::Database;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .context("Failed to load configuration")?;

    // --log-level beats RUST_LOG, which beats the config file
    let filter = match &cli.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Starting IronTrack v{}", env!("CARGO_PKG_VERSION"));

    let path = cli
        .database
        .clone()
        .unwrap_or_else(|| config.database_path());

    let db = Database::open(&path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?
        .with_gear_policy(config.gear.policy);

    cli::execute(&cli, &config, &db)
}
