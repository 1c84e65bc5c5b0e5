//! # CARLA Bridge CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Flag and environment parsing (`.env` files honoured)
//! - Logging setup
//! - Bridge lifecycle with graceful shutdown on Ctrl+C / SIGTERM

mod cli;
mod commands;
mod error;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::run_bridge;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    observability::init_with_config(
        ObservabilityConfig {
            log_format: cli.log_format.into(),
            ..Default::default()
        }
        .with_verbosity(cli.verbose, cli.quiet),
    )?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "CARLA Bridge starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_bridge(args).await,
    };

    if let Err(ref e) = result {
        tracing::error!(error = format!("{e:#}"), "Command failed");
    }

    result
}
