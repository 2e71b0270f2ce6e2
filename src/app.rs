//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - installs logging
//! - builds the source configuration (env, then flags)
//! - dispatches to the acquisition pipeline or the catalog
//! - prints JSON or text

use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::acquire::RequestContext;
use crate::cli::{Cli, Command, OutputFormat};
use crate::config::SourceConfig;
use crate::error::AppError;
use crate::report::{format_consumption_snapshot, format_dataset_info, format_datasets, format_reservoir_snapshot};

pub mod pipeline;

pub use pipeline::GridMetrics;

/// Entry point for the `grid` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = config_from_cli(&cli, SourceConfig::from_env()?);
    let metrics = GridMetrics::new(&config)?;

    let mut ctx = RequestContext::now();
    if let Some(secs) = cli.deadline {
        ctx = ctx.with_deadline(Duration::from_secs(secs));
    }

    match &cli.command {
        Command::Reservoirs => {
            let snapshot = metrics.reservoir_snapshot_at(&ctx)?;
            emit(cli.format, &snapshot, || format_reservoir_snapshot(&snapshot))
        }
        Command::Consumption => {
            let snapshot = metrics.consumption_snapshot_at(&ctx)?;
            emit(cli.format, &snapshot, || format_consumption_snapshot(&snapshot))
        }
        Command::Datasets => {
            let datasets = metrics.catalog().list_datasets()?;
            emit(cli.format, &datasets, || format_datasets(&datasets))
        }
        Command::Search { query } => {
            let datasets = metrics.catalog().search(query)?;
            emit(cli.format, &datasets, || format_datasets(&datasets))
        }
        Command::Info { id } => {
            let dataset = metrics
                .catalog()
                .dataset_info(id)?
                .ok_or_else(|| AppError::new(3, format!("Dataset '{id}' not found.")))?;
            emit(cli.format, &dataset, || format_dataset_info(&dataset))
        }
    }
}

/// Apply CLI overrides on top of the environment-derived configuration.
pub fn config_from_cli(cli: &Cli, mut config: SourceConfig) -> SourceConfig {
    if let Some(secs) = cli.timeout.filter(|s| *s > 0) {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if let Some(dir) = &cli.fixtures {
        config = config.with_fixtures(dir.clone());
    }
    config
}

/// Install a stderr subscriber; `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "grid_snapshot=debug,warn",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (tests, embedding) is harmless; ignore the error.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce() -> String) -> Result<(), AppError> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)
                .map_err(|e| AppError::new(4, format!("Failed to serialize output: {e}")))?;
            println!("{json}");
        }
        OutputFormat::Text => print!("{}", text()),
    }
    Ok(())
}
