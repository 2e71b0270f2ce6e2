//! Command-line parsing for the `grid` binary.
//!
//! Parsing stays here; dispatch lives in [`crate::app`].

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "grid", version, about = "Regional grid metrics from ONS open data")]
pub struct Cli {
    /// Per-call network timeout in seconds (overrides ONS_TIMEOUT_SECS).
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Serve every provider call from this fixture directory instead of the network.
    #[arg(long, global = true, value_name = "DIR")]
    pub fixtures: Option<PathBuf>,

    /// Overall request budget in seconds; remaining network tiers are skipped once it passes.
    #[arg(long, global = true, value_name = "SECS")]
    pub deadline: Option<u64>,

    /// Log tier attempts and fallbacks to stderr (-v: debug, -vv: trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format for snapshots and catalog listings.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reservoir storage level per region.
    Reservoirs,
    /// Grid load per region, with total and forecast.
    Consumption,
    /// List catalog datasets (details for the first few).
    Datasets,
    /// Search catalog datasets by keyword.
    Search {
        /// Free-text query, e.g. `carga` or `reservatorio`.
        query: String,
    },
    /// Show one dataset and its resources.
    Info {
        /// Dataset id or name.
        id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
