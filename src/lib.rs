//! `grid-snapshot` library crate.
//!
//! Resolves regional grid metrics (reservoir storage, grid load) from the ONS
//! open data services and normalizes them into a fixed, region-keyed shape.
//!
//! The binary (`grid`) is a thin wrapper around this library so that:
//!
//! - the acquisition chain is testable without spawning processes
//! - a serving layer can embed [`app::GridMetrics`] directly

pub mod acquire;
pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod normalize;
pub mod report;
