//! Domain types used throughout the acquisition pipeline.
//!
//! This module defines:
//!
//! - the closed set of grid regions (`Region`) and their reference capacities
//! - raw provider rows (`RawRecord`)
//! - normalized outputs (`NormalizedMetric`, `LoadProfile`)
//! - tier bookkeeping (`Provenance`, `AcquisitionOutcome`)

pub mod types;

pub use types::*;
