//! Metric acquisition: the tier chain and the metrics it can resolve.
//!
//! Each metric describes where it lives upstream (bulk dataset, catalog
//! keywords) and how to read it out of raw rows. The chain in [`chain`] is
//! generic over that description, so reservoirs and consumption walk exactly
//! the same tiers.

pub mod chain;
pub mod consumption;
pub mod reservoir;

pub use chain::{FallbackReason, RequestContext, Resolution, Tier, TierChain};
pub use consumption::ConsumptionMetric;
pub use reservoir::ReservoirMetric;

use crate::domain::RawRecord;

/// A metric the tier chain knows how to acquire.
pub trait MetricSource {
    type Output;

    /// Short name used in log fields.
    const LABEL: &'static str;
    /// `(dataset_key, FILENAME)` of the yearly bulk file.
    const DATASET: (&'static str, &'static str);
    /// Free-text query for the catalog search tier.
    const SEARCH_KEYWORD: &'static str;
    /// Resource-name keywords that mark a catalog resource as relevant.
    const RESOURCE_KEYWORDS: &'static [&'static str];

    /// Extract from a long-format bulk file (one row per region per instant).
    fn from_bulk(records: &[RawRecord]) -> Option<Self::Output>;

    /// Extract from a catalog sample (one column per region).
    fn from_catalog(records: &[RawRecord]) -> Option<Self::Output>;

    /// Static reference values, stamped with `timestamp`.
    fn reference(timestamp: &str) -> Self::Output;
}
