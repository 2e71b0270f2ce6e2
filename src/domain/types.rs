//! Shared domain types.
//!
//! These types are intentionally kept small and serializable so they can be:
//!
//! - produced by either acquisition tier (bulk files or catalog samples)
//! - normalized without knowing which tier produced them
//! - emitted as JSON by the assembler

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One of the four interconnected subsystems of the national grid.
///
/// Closed on purpose: provider spellings are mapped onto these variants by the
/// alias table in `normalize::alias`, never used as keys directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Southeast,
    South,
    Northeast,
    North,
}

impl Region {
    pub const ALL: [Region; 4] = [Region::Southeast, Region::South, Region::Northeast, Region::North];

    /// Stable lowercase key used in snapshots.
    pub fn key(self) -> &'static str {
        match self {
            Region::Southeast => "southeast",
            Region::South => "south",
            Region::Northeast => "northeast",
            Region::North => "north",
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            Region::Southeast => "Southeast/Center-West",
            Region::South => "South",
            Region::Northeast => "Northeast",
            Region::North => "North",
        }
    }

    /// Reference maximum storable energy (MWmed).
    ///
    /// Approximate `val_eararmazenavel_mwmes` values; only used as context next
    /// to a reservoir level, never to derive one.
    pub fn capacity_mwmed(self) -> u32 {
        match self {
            Region::Southeast => 208_355,
            Region::South => 19_768,
            Region::Northeast => 56_468,
            Region::North => 13_489,
        }
    }
}

/// One upstream row: provider column name -> raw value, in provider order.
///
/// Column order matters: the region resolver breaks ties on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: Vec<(String, String)>,
}

impl RawRecord {
    /// Column names in provider order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Value of a column (trimmed, case-insensitive name match); blank values count as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field.trim().eq_ignore_ascii_case(name))
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// First non-blank value among `names`, in the given order.
    pub fn get_any(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| self.get(name))
    }
}

impl<K, V> FromIterator<(K, V)> for RawRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Reservoir health flag derived from the storage level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservoirStatus {
    Normal,
    Attention,
}

impl ReservoirStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReservoirStatus::Normal => "normal",
            ReservoirStatus::Attention => "attention",
        }
    }
}

/// Per-metric annotation carried next to the value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Annotation {
    /// Reservoir level status.
    Status(ReservoirStatus),
    /// Share of total load, in percent (1 decimal).
    Share(f64),
}

/// A single region's value after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMetric {
    pub region: Region,
    /// Level percent for reservoirs, MW for load.
    pub value: f64,
    /// Timestamp exactly as the provider sent it (opaque, compared lexically).
    pub timestamp: String,
    pub annotation: Annotation,
}

/// At most one metric per region.
pub type RegionMetrics = BTreeMap<Region, NormalizedMetric>;

/// Normalized grid load: per-region metrics plus system totals.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadProfile {
    pub current_load_mw: i64,
    pub forecast_load_mw: i64,
    pub timestamp: String,
    pub metrics: RegionMetrics,
}

/// Which acquisition tier produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    BulkCurrent,
    BulkPrevious,
    Catalog,
    Fallback,
}

impl Provenance {
    pub fn tag(self) -> &'static str {
        match self {
            Provenance::BulkCurrent => "bulk-current",
            Provenance::BulkPrevious => "bulk-previous",
            Provenance::Catalog => "catalog",
            Provenance::Fallback => "fallback",
        }
    }
}

/// Result of one acquisition tier.
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionOutcome<T> {
    Success(T, Provenance),
    /// Tier ran but produced nothing usable (includes unrecognized schemas).
    Empty,
    /// Tier failed; the reason is logged and the chain advances.
    Failure(String),
}

impl<T> AcquisitionOutcome<T> {
    /// Wrap an optional tier result, tagging successes with `provenance`.
    pub fn from_option(value: Option<T>, provenance: Provenance) -> Self {
        match value {
            Some(v) => AcquisitionOutcome::Success(v, provenance),
            None => AcquisitionOutcome::Empty,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AcquisitionOutcome::Success(..))
    }
}
