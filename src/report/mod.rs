//! Snapshot assembly: the externally visible shape of a resolved metric.
//!
//! Snapshots are what callers serialize. Region keys are the lowercase
//! canonical names; every snapshot carries `data_source`, `provenance` and a
//! human-readable `note`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::acquire::{FallbackReason, Resolution};
use crate::domain::{Annotation, LoadProfile, Provenance, Region, RegionMetrics, ReservoirStatus};
use crate::normalize::derive_status;

pub mod format;

pub use format::*;

/// Coarse origin of a snapshot, as shown to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataSource {
    #[serde(rename = "ONS API")]
    Api,
    #[serde(rename = "Fallback data")]
    Fallback,
}

impl DataSource {
    pub fn from_provenance(provenance: Provenance) -> Self {
        match provenance {
            Provenance::Fallback => DataSource::Fallback,
            _ => DataSource::Api,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DataSource::Api => "ONS API",
            DataSource::Fallback => "Fallback data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservoirEntry {
    pub level_percent: f64,
    pub capacity_mwmed: u32,
    pub timestamp: String,
    pub status: ReservoirStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservoirSnapshot {
    #[serde(flatten)]
    pub regions: BTreeMap<Region, ReservoirEntry>,
    pub data_source: DataSource,
    pub provenance: Provenance,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionLoad {
    pub load_mw: f64,
    /// Share of total load (percent, 1 decimal).
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionSnapshot {
    pub current_load_mw: i64,
    pub forecast_load_mw: i64,
    pub timestamp: String,
    pub regions: BTreeMap<Region, RegionLoad>,
    pub data_source: DataSource,
    pub provenance: Provenance,
    pub note: String,
}

pub fn assemble_reservoir(resolution: Resolution<RegionMetrics>) -> ReservoirSnapshot {
    let note = note_for(&resolution, "reservoir", resolution.value.len());

    let regions = resolution
        .value
        .into_iter()
        .map(|(region, metric)| {
            let status = match metric.annotation {
                Annotation::Status(status) => status,
                Annotation::Share(_) => derive_status(metric.value),
            };
            let entry = ReservoirEntry {
                level_percent: metric.value,
                capacity_mwmed: region.capacity_mwmed(),
                timestamp: metric.timestamp,
                status,
            };
            (region, entry)
        })
        .collect();

    ReservoirSnapshot {
        regions,
        data_source: DataSource::from_provenance(resolution.provenance),
        provenance: resolution.provenance,
        note,
    }
}

pub fn assemble_consumption(resolution: Resolution<LoadProfile>) -> ConsumptionSnapshot {
    let note = note_for(&resolution, "consumption", resolution.value.metrics.len());
    let profile = resolution.value;

    let regions = profile
        .metrics
        .into_iter()
        .map(|(region, metric)| {
            let percent = match metric.annotation {
                Annotation::Share(share) => share,
                Annotation::Status(_) => 0.0,
            };
            (
                region,
                RegionLoad {
                    load_mw: metric.value,
                    percent,
                },
            )
        })
        .collect();

    ConsumptionSnapshot {
        current_load_mw: profile.current_load_mw,
        forecast_load_mw: profile.forecast_load_mw,
        timestamp: profile.timestamp,
        regions,
        data_source: DataSource::from_provenance(resolution.provenance),
        provenance: resolution.provenance,
        note,
    }
}

fn note_for<T>(resolution: &Resolution<T>, metric: &str, region_count: usize) -> String {
    let mut note = match (resolution.provenance, &resolution.fallback_reason) {
        (Provenance::BulkCurrent | Provenance::BulkPrevious, _) => match resolution.year {
            Some(year) => format!("ONS {metric} data loaded successfully from the {year} bulk file."),
            None => format!("ONS {metric} data loaded successfully from bulk files."),
        },
        (Provenance::Catalog, _) => {
            format!("ONS {metric} data loaded successfully from the open data catalog.")
        }
        (Provenance::Fallback, Some(FallbackReason::NoDatasets)) => {
            format!("No ONS {metric} datasets found; showing reference values.")
        }
        (Provenance::Fallback, Some(FallbackReason::CatalogFailed(reason))) => {
            format!("ONS catalog unavailable ({reason}); showing reference {metric} values.")
        }
        (Provenance::Fallback, Some(FallbackReason::DeadlineExceeded)) => {
            format!("Request deadline passed before ONS {metric} data arrived; showing reference values.")
        }
        (Provenance::Fallback, Some(FallbackReason::Unrecognized) | None) => {
            format!("ONS {metric} data format not recognized; showing reference values.")
        }
    };

    if resolution.provenance != Provenance::Fallback && region_count < Region::ALL.len() {
        note.push_str(&format!(" Only {region_count} of {} regions reported.", Region::ALL.len()));
    }
    note
}
