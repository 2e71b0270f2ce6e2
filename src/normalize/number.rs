//! Number parsing and derived metrics.

use std::collections::BTreeMap;

use crate::domain::{RawRecord, Region, ReservoirStatus};

/// Levels strictly above this percentage are `normal`.
pub const STATUS_THRESHOLD_PERCENT: f64 = 50.0;

/// Flat uplift applied to current load to produce the forecast figure.
///
/// A presentation heuristic, not a measured forecast.
pub const FORECAST_UPLIFT: f64 = 1.03;

/// Parse a provider number, accepting a comma decimal separator (`"65,4"`).
pub fn parse_number(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    let v = normalized.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// First column among `columns` whose value parses as a number.
pub fn first_number(record: &RawRecord, columns: &[&str]) -> Option<f64> {
    columns
        .iter()
        .find_map(|col| record.get(col).and_then(parse_number))
}

/// `verified / max * 100`, only defined for a positive `max`.
pub fn derive_percentage(verified: f64, max: f64) -> Option<f64> {
    if max > 0.0 { Some(verified / max * 100.0) } else { None }
}

pub fn derive_status(percent: f64) -> ReservoirStatus {
    if percent > STATUS_THRESHOLD_PERCENT {
        ReservoirStatus::Normal
    } else {
        ReservoirStatus::Attention
    }
}

/// Round to one decimal place.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// System totals and per-region shares derived from regional loads.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadShares {
    pub total_load_mw: i64,
    pub forecast_load_mw: i64,
    /// Percent of total per region (1 decimal).
    pub shares: BTreeMap<Region, f64>,
}

/// Derive load shares, total and forecast.
///
/// With a non-positive total every share and both totals are zero.
pub fn derive_load_shares(load_by_region: &BTreeMap<Region, f64>) -> LoadShares {
    let total: f64 = load_by_region.values().sum();

    if !(total > 0.0) {
        return LoadShares {
            total_load_mw: 0,
            forecast_load_mw: 0,
            shares: load_by_region.keys().map(|r| (*r, 0.0)).collect(),
        };
    }

    let shares = load_by_region
        .iter()
        .map(|(region, load)| (*region, round1(load / total * 100.0)))
        .collect();

    LoadShares {
        total_load_mw: total.round() as i64,
        forecast_load_mw: (total * FORECAST_UPLIFT).round() as i64,
        shares,
    }
}
