//! Grid load (energy consumption) by region, with system totals.

use std::collections::BTreeMap;

use crate::acquire::MetricSource;
use crate::acquire::reservoir::CATALOG_TIMESTAMP_COLUMNS;
use crate::data::bulk::CARGA_ENERGIA;
use crate::domain::{Annotation, LoadProfile, NormalizedMetric, RawRecord, Region};
use crate::normalize::{candidates, derive_load_shares, first_number, parse_number, select_latest};

const BULK_TIMESTAMP_COLUMNS: &[&str] = &["din_instante", "data"];
const LOAD_COLUMNS: &[&str] = &["val_cargaenergiamwmed", "val_carga", "carga"];

/// Reference regional loads (MW) used when no tier yields data.
const REFERENCE_LOADS: [(Region, f64); 4] = [
    (Region::Southeast, 38_245.0),
    (Region::South, 9_876.0),
    (Region::Northeast, 12_543.0),
    (Region::North, 7_878.0),
];

pub struct ConsumptionMetric;

impl MetricSource for ConsumptionMetric {
    type Output = LoadProfile;

    const LABEL: &'static str = "consumption";
    const DATASET: (&'static str, &'static str) = CARGA_ENERGIA;
    const SEARCH_KEYWORD: &'static str = "carga";
    const RESOURCE_KEYWORDS: &'static [&'static str] = &["carga", "demanda", "consumo", "load"];

    fn from_bulk(records: &[RawRecord]) -> Option<LoadProfile> {
        let mut loads = BTreeMap::new();
        let mut stamps = BTreeMap::new();
        for (region, latest) in select_latest(records, BULK_TIMESTAMP_COLUMNS) {
            if let Some(load) = first_number(latest.record, LOAD_COLUMNS) {
                loads.insert(region, load);
                stamps.insert(region, latest.timestamp);
            }
        }
        // Regions can report on different days; the profile carries the newest.
        let timestamp = stamps.values().max().cloned()?;
        Some(profile(&loads, |region| stamps.get(&region).cloned().unwrap_or_default(), timestamp))
    }

    fn from_catalog(records: &[RawRecord]) -> Option<LoadProfile> {
        let record = records.first()?;
        let names = record.field_names();
        let timestamp = record.get_any(CATALOG_TIMESTAMP_COLUMNS).unwrap_or("").to_string();

        let loads: BTreeMap<Region, f64> = Region::ALL
            .into_iter()
            .filter_map(|region| {
                let load = candidates(&names, region)
                    .into_iter()
                    .find_map(|name| record.get(name).and_then(parse_number))?;
                Some((region, load))
            })
            .collect();

        (!loads.is_empty()).then(|| profile(&loads, |_| timestamp.clone(), timestamp.clone()))
    }

    fn reference(timestamp: &str) -> LoadProfile {
        let loads: BTreeMap<Region, f64> = REFERENCE_LOADS.into_iter().collect();
        profile(&loads, |_| timestamp.to_string(), timestamp.to_string())
    }
}

fn profile(loads: &BTreeMap<Region, f64>, stamp_for: impl Fn(Region) -> String, timestamp: String) -> LoadProfile {
    let shares = derive_load_shares(loads);
    let metrics = loads
        .iter()
        .map(|(region, load)| {
            let share = shares.shares.get(region).copied().unwrap_or(0.0);
            let metric = NormalizedMetric {
                region: *region,
                value: *load,
                timestamp: stamp_for(*region),
                annotation: Annotation::Share(share),
            };
            (*region, metric)
        })
        .collect();

    LoadProfile {
        current_load_mw: shares.total_load_mw,
        forecast_load_mw: shares.forecast_load_mw,
        timestamp,
        metrics,
    }
}
