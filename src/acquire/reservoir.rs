//! Reservoir storage levels (EAR) by region.

use crate::acquire::MetricSource;
use crate::data::bulk::EAR_SUBSISTEMA;
use crate::domain::{Annotation, NormalizedMetric, RawRecord, Region, RegionMetrics};
use crate::normalize::{candidates, derive_percentage, derive_status, first_number, parse_number, round1, select_latest};

const BULK_TIMESTAMP_COLUMNS: &[&str] = &["din_instante", "dat_referencia", "data"];
const PERCENT_COLUMNS: &[&str] = &["val_earverif_percentual", "ear_verif_percentual", "val_ear_percentual"];
const VERIFIED_COLUMNS: &[&str] = &["val_earverif_mwmes", "ear_verif_subsistema"];
const MAX_COLUMNS: &[&str] = &["val_eararmazenavel_mwmes", "ear_max_subsistema"];

pub(crate) const CATALOG_TIMESTAMP_COLUMNS: &[&str] = &["data", "timestamp"];

/// Reference storage levels (percent) used when no tier yields data.
const REFERENCE_LEVELS: [(Region, f64); 4] = [
    (Region::Southeast, 65.4),
    (Region::South, 58.2),
    (Region::Northeast, 42.8),
    (Region::North, 71.3),
];

pub struct ReservoirMetric;

impl MetricSource for ReservoirMetric {
    type Output = RegionMetrics;

    const LABEL: &'static str = "reservoirs";
    const DATASET: (&'static str, &'static str) = EAR_SUBSISTEMA;
    const SEARCH_KEYWORD: &'static str = "reservatorio";
    const RESOURCE_KEYWORDS: &'static [&'static str] = &["reservatorio", "ear", "armazenamento"];

    fn from_bulk(records: &[RawRecord]) -> Option<RegionMetrics> {
        let metrics: RegionMetrics = select_latest(records, BULK_TIMESTAMP_COLUMNS)
            .into_iter()
            .filter_map(|(region, latest)| {
                let percent = bulk_percent(latest.record)?;
                Some((region, level(region, round1(percent), latest.timestamp)))
            })
            .collect();

        (!metrics.is_empty()).then_some(metrics)
    }

    fn from_catalog(records: &[RawRecord]) -> Option<RegionMetrics> {
        // The sample is not date-sorted; its first row stands in for "latest".
        let record = records.first()?;
        let names = record.field_names();
        let timestamp = record.get_any(CATALOG_TIMESTAMP_COLUMNS).unwrap_or("");

        let metrics: RegionMetrics = Region::ALL
            .into_iter()
            .filter_map(|region| {
                let percent = candidates(&names, region)
                    .into_iter()
                    .find_map(|name| record.get(name).and_then(parse_number))?;
                Some((region, level(region, percent, timestamp.to_string())))
            })
            .collect();

        (!metrics.is_empty()).then_some(metrics)
    }

    fn reference(timestamp: &str) -> RegionMetrics {
        REFERENCE_LEVELS
            .into_iter()
            .map(|(region, percent)| (region, level(region, percent, timestamp.to_string())))
            .collect()
    }
}

/// Level percent from a bulk row: a published percentage, else verified over max.
fn bulk_percent(record: &RawRecord) -> Option<f64> {
    first_number(record, PERCENT_COLUMNS).or_else(|| {
        let verified = first_number(record, VERIFIED_COLUMNS)?;
        let max = first_number(record, MAX_COLUMNS)?;
        derive_percentage(verified, max)
    })
}

fn level(region: Region, percent: f64, timestamp: String) -> NormalizedMetric {
    NormalizedMetric {
        region,
        value: percent,
        timestamp,
        annotation: Annotation::Status(derive_status(percent)),
    }
}
