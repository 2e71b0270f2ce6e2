//! Latest-record-per-region selection for long-format files.
//!
//! Bulk files carry one row per subsystem per day. We keep, for each region,
//! the row whose timestamp column is lexicographically greatest.
//!
//! This relies on ISO-8601 timestamps (`YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`),
//! which sort correctly as strings. Other formats give an undefined order; we
//! do not try to repair them.

use std::collections::BTreeMap;

use crate::domain::{RawRecord, Region};
use crate::normalize::alias::region_for_identifier;

/// Columns that identify the subsystem of a row, in lookup order.
pub const REGION_ID_COLUMNS: &[&str] = &["id_subsistema", "nom_subsistema"];

/// The most recent row seen for a region.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestRecord<'a> {
    /// Trimmed timestamp, empty if the row had none.
    pub timestamp: String,
    pub record: &'a RawRecord,
}

/// Group rows by region and keep the latest per group.
///
/// Rows with no recognizable subsystem are skipped. On equal timestamps the
/// later row wins.
pub fn select_latest<'a>(
    records: &'a [RawRecord],
    timestamp_columns: &[&str],
) -> BTreeMap<Region, LatestRecord<'a>> {
    let mut latest: BTreeMap<Region, LatestRecord<'a>> = BTreeMap::new();

    for record in records {
        let Some(region) = record.get_any(REGION_ID_COLUMNS).and_then(region_for_identifier) else {
            continue;
        };

        let timestamp = record.get_any(timestamp_columns).unwrap_or("").to_string();

        let newer = latest
            .get(&region)
            .is_none_or(|current| timestamp.as_str() >= current.timestamp.as_str());
        if newer {
            latest.insert(region, LatestRecord { timestamp, record });
        }
    }

    latest
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: &[&str] = &["din_instante", "dat_referencia", "data"];

    fn row(id: &str, date: &str, value: &str) -> RawRecord {
        [("id_subsistema", id), ("din_instante", date), ("val", value)]
            .into_iter()
            .collect()
    }

    #[test]
    fn keeps_latest_row_per_region() {
        let records = vec![
            row("SE", "2024-01-14", "1"),
            row("SE", "2024-01-15", "2"),
            row("SE", "2024-01-13", "3"),
            row("S", "2024-01-15", "4"),
        ];

        let latest = select_latest(&records, TS);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[&Region::Southeast].timestamp, "2024-01-15");
        assert_eq!(latest[&Region::Southeast].record.get("val"), Some("2"));
        assert_eq!(latest[&Region::South].record.get("val"), Some("4"));
    }

    #[test]
    fn equal_timestamps_keep_the_later_row() {
        let records = vec![row("NE", "2024-01-15", "first"), row("NE", "2024-01-15", "second")];
        let latest = select_latest(&records, TS);
        assert_eq!(latest[&Region::Northeast].record.get("val"), Some("second"));
    }

    #[test]
    fn unknown_subsystems_are_skipped_and_names_are_used_as_fallback() {
        let by_name: RawRecord = [("nom_subsistema", "NORTE"), ("data", "2024-02-01")]
            .into_iter()
            .collect();
        let records = vec![row("SIN", "2024-01-15", "x"), by_name];

        let latest = select_latest(&records, TS);
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[&Region::North].timestamp, "2024-02-01");
    }

    #[test]
    fn full_timestamps_compare_lexically() {
        let records = vec![
            row("N", "2024-01-15T09:00:00", "a"),
            row("N", "2024-01-15T23:00:00", "b"),
            row("N", "2024-01-15", "c"),
        ];
        let latest = select_latest(&records, TS);
        assert_eq!(latest[&Region::North].record.get("val"), Some("b"));
    }
}
