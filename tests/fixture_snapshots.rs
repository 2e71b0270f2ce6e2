use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use grid_snapshot::acquire::RequestContext;
use grid_snapshot::app::GridMetrics;
use grid_snapshot::config::SourceConfig;
use grid_snapshot::domain::{Provenance, Region, ReservoirStatus};
use grid_snapshot::normalize::STATUS_THRESHOLD_PERCENT;
use grid_snapshot::report::DataSource;

fn fixture_dir(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn metrics_for(dir: impl Into<PathBuf>) -> GridMetrics {
    GridMetrics::new(&SourceConfig::default().with_fixtures(dir)).unwrap()
}

fn ctx() -> RequestContext {
    let now = NaiveDate::from_ymd_opt(2024, 1, 16)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .unwrap();
    RequestContext::new(now)
}

#[test]
fn bulk_reservoirs_cover_all_regions() {
    let snapshot = metrics_for(fixture_dir("bulk")).reservoir_snapshot_at(&ctx()).unwrap();

    assert_eq!(snapshot.provenance, Provenance::BulkCurrent);
    assert_eq!(snapshot.data_source, DataSource::Api);
    assert_eq!(snapshot.regions.len(), 4);
    for (region, entry) in &snapshot.regions {
        assert!(entry.level_percent > 0.0 && entry.level_percent < 100.0);
        assert_eq!(entry.capacity_mwmed, region.capacity_mwmed());
        assert_eq!(entry.timestamp, "2024-01-15");
        let expected = if entry.level_percent > STATUS_THRESHOLD_PERCENT {
            ReservoirStatus::Normal
        } else {
            ReservoirStatus::Attention
        };
        assert_eq!(entry.status, expected);
    }
    assert_eq!(snapshot.regions[&Region::Southeast].level_percent, 65.4);
    assert_eq!(snapshot.regions[&Region::Northeast].status, ReservoirStatus::Attention);
}

#[test]
fn same_fixture_gives_identical_output() {
    let metrics = metrics_for(fixture_dir("bulk"));
    let first = serde_json::to_string(&metrics.reservoir_snapshot_at(&ctx()).unwrap()).unwrap();
    let second = serde_json::to_string(&metrics.reservoir_snapshot_at(&ctx()).unwrap()).unwrap();
    assert_eq!(first, second);

    let first = serde_json::to_string(&metrics.consumption_snapshot_at(&ctx()).unwrap()).unwrap();
    let second = serde_json::to_string(&metrics.consumption_snapshot_at(&ctx()).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn bulk_consumption_shares_sum_to_one_hundred() {
    let snapshot = metrics_for(fixture_dir("bulk")).consumption_snapshot_at(&ctx()).unwrap();

    assert_eq!(snapshot.provenance, Provenance::BulkCurrent);
    assert_eq!(snapshot.current_load_mw, 68542);
    assert_eq!(snapshot.forecast_load_mw, 70598);
    assert_eq!(snapshot.timestamp, "2024-01-15");

    let sum: f64 = snapshot.regions.values().map(|r| r.percent).sum();
    assert!((sum - 100.0).abs() <= 1.0, "shares sum to {sum}");
    assert_eq!(snapshot.regions[&Region::Southeast].percent, 55.8);
}

#[test]
fn catalog_fixtures_are_used_without_bulk_files() {
    let metrics = metrics_for(fixture_dir("catalog"));

    let reservoirs = metrics.reservoir_snapshot_at(&ctx()).unwrap();
    assert_eq!(reservoirs.provenance, Provenance::Catalog);
    assert!(reservoirs.note.to_lowercase().contains("successfully"));
    assert_eq!(reservoirs.regions[&Region::Southeast].level_percent, 65.4);
    assert_eq!(reservoirs.regions[&Region::South].status, ReservoirStatus::Normal);
    assert_eq!(reservoirs.regions[&Region::Northeast].status, ReservoirStatus::Attention);
    assert_eq!(reservoirs.regions[&Region::North].level_percent, 71.3);

    let consumption = metrics.consumption_snapshot_at(&ctx()).unwrap();
    assert_eq!(consumption.provenance, Provenance::Catalog);
    assert_eq!(consumption.current_load_mw, 68542);
    assert_eq!(consumption.regions.len(), 4);
}

#[test]
fn empty_search_falls_back_to_reference_values() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("ons_package_search_reservatorio.json"),
        r#"{"success": true, "result": {"count": 0, "results": []}}"#,
    )
    .unwrap();

    let snapshot = metrics_for(dir.path()).reservoir_snapshot_at(&ctx()).unwrap();
    assert_eq!(snapshot.data_source, DataSource::Fallback);
    assert_eq!(snapshot.regions.len(), 4);
    assert_eq!(snapshot.regions[&Region::South].level_percent, 58.2);
    assert_eq!(snapshot.regions[&Region::South].timestamp, "2024-01-16T08:00:00");

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["data_source"], "Fallback data");
}

#[test]
fn unrecognized_samples_fall_back_with_a_distinct_note() {
    let dir = tempfile::tempdir().unwrap();
    fs::copy(
        fixture_dir("catalog").join("ons_package_search_carga.json"),
        dir.path().join("ons_package_search_carga.json"),
    )
    .unwrap();
    fs::write(
        dir.path().join("ons_datastore_search_carga-2024.json"),
        r#"{"success": true, "result": {"records": [{"usina": "Itaipu", "geracao": "12000"}]}}"#,
    )
    .unwrap();

    let snapshot = metrics_for(dir.path()).consumption_snapshot_at(&ctx()).unwrap();
    assert_eq!(snapshot.data_source, DataSource::Fallback);
    assert!(snapshot.note.to_lowercase().contains("not recognized"));
    assert_eq!(snapshot.forecast_load_mw, 70598);
}

#[test]
fn missing_catalog_fixture_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = metrics_for(dir.path()).reservoir_snapshot_at(&ctx()).unwrap_err();
    assert_eq!(err.exit_code(), 4);
    assert!(err.to_string().contains("ons_package_search_reservatorio"));
}

#[test]
fn catalog_listing_skips_missing_details() {
    let metrics = metrics_for(fixture_dir("catalog"));

    let datasets = metrics.catalog().list_datasets().unwrap();
    let names: Vec<_> = datasets.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["ear-diario-por-subsistema", "carga-energia"]);

    let info = metrics.catalog().dataset_info("carga-energia").unwrap().unwrap();
    assert_eq!(info.resources.len(), 1);
    assert_eq!(info.resources[0].format, "CSV");
}
