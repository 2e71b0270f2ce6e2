//! File-backed transport for offline and deterministic runs.
//!
//! Layout of a fixture directory:
//!
//! - catalog: `ons_{action}[_{key}].json`, where `key` is the `q`, `id` or
//!   `resource_id` parameter (`ons_package_search_reservatorio.json`)
//! - bulk: `ons_{dataset_key}_{FILENAME}.csv`, else `ons_{dataset_key}.csv`
//!
//! The year of a bulk request is ignored: one fixture serves every year.
//! A missing fixture is always [`FetchError::FixtureMissing`]; it never falls
//! through to the network.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;

use crate::data::transport::{BulkRequest, Transport};
use crate::error::FetchError;

/// Parameters that disambiguate catalog fixtures, in lookup order.
const FIXTURE_KEY_PARAMS: [&str; 3] = ["q", "id", "resource_id"];

/// Fixture base name for a catalog call.
pub fn catalog_fixture_name(action: &str, params: &[(&str, String)]) -> String {
    let key = FIXTURE_KEY_PARAMS
        .iter()
        .find_map(|wanted| params.iter().find(|(k, _)| k == wanted).map(|(_, v)| v.as_str()));
    match key {
        Some(key) => format!("ons_{action}_{key}"),
        None => format!("ons_{action}"),
    }
}

#[derive(Debug, Clone)]
pub struct FixtureTransport {
    root: PathBuf,
}

impl FixtureTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, path: &Path) -> Result<String, FetchError> {
        fs::read_to_string(path)
            .map_err(|e| FetchError::Transport(format!("failed to read fixture '{}': {e}", path.display())))
    }
}

impl Transport for FixtureTransport {
    fn catalog(&self, action: &str, params: &[(&str, String)], _timeout: Duration) -> Result<Value, FetchError> {
        let name = catalog_fixture_name(action, params);
        let path = self.root.join(format!("{name}.json"));
        if !path.is_file() {
            return Err(FetchError::FixtureMissing(format!(
                "{} (action `{action}`, params {params:?})",
                path.display()
            )));
        }
        let body = self.read(&path)?;
        serde_json::from_str(&body)
            .map_err(|e| FetchError::Parse(format!("invalid JSON in fixture '{}': {e}", path.display())))
    }

    fn bulk(&self, request: &BulkRequest, _timeout: Duration) -> Result<String, FetchError> {
        let candidates = [
            self.root
                .join(format!("ons_{}_{}.csv", request.dataset_key, request.filename)),
            self.root.join(format!("ons_{}.csv", request.dataset_key)),
        ];
        match candidates.iter().find(|p| p.is_file()) {
            Some(path) => self.read(path),
            None => Err(FetchError::FixtureMissing(format!(
                "ons_{}[_{}].csv in {}",
                request.dataset_key,
                request.filename,
                self.root.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk_request(key: &str, filename: &str) -> BulkRequest {
        BulkRequest {
            dataset_key: key.into(),
            filename: filename.into(),
            year: Some(2024),
            url: "https://example.invalid".into(),
        }
    }

    #[test]
    fn fixture_names_follow_the_query_key() {
        assert_eq!(catalog_fixture_name("package_list", &[]), "ons_package_list");
        assert_eq!(
            catalog_fixture_name("package_search", &[("q", "carga".into())]),
            "ons_package_search_carga"
        );
        assert_eq!(
            catalog_fixture_name("datastore_search", &[("resource_id", "abc".into()), ("limit", "10".into())]),
            "ons_datastore_search_abc"
        );
    }

    #[test]
    fn missing_catalog_fixture_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FixtureTransport::new(dir.path());
        let err = transport
            .catalog("package_search", &[("q", "unknown".into())], Duration::from_secs(1))
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("ons_package_search_unknown"));
    }

    #[test]
    fn invalid_catalog_fixture_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ons_package_list.json"), "{not json").unwrap();
        let err = FixtureTransport::new(dir.path())
            .catalog("package_list", &[], Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn bulk_prefers_filename_specific_fixture() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ons_carga_energia.csv"), "generic").unwrap();
        fs::write(dir.path().join("ons_carga_energia_CARGA_ENERGIA.csv"), "specific").unwrap();

        let transport = FixtureTransport::new(dir.path());
        let body = transport
            .bulk(&bulk_request("carga_energia", "CARGA_ENERGIA"), Duration::from_secs(1))
            .unwrap();
        assert_eq!(body, "specific");

        let body = transport
            .bulk(&bulk_request("carga_energia", "OTHER"), Duration::from_secs(1))
            .unwrap();
        assert_eq!(body, "generic");
    }

    #[test]
    fn missing_bulk_fixture_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = FixtureTransport::new(dir.path())
            .bulk(&bulk_request("ear_subsistema", "EAR_DIARIO_SUBSISTEMA"), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, FetchError::FixtureMissing(_)));
    }
}
