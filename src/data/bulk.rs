//! Bulk file retrieval from the provider's object store.
//!
//! Files live at `{base}/dataset/{path}/{FILENAME}[_{year}].csv` and are
//! semicolon-delimited UTF-8 with a header row.
//!
//! Retrieval is soft: every transport or decode failure is logged and becomes
//! `None`, so the acquisition chain can move on to the next tier.

use std::sync::Arc;
use std::time::Duration;

use csv::StringRecord;
use tracing::{debug, warn};

use crate::config::SourceConfig;
use crate::data::transport::{BulkRequest, Transport};
use crate::domain::RawRecord;
use crate::error::FetchError;

/// Logical dataset key -> storage path.
const DATASET_PATHS: [(&str, &str); 7] = [
    ("ear_subsistema", "ear_subsistema_di"),
    ("ear_reservatorio", "ear_reservatorio_di"),
    ("ear_bacia", "ear_bacia_di"),
    ("carga_energia", "carga_energia"),
    ("cmo_semihorario", "cmo_tm"),
    ("reservatorio", "reservatorio"),
    ("geracao", "geracao_usina"),
];

pub const EAR_SUBSISTEMA: (&str, &str) = ("ear_subsistema", "EAR_DIARIO_SUBSISTEMA");
pub const CARGA_ENERGIA: (&str, &str) = ("carga_energia", "CARGA_ENERGIA");
pub const RESERVATORIOS: (&str, &str) = ("reservatorio", "RESERVATORIOS");

/// Storage path for a dataset key; unmapped keys are used as-is.
pub fn dataset_path(dataset_key: &str) -> &str {
    DATASET_PATHS
        .iter()
        .find(|(key, _)| *key == dataset_key)
        .map(|(_, path)| *path)
        .unwrap_or(dataset_key)
}

pub struct BulkClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    timeout: Duration,
}

impl BulkClient {
    pub fn new(transport: Arc<dyn Transport>, config: &SourceConfig) -> Self {
        Self {
            transport,
            base_url: config.bulk_base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        }
    }

    pub fn request(&self, dataset_key: &str, filename: &str, year: Option<i32>) -> BulkRequest {
        let mut request = BulkRequest {
            dataset_key: dataset_key.to_string(),
            filename: filename.to_string(),
            year,
            url: String::new(),
        };
        request.url = format!(
            "{}/dataset/{}/{}",
            self.base_url,
            dataset_path(dataset_key),
            request.file_name()
        );
        request
    }

    /// Fetch and decode a dataset file with the configured timeout.
    pub fn fetch(&self, dataset_key: &str, filename: &str, year: Option<i32>) -> Option<Vec<RawRecord>> {
        self.fetch_with_timeout(dataset_key, filename, year, self.timeout)
    }

    /// Fetch and decode a dataset file; `None` on any failure or an empty file.
    pub fn fetch_with_timeout(
        &self,
        dataset_key: &str,
        filename: &str,
        year: Option<i32>,
        timeout: Duration,
    ) -> Option<Vec<RawRecord>> {
        let request = self.request(dataset_key, filename, year);

        let body = match self.transport.bulk(&request, timeout) {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %request.url, error = %e, "bulk download failed");
                return None;
            }
        };

        match decode_records(&body) {
            Ok(records) if records.is_empty() => {
                debug!(url = %request.url, "bulk file has no rows");
                None
            }
            Ok(records) => {
                debug!(url = %request.url, rows = records.len(), "bulk file decoded");
                Some(records)
            }
            Err(e) => {
                warn!(url = %request.url, error = %e, "bulk file could not be decoded");
                None
            }
        }
    }

    /// Daily stored energy by subsystem.
    pub fn ear_subsistema(&self, year: i32) -> Option<Vec<RawRecord>> {
        let (key, file) = EAR_SUBSISTEMA;
        self.fetch(key, file, Some(year))
    }

    /// Daily energy load by subsystem.
    pub fn carga_energia(&self, year: i32) -> Option<Vec<RawRecord>> {
        let (key, file) = CARGA_ENERGIA;
        self.fetch(key, file, Some(year))
    }

    /// Reservoir registry (not split by year).
    pub fn reservatorios(&self) -> Option<Vec<RawRecord>> {
        let (key, file) = RESERVATORIOS;
        self.fetch(key, file, None)
    }
}

/// Decode semicolon-delimited text with a header row into records.
///
/// Short rows keep only the columns they have; a malformed row fails the file.
pub fn decode_records(body: &str) -> Result<Vec<RawRecord>, FetchError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| FetchError::Parse(format!("failed to read header row: {e}")))?
        .iter()
        .map(normalize_header_name)
        .collect();

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header, and lines are 1-based.
        let line = idx + 2;
        let row: StringRecord = result.map_err(|e| FetchError::Parse(format!("line {line}: {e}")))?;
        records.push(
            headers
                .iter()
                .zip(row.iter())
                .map(|(name, value)| (name.clone(), value.to_string()))
                .collect(),
        );
    }
    Ok(records)
}

fn normalize_header_name(name: &str) -> String {
    // Exports from spreadsheet tools sometimes start with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}
