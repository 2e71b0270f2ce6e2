//! Catalog metadata API: dataset search and resource sampling.
//!
//! Every action answers with an envelope `{success: bool, result: ...}`. A
//! `success: false` envelope is treated as an empty result, not an error.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::SourceConfig;
use crate::data::transport::Transport;
use crate::domain::RawRecord;
use crate::error::FetchError;

/// Records sampled from a candidate resource.
pub const SAMPLE_LIMIT: usize = 10;

/// Dataset details fetched by `list_datasets`.
pub const LIST_DETAIL_LIMIT: usize = 10;

/// Resource formats that can carry tabular records.
const TABULAR_FORMATS: [&str; 2] = ["CSV", "JSON"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resources: Vec<ResourceDescriptor>,
}

impl DatasetDescriptor {
    /// `id` if present, else `name`.
    pub fn identifier(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub format: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Catalog fields may be sent as explicit `null`; read those as empty.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ResourceDescriptor {
    /// Tabular format and a name containing one of `keywords` (case-insensitive).
    pub fn matches(&self, keywords: &[&str]) -> bool {
        let format = self.format.trim().to_uppercase();
        let name = self.name.to_lowercase();
        TABULAR_FORMATS.contains(&format.as_str()) && keywords.iter().any(|k| name.contains(k))
    }
}

/// Result of scanning candidate resources for a usable sample.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleScan<T> {
    /// A non-empty sample was found; the extractor's answer is final.
    Sampled(Option<T>),
    /// No matching resource returned records.
    NoSample,
    /// The time budget ran out before a non-empty sample was found.
    OutOfTime,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    result: Value,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    results: Vec<DatasetDescriptor>,
}

#[derive(Debug, Deserialize)]
struct DatastoreResult {
    #[serde(default)]
    records: Vec<Map<String, Value>>,
}

pub struct CatalogClient {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl CatalogClient {
    pub fn new(transport: Arc<dyn Transport>, config: &SourceConfig) -> Self {
        Self {
            transport,
            timeout: config.timeout,
        }
    }

    /// Call `action`; `Ok(None)` when the envelope reports `success: false`.
    fn request<T: for<'de> Deserialize<'de>>(
        &self,
        action: &str,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Result<Option<T>, FetchError> {
        let raw = self.transport.catalog(action, params, timeout)?;
        let envelope: Envelope = serde_json::from_value(raw)
            .map_err(|e| FetchError::Parse(format!("unexpected `{action}` envelope: {e}")))?;
        if !envelope.success {
            debug!(action, "catalog reported success=false");
            return Ok(None);
        }
        serde_json::from_value(envelope.result)
            .map(Some)
            .map_err(|e| FetchError::Parse(format!("unexpected `{action}` result: {e}")))
    }

    /// All dataset ids.
    pub fn list_dataset_ids(&self) -> Result<Vec<String>, FetchError> {
        Ok(self
            .request::<Vec<String>>("package_list", &[], self.timeout)?
            .unwrap_or_default())
    }

    /// Details for the first few datasets; datasets whose details fail are skipped.
    pub fn list_datasets(&self) -> Result<Vec<DatasetDescriptor>, FetchError> {
        let mut out = Vec::new();
        for id in self.list_dataset_ids()?.iter().take(LIST_DETAIL_LIMIT) {
            match self.dataset_info(id) {
                Ok(Some(dataset)) => out.push(dataset),
                Ok(None) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(dataset = %id, error = %e, "skipping dataset"),
            }
        }
        Ok(out)
    }

    pub fn dataset_info(&self, dataset_id: &str) -> Result<Option<DatasetDescriptor>, FetchError> {
        self.request("package_show", &[("id", dataset_id.to_string())], self.timeout)
    }

    pub fn search(&self, keyword: &str) -> Result<Vec<DatasetDescriptor>, FetchError> {
        self.search_with_timeout(keyword, self.timeout)
    }

    pub fn search_with_timeout(&self, keyword: &str, timeout: Duration) -> Result<Vec<DatasetDescriptor>, FetchError> {
        Ok(self
            .request::<SearchResult>("package_search", &[("q", keyword.to_string())], timeout)?
            .map(|r| r.results)
            .unwrap_or_default())
    }

    pub fn sample_resource(&self, resource_id: &str, limit: usize) -> Result<Vec<RawRecord>, FetchError> {
        self.sample_resource_with_timeout(resource_id, limit, self.timeout)
    }

    pub fn sample_resource_with_timeout(
        &self,
        resource_id: &str,
        limit: usize,
        timeout: Duration,
    ) -> Result<Vec<RawRecord>, FetchError> {
        let params = [("resource_id", resource_id.to_string()), ("limit", limit.to_string())];
        let records = self
            .request::<DatastoreResult>("datastore_search", &params, timeout)?
            .map(|r| r.records)
            .unwrap_or_default();
        Ok(records.iter().map(record_from_json).collect())
    }

    /// Find the first domain resource with records and extract a metric set from it.
    ///
    /// Resources are scanned in dataset order. Empty or failing samples are
    /// skipped; the first non-empty sample decides the result, even when
    /// `extract` finds nothing in it. `budget` is asked for a timeout before
    /// every sample call; once it returns `None` the scan stops with
    /// [`SampleScan::OutOfTime`]. Only a fatal error (missing fixture) is
    /// returned as `Err`.
    pub fn parse_domain_dataset<T>(
        &self,
        datasets: &[DatasetDescriptor],
        keywords: &[&str],
        budget: impl Fn() -> Option<Duration>,
        extract: impl Fn(&[RawRecord]) -> Option<T>,
    ) -> Result<SampleScan<T>, FetchError> {
        for resource in matching_resources(datasets, keywords) {
            let Some(resource_id) = resource.id.as_deref() else {
                continue;
            };
            let Some(timeout) = budget() else {
                debug!(resource = %resource.name, "no time left to sample resource");
                return Ok(SampleScan::OutOfTime);
            };
            match self.sample_resource_with_timeout(resource_id, SAMPLE_LIMIT, timeout) {
                Ok(records) if records.is_empty() => {
                    debug!(resource = %resource.name, "resource sample is empty");
                }
                Ok(records) => {
                    debug!(resource = %resource.name, rows = records.len(), "sampled resource");
                    return Ok(SampleScan::Sampled(extract(&records)));
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(resource = %resource.name, error = %e, "resource sample failed"),
            }
        }
        Ok(SampleScan::NoSample)
    }
}

/// Tabular resources whose name mentions one of `keywords`, in dataset order.
pub fn matching_resources<'a>(
    datasets: &'a [DatasetDescriptor],
    keywords: &'a [&'a str],
) -> impl Iterator<Item = &'a ResourceDescriptor> + 'a {
    datasets
        .iter()
        .flat_map(|d| d.resources.iter())
        .filter(move |r| r.matches(keywords))
}

/// Flatten a datastore JSON record into a `RawRecord`, keeping key order.
///
/// Numbers and booleans are rendered as text; nulls are dropped.
pub fn record_from_json(map: &Map<String, Value>) -> RawRecord {
    map.iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), text))
        })
        .collect()
}
