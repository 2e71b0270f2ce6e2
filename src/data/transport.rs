//! Provider transport: the only place that performs I/O for the pipeline.
//!
//! Two implementations:
//! - [`HttpTransport`]: blocking HTTP against the catalog API and object store
//! - [`FixtureTransport`](crate::data::fixture::FixtureTransport): files on disk, for tests
//!
//! Implementations hold configuration only, so one handle can be shared by
//! concurrent callers.

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;

use crate::config::SourceConfig;
use crate::data::fixture::FixtureTransport;
use crate::error::FetchError;

/// A bulk-file request, resolved to both a URL and a fixture key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkRequest {
    pub dataset_key: String,
    /// Base file name without year or extension (`EAR_DIARIO_SUBSISTEMA`).
    pub filename: String,
    pub year: Option<i32>,
    pub url: String,
}

impl BulkRequest {
    /// `FILENAME[_YEAR].csv`
    pub fn file_name(&self) -> String {
        match self.year {
            Some(year) => format!("{}_{year}.csv", self.filename),
            None => format!("{}.csv", self.filename),
        }
    }
}

pub trait Transport: Send + Sync {
    /// Call a catalog action and return the raw JSON envelope.
    fn catalog(&self, action: &str, params: &[(&str, String)], timeout: Duration) -> Result<Value, FetchError>;

    /// Fetch a bulk file body as UTF-8 text.
    fn bulk(&self, request: &BulkRequest, timeout: Duration) -> Result<String, FetchError>;
}

/// Build the transport selected by `config`.
pub fn from_config(config: &SourceConfig) -> Result<Arc<dyn Transport>, FetchError> {
    match &config.fixtures_path {
        Some(root) => Ok(Arc::new(FixtureTransport::new(root.clone()))),
        None => Ok(Arc::new(HttpTransport::new(config)?)),
    }
}

pub struct HttpTransport {
    client: Client,
    catalog_base_url: String,
}

impl HttpTransport {
    pub fn new(config: &SourceConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            catalog_base_url: config.catalog_base_url.clone(),
        })
    }

    fn get(&self, url: &str, params: &[(&str, String)], timeout: Duration) -> Result<reqwest::blocking::Response, FetchError> {
        let resp = self
            .client
            .get(url)
            .query(params)
            .timeout(timeout)
            .send()
            .map_err(|e| FetchError::Transport(format!("request to {url} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(FetchError::Status {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp)
    }
}

impl Transport for HttpTransport {
    fn catalog(&self, action: &str, params: &[(&str, String)], timeout: Duration) -> Result<Value, FetchError> {
        let url = format!("{}/{action}", self.catalog_base_url);
        self.get(&url, params, timeout)?
            .json()
            .map_err(|e| FetchError::Parse(format!("invalid JSON from {url}: {e}")))
    }

    fn bulk(&self, request: &BulkRequest, timeout: Duration) -> Result<String, FetchError> {
        self.get(&request.url, &[], timeout)?
            .text()
            .map_err(|e| FetchError::Transport(format!("failed to read {}: {e}", request.url)))
    }
}
