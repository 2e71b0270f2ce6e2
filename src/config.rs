//! Provider source configuration.
//!
//! Resolution order: built-in defaults, then `.env` / process environment,
//! then explicit builder calls (the CLI applies its flags this way).
//!
//! Configuration is read once when a client is built; nothing here is
//! consulted per request.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_CATALOG_URL: &str = "https://dados.ons.org.br/api/3/action";
pub const DEFAULT_BULK_URL: &str = "https://ons-dl-prod-opendata.s3.amazonaws.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_CATALOG_URL: &str = "ONS_CATALOG_URL";
pub const ENV_BULK_URL: &str = "ONS_BULK_URL";
pub const ENV_TIMEOUT_SECS: &str = "ONS_TIMEOUT_SECS";
pub const ENV_USE_FIXTURES: &str = "ONS_USE_FIXTURES";
pub const ENV_FIXTURES_PATH: &str = "ONS_FIXTURES_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Base for catalog actions (`{base}/package_search`, ...).
    pub catalog_base_url: String,
    /// Object store base (`{base}/dataset/{path}/{FILE}.csv`).
    pub bulk_base_url: String,
    /// Per-call network timeout.
    pub timeout: Duration,
    pub user_agent: String,
    /// When set, every provider call is served from this directory instead of the network.
    pub fixtures_path: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            catalog_base_url: DEFAULT_CATALOG_URL.to_string(),
            bulk_base_url: DEFAULT_BULK_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: concat!("grid-snapshot/", env!("CARGO_PKG_VERSION")).to_string(),
            fixtures_path: None,
        }
    }
}

impl SourceConfig {
    /// Load from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_CATALOG_URL).filter(|s| !s.trim().is_empty()) {
            config.catalog_base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(url) = lookup(ENV_BULK_URL).filter(|s| !s.trim().is_empty()) {
            config.bulk_base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().ok().filter(|s| *s > 0).ok_or_else(|| {
                AppError::new(2, format!("Invalid {ENV_TIMEOUT_SECS} '{raw}': expected a positive number of seconds."))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        let use_fixtures = lookup(ENV_USE_FIXTURES)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if use_fixtures {
            let path = lookup(ENV_FIXTURES_PATH)
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| {
                    AppError::new(
                        2,
                        format!("{ENV_USE_FIXTURES}=true requires {ENV_FIXTURES_PATH} to point at a fixture directory."),
                    )
                })?;
            config.fixtures_path = Some(PathBuf::from(path.trim()));
        }

        Ok(config)
    }

    pub fn with_fixtures(mut self, path: impl Into<PathBuf>) -> Self {
        self.fixtures_path = Some(path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn uses_fixtures(&self) -> bool {
        self.fixtures_path.is_some()
    }
}
