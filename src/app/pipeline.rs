//! Shared acquisition logic used by the CLI and by library callers.
//!
//! A [`GridMetrics`] owns one transport handle and the tier chain built on
//! it. It holds configuration only, so one instance can serve concurrent
//! requests:
//!
//! transport -> tier chain -> normalized metrics -> snapshot

use std::sync::Arc;

use crate::acquire::{ConsumptionMetric, RequestContext, ReservoirMetric, TierChain};
use crate::config::SourceConfig;
use crate::data::{CatalogClient, Transport, transport};
use crate::error::AppError;
use crate::report::{ConsumptionSnapshot, ReservoirSnapshot, assemble_consumption, assemble_reservoir};

pub struct GridMetrics {
    chain: TierChain,
}

impl GridMetrics {
    /// Build from configuration, picking the HTTP or fixture transport.
    pub fn new(config: &SourceConfig) -> Result<Self, AppError> {
        let transport = transport::from_config(config)?;
        Ok(Self::with_transport(transport, config))
    }

    /// Build from the environment (`.env` included).
    pub fn from_env() -> Result<Self, AppError> {
        Self::new(&SourceConfig::from_env()?)
    }

    pub fn with_transport(transport: Arc<dyn Transport>, config: &SourceConfig) -> Self {
        Self {
            chain: TierChain::new(transport, config),
        }
    }

    pub fn reservoir_snapshot(&self) -> Result<ReservoirSnapshot, AppError> {
        self.reservoir_snapshot_at(&RequestContext::now())
    }

    pub fn reservoir_snapshot_at(&self, ctx: &RequestContext) -> Result<ReservoirSnapshot, AppError> {
        let resolution = self.chain.resolve::<ReservoirMetric>(ctx)?;
        Ok(assemble_reservoir(resolution))
    }

    pub fn consumption_snapshot(&self) -> Result<ConsumptionSnapshot, AppError> {
        self.consumption_snapshot_at(&RequestContext::now())
    }

    pub fn consumption_snapshot_at(&self, ctx: &RequestContext) -> Result<ConsumptionSnapshot, AppError> {
        let resolution = self.chain.resolve::<ConsumptionMetric>(ctx)?;
        Ok(assemble_consumption(resolution))
    }

    /// Direct catalog access for listing and inspecting datasets.
    pub fn catalog(&self) -> &CatalogClient {
        self.chain.catalog()
    }
}
