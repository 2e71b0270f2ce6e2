//! The acquisition tier chain.
//!
//! Tiers run in a fixed order and the first non-empty result wins:
//!
//! 1. bulk file for the current year
//! 2. bulk file for the previous year
//! 3. catalog search (datasets matching the metric keyword)
//! 4. catalog parse (sample the first matching resource)
//! 5. static reference values
//!
//! Each tier is a separate `attempt_*` method, so tiers can be exercised one
//! at a time. Failures are logged and treated as an empty tier; the only
//! error that leaves [`TierChain::resolve`] is a missing fixture on the
//! catalog path.
//!
//! An optional request deadline clamps every per-call timeout, including each
//! resource sample inside the catalog parse tier. Once it has passed, the
//! remaining network work is skipped and the static values are returned.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Datelike, Local, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::acquire::MetricSource;
use crate::config::SourceConfig;
use crate::data::{BulkClient, CatalogClient, DatasetDescriptor, SampleScan, Transport};
use crate::domain::{AcquisitionOutcome, Provenance};
use crate::error::FetchError;

/// Timestamp format stamped on static reference values.
pub const FALLBACK_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Per-request inputs: the clock and an optional overall deadline.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    /// Wall-clock time used to pick bulk years and stamp fallback values.
    pub now: NaiveDateTime,
    pub deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now, deadline: None }
    }

    /// Local time, no deadline.
    pub fn now() -> Self {
        Self::new(Local::now().naive_local())
    }

    pub fn with_deadline(mut self, budget: Duration) -> Self {
        self.deadline = Some(Instant::now() + budget);
        self
    }

    /// Timeout for the next call, clamped to the deadline; `None` once it has passed.
    pub fn remaining(&self, timeout: Duration) -> Option<Duration> {
        match self.deadline {
            None => Some(timeout),
            Some(deadline) => {
                let left = deadline.saturating_duration_since(Instant::now());
                (!left.is_zero()).then(|| left.min(timeout))
            }
        }
    }

    pub fn year(&self) -> i32 {
        self.now.year()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    BulkCurrentYear,
    BulkPreviousYear,
    CatalogSearch,
    CatalogParse,
    StaticFallback,
}

impl Tier {
    /// Every tier, in the order they are tried.
    pub const ORDER: [Tier; 5] = [
        Tier::BulkCurrentYear,
        Tier::BulkPreviousYear,
        Tier::CatalogSearch,
        Tier::CatalogParse,
        Tier::StaticFallback,
    ];

    /// The tier tried after this one; the static tier is terminal.
    pub fn next(self) -> Tier {
        match self {
            Tier::BulkCurrentYear => Tier::BulkPreviousYear,
            Tier::BulkPreviousYear => Tier::CatalogSearch,
            Tier::CatalogSearch => Tier::CatalogParse,
            Tier::CatalogParse | Tier::StaticFallback => Tier::StaticFallback,
        }
    }

    pub fn is_network(self) -> bool {
        self != Tier::StaticFallback
    }
}

/// Why the static tier was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// Catalog search returned no datasets.
    NoDatasets,
    /// Datasets were found but no values could be extracted from them.
    Unrecognized,
    /// Catalog search failed outright.
    CatalogFailed(String),
    /// The request deadline passed before a network tier succeeded.
    DeadlineExceeded,
}

/// The outcome of a full chain run.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<T> {
    pub value: T,
    pub provenance: Provenance,
    /// Year of the bulk file that produced `value`, for the bulk tiers.
    pub year: Option<i32>,
    /// Set only for [`Provenance::Fallback`].
    pub fallback_reason: Option<FallbackReason>,
}

pub struct TierChain {
    bulk: BulkClient,
    catalog: CatalogClient,
    timeout: Duration,
}

impl TierChain {
    pub fn new(transport: Arc<dyn Transport>, config: &SourceConfig) -> Self {
        Self {
            bulk: BulkClient::new(transport.clone(), config),
            catalog: CatalogClient::new(transport, config),
            timeout: config.timeout,
        }
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    /// Bulk tier for one year.
    pub fn attempt_bulk<M: MetricSource>(
        &self,
        year: i32,
        provenance: Provenance,
        timeout: Duration,
    ) -> AcquisitionOutcome<M::Output> {
        let (key, file) = M::DATASET;
        let Some(records) = self.bulk.fetch_with_timeout(key, file, Some(year), timeout) else {
            return AcquisitionOutcome::Empty;
        };
        let value = M::from_bulk(&records);
        if value.is_none() {
            debug!(metric = M::LABEL, year, rows = records.len(), "bulk file has no recognizable regions");
        }
        AcquisitionOutcome::from_option(value, provenance)
    }

    /// Catalog search tier: datasets matching the metric keyword.
    pub fn attempt_catalog_search<M: MetricSource>(
        &self,
        timeout: Duration,
    ) -> Result<AcquisitionOutcome<Vec<DatasetDescriptor>>, FetchError> {
        match self.catalog.search_with_timeout(M::SEARCH_KEYWORD, timeout) {
            Ok(datasets) if datasets.is_empty() => Ok(AcquisitionOutcome::Empty),
            Ok(datasets) => Ok(AcquisitionOutcome::Success(datasets, Provenance::Catalog)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(metric = M::LABEL, error = %e, "catalog search failed");
                Ok(AcquisitionOutcome::Failure(e.to_string()))
            }
        }
    }

    /// Catalog parse tier: extract values from the first usable resource sample.
    ///
    /// Each sample call gets whatever is left of the request deadline.
    pub fn attempt_catalog_parse<M: MetricSource>(
        &self,
        datasets: &[DatasetDescriptor],
        ctx: &RequestContext,
    ) -> Result<SampleScan<M::Output>, FetchError> {
        self.catalog.parse_domain_dataset(
            datasets,
            M::RESOURCE_KEYWORDS,
            || ctx.remaining(self.timeout),
            M::from_catalog,
        )
    }

    /// Static tier; always succeeds.
    pub fn attempt_fallback<M: MetricSource>(&self, ctx: &RequestContext, reason: FallbackReason) -> Resolution<M::Output> {
        let timestamp = ctx.now.format(FALLBACK_TIMESTAMP_FORMAT).to_string();
        info!(metric = M::LABEL, reason = ?reason, "using reference values");
        Resolution {
            value: M::reference(&timestamp),
            provenance: Provenance::Fallback,
            year: None,
            fallback_reason: Some(reason),
        }
    }

    /// Run every tier in order and return the first non-empty result.
    pub fn resolve<M: MetricSource>(&self, ctx: &RequestContext) -> Result<Resolution<M::Output>, FetchError> {
        let mut datasets = Vec::new();
        let mut tier = Tier::BulkCurrentYear;

        loop {
            let budget = ctx.remaining(self.timeout);
            if tier.is_network() && budget.is_none() {
                warn!(metric = M::LABEL, tier = ?tier, "request deadline passed, skipping network tiers");
                return Ok(self.attempt_fallback::<M>(ctx, FallbackReason::DeadlineExceeded));
            }
            let timeout = budget.unwrap_or(self.timeout);
            debug!(metric = M::LABEL, tier = ?tier, timeout_ms = timeout.as_millis() as u64, "attempting tier");

            let (outcome, year) = match tier {
                Tier::BulkCurrentYear => {
                    let year = ctx.year();
                    (self.attempt_bulk::<M>(year, Provenance::BulkCurrent, timeout), Some(year))
                }
                Tier::BulkPreviousYear => {
                    let year = ctx.year() - 1;
                    (self.attempt_bulk::<M>(year, Provenance::BulkPrevious, timeout), Some(year))
                }
                Tier::CatalogSearch => match self.attempt_catalog_search::<M>(timeout)? {
                    AcquisitionOutcome::Success(found, _) => {
                        debug!(metric = M::LABEL, datasets = found.len(), "catalog search matched");
                        datasets = found;
                        tier = tier.next();
                        continue;
                    }
                    AcquisitionOutcome::Empty => {
                        return Ok(self.attempt_fallback::<M>(ctx, FallbackReason::NoDatasets));
                    }
                    AcquisitionOutcome::Failure(reason) => {
                        return Ok(self.attempt_fallback::<M>(ctx, FallbackReason::CatalogFailed(reason)));
                    }
                },
                Tier::CatalogParse => match self.attempt_catalog_parse::<M>(&datasets, ctx)? {
                    SampleScan::Sampled(value) => (AcquisitionOutcome::from_option(value, Provenance::Catalog), None),
                    SampleScan::NoSample => (AcquisitionOutcome::Empty, None),
                    SampleScan::OutOfTime => {
                        warn!(metric = M::LABEL, "request deadline passed while sampling resources");
                        return Ok(self.attempt_fallback::<M>(ctx, FallbackReason::DeadlineExceeded));
                    }
                },
                Tier::StaticFallback => {
                    return Ok(self.attempt_fallback::<M>(ctx, FallbackReason::Unrecognized));
                }
            };

            match outcome {
                AcquisitionOutcome::Success(value, provenance) => {
                    info!(metric = M::LABEL, provenance = provenance.tag(), "metric resolved");
                    return Ok(Resolution {
                        value,
                        provenance,
                        year,
                        fallback_reason: None,
                    });
                }
                AcquisitionOutcome::Empty => debug!(metric = M::LABEL, tier = ?tier, "tier returned nothing"),
                AcquisitionOutcome::Failure(reason) => {
                    warn!(metric = M::LABEL, tier = ?tier, %reason, "tier failed");
                }
            }
            tier = tier.next();
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;
    use crate::acquire::{ConsumptionMetric, ReservoirMetric};
    use crate::data::transport::testing::ScriptedTransport;
    use crate::domain::Region;

    const EAR_2024: &str = "id_subsistema;din_instante;val_earverif_percentual\n\
SE;2024-03-01;61,2\n\
S;2024-03-01;70,0\n";

    const EAR_2023: &str = "id_subsistema;din_instante;val_earverif_percentual\n\
NE;2023-12-31;44,1\n";

    fn ctx() -> RequestContext {
        let now = NaiveDate::from_ymd_opt(2024, 3, 2)
            .and_then(|d| d.and_hms_opt(10, 30, 0))
            .unwrap();
        RequestContext::new(now)
    }

    fn build(transport: ScriptedTransport) -> (Arc<ScriptedTransport>, TierChain) {
        let transport = Arc::new(transport);
        let chain = TierChain::new(transport.clone(), &SourceConfig::default());
        (transport, chain)
    }

    fn search_hit() -> serde_json::Value {
        json!({"success": true, "result": {"results": [{
            "name": "ear-diario",
            "resources": [{"id": "res-ear", "name": "ear_subsistema.json", "format": "JSON"}]
        }]}})
    }

    #[test]
    fn current_year_bulk_wins() {
        let (_, chain) = build(ScriptedTransport::new().with_bulk("EAR_DIARIO_SUBSISTEMA_2024.csv", Ok(EAR_2024.into())));
        let res = chain.resolve::<ReservoirMetric>(&ctx()).unwrap();
        assert_eq!(res.provenance, Provenance::BulkCurrent);
        assert_eq!(res.year, Some(2024));
        assert_eq!(res.value.len(), 2);
        assert_eq!(res.value[&Region::Southeast].value, 61.2);
        assert!(res.fallback_reason.is_none());
    }

    #[test]
    fn previous_year_is_tried_next() {
        let (transport, chain) =
            build(ScriptedTransport::new().with_bulk("EAR_DIARIO_SUBSISTEMA_2023.csv", Ok(EAR_2023.into())));
        let res = chain.resolve::<ReservoirMetric>(&ctx()).unwrap();
        assert_eq!(res.provenance, Provenance::BulkPrevious);
        assert_eq!(res.year, Some(2023));
        assert_eq!(
            transport.calls(),
            vec!["EAR_DIARIO_SUBSISTEMA_2024.csv", "EAR_DIARIO_SUBSISTEMA_2023.csv"]
        );
    }

    #[test]
    fn catalog_is_used_when_bulk_is_empty() {
        let (_, chain) = build(
            ScriptedTransport::new()
                .with_bulk("EAR_DIARIO_SUBSISTEMA_2024.csv", Ok("id_subsistema;din_instante\n".into()))
                .with_catalog("ons_package_search_reservatorio", Ok(search_hit()))
                .with_catalog(
                    "ons_datastore_search_res-ear",
                    Ok(json!({"success": true, "result": {"records": [
                        {"data": "2024-01-15", "sudeste": "65.4", "sul": "58.2", "nordeste": "42.8", "norte": "71.3"}
                    ]}})),
                ),
        );
        let res = chain.resolve::<ReservoirMetric>(&ctx()).unwrap();
        assert_eq!(res.provenance, Provenance::Catalog);
        assert_eq!(res.year, None);
        assert_eq!(res.value.len(), 4);
        assert_eq!(res.value[&Region::North].timestamp, "2024-01-15");
    }

    #[test]
    fn empty_search_and_unusable_samples_are_told_apart() {
        let (_, chain) = build(
            ScriptedTransport::new()
                .with_catalog("ons_package_search_carga", Ok(json!({"success": true, "result": {"results": []}}))),
        );
        let res = chain.resolve::<ConsumptionMetric>(&ctx()).unwrap();
        assert_eq!(res.provenance, Provenance::Fallback);
        assert_eq!(res.fallback_reason, Some(FallbackReason::NoDatasets));

        let (_, chain) = build(
            ScriptedTransport::new()
                .with_catalog("ons_package_search_reservatorio", Ok(search_hit()))
                .with_catalog(
                    "ons_datastore_search_res-ear",
                    Ok(json!({"success": true, "result": {"records": [{"usina": "Furnas", "volume": "12"}]}})),
                ),
        );
        let res = chain.resolve::<ReservoirMetric>(&ctx()).unwrap();
        assert_eq!(res.fallback_reason, Some(FallbackReason::Unrecognized));
        assert_eq!(res.value.len(), 4);
        assert_eq!(res.value[&Region::Southeast].timestamp, "2024-03-02T10:30:00");
    }

    #[test]
    fn transport_failures_degrade_to_fallback() {
        let (_, chain) = build(ScriptedTransport::new().with_catalog(
            "ons_package_search_carga",
            Err(FetchError::Transport("connection refused".into())),
        ));
        let res = chain.resolve::<ConsumptionMetric>(&ctx()).unwrap();
        assert_eq!(res.provenance, Provenance::Fallback);
        assert!(matches!(res.fallback_reason, Some(FallbackReason::CatalogFailed(_))));
        assert_eq!(res.value.current_load_mw, 68542);
    }

    #[test]
    fn missing_catalog_fixture_propagates() {
        let (_, chain) = build(ScriptedTransport::new().with_catalog(
            "ons_package_search_reservatorio",
            Err(FetchError::FixtureMissing("ons_package_search_reservatorio.json".into())),
        ));
        let err = chain.resolve::<ReservoirMetric>(&ctx()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn expired_deadline_skips_the_network() {
        let (transport, chain) = build(ScriptedTransport::new());
        let expired = ctx().with_deadline(Duration::ZERO);
        let res = chain.resolve::<ReservoirMetric>(&expired).unwrap();
        assert_eq!(res.fallback_reason, Some(FallbackReason::DeadlineExceeded));
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn deadline_bounds_the_catalog_parse_tier() {
        let hit = json!({"success": true, "result": {"results": [{
            "name": "ear-diario",
            "resources": [
                {"id": "ear-1", "name": "ear_1.json", "format": "JSON"},
                {"id": "ear-2", "name": "ear_2.json", "format": "JSON"},
                {"id": "ear-3", "name": "ear_3.json", "format": "JSON"},
                {"id": "ear-4", "name": "ear_4.json", "format": "JSON"}
            ]
        }]}});
        let mut transport = ScriptedTransport::new().with_catalog("ons_package_search_reservatorio", Ok(hit));
        for id in ["ear-1", "ear-2", "ear-3", "ear-4"] {
            transport = transport.with_stall(&format!("ons_datastore_search_{id}"));
        }
        let (transport, chain) = build(transport);

        let budget = Duration::from_millis(200);
        let started = Instant::now();
        let res = chain.resolve::<ReservoirMetric>(&ctx().with_deadline(budget)).unwrap();

        assert_eq!(res.fallback_reason, Some(FallbackReason::DeadlineExceeded));
        assert!(started.elapsed() < budget * 2, "took {:?}", started.elapsed());
        let samples = transport.calls().iter().filter(|c| c.starts_with("ons_datastore_search")).count();
        assert_eq!(samples, 1);
    }

    #[test]
    fn tiers_advance_in_order_and_end_at_the_static_tier() {
        let mut walked = vec![Tier::BulkCurrentYear];
        while let Some(&last) = walked.last().filter(|t| t.is_network()) {
            walked.push(last.next());
        }
        assert_eq!(walked, Tier::ORDER);
        assert_eq!(Tier::StaticFallback.next(), Tier::StaticFallback);
    }

    #[test]
    fn remaining_clamps_to_the_deadline() {
        let ctx = ctx();
        assert_eq!(ctx.remaining(Duration::from_secs(30)), Some(Duration::from_secs(30)));

        let tight = ctx.with_deadline(Duration::from_secs(5));
        let left = tight.remaining(Duration::from_secs(30)).unwrap();
        assert!(left <= Duration::from_secs(5));
        assert_eq!(tight.remaining(Duration::from_millis(1)), Some(Duration::from_millis(1)));
    }

    #[test]
    fn individual_tiers_can_run_alone() {
        let (_, chain) = build(ScriptedTransport::new().with_bulk("CARGA_ENERGIA_2022.csv", Ok(
            "id_subsistema;din_instante;val_cargaenergiamwmed\nN;2022-12-31;7878\n".into(),
        )));
        let outcome = chain.attempt_bulk::<ConsumptionMetric>(2022, Provenance::BulkPrevious, Duration::from_secs(1));
        assert!(outcome.is_success());

        let outcome = chain.attempt_bulk::<ConsumptionMetric>(2021, Provenance::BulkPrevious, Duration::from_secs(1));
        assert_eq!(outcome, AcquisitionOutcome::Empty);
    }
}
