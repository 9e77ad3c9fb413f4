//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Counts undo releases and poll attempts/outcomes; nothing here influences control flow.

use std::fmt;
use std::sync::Arc;

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{MetricStage, Result, TelemetryError};

const POLL_ATTEMPTS: &str = "fixtura_poll_attempts_total";
const POLL_OUTCOMES: &str = "fixtura_poll_outcomes_total";
const UNDO_RELEASES: &str = "fixtura_undo_releases_total";

/// Outcome label recorded when a poll succeeded.
pub const OUTCOME_SUCCEEDED: &str = "succeeded";
/// Outcome label recorded when a poll hit its deadline.
pub const OUTCOME_TIMEOUT: &str = "timeout";
/// Outcome label recorded when a poll attempt failed outright.
pub const OUTCOME_FAILED: &str = "failed";
/// Status label recorded when an undo handle released cleanly.
pub const RELEASE_OK: &str = "released";
/// Status label recorded when an undo handle failed to release.
pub const RELEASE_FAILED: &str = "failed";

/// Prometheus-backed metrics registry shared across the engines.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

struct MetricsInner {
    registry: Registry,
    poll_attempts_total: IntCounter,
    poll_outcomes_total: IntCounterVec,
    undo_releases_total: IntCounterVec,
}

/// Snapshot of the counters for assertions and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Total poll attempts started.
    pub poll_attempts_total: u64,
    /// Polls that returned a value accepted by their predicate.
    pub poll_succeeded_total: u64,
    /// Polls that ran out of time.
    pub poll_timeout_total: u64,
    /// Polls whose operation failed.
    pub poll_failed_total: u64,
    /// Undo handles released cleanly.
    pub undo_released_total: u64,
    /// Undo handles whose release failed.
    pub undo_failed_total: u64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built or
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let poll_attempts_total =
            IntCounter::with_opts(Opts::new(POLL_ATTEMPTS, "Poll attempts started"))
                .map_err(|source| collector(POLL_ATTEMPTS, source))?;
        let poll_outcomes_total = IntCounterVec::new(
            Opts::new(POLL_OUTCOMES, "Terminal poll outcomes by kind"),
            &["outcome"],
        )
        .map_err(|source| collector(POLL_OUTCOMES, source))?;
        let undo_releases_total = IntCounterVec::new(
            Opts::new(UNDO_RELEASES, "Undo handle releases by status"),
            &["status"],
        )
        .map_err(|source| collector(UNDO_RELEASES, source))?;

        registry
            .register(Box::new(poll_attempts_total.clone()))
            .map_err(|source| register(POLL_ATTEMPTS, source))?;
        registry
            .register(Box::new(poll_outcomes_total.clone()))
            .map_err(|source| register(POLL_OUTCOMES, source))?;
        registry
            .register(Box::new(undo_releases_total.clone()))
            .map_err(|source| register(UNDO_RELEASES, source))?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                poll_attempts_total,
                poll_outcomes_total,
                undo_releases_total,
            }),
        })
    }

    /// Increment the poll attempt counter.
    pub fn inc_poll_attempt(&self) {
        self.inner.poll_attempts_total.inc();
    }

    /// Record a terminal poll outcome (`succeeded`, `timeout`, `failed`).
    pub fn inc_poll_outcome(&self, outcome: &str) {
        self.inner
            .poll_outcomes_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Record an undo release result (`released`, `failed`).
    pub fn inc_undo_release(&self, status: &str) {
        self.inner
            .undo_releases_total
            .with_label_values(&[status])
            .inc();
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::Exposition { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::ExpositionText { source })
    }

    /// Take a point-in-time snapshot of the counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let outcome = |label: &str| {
            self.inner
                .poll_outcomes_total
                .with_label_values(&[label])
                .get()
        };
        let release = |label: &str| {
            self.inner
                .undo_releases_total
                .with_label_values(&[label])
                .get()
        };
        MetricsSnapshot {
            poll_attempts_total: self.inner.poll_attempts_total.get(),
            poll_succeeded_total: outcome(OUTCOME_SUCCEEDED),
            poll_timeout_total: outcome(OUTCOME_TIMEOUT),
            poll_failed_total: outcome(OUTCOME_FAILED),
            undo_released_total: release(RELEASE_OK),
            undo_failed_total: release(RELEASE_FAILED),
        }
    }
}

fn collector(metric: &'static str, source: prometheus::Error) -> TelemetryError {
    TelemetryError::Metric {
        metric,
        stage: MetricStage::Build,
        source,
    }
}

fn register(metric: &'static str, source: prometheus::Error) -> TelemetryError {
    TelemetryError::Metric {
        metric,
        stage: MetricStage::Register,
        source,
    }
}
