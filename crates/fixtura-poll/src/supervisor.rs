//! Deadline supervisor driving poll specifications.
//!
//! # Design
//! - The deadline timer starts when execution starts and pre-empts both the attempt in flight
//!   and the interval sleep.
//! - A result that lands at or after the deadline is discarded; timeout wins.
//! - A failed attempt ends the poll immediately; only unaccepted results are retried.

use fixtura_telemetry::Metrics;
use fixtura_telemetry::metrics::{OUTCOME_FAILED, OUTCOME_SUCCEEDED, OUTCOME_TIMEOUT};
use tokio::task;
use tokio::time::{self, Instant};
use tracing::{debug, warn};

use crate::error::{BoxError, PollError, PollResult};
use crate::spec::PollSpec;

enum Settled<T> {
    Accepted(T),
    Failed(BoxError),
    Expired,
}

/// Runs poll specifications, optionally counting attempts and outcomes.
#[derive(Debug, Clone, Default)]
pub struct Supervisor {
    metrics: Option<Metrics>,
}

impl Supervisor {
    /// Supervisor without metrics.
    #[must_use]
    pub const fn new() -> Self {
        Self { metrics: None }
    }

    /// Count attempts and terminal outcomes in `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Poll `spec` until a result satisfies its predicate, an attempt fails, or the deadline
    /// elapses.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Timeout`] carrying the spec's message when the deadline wins,
    /// or [`PollError::Operation`] with the attempt's error when an attempt fails.
    pub async fn execute<T>(&self, spec: &PollSpec<T>) -> PollResult<T>
    where
        T: Send + 'static,
    {
        let started = Instant::now();
        let deadline = started + spec.deadline();
        let mut attempts = 0_u32;

        let settled = tokio::select! {
            biased;
            () = time::sleep_until(deadline) => Settled::Expired,
            settled = self.drive(spec, &mut attempts) => settled,
        };
        let settled = match settled {
            Settled::Accepted(_) if Instant::now() >= deadline => Settled::Expired,
            other => other,
        };

        match settled {
            Settled::Accepted(value) => {
                debug!(
                    attempts,
                    elapsed_ms = started.elapsed().as_millis(),
                    "poll succeeded"
                );
                self.record_outcome(OUTCOME_SUCCEEDED);
                Ok(value)
            }
            Settled::Failed(source) => {
                warn!(attempts, error = %source, "poll attempt failed; not retrying");
                self.record_outcome(OUTCOME_FAILED);
                Err(PollError::Operation { source })
            }
            Settled::Expired => {
                let elapsed = started.elapsed();
                warn!(
                    attempts,
                    elapsed_ms = elapsed.as_millis(),
                    message = spec.message(),
                    "poll deadline elapsed"
                );
                self.record_outcome(OUTCOME_TIMEOUT);
                Err(PollError::Timeout {
                    message: spec.message().to_string(),
                    elapsed,
                    attempts,
                })
            }
        }
    }

    async fn drive<T>(&self, spec: &PollSpec<T>, attempts: &mut u32) -> Settled<T>
    where
        T: Send + 'static,
    {
        loop {
            *attempts += 1;
            if let Some(metrics) = &self.metrics {
                metrics.inc_poll_attempt();
            }
            debug!(attempt = *attempts, "poll attempt");

            match spec.operation().attempt().await {
                Err(source) => return Settled::Failed(source),
                Ok(value) if spec.accepts(&value) => return Settled::Accepted(value),
                Ok(_) => {}
            }

            if spec.interval().is_zero() {
                task::yield_now().await;
            } else {
                time::sleep(spec.interval()).await;
            }
        }
    }

    fn record_outcome(&self, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_poll_outcome(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use fixtura_test_support::mocks::ScriptedOperation;
    use std::time::Duration;

    fn scripted<T>(script: &ScriptedOperation<T>) -> PollSpec<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let script = script.clone();
        PollSpec::new(move || script.call())
    }

    #[tokio::test(start_paused = true)]
    async fn unaccepted_results_are_retried_on_interval() -> Result<()> {
        let script = ScriptedOperation::values([1_u8, 2, 3]);
        let spec = scripted(&script)
            .until(|value| *value == 3)
            .with_interval(Duration::from_millis(100))
            .with_deadline(Duration::from_secs(5));

        let started = Instant::now();
        let value = spec.execute().await?;

        assert_eq!(value, 3);
        assert_eq!(script.calls(), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(200) && elapsed < Duration::from_millis(300));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn zero_deadline_times_out_before_accepting() {
        let script = ScriptedOperation::values([1_u8]);
        let spec = scripted(&script).with_deadline(Duration::ZERO);

        let err = spec.execute().await.err();
        assert!(matches!(err, Some(PollError::Timeout { attempts: 0, .. })));
        assert_eq!(script.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_keeps_polling_until_accepted() -> Result<()> {
        let script = ScriptedOperation::values([false, false, false, true]);
        let spec = scripted(&script)
            .until(|ready| *ready)
            .with_interval(Duration::ZERO)
            .with_deadline(Duration::from_secs(1));

        assert!(spec.execute().await?);
        assert_eq!(script.calls(), 4);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn metrics_count_attempts_and_outcomes() -> Result<()> {
        let metrics = Metrics::new()?;
        let supervisor = Supervisor::new().with_metrics(metrics.clone());

        let script = ScriptedOperation::values([0_u8, 1]);
        let ok = scripted(&script)
            .until(|value| *value == 1)
            .with_interval(Duration::from_millis(10));
        supervisor.execute(&ok).await?;

        let never = scripted(&ScriptedOperation::values([0_u8]))
            .until(|value| *value == 1)
            .with_interval(Duration::from_millis(10))
            .with_deadline(Duration::from_millis(35));
        assert!(supervisor.execute(&never).await.is_err());

        let failing = scripted(&ScriptedOperation::<u8>::new([Err("boom".to_string())]));
        assert!(supervisor.execute(&failing).await.is_err());

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.poll_succeeded_total, 1);
        assert_eq!(snapshot.poll_timeout_total, 1);
        assert_eq!(snapshot.poll_failed_total, 1);
        assert_eq!(snapshot.poll_attempts_total, 2 + 4 + 1);
        Ok(())
    }
}
