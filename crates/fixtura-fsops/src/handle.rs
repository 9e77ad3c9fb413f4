//! Single-release undo handles and their composite form.
//!
//! # Design
//! - A handle owns its undo closure; `release` takes it out, so a second release is a no-op.
//! - Nothing releases implicitly. Dropping an unreleased handle leaves the mutation in place
//!   and logs a warning naming the handle.
//! - Composites release every member in the order supplied and collect all failures.

use std::fmt;

use fixtura_telemetry::Metrics;
use fixtura_telemetry::metrics::{RELEASE_FAILED, RELEASE_OK};
use tracing::{debug, info, warn};

use crate::error::{FsOpsError, FsOpsResult};

type UndoFn = Box<dyn FnOnce() -> FsOpsResult<()> + Send + 'static>;

/// Owned token whose release performs a compensating action.
#[must_use = "an UndoHandle does nothing unless released"]
pub struct UndoHandle {
    label: String,
    undo: Option<UndoFn>,
    metrics: Option<Metrics>,
}

impl UndoHandle {
    /// Wrap `undo` in a handle identified by `label` in logs.
    pub fn new<F>(label: impl Into<String>, undo: F) -> Self
    where
        F: FnOnce() -> FsOpsResult<()> + Send + 'static,
    {
        Self {
            label: label.into(),
            undo: Some(Box::new(undo)),
            metrics: None,
        }
    }

    /// Handle whose release does nothing; useful as a placeholder in teardown code.
    pub fn noop(label: impl Into<String>) -> Self {
        Self::new(label, || Ok(()))
    }

    /// Count this handle's release in `metrics`.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Label used in logs.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether `release` has already run.
    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.undo.is_none()
    }

    /// Run the compensating action.
    ///
    /// The undo runs at most once: later calls return `Ok(())` without doing
    /// anything, even when the first call failed. The failure is never retried.
    ///
    /// # Errors
    ///
    /// Returns whatever the undo returned.
    pub fn release(&mut self) -> FsOpsResult<()> {
        let Some(undo) = self.undo.take() else {
            debug!(handle = %self.label, "undo handle already released");
            return Ok(());
        };

        let result = undo();
        match &result {
            Ok(()) => {
                info!(handle = %self.label, "released undo handle");
                if let Some(metrics) = &self.metrics {
                    metrics.inc_undo_release(RELEASE_OK);
                }
            }
            Err(error) => {
                warn!(handle = %self.label, error = ?error, "undo handle release failed");
                if let Some(metrics) = &self.metrics {
                    metrics.inc_undo_release(RELEASE_FAILED);
                }
            }
        }
        result
    }

    /// Aggregate `handles` into one handle.
    ///
    /// Releasing the composite releases every member exactly once, in the given
    /// order, and keeps going past failures. When any member fails the composite
    /// returns [`FsOpsError::Aggregate`] carrying every failure in release order.
    pub fn combine<I>(handles: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut members: Vec<Self> = handles.into_iter().collect();
        let label = format!("composite[{}]", members.len());
        Self::new(label, move || {
            let mut failures = Vec::new();
            for member in &mut members {
                if let Err(error) = member.release() {
                    failures.push(error);
                }
            }
            if failures.is_empty() {
                Ok(())
            } else {
                Err(FsOpsError::Aggregate { failures })
            }
        })
    }
}

/// Aggregate `handles` into one handle; see [`UndoHandle::combine`].
pub fn combine<I>(handles: I) -> UndoHandle
where
    I: IntoIterator<Item = UndoHandle>,
{
    UndoHandle::combine(handles)
}

impl fmt::Debug for UndoHandle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("UndoHandle")
            .field("label", &self.label)
            .field("released", &self.is_released())
            .finish_non_exhaustive()
    }
}

impl Drop for UndoHandle {
    fn drop(&mut self) {
        if self.undo.is_some() {
            warn!(
                handle = %self.label,
                "undo handle dropped without release; mutation left in place"
            );
        }
    }
}
