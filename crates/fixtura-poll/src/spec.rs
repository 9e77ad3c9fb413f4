//! Immutable poll specifications.
//!
//! # Design
//! - A spec is plain data: every `with_*`/`until` call returns a new spec and nothing runs
//!   until [`PollSpec::execute`].
//! - Operations and predicates are shared behind `Arc`, so cloning a spec is cheap.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use fixtura_config::PollDefaults;
use fixtura_config::defaults::{POLL_DEADLINE, POLL_INTERVAL};

use crate::error::{BoxError, PollError, PollResult};
use crate::operation::PollOperation;
use crate::presets::PollPreset;
use crate::supervisor::Supervisor;

/// Failure message used when none is configured.
pub const DEFAULT_MESSAGE: &str = "condition was not met before the deadline";

type Predicate<T> = dyn Fn(&T) -> bool + Send + Sync + 'static;

/// Description of a bounded retry-until-predicate operation.
pub struct PollSpec<T> {
    operation: PollOperation<T>,
    predicate: Arc<Predicate<T>>,
    interval: Duration,
    deadline: Duration,
    message: String,
}

const fn accept_any<T>(_: &T) -> bool {
    true
}

impl<T> Clone for PollSpec<T> {
    fn clone(&self) -> Self {
        Self {
            operation: self.operation.clone(),
            predicate: Arc::clone(&self.predicate),
            interval: self.interval,
            deadline: self.deadline,
            message: self.message.clone(),
        }
    }
}

impl<T> fmt::Debug for PollSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollSpec")
            .field("interval", &self.interval)
            .field("deadline", &self.deadline)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl<T> PollSpec<T>
where
    T: Send + 'static,
{
    /// Spec around an async closure, accepting the first successful result.
    pub fn new<F, Fut, E>(operation: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        Self::from_operation(PollOperation::new(operation))
    }

    /// Spec around a synchronous closure run on the blocking pool per attempt.
    pub fn from_blocking<F, E>(operation: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        Self::from_operation(PollOperation::from_blocking(operation))
    }

    /// Spec around an existing operation, with compiled defaults.
    pub fn from_operation(operation: PollOperation<T>) -> Self {
        Self {
            operation,
            predicate: Arc::new(accept_any::<T>),
            interval: POLL_INTERVAL,
            deadline: POLL_DEADLINE,
            message: DEFAULT_MESSAGE.to_string(),
        }
    }

    /// Accept only results for which `predicate` holds.
    #[must_use]
    pub fn until<P>(self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            ..self
        }
    }

    /// Pause between attempts. Zero yields to the scheduler instead of sleeping.
    #[must_use]
    pub fn with_interval(self, interval: Duration) -> Self {
        Self { interval, ..self }
    }

    /// Overall budget, measured from the start of execution.
    #[must_use]
    pub fn with_deadline(self, deadline: Duration) -> Self {
        Self { deadline, ..self }
    }

    /// Message carried by the timeout error.
    #[must_use]
    pub fn with_message(self, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..self
        }
    }

    /// Apply a preset's interval and deadline.
    #[must_use]
    pub fn with_preset(self, preset: PollPreset) -> Self {
        self.with_interval(preset.interval())
            .with_deadline(preset.deadline())
    }

    /// Apply configured interval and deadline.
    #[must_use]
    pub fn with_defaults(self, defaults: &PollDefaults) -> Self {
        self.with_interval(defaults.interval)
            .with_deadline(defaults.deadline)
    }

    /// Pause between attempts.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Overall budget.
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Message carried by the timeout error.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Operation run per attempt.
    #[must_use]
    pub const fn operation(&self) -> &PollOperation<T> {
        &self.operation
    }

    /// Whether `value` satisfies the predicate.
    pub fn accepts(&self, value: &T) -> bool {
        (self.predicate)(value)
    }

    /// Run the spec under a supervisor without metrics.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Timeout`] if no accepted result arrived before the deadline,
    /// or [`PollError::Operation`] as soon as an attempt fails.
    pub async fn execute(&self) -> PollResult<T> {
        Supervisor::new().execute(self).await
    }
}

impl<T> PollSpec<Option<T>>
where
    T: Send + 'static,
{
    /// [`Self::execute`], unwrapping the accepted value.
    ///
    /// # Errors
    ///
    /// As [`Self::execute`], plus [`PollError::Absent`] when the predicate accepted `None`.
    pub async fn execute_present(&self) -> PollResult<T> {
        self.execute().await?.ok_or(PollError::Absent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn constant(value: u8) -> PollSpec<u8> {
        PollSpec::new(move || async move { Ok::<_, io::Error>(value) })
    }

    #[test]
    fn new_spec_uses_compiled_defaults() {
        let spec = constant(1);
        assert_eq!(spec.interval(), Duration::from_secs(5));
        assert_eq!(spec.deadline(), Duration::from_secs(30));
        assert_eq!(spec.message(), DEFAULT_MESSAGE);
        assert!(spec.accepts(&0));
    }

    #[test]
    fn builders_return_new_specs_without_touching_the_original() {
        let base = constant(1);
        let tuned = base
            .clone()
            .until(|value| *value > 3)
            .with_interval(Duration::from_millis(10))
            .with_deadline(Duration::from_secs(1))
            .with_message("value stayed small");

        assert_eq!(base.interval(), Duration::from_secs(5));
        assert!(base.accepts(&0));
        assert_eq!(tuned.interval(), Duration::from_millis(10));
        assert_eq!(tuned.deadline(), Duration::from_secs(1));
        assert_eq!(tuned.message(), "value stayed small");
        assert!(!tuned.accepts(&3));
        assert!(tuned.accepts(&4));
    }

    #[test]
    fn presets_and_configured_defaults_apply() {
        let quick = constant(1).with_preset(PollPreset::Quick);
        assert_eq!(quick.interval(), Duration::from_millis(50));
        assert_eq!(quick.deadline(), Duration::from_secs(5));

        let configured = constant(1).with_defaults(&PollDefaults {
            interval: Duration::from_millis(250),
            deadline: Duration::from_secs(2),
        });
        assert_eq!(configured.interval(), Duration::from_millis(250));
        assert_eq!(configured.deadline(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn execute_present_rejects_accepted_absence() {
        let spec = PollSpec::new(|| async { Ok::<Option<u8>, io::Error>(None) });
        let err = spec.execute_present().await.err();
        assert!(matches!(err, Some(PollError::Absent)));
    }
}
