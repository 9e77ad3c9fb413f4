//! Scripted operations for exercising poll specifications deterministically.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};

/// An operation that replays a fixed script, one step per call.
///
/// Once the script is exhausted the final step repeats forever. Clones share
/// the script and the call counter.
#[derive(Debug)]
pub struct ScriptedOperation<T> {
    steps: Arc<[std::result::Result<T, String>]>,
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

impl<T> Clone for ScriptedOperation<T> {
    fn clone(&self) -> Self {
        Self {
            steps: Arc::clone(&self.steps),
            calls: Arc::clone(&self.calls),
            delay: self.delay,
        }
    }
}

impl<T> ScriptedOperation<T>
where
    T: Clone + Send + 'static,
{
    /// Build a script of successes (`Ok`) and failures (`Err(message)`).
    pub fn new<I>(steps: I) -> Self
    where
        I: IntoIterator<Item = std::result::Result<T, String>>,
    {
        Self {
            steps: steps.into_iter().collect(),
            calls: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
        }
    }

    /// Build a script that only ever succeeds.
    pub fn values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self::new(values.into_iter().map(Ok))
    }

    /// Make every call wait `delay` before producing its step.
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        Self { delay, ..self }
    }

    /// Number of calls made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Produce the next step, after the configured delay.
    ///
    /// The call is counted when it starts, not when it completes.
    pub fn call(&self) -> impl Future<Output = Result<T>> + Send + use<T> {
        let step = self.next_step();
        let delay = self.delay;
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            step
        }
    }

    /// Produce the next step synchronously, blocking the thread for the configured delay.
    ///
    /// # Errors
    ///
    /// Returns the scripted failure for this call, or an error for an empty script.
    pub fn call_blocking(&self) -> Result<T> {
        let step = self.next_step();
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        step
    }

    fn next_step(&self) -> Result<T> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.steps.get(index).or_else(|| self.steps.last()) {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(message)) => Err(anyhow!(message.clone())),
            None => Err(anyhow!("scripted operation has no steps")),
        }
    }
}
