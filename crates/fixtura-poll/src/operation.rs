//! Type-erased, repeatable async operations.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::BoxError;

/// Future returned by one attempt of a [`PollOperation`].
pub type AttemptFuture<T> = Pin<Box<dyn Future<Output = Result<T, BoxError>> + Send + 'static>>;

type AttemptFn<T> = dyn Fn() -> AttemptFuture<T> + Send + Sync + 'static;

/// An async operation that can be started any number of times.
///
/// Clones share the underlying closure.
pub struct PollOperation<T> {
    attempt: Arc<AttemptFn<T>>,
}

impl<T> Clone for PollOperation<T> {
    fn clone(&self) -> Self {
        Self {
            attempt: Arc::clone(&self.attempt),
        }
    }
}

impl<T> fmt::Debug for PollOperation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollOperation").finish_non_exhaustive()
    }
}

impl<T> PollOperation<T>
where
    T: Send + 'static,
{
    /// Wrap a closure producing a fresh future per attempt.
    pub fn new<F, Fut, E>(operation: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        Self {
            attempt: Arc::new(move || {
                let attempt = operation();
                Box::pin(async move { attempt.await.map_err(Into::into) })
            }),
        }
    }

    /// Wrap a synchronous closure; each attempt runs on tokio's blocking pool.
    pub fn from_blocking<F, E>(operation: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        let operation = Arc::new(operation);
        Self::new(move || {
            let operation = Arc::clone(&operation);
            async move {
                match tokio::task::spawn_blocking(move || operation()).await {
                    Ok(result) => result.map_err(Into::<BoxError>::into),
                    Err(join_error) => Err(BoxError::from(join_error)),
                }
            }
        })
    }

    /// Start one attempt.
    #[must_use]
    pub fn attempt(&self) -> AttemptFuture<T> {
        (self.attempt)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use std::io;

    #[tokio::test]
    async fn each_attempt_runs_the_closure_again() -> Result<()> {
        let operation = PollOperation::new(|| async { Ok::<_, io::Error>(5_u8) });
        let copy = operation.clone();
        assert_eq!(operation.attempt().await.map_err(|err| anyhow!(err))?, 5);
        assert_eq!(copy.attempt().await.map_err(|err| anyhow!(err))?, 5);
        Ok(())
    }

    #[tokio::test]
    async fn blocking_operations_report_their_errors() {
        let operation =
            PollOperation::<u8>::from_blocking(|| Err(io::Error::other("disk unavailable")));
        let outcome = operation.attempt().await;
        assert_eq!(
            outcome.err().map(|err| err.to_string()).as_deref(),
            Some("disk unavailable")
        );
    }
}
