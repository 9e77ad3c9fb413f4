//! Scoped acquisition: run a body, then release its handle on every exit path.

use std::error::Error;
use std::fmt;
use std::future::Future;

use tracing::warn;

use crate::error::FsOpsError;
use crate::handle::UndoHandle;

/// Failure of a scoped body, of the release that followed it, or of both.
#[derive(Debug)]
pub enum ScopedError<E> {
    /// The body failed; the release succeeded.
    Body {
        /// Error returned by the body.
        error: E,
    },
    /// The body succeeded; the release failed.
    Release {
        /// Error returned by the release.
        source: FsOpsError,
    },
    /// Both the body and the release failed.
    Both {
        /// Error returned by the body.
        error: E,
        /// Error returned by the release.
        release: FsOpsError,
    },
}

impl<E> fmt::Display for ScopedError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Body { .. } => f.write_str("scoped body failed"),
            Self::Release { .. } => f.write_str("scoped release failed"),
            Self::Both { .. } => f.write_str("scoped body and release failed"),
        }
    }
}

impl<E: fmt::Debug> Error for ScopedError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.release_error().map(|error| error as &(dyn Error + 'static))
    }
}

impl<E> ScopedError<E> {
    /// Body error, if the body failed.
    pub const fn body_error(&self) -> Option<&E> {
        match self {
            Self::Body { error } | Self::Both { error, .. } => Some(error),
            Self::Release { .. } => None,
        }
    }

    /// Release error, if the release failed.
    pub const fn release_error(&self) -> Option<&FsOpsError> {
        match self {
            Self::Release { source } | Self::Both { release: source, .. } => Some(source),
            Self::Body { .. } => None,
        }
    }
}

/// Run `body`, then release `handle` whether the body returned `Ok`, returned `Err`, or panicked.
///
/// On panic the release runs during unwinding; its failure is logged because it cannot be returned.
///
/// # Errors
///
/// Returns [`ScopedError`] describing whichever of the body and the release failed.
pub fn scoped<T, E, F>(handle: UndoHandle, body: F) -> Result<T, ScopedError<E>>
where
    F: FnOnce() -> Result<T, E>,
{
    let mut guard = ReleaseGuard { handle };
    let outcome = body();
    let release = guard.handle.release();
    settle(outcome, release)
}

/// Async form of [`scoped`]. The handle is also released if the returned future is dropped early.
///
/// # Errors
///
/// Returns [`ScopedError`] describing whichever of the body and the release failed.
pub async fn scoped_async<T, E, F, Fut>(handle: UndoHandle, body: F) -> Result<T, ScopedError<E>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut guard = ReleaseGuard { handle };
    let outcome = body().await;
    let release = guard.handle.release();
    settle(outcome, release)
}

fn settle<T, E>(outcome: Result<T, E>, release: Result<(), FsOpsError>) -> Result<T, ScopedError<E>> {
    match (outcome, release) {
        (Ok(value), Ok(())) => Ok(value),
        (Err(error), Ok(())) => Err(ScopedError::Body { error }),
        (Ok(_), Err(source)) => Err(ScopedError::Release { source }),
        (Err(error), Err(release)) => Err(ScopedError::Both { error, release }),
    }
}

struct ReleaseGuard {
    handle: UndoHandle,
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        if self.handle.is_released() {
            return;
        }
        if let Err(error) = self.handle.release() {
            warn!(
                handle = %self.handle.label(),
                error = ?error,
                "release during unwind failed"
            );
        }
    }
}
