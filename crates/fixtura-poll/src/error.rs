//! # Design
//!
//! - Keep the timeout message exactly as the caller wrote it; it is the test's failure text.
//! - Propagated failures keep the operation's own error as the source.

use std::error::Error as StdError;
use std::time::Duration;

use thiserror::Error;

/// Error type accepted from poll operations.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result type for poll execution.
pub type PollResult<T> = Result<T, PollError>;

/// Terminal failures of a poll.
#[derive(Debug, Error)]
pub enum PollError {
    /// The deadline elapsed before a result satisfied the predicate.
    #[error("{message}")]
    Timeout {
        /// Caller-supplied failure message.
        message: String,
        /// Time spent polling.
        elapsed: Duration,
        /// Attempts started before the deadline.
        attempts: u32,
    },
    /// An attempt failed; attempts are never retried after a failure.
    #[error("poll operation failed")]
    Operation {
        /// Error returned by the operation.
        #[source]
        source: BoxError,
    },
    /// The accepted result held no value.
    #[error("poll accepted an absent result")]
    Absent,
}

impl PollError {
    /// Whether the poll ran out of time.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn timeout_renders_caller_message_verbatim() {
        let err = PollError::Timeout {
            message: "service never became ready".to_string(),
            elapsed: Duration::from_secs(3),
            attempts: 4,
        };
        assert_eq!(err.to_string(), "service never became ready");
        assert!(err.is_timeout());
    }

    #[test]
    fn operation_failure_keeps_source() {
        let err = PollError::Operation {
            source: Box::new(io::Error::other("connection reset")),
        };
        assert_eq!(err.to_string(), "poll operation failed");
        assert!(!err.is_timeout());
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("connection reset")
        );
    }
}
