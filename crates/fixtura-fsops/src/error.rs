//! # Design
//!
//! - Provide structured, constant-message errors for staging and undo operations.
//! - Capture operation context (paths, fields, inputs) to make failures reproducible in tests.
//! - Preserve source errors without interpolating context into error messages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for filesystem operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced by reversible filesystem operations.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// IO failures while interacting with the filesystem.
    #[error("fsops io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Walkdir traversal failures.
    #[error("fsops walkdir failure")]
    Walkdir {
        /// Operation that triggered the walkdir failure.
        operation: &'static str,
        /// Path involved in the walkdir failure.
        path: PathBuf,
        /// Underlying walkdir error.
        source: walkdir::Error,
    },
    /// Snapshot manifest could not be written or parsed.
    #[error("fsops snapshot manifest failure")]
    Manifest {
        /// Operation that triggered the manifest failure.
        operation: &'static str,
        /// Manifest path.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// Input validation failures; raised before anything is touched.
    #[error("fsops invalid input")]
    InvalidInput {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// A path that had to exist did not; raised before anything is touched.
    #[error("fsops path not found")]
    NotFound {
        /// Field naming the missing path.
        field: &'static str,
        /// The missing path.
        path: PathBuf,
    },
    /// One or more members of a composite release failed.
    #[error("fsops release failures")]
    Aggregate {
        /// Every member failure, in release order.
        failures: Vec<FsOpsError>,
    },
}

impl FsOpsError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn walkdir(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: walkdir::Error,
    ) -> Self {
        Self::Walkdir {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn manifest(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: serde_json::Error,
    ) -> Self {
        Self::Manifest {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(
        field: &'static str,
        reason: &'static str,
        value: Option<String>,
    ) -> Self {
        Self::InvalidInput {
            field,
            reason,
            value,
        }
    }

    pub(crate) fn not_found(field: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::NotFound {
            field,
            path: path.into(),
        }
    }

    /// Member failures carried by an aggregate error, or the error itself otherwise.
    #[must_use]
    pub fn failures(&self) -> Vec<&Self> {
        match self {
            Self::Aggregate { failures } => failures.iter().collect(),
            other => vec![other],
        }
    }
}
