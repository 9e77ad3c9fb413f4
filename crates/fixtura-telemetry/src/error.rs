//! Failures raised while wiring fixtura's logging and counters.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::string::FromUtf8Error;

use prometheus::Error as PrometheusError;
use tracing_subscriber::util::TryInitError;

/// Result alias for telemetry setup and rendering.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Stage of counter setup that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricStage {
    /// Constructing the counter from its name and help text.
    Build,
    /// Adding the counter to fixtura's registry.
    Register,
}

impl MetricStage {
    /// Stable label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Register => "register",
        }
    }
}

/// Errors raised by [`crate::init_logging`] and [`crate::Metrics`].
#[derive(Debug)]
pub enum TelemetryError {
    /// Another global subscriber already owns the process's log output.
    LoggingInstall {
        /// Rejection reported by `tracing-subscriber`.
        source: TryInitError,
    },
    /// One of fixtura's poll or undo counters could not be set up.
    Metric {
        /// Name of the counter, e.g. `fixtura_undo_releases_total`.
        metric: &'static str,
        /// Whether construction or registration failed.
        stage: MetricStage,
        /// Rejection reported by the Prometheus client.
        source: PrometheusError,
    },
    /// The counters could not be written in the text exposition format.
    Exposition {
        /// Rejection reported by the Prometheus text encoder.
        source: PrometheusError,
    },
    /// The written exposition was not UTF-8.
    ExpositionText {
        /// Conversion failure for the encoded buffer.
        source: FromUtf8Error,
    },
}

impl TelemetryError {
    /// Counter the error concerns, when it concerns one.
    #[must_use]
    pub const fn metric(&self) -> Option<&'static str> {
        match self {
            Self::Metric { metric, .. } => Some(*metric),
            _ => None,
        }
    }
}

impl Display for TelemetryError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoggingInstall { .. } => {
                formatter.write_str("fixtura logging could not be installed")
            }
            Self::Metric { .. } => formatter.write_str("fixtura counter setup failed"),
            Self::Exposition { .. } => formatter.write_str("fixtura counters could not be rendered"),
            Self::ExpositionText { .. } => {
                formatter.write_str("rendered fixtura counters were not utf-8")
            }
        }
    }
}

impl Error for TelemetryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::LoggingInstall { source } => Some(source),
            Self::Metric { source, .. } | Self::Exposition { source } => Some(source),
            Self::ExpositionText { source } => Some(source),
        }
    }
}
