//! Typed settings resolved from defaults and environment overrides.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::defaults;

/// Cadence and budget applied to poll specifications that do not set their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollDefaults {
    /// Pause between attempts whose result did not satisfy the predicate.
    pub interval: Duration,
    /// Overall wall-clock budget for one poll.
    pub deadline: Duration,
}

impl Default for PollDefaults {
    fn default() -> Self {
        Self {
            interval: defaults::POLL_INTERVAL,
            deadline: defaults::POLL_DEADLINE,
        }
    }
}

/// Location of the private directory holding staged snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingSettings {
    /// Root directory; each snapshot gets its own subdirectory.
    pub root: PathBuf,
}

impl Default for StagingSettings {
    fn default() -> Self {
        Self {
            root: env::temp_dir().join(defaults::STAGING_DIR_NAME),
        }
    }
}

/// Requested log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormatSetting {
    /// Structured JSON lines.
    Json,
    /// Human-readable output.
    Pretty,
    /// Let the telemetry crate pick based on the build profile.
    #[default]
    Inferred,
}

/// Logging preferences consumed by `fixtura-telemetry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormatSetting,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            format: LogFormatSetting::Inferred,
        }
    }
}

/// Complete configuration for a test process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FixturaConfig {
    /// Poll cadence and budget defaults.
    pub poll: PollDefaults,
    /// Staging store location.
    pub staging: StagingSettings,
    /// Logging preferences.
    pub logging: LoggingSettings,
}
