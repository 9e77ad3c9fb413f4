//! Compiled defaults and environment keys for configuration overrides.
//!
//! # Design
//! - Keep time-based defaults explicit so suites can reason about worst-case runtimes.
//! - Centralise environment keys so loaders and docs never drift apart.

use std::time::Duration;

/// Pause between poll attempts when nothing else is configured.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Overall poll budget when nothing else is configured.
pub const POLL_DEADLINE: Duration = Duration::from_secs(30);
/// Directory created under the system temp dir to hold staged snapshots.
pub const STAGING_DIR_NAME: &str = "fixtura-staging";
/// Log level used when neither `RUST_LOG` nor an override is present.
pub const LOG_LEVEL: &str = "info";

/// Environment key overriding the poll interval, in milliseconds.
pub const ENV_POLL_INTERVAL_MS: &str = "FIXTURA_POLL_INTERVAL_MS";
/// Environment key overriding the poll deadline, in milliseconds.
pub const ENV_POLL_DEADLINE_MS: &str = "FIXTURA_POLL_DEADLINE_MS";
/// Environment key overriding the staging root directory.
pub const ENV_STAGING_ROOT: &str = "FIXTURA_STAGING_ROOT";
/// Environment key overriding the log level.
pub const ENV_LOG_LEVEL: &str = "FIXTURA_LOG_LEVEL";
/// Environment key overriding the log format (`json`, `pretty`, or `auto`).
pub const ENV_LOG_FORMAT: &str = "FIXTURA_LOG_FORMAT";
