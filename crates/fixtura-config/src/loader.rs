//! Environment parsing for [`FixturaConfig`].
//!
//! # Design
//! - Read every override through a lookup function so tests never touch the process environment.
//! - Blank values count as unset; anything else must parse or the whole load fails.

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::defaults::{
    ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_POLL_DEADLINE_MS, ENV_POLL_INTERVAL_MS, ENV_STAGING_ROOT,
};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{FixturaConfig, LogFormatSetting};

impl FixturaConfig {
    /// Resolve configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when an override cannot be parsed.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration using `lookup` to read each override key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when an override cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(raw) = read(ENV_POLL_INTERVAL_MS) {
            config.poll.interval = parse_millis(ENV_POLL_INTERVAL_MS, &raw)?;
        }
        if let Some(raw) = read(ENV_POLL_DEADLINE_MS) {
            config.poll.deadline = parse_millis(ENV_POLL_DEADLINE_MS, &raw)?;
        }
        if let Some(raw) = read(ENV_STAGING_ROOT) {
            config.staging.root = PathBuf::from(raw.trim());
        }
        if let Some(raw) = read(ENV_LOG_LEVEL) {
            config.logging.level = raw.trim().to_string();
        }
        if let Some(raw) = read(ENV_LOG_FORMAT) {
            config.logging.format = parse_format(&raw)?;
        }

        debug!(
            poll_interval_ms = config.poll.interval.as_millis(),
            poll_deadline_ms = config.poll.deadline.as_millis(),
            staging_root = %config.staging.root.display(),
            log_level = %config.logging.level,
            "resolved fixtura configuration"
        );
        Ok(config)
    }
}

fn parse_millis(field: &'static str, raw: &str) -> ConfigResult<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::invalid(field, raw, "not_a_number"))
}

fn parse_format(raw: &str) -> ConfigResult<LogFormatSetting> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "json" => Ok(LogFormatSetting::Json),
        "pretty" => Ok(LogFormatSetting::Pretty),
        "auto" => Ok(LogFormatSetting::Inferred),
        _ => Err(ConfigError::invalid(ENV_LOG_FORMAT, raw, "unknown_format")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults;
    use anyhow::Result;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_compiled_defaults() -> Result<()> {
        let config = FixturaConfig::from_lookup(|_| None)?;
        assert_eq!(config, FixturaConfig::default());
        assert_eq!(config.poll.interval, defaults::POLL_INTERVAL);
        assert_eq!(config.poll.deadline, defaults::POLL_DEADLINE);
        assert!(config.staging.root.ends_with(defaults::STAGING_DIR_NAME));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormatSetting::Inferred);
        Ok(())
    }

    #[test]
    fn overrides_are_applied() -> Result<()> {
        let config = FixturaConfig::from_lookup(lookup_from(&[
            (ENV_POLL_INTERVAL_MS, "250"),
            (ENV_POLL_DEADLINE_MS, " 2000 "),
            (ENV_STAGING_ROOT, "/var/tmp/staging"),
            (ENV_LOG_LEVEL, "fixtura_poll=debug"),
            (ENV_LOG_FORMAT, "JSON"),
        ]))?;
        assert_eq!(config.poll.interval, Duration::from_millis(250));
        assert_eq!(config.poll.deadline, Duration::from_secs(2));
        assert_eq!(config.staging.root, PathBuf::from("/var/tmp/staging"));
        assert_eq!(config.logging.level, "fixtura_poll=debug");
        assert_eq!(config.logging.format, LogFormatSetting::Json);
        Ok(())
    }

    #[test]
    fn blank_values_are_ignored() -> Result<()> {
        let config = FixturaConfig::from_lookup(lookup_from(&[
            (ENV_POLL_INTERVAL_MS, "   "),
            (ENV_STAGING_ROOT, ""),
        ]))?;
        assert_eq!(config.poll.interval, defaults::POLL_INTERVAL);
        assert_eq!(config.staging, FixturaConfig::default().staging);
        Ok(())
    }

    #[test]
    fn zero_interval_is_accepted() -> Result<()> {
        let config = FixturaConfig::from_lookup(lookup_from(&[(ENV_POLL_INTERVAL_MS, "0")]))?;
        assert_eq!(config.poll.interval, Duration::ZERO);
        Ok(())
    }

    #[test]
    fn non_numeric_duration_is_rejected() {
        let result = FixturaConfig::from_lookup(lookup_from(&[(ENV_POLL_DEADLINE_MS, "30s")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidField {
                field: ENV_POLL_DEADLINE_MS,
                reason: "not_a_number",
                ..
            })
        ));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let result = FixturaConfig::from_lookup(lookup_from(&[(ENV_LOG_FORMAT, "xml")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidField {
                reason: "unknown_format",
                ..
            })
        ));
    }
}
