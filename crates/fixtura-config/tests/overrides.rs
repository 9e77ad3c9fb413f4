//! Environment overrides resolved through a lookup table.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use fixtura_config::defaults::{
    ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_POLL_DEADLINE_MS, ENV_POLL_INTERVAL_MS, ENV_STAGING_ROOT,
};
use fixtura_config::{ConfigError, FixturaConfig, LogFormatSetting};

fn resolve(pairs: &[(&str, &str)]) -> Result<FixturaConfig, ConfigError> {
    let table: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect();
    FixturaConfig::from_lookup(|key| table.get(key).cloned())
}

#[test]
fn every_override_is_applied() -> Result<()> {
    let config = resolve(&[
        (ENV_POLL_INTERVAL_MS, "0"),
        (ENV_POLL_DEADLINE_MS, "1500"),
        (ENV_STAGING_ROOT, "/var/tmp/fixtura"),
        (ENV_LOG_LEVEL, "debug"),
        (ENV_LOG_FORMAT, "JSON"),
    ])?;

    assert_eq!(config.poll.interval, Duration::ZERO);
    assert_eq!(config.poll.deadline, Duration::from_millis(1500));
    assert_eq!(config.staging.root, Path::new("/var/tmp/fixtura"));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormatSetting::Json);
    Ok(())
}

#[test]
fn empty_environment_keeps_defaults() -> Result<()> {
    assert_eq!(resolve(&[])?, FixturaConfig::default());
    assert_eq!(resolve(&[(ENV_LOG_LEVEL, "   ")])?, FixturaConfig::default());
    Ok(())
}

#[test]
fn garbage_is_rejected_with_the_offending_key() {
    let err = resolve(&[(ENV_POLL_DEADLINE_MS, "soon")]).err();
    assert!(matches!(
        err,
        Some(ConfigError::InvalidField {
            field: ENV_POLL_DEADLINE_MS,
            reason: "not_a_number",
            ..
        })
    ));

    let err = resolve(&[(ENV_LOG_FORMAT, "xml")]).err();
    assert!(matches!(
        err,
        Some(ConfigError::InvalidField {
            reason: "unknown_format",
            ..
        })
    ));
}
