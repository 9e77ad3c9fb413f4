//! Error types for configuration loading.

use thiserror::Error;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An override contained a value that could not be interpreted.
    #[error("invalid configuration field")]
    InvalidField {
        /// Environment key that carried the value.
        field: &'static str,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, value: &str, reason: &'static str) -> Self {
        Self::InvalidField {
            field,
            value: Some(value.to_string()),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_helper_captures_context() {
        let err = ConfigError::invalid("FIXTURA_POLL_INTERVAL_MS", "soon", "not_a_number");
        assert_eq!(err.to_string(), "invalid configuration field");
        assert!(matches!(
            err,
            ConfigError::InvalidField {
                field: "FIXTURA_POLL_INTERVAL_MS",
                reason: "not_a_number",
                value: Some(ref value),
            } if value == "soon"
        ));
    }
}
