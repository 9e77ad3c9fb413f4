//! Test fixtures and environment helpers.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;

use anyhow::{Context, Result};
use fixtura_telemetry::{LogFormat, LoggingConfig, init_logging};
use tempfile::TempDir;

static LOGGING: Once = Once::new();

/// Install a pretty `warn`-level subscriber once per test binary.
///
/// `RUST_LOG` still overrides the level. A subscriber installed elsewhere is left in place.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let config = LoggingConfig {
            level: "warn",
            format: LogFormat::Pretty,
        };
        let _ = init_logging(&config);
    });
}

/// Create an isolated temporary directory removed when the handle drops.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn temp_workspace(prefix: &str) -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .with_context(|| format!("failed to create temp workspace with prefix {prefix}"))
}

/// Write `contents` to `root/relative`, creating parent directories.
///
/// # Errors
///
/// Returns an error if a parent directory or the file cannot be written.
pub fn write_file(root: &Path, relative: &str, contents: &[u8]) -> Result<PathBuf> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Count the direct children of `dir`, treating a missing directory as empty.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be read.
pub fn count_entries(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    Ok(entries.count())
}
