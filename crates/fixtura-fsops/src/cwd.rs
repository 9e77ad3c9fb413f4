//! Process-wide working-directory slot.
//!
//! # Design
//! - The working directory is global to the process; every change made through this crate
//!   goes through one mutex so changes never interleave.
//! - The first change records the directory the process started from, so a test harness can
//!   always get back there with [`restore_original`] even if handles leaked.
//! - Each undo restores the directory captured by its own call, not the original.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::error::{FsOpsError, FsOpsResult};

struct CwdSlot {
    original: Option<PathBuf>,
}

static SLOT: Mutex<CwdSlot> = Mutex::new(CwdSlot { original: None });

fn lock() -> MutexGuard<'static, CwdSlot> {
    SLOT.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Directory captured before the first change made through this crate, if any.
#[must_use]
pub fn original_dir() -> Option<PathBuf> {
    lock().original.clone()
}

/// Return to the directory captured before the first change and forget it.
///
/// Returns `false` when nothing was captured.
///
/// # Errors
///
/// Returns an IO error if the original directory can no longer be entered.
pub fn restore_original() -> FsOpsResult<bool> {
    let mut slot = lock();
    let Some(original) = slot.original.clone() else {
        return Ok(false);
    };
    env::set_current_dir(&original)
        .map_err(|source| FsOpsError::io("cwd.restore_original", &original, source))?;
    slot.original = None;
    info!(path = %original.display(), "restored original working directory");
    Ok(true)
}

/// Switch to `path`, returning the directory that was current before.
pub(crate) fn change_to(path: &Path) -> FsOpsResult<PathBuf> {
    let mut slot = lock();
    let previous =
        env::current_dir().map_err(|source| FsOpsError::io("cwd.current_dir", path, source))?;
    env::set_current_dir(path).map_err(|source| FsOpsError::io("cwd.set", path, source))?;
    if slot.original.is_none() {
        slot.original = Some(previous.clone());
    }
    debug!(
        from = %previous.display(),
        to = %path.display(),
        "changed working directory"
    );
    Ok(previous)
}
