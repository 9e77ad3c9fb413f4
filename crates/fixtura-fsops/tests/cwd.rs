//! Working-directory changes share one process-wide slot, so these tests run serially.

use std::env;

use anyhow::Result;
use fixtura_fsops::{FsOps, FsOpsError, cwd};
use fixtura_test_support::fixtures::{init_test_logging, temp_workspace, write_file};
use serial_test::serial;

#[test]
#[serial]
fn set_current_dir_undo_returns_to_previous_directory() -> Result<()> {
    init_test_logging();
    let start = env::current_dir()?;
    let outer = temp_workspace("cwd-outer")?;
    let inner = temp_workspace("cwd-inner")?;
    let fsops = FsOps::default();

    let mut to_outer = fsops.set_current_dir_undoable(outer.path())?;
    let mut to_inner = fsops.set_current_dir_undoable(inner.path())?;
    assert_eq!(env::current_dir()?, inner.path().canonicalize()?);
    assert_eq!(cwd::original_dir().as_deref(), Some(start.as_path()));

    to_inner.release()?;
    assert_eq!(env::current_dir()?, outer.path().canonicalize()?);
    to_outer.release()?;
    assert_eq!(env::current_dir()?, start);

    assert!(cwd::restore_original()?);
    assert!(!cwd::restore_original()?);
    Ok(())
}

#[test]
#[serial]
fn restore_original_recovers_from_leaked_handles() -> Result<()> {
    let start = env::current_dir()?;
    let workspace = temp_workspace("cwd-leak")?;
    let fsops = FsOps::default();

    fsops.set_current_dir(workspace.path())?;
    drop(fsops.set_current_dir_undoable(workspace.path())?);

    assert!(cwd::restore_original()?);
    assert_eq!(env::current_dir()?, start);
    Ok(())
}

#[test]
#[serial]
fn set_current_dir_rejects_files() -> Result<()> {
    let workspace = temp_workspace("cwd-file")?;
    let file = write_file(workspace.path(), "file.txt", b"x")?;
    let fsops = FsOps::default();

    assert!(matches!(
        fsops.set_current_dir_undoable(&file),
        Err(FsOpsError::InvalidInput {
            reason: "not_a_directory",
            ..
        })
    ));
    assert!(cwd::original_dir().is_none());
    Ok(())
}
