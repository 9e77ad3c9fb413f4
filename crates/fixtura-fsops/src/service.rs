//! Compensating-action engine: filesystem mutations paired with staged snapshots.
//!
//! # Design
//! - Every mutation comes in a plain form and an `_undoable` form returning an [`UndoHandle`].
//! - Preconditions are checked before anything is staged or touched; undo never re-validates.
//! - Paths are made absolute up front so undo closures survive working-directory changes.
//! - A snapshot taken for a mutation that then fails is discarded before the error returns.

use std::fs;
use std::path::{Path, PathBuf};

use fixtura_config::FixturaConfig;
use fixtura_telemetry::Metrics;
use tracing::{debug, warn};

use crate::cwd;
use crate::error::{FsOpsError, FsOpsResult};
use crate::handle::UndoHandle;
use crate::staging::{StagedSnapshot, StagingStore};
use crate::tree::{absolute, clear_dir, copy_tree, entry_exists, move_tree, remove_tree};

/// Reversible filesystem operations backed by a [`StagingStore`].
#[derive(Debug, Clone, Default)]
pub struct FsOps {
    staging: StagingStore,
    metrics: Option<Metrics>,
}

impl FsOps {
    /// Engine staging snapshots in `staging`.
    #[must_use]
    pub const fn new(staging: StagingStore) -> Self {
        Self {
            staging,
            metrics: None,
        }
    }

    /// Engine staging snapshots where configuration says.
    #[must_use]
    pub fn from_config(config: &FixturaConfig) -> Self {
        Self::new(StagingStore::from_settings(&config.staging))
    }

    /// Count releases of every handle this engine hands out.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Store holding this engine's snapshots.
    #[must_use]
    pub const fn staging(&self) -> &StagingStore {
        &self.staging
    }

    /// Copy `src` to `dst`, replacing whatever `dst` held.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::NotFound`] if `src` is missing, [`FsOpsError::InvalidInput`]
    /// if either path is empty or the two overlap, or an IO error from the copy.
    pub fn copy(&self, src: &Path, dst: &Path) -> FsOpsResult<()> {
        let (src, dst) = transfer_paths(src, dst)?;
        overwrite_with_copy(&src, &dst)
    }

    /// [`Self::copy`], returning a handle that puts `dst` back the way it was.
    ///
    /// When `dst` did not exist, the undo also removes the parent directories the copy created.
    ///
    /// # Errors
    ///
    /// As [`Self::copy`], plus staging failures for an existing `dst`.
    pub fn copy_undoable(&self, src: &Path, dst: &Path) -> FsOpsResult<UndoHandle> {
        let (src, dst) = transfer_paths(src, dst)?;
        let created_root = topmost_missing(&dst);
        let snapshot = if entry_exists(&dst) {
            Some(self.staging.stage(&dst)?)
        } else {
            None
        };
        let performed = overwrite_with_copy(&src, &dst);
        let snapshot = self.settle(performed, snapshot)?;

        let label = format!("copy {} -> {}", src.display(), dst.display());
        let staging = self.staging.clone();
        Ok(self.handle(label, move || match snapshot {
            Some(snapshot) => restore_and_discard(&staging, snapshot, &dst),
            None => remove_tree(&created_root),
        }))
    }

    /// Move `src` to `dst`. `dst` must not exist.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::NotFound`] if `src` is missing, [`FsOpsError::InvalidInput`]
    /// if `dst` exists or the paths overlap, or an IO error from the move.
    pub fn move_entry(&self, src: &Path, dst: &Path) -> FsOpsResult<()> {
        let (src, dst) = move_paths(src, dst)?;
        move_tree(&src, &dst)
    }

    /// [`Self::move_entry`], returning a handle that removes `dst`, along with any parent
    /// directories the move created, and restores `src`.
    ///
    /// # Errors
    ///
    /// As [`Self::move_entry`], plus staging failures for `src`.
    pub fn move_undoable(&self, src: &Path, dst: &Path) -> FsOpsResult<UndoHandle> {
        let (src, dst) = move_paths(src, dst)?;
        let created_root = topmost_missing(&dst);
        let snapshot = self.staging.stage(&src)?;
        let performed = move_tree(&src, &dst);
        let snapshot = self.settle(performed, Some(snapshot))?;

        let label = format!("move {} -> {}", src.display(), dst.display());
        let staging = self.staging.clone();
        Ok(self.handle(label, move || {
            remove_tree(&created_root)?;
            match snapshot {
                Some(snapshot) => restore_and_discard(&staging, snapshot, &src),
                None => Ok(()),
            }
        }))
    }

    /// Remove the file or directory tree at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::NotFound`] if `path` is missing, or an IO error from the removal.
    pub fn delete(&self, path: &Path) -> FsOpsResult<()> {
        let path = existing_path("path", path)?;
        remove_tree(&path)
    }

    /// [`Self::delete`], returning a handle that restores the removed entry.
    ///
    /// # Errors
    ///
    /// As [`Self::delete`], plus staging failures.
    pub fn delete_undoable(&self, path: &Path) -> FsOpsResult<UndoHandle> {
        let path = existing_path("path", path)?;
        let snapshot = self.staging.stage(&path)?;
        let performed = remove_tree(&path);
        let snapshot = self.settle(performed, Some(snapshot))?;

        let label = format!("delete {}", path.display());
        Ok(self.restoring_handle(label, snapshot, path))
    }

    /// Overwrite the existing `dst` with a copy of `src`; `src` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::NotFound`] naming whichever of `source` or `destination` is
    /// missing, [`FsOpsError::InvalidInput`] if the paths overlap, or an IO error.
    pub fn replace(&self, src: &Path, dst: &Path) -> FsOpsResult<()> {
        let (src, dst) = replace_paths(src, dst)?;
        overwrite_with_copy(&src, &dst)
    }

    /// [`Self::replace`], returning a handle that restores the original `dst`.
    ///
    /// # Errors
    ///
    /// As [`Self::replace`], plus staging failures for `dst`.
    pub fn replace_undoable(&self, src: &Path, dst: &Path) -> FsOpsResult<UndoHandle> {
        let (src, dst) = replace_paths(src, dst)?;
        let snapshot = self.staging.stage(&dst)?;
        let performed = overwrite_with_copy(&src, &dst);
        let snapshot = self.settle(performed, Some(snapshot))?;

        let label = format!("replace {} with {}", dst.display(), src.display());
        Ok(self.restoring_handle(label, snapshot, dst))
    }

    /// Make sure a directory exists at `path`, creating missing parents.
    ///
    /// Returns `true` when the directory had to be created.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::InvalidInput`] if `path` is empty or names an existing
    /// non-directory, or an IO error from creation.
    pub fn ensure_dir(&self, path: &Path) -> FsOpsResult<bool> {
        let path = ensure_path(path)?;
        if path.is_dir() {
            return Ok(false);
        }
        create_dirs(&path)?;
        Ok(true)
    }

    /// [`Self::ensure_dir`], returning a handle that undoes exactly what the call changed.
    ///
    /// A directory that already existed is snapshotted and restored to its contents at call
    /// time. Otherwise the top-most directory the call created is removed.
    ///
    /// # Errors
    ///
    /// As [`Self::ensure_dir`], plus staging failures for an existing directory.
    pub fn ensure_dir_undoable(&self, path: &Path) -> FsOpsResult<UndoHandle> {
        let path = ensure_path(path)?;
        let label = format!("ensure_dir {}", path.display());

        if path.is_dir() {
            let snapshot = self.staging.stage(&path)?;
            return Ok(self.restoring_handle(label, Some(snapshot), path));
        }

        let created_root = topmost_missing(&path);
        create_dirs(&path)?;
        Ok(self.handle(label, move || remove_tree(&created_root)))
    }

    /// Remove every entry inside the directory at `path`, keeping the directory.
    ///
    /// Returns the number of top-level entries removed.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::NotFound`] if `path` is missing, [`FsOpsError::InvalidInput`]
    /// if it is not a directory, or an IO error from the removal.
    pub fn clean(&self, path: &Path) -> FsOpsResult<usize> {
        let path = existing_dir(path)?;
        clear_dir(&path)
    }

    /// [`Self::clean`], returning a handle that restores the exact pre-clean tree.
    ///
    /// # Errors
    ///
    /// As [`Self::clean`], plus staging failures.
    pub fn clean_undoable(&self, path: &Path) -> FsOpsResult<UndoHandle> {
        let path = existing_dir(path)?;
        let snapshot = self.staging.stage(&path)?;
        let performed = clear_dir(&path).map(|removed| {
            debug!(path = %path.display(), removed, "cleaned directory");
        });
        let snapshot = self.settle(performed, Some(snapshot))?;

        let label = format!("clean {}", path.display());
        Ok(self.restoring_handle(label, snapshot, path))
    }

    /// Change the process working directory to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::NotFound`] if `path` is missing, [`FsOpsError::InvalidInput`]
    /// if it is not a directory, or an IO error from the change.
    pub fn set_current_dir(&self, path: &Path) -> FsOpsResult<()> {
        let path = existing_dir(path)?;
        cwd::change_to(&path).map(drop)
    }

    /// [`Self::set_current_dir`], returning a handle that switches back to the directory
    /// that was current before this call.
    ///
    /// # Errors
    ///
    /// As [`Self::set_current_dir`].
    pub fn set_current_dir_undoable(&self, path: &Path) -> FsOpsResult<UndoHandle> {
        let path = existing_dir(path)?;
        let previous = cwd::change_to(&path)?;
        let label = format!("set_current_dir {}", path.display());
        Ok(self.handle(label, move || cwd::change_to(&previous).map(drop)))
    }

    fn handle<F>(&self, label: String, undo: F) -> UndoHandle
    where
        F: FnOnce() -> FsOpsResult<()> + Send + 'static,
    {
        let handle = UndoHandle::new(label, undo);
        match &self.metrics {
            Some(metrics) => handle.with_metrics(metrics.clone()),
            None => handle,
        }
    }

    fn restoring_handle(
        &self,
        label: String,
        snapshot: Option<StagedSnapshot>,
        destination: PathBuf,
    ) -> UndoHandle {
        let staging = self.staging.clone();
        self.handle(label, move || match snapshot {
            Some(snapshot) => restore_and_discard(&staging, snapshot, &destination),
            None => Ok(()),
        })
    }

    /// Pass the snapshot through on success; discard it and return the mutation error otherwise.
    fn settle(
        &self,
        performed: FsOpsResult<()>,
        snapshot: Option<StagedSnapshot>,
    ) -> FsOpsResult<Option<StagedSnapshot>> {
        let Err(error) = performed else {
            return Ok(snapshot);
        };
        if let Some(snapshot) = snapshot {
            let id = snapshot.id();
            if let Err(discard_error) = self.staging.discard(snapshot) {
                warn!(
                    snapshot_id = %id,
                    error = ?discard_error,
                    "failed to discard snapshot after mutation failure"
                );
            }
        }
        Err(error)
    }
}

fn restore_and_discard(
    staging: &StagingStore,
    snapshot: StagedSnapshot,
    destination: &Path,
) -> FsOpsResult<()> {
    staging.restore(&snapshot, destination)?;
    staging.discard(snapshot)
}

fn overwrite_with_copy(src: &Path, dst: &Path) -> FsOpsResult<()> {
    remove_tree(dst)?;
    copy_tree(src, dst)?;
    debug!(source = %src.display(), destination = %dst.display(), "copied entry");
    Ok(())
}

fn create_dirs(path: &Path) -> FsOpsResult<()> {
    fs::create_dir_all(path).map_err(|source| FsOpsError::io("ensure_dir.create", path, source))?;
    debug!(path = %path.display(), "created directory");
    Ok(())
}

/// Highest ancestor of `path` (or `path` itself) that does not exist yet.
fn topmost_missing(path: &Path) -> PathBuf {
    path.ancestors()
        .take_while(|ancestor| !ancestor.as_os_str().is_empty() && !entry_exists(ancestor))
        .last()
        .unwrap_or(path)
        .to_path_buf()
}

fn non_empty(field: &'static str, path: &Path) -> FsOpsResult<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(FsOpsError::invalid(field, "empty", None));
    }
    absolute(field, path)
}

fn existing_path(field: &'static str, path: &Path) -> FsOpsResult<PathBuf> {
    let path = non_empty(field, path)?;
    if !entry_exists(&path) {
        return Err(FsOpsError::not_found(field, path));
    }
    Ok(path)
}

fn existing_dir(path: &Path) -> FsOpsResult<PathBuf> {
    let path = existing_path("path", path)?;
    if !path.is_dir() {
        return Err(FsOpsError::invalid(
            "path",
            "not_a_directory",
            Some(path.display().to_string()),
        ));
    }
    Ok(path)
}

fn ensure_path(path: &Path) -> FsOpsResult<PathBuf> {
    let path = non_empty("path", path)?;
    if entry_exists(&path) && !path.is_dir() {
        return Err(FsOpsError::invalid(
            "path",
            "not_a_directory",
            Some(path.display().to_string()),
        ));
    }
    Ok(path)
}

/// Reject transfers where one path contains the other.
fn disjoint(src: &Path, dst: &Path) -> FsOpsResult<()> {
    if src == dst {
        return Err(FsOpsError::invalid(
            "destination",
            "same_path",
            Some(dst.display().to_string()),
        ));
    }
    if dst.starts_with(src) {
        return Err(FsOpsError::invalid(
            "destination",
            "nested_in_source",
            Some(dst.display().to_string()),
        ));
    }
    if src.starts_with(dst) {
        return Err(FsOpsError::invalid(
            "source",
            "nested_in_destination",
            Some(src.display().to_string()),
        ));
    }
    Ok(())
}

fn transfer_paths(src: &Path, dst: &Path) -> FsOpsResult<(PathBuf, PathBuf)> {
    let src = existing_path("source", src)?;
    let dst = non_empty("destination", dst)?;
    disjoint(&src, &dst)?;
    Ok((src, dst))
}

fn move_paths(src: &Path, dst: &Path) -> FsOpsResult<(PathBuf, PathBuf)> {
    let (src, dst) = transfer_paths(src, dst)?;
    if entry_exists(&dst) {
        return Err(FsOpsError::invalid(
            "destination",
            "already_exists",
            Some(dst.display().to_string()),
        ));
    }
    Ok((src, dst))
}

fn replace_paths(src: &Path, dst: &Path) -> FsOpsResult<(PathBuf, PathBuf)> {
    let src = existing_path("source", src)?;
    let dst = existing_path("destination", dst)?;
    disjoint(&src, &dst)?;
    Ok((src, dst))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};
    use fixtura_test_support::fixtures::{count_entries, temp_workspace, write_file};
    use fixtura_test_support::tree::TreeListing;
    use tempfile::TempDir;

    fn engine() -> Result<(TempDir, FsOps)> {
        let staging = temp_workspace("fixtura-staging")?;
        let fsops = FsOps::new(StagingStore::new(staging.path()));
        Ok((staging, fsops))
    }

    #[test]
    fn empty_paths_are_rejected_before_anything_runs() -> Result<()> {
        let (_staging, fsops) = engine()?;
        let err = fsops.delete_undoable(Path::new("")).err();
        assert!(matches!(
            err,
            Some(FsOpsError::InvalidInput {
                field: "path",
                reason: "empty",
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn replace_reports_each_missing_side() -> Result<()> {
        let (staging, fsops) = engine()?;
        let workspace = temp_workspace("replace")?;
        let present = write_file(workspace.path(), "present.txt", b"x")?;
        let missing = workspace.path().join("missing.txt");

        let err = fsops.replace_undoable(&missing, &present).err();
        assert!(matches!(err, Some(FsOpsError::NotFound { field: "source", .. })));
        let err = fsops.replace_undoable(&present, &missing).err();
        assert!(matches!(
            err,
            Some(FsOpsError::NotFound {
                field: "destination",
                ..
            })
        ));
        assert_eq!(count_entries(staging.path())?, 0);
        Ok(())
    }

    #[test]
    fn move_refuses_existing_destination() -> Result<()> {
        let (_staging, fsops) = engine()?;
        let workspace = temp_workspace("move")?;
        let src = write_file(workspace.path(), "a.txt", b"a")?;
        let dst = write_file(workspace.path(), "b.txt", b"b")?;

        let err = fsops.move_undoable(&src, &dst).err();
        assert!(matches!(
            err,
            Some(FsOpsError::InvalidInput {
                reason: "already_exists",
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn overlapping_paths_are_rejected() -> Result<()> {
        let (_staging, fsops) = engine()?;
        let workspace = temp_workspace("overlap")?;
        write_file(workspace.path(), "tree/a.txt", b"a")?;
        let tree = workspace.path().join("tree");

        let err = fsops.copy(&tree, &tree.join("inner")).err();
        assert!(matches!(
            err,
            Some(FsOpsError::InvalidInput {
                reason: "nested_in_source",
                ..
            })
        ));
        let err = fsops.copy(&tree, &tree).err();
        assert!(matches!(
            err,
            Some(FsOpsError::InvalidInput {
                reason: "same_path",
                ..
            })
        ));
        let err = fsops.replace(&tree.join("a.txt"), &tree).err();
        assert!(matches!(
            err,
            Some(FsOpsError::InvalidInput {
                reason: "nested_in_destination",
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn ensure_dir_rejects_files_and_reports_creation() -> Result<()> {
        let (_staging, fsops) = engine()?;
        let workspace = temp_workspace("ensure")?;
        let file = write_file(workspace.path(), "file.txt", b"x")?;

        assert!(matches!(
            fsops.ensure_dir(&file),
            Err(FsOpsError::InvalidInput {
                reason: "not_a_directory",
                ..
            })
        ));
        let dir = workspace.path().join("fresh");
        assert!(fsops.ensure_dir(&dir)?);
        assert!(!fsops.ensure_dir(&dir)?);
        Ok(())
    }

    #[test]
    fn ensure_dir_undo_removes_created_parents() -> Result<()> {
        let (staging, fsops) = engine()?;
        let workspace = temp_workspace("ensure-nested")?;
        let nested = workspace.path().join("a/b/c");

        let mut handle = fsops.ensure_dir_undoable(&nested)?;
        assert!(nested.is_dir());
        handle.release()?;

        assert!(!workspace.path().join("a").exists());
        assert_eq!(count_entries(workspace.path())?, 0);
        assert_eq!(count_entries(staging.path())?, 0);
        Ok(())
    }

    #[test]
    fn clean_requires_a_directory() -> Result<()> {
        let (_staging, fsops) = engine()?;
        let workspace = temp_workspace("clean")?;
        let file = write_file(workspace.path(), "file.txt", b"x")?;
        let missing = workspace.path().join("missing");

        assert!(matches!(
            fsops.clean_undoable(&file),
            Err(FsOpsError::InvalidInput {
                reason: "not_a_directory",
                ..
            })
        ));
        assert!(matches!(
            fsops.clean(&missing),
            Err(FsOpsError::NotFound { .. })
        ));
        Ok(())
    }

    #[test]
    fn plain_copy_overwrites_directory_exactly() -> Result<()> {
        let (_staging, fsops) = engine()?;
        let workspace = temp_workspace("copy-plain")?;
        write_file(workspace.path(), "src/keep.txt", b"new")?;
        write_file(workspace.path(), "dst/stale.txt", b"old")?;
        let src = workspace.path().join("src");
        let dst = workspace.path().join("dst");

        fsops.copy(&src, &dst)?;

        assert_eq!(TreeListing::capture(&dst)?, TreeListing::capture(&src)?);
        Ok(())
    }

    #[test]
    fn failed_undo_surfaces_and_keeps_nothing_hidden() -> Result<()> {
        let (staging, fsops) = engine()?;
        let workspace = temp_workspace("lost-snapshot")?;
        let file = write_file(workspace.path(), "gone.txt", b"data")?;

        let mut handle = fsops.delete_undoable(&file)?;
        let leaked = fsops.staging().abandoned()?;
        let Some(snapshot) = leaked.first() else {
            bail!("expected a staged snapshot");
        };
        fs::remove_file(snapshot.staging_path())?;

        let result = handle.release();
        assert!(matches!(
            result,
            Err(FsOpsError::NotFound {
                field: "staging_path",
                ..
            })
        ));
        assert!(!file.exists());
        assert_eq!(count_entries(staging.path())?, 1);
        Ok(())
    }

    #[test]
    fn topmost_missing_stops_at_existing_ancestor() -> Result<()> {
        let workspace = temp_workspace("ancestors")?;
        let nested = workspace.path().join("x/y/z");
        assert_eq!(topmost_missing(&nested), workspace.path().join("x"));
        assert_eq!(topmost_missing(workspace.path()), workspace.path());
        Ok(())
    }
}
