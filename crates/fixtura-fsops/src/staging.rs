//! Private on-disk snapshots of files and directory trees.
//!
//! # Design
//! - Each snapshot lives in its own `<root>/<uuid>/` slot holding `payload` and a JSON manifest.
//! - Snapshots are never collected implicitly: whoever stages must `discard` (or leak the slot).
//! - Leaked slots stay discoverable through their manifests via [`StagingStore::abandoned`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fixtura_config::StagingSettings;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{FsOpsError, FsOpsResult};
use crate::tree::{clear_dir, copy_tree, remove_tree};

const PAYLOAD_NAME: &str = "payload";
const MANIFEST_NAME: &str = "snapshot.json";

/// Kind of filesystem entity captured by a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// A single file or symbolic link.
    File,
    /// A directory tree, including empty subdirectories.
    Directory,
}

impl EntryKind {
    /// Stable label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
        }
    }
}

/// Immutable record of one staged copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedSnapshot {
    id: Uuid,
    source_path: PathBuf,
    staging_path: PathBuf,
    kind: EntryKind,
    staged_at: DateTime<Utc>,
}

impl StagedSnapshot {
    /// Unique identifier, also the name of the snapshot's slot directory.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Path the snapshot was taken from.
    #[must_use]
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Location of the private copy.
    #[must_use]
    pub fn staging_path(&self) -> &Path {
        &self.staging_path
    }

    /// Whether a file or a directory tree was captured.
    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        self.kind
    }

    /// When the copy was taken.
    #[must_use]
    pub const fn staged_at(&self) -> DateTime<Utc> {
        self.staged_at
    }

    fn slot(&self) -> Option<&Path> {
        self.staging_path.parent()
    }
}

/// Store that captures, restores, and discards snapshots under one root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingStore {
    root: PathBuf,
}

impl Default for StagingStore {
    fn default() -> Self {
        Self::from_settings(&StagingSettings::default())
    }
}

impl StagingStore {
    /// Store rooted at `root`; the directory is created on first use.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted where configuration says.
    #[must_use]
    pub fn from_settings(settings: &StagingSettings) -> Self {
        Self::new(settings.root.clone())
    }

    /// Root directory holding snapshot slots.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy the entity at `path` into a fresh slot.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::NotFound`] if `path` does not exist, or an IO/manifest
    /// error if the copy cannot be written. A partially written slot is removed.
    pub fn stage(&self, path: &Path) -> FsOpsResult<StagedSnapshot> {
        let metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(FsOpsError::not_found("path", path));
            }
            Err(err) => return Err(FsOpsError::io("stage.metadata", path, err)),
        };
        let kind = if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        let id = Uuid::new_v4();
        let slot = self.root.join(id.to_string());
        fs::create_dir_all(&slot).map_err(|source| FsOpsError::io("stage.create_slot", &slot, source))?;

        let snapshot = StagedSnapshot {
            id,
            source_path: path.to_path_buf(),
            staging_path: slot.join(PAYLOAD_NAME),
            kind,
            staged_at: Utc::now(),
        };

        let written = copy_tree(path, &snapshot.staging_path)
            .and_then(|()| write_manifest(&slot, &snapshot));
        if let Err(error) = written {
            if let Err(cleanup) = remove_tree(&slot) {
                warn!(
                    error = ?cleanup,
                    slot = %slot.display(),
                    "failed to remove partially staged snapshot"
                );
            }
            return Err(error);
        }

        debug!(
            snapshot_id = %id,
            source = %path.display(),
            kind = kind.as_str(),
            "staged snapshot"
        );
        Ok(snapshot)
    }

    /// Copy the staged contents back to `destination`, overwriting what is there.
    ///
    /// For directories the destination root is kept but its entries are replaced
    /// so the restored tree matches the snapshot exactly.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::NotFound`] if the staged copy has gone missing, or an IO
    /// error if the destination cannot be rewritten.
    pub fn restore(&self, snapshot: &StagedSnapshot, destination: &Path) -> FsOpsResult<()> {
        if fs::symlink_metadata(&snapshot.staging_path).is_err() {
            return Err(FsOpsError::not_found("staging_path", &snapshot.staging_path));
        }

        let existing = fs::symlink_metadata(destination).ok();
        match (snapshot.kind, existing) {
            (EntryKind::Directory, Some(metadata)) if metadata.is_dir() => {
                clear_dir(destination)?;
            }
            (_, Some(_)) => remove_tree(destination)?,
            (_, None) => {}
        }
        copy_tree(&snapshot.staging_path, destination)?;

        debug!(
            snapshot_id = %snapshot.id,
            destination = %destination.display(),
            kind = snapshot.kind.as_str(),
            "restored snapshot"
        );
        Ok(())
    }

    /// Delete the staged copy and its manifest. Discarding an already removed slot succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::InvalidInput`] if the snapshot does not belong to this store,
    /// or an IO error if the slot cannot be removed.
    pub fn discard(&self, snapshot: StagedSnapshot) -> FsOpsResult<()> {
        let slot = self.owned_slot(&snapshot)?;
        remove_tree(slot)?;
        debug!(snapshot_id = %snapshot.id, "discarded snapshot");
        Ok(())
    }

    /// Manifests of every snapshot still on disk, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an IO or manifest error if the root or a manifest cannot be read.
    pub fn abandoned(&self) -> FsOpsResult<Vec<StagedSnapshot>> {
        let mut snapshots = Vec::new();
        for slot in self.slots()? {
            let manifest = slot.join(MANIFEST_NAME);
            if !manifest.is_file() {
                continue;
            }
            snapshots.push(read_manifest(&manifest)?);
        }
        snapshots.sort_by_key(|snapshot| snapshot.staged_at);
        Ok(snapshots)
    }

    /// Delete every snapshot slot under the root. Returns the number of slots removed.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the root cannot be read or a slot cannot be removed.
    pub fn purge(&self) -> FsOpsResult<usize> {
        let slots = self.slots()?;
        for slot in &slots {
            remove_tree(slot)?;
        }
        if !slots.is_empty() {
            warn!(
                root = %self.root.display(),
                purged = slots.len(),
                "purged staged snapshots"
            );
        }
        Ok(slots.len())
    }

    fn slots(&self) -> FsOpsResult<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(FsOpsError::io("staging.read_root", &self.root, err)),
        };
        let mut slots = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|source| FsOpsError::io("staging.read_entry", &self.root, source))?;
            let path = entry.path();
            let is_slot = path.is_dir()
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| Uuid::parse_str(name).is_ok());
            if is_slot {
                slots.push(path);
            }
        }
        Ok(slots)
    }

    fn owned_slot<'a>(&self, snapshot: &'a StagedSnapshot) -> FsOpsResult<&'a Path> {
        match snapshot.slot() {
            Some(slot) if slot.parent() == Some(self.root.as_path()) => Ok(slot),
            _ => Err(FsOpsError::invalid(
                "snapshot",
                "foreign_store",
                Some(snapshot.staging_path.display().to_string()),
            )),
        }
    }
}

fn write_manifest(slot: &Path, snapshot: &StagedSnapshot) -> FsOpsResult<()> {
    let path = slot.join(MANIFEST_NAME);
    let payload = serde_json::to_vec_pretty(snapshot)
        .map_err(|source| FsOpsError::manifest("manifest.serialize", &path, source))?;
    fs::write(&path, payload).map_err(|source| FsOpsError::io("manifest.write", &path, source))
}

fn read_manifest(path: &Path) -> FsOpsResult<StagedSnapshot> {
    let raw = fs::read(path).map_err(|source| FsOpsError::io("manifest.read", path, source))?;
    serde_json::from_slice(&raw).map_err(|source| FsOpsError::manifest("manifest.parse", path, source))
}
