//! Byte-exact listings of filesystem trees for before/after comparisons.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// One entry in a [`TreeListing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEntry {
    /// A directory; only its presence is recorded.
    Directory,
    /// A file and its full contents.
    File(Vec<u8>),
    /// A symbolic link and the target it points at, unresolved.
    Symlink(PathBuf),
}

/// Relative path → entry map describing a file or directory tree.
///
/// For a directory root the root itself is not listed; for a file root the
/// single entry is keyed by the empty path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TreeListing {
    entries: BTreeMap<PathBuf, TreeEntry>,
}

impl TreeListing {
    /// Start an empty listing, usually to describe an expected tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory entry.
    #[must_use]
    pub fn dir(mut self, relative: &str) -> Self {
        self.entries
            .insert(PathBuf::from(relative), TreeEntry::Directory);
        self
    }

    /// Add a file entry with its contents.
    #[must_use]
    pub fn file(mut self, relative: &str, contents: &[u8]) -> Self {
        self.entries
            .insert(PathBuf::from(relative), TreeEntry::File(contents.to_vec()));
        self
    }

    /// Add a symbolic link entry.
    #[must_use]
    pub fn symlink(mut self, relative: &str, target: &str) -> Self {
        self.entries
            .insert(PathBuf::from(relative), TreeEntry::Symlink(PathBuf::from(target)));
        self
    }

    /// Capture the tree rooted at `root`. Links below the root are recorded, not followed.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be walked or a file cannot be read.
    pub fn capture(root: &Path) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
            let relative = entry
                .path()
                .strip_prefix(root)
                .with_context(|| format!("{} escaped its root", entry.path().display()))?
                .to_path_buf();
            if entry.path_is_symlink() && entry.depth() > 0 {
                let target = fs::read_link(entry.path())
                    .with_context(|| format!("failed to read link {}", entry.path().display()))?;
                entries.insert(relative, TreeEntry::Symlink(target));
            } else if entry.file_type().is_dir() {
                if entry.depth() > 0 {
                    entries.insert(relative, TreeEntry::Directory);
                }
            } else {
                let contents = fs::read(entry.path())
                    .with_context(|| format!("failed to read {}", entry.path().display()))?;
                entries.insert(relative, TreeEntry::File(contents));
            }
        }
        Ok(Self { entries })
    }

    /// Relative paths in sorted order.
    #[must_use]
    pub fn paths(&self) -> Vec<&Path> {
        self.entries.keys().map(PathBuf::as_path).collect()
    }

    /// Look up one entry.
    #[must_use]
    pub fn get(&self, relative: &str) -> Option<&TreeEntry> {
        self.entries.get(Path::new(relative))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the listing has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
