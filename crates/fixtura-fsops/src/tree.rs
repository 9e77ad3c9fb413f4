//! Recursive copy, move, and removal helpers shared by staging and the undo engine.

use std::fs;
use std::io;
use std::path::{self, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{FsOpsError, FsOpsResult};

/// Whether anything (file, directory, or dangling link) exists at `path`.
pub(crate) fn entry_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Lexically absolute form of `path`, resolved against the current directory.
pub(crate) fn absolute(field: &'static str, path: &Path) -> FsOpsResult<PathBuf> {
    path::absolute(path).map_err(|source| match source.kind() {
        io::ErrorKind::InvalidInput => {
            FsOpsError::invalid(field, "not_absolutizable", Some(path.display().to_string()))
        }
        _ => FsOpsError::io("absolute", path, source),
    })
}

/// Copy a file, link, or directory tree. Symbolic links are recreated as links, never followed.
pub(crate) fn copy_tree(source: &Path, destination: &Path) -> FsOpsResult<()> {
    let metadata = fs::symlink_metadata(source)
        .map_err(|source_err| FsOpsError::io("copy_tree.metadata", source, source_err))?;
    if !metadata.is_dir() {
        if let Some(parent) = destination.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source_err| {
                FsOpsError::io("copy_tree.create_parent", parent, source_err)
            })?;
        }
        if metadata.file_type().is_symlink() {
            return copy_link(source, destination);
        }
        fs::copy(source, destination).map_err(|source_err| {
            FsOpsError::io("copy_tree.copy_file", destination, source_err)
        })?;
        return Ok(());
    }

    fs::create_dir_all(destination).map_err(|source_err| {
        FsOpsError::io("copy_tree.create_dir", destination, source_err)
    })?;

    for entry in WalkDir::new(source).min_depth(1) {
        let entry =
            entry.map_err(|source_err| FsOpsError::walkdir("copy_tree.walk", source, source_err))?;
        let relative = entry.path().strip_prefix(source).map_err(|_| {
            FsOpsError::invalid(
                "source_path",
                "strip_prefix",
                Some(entry.path().to_string_lossy().into_owned()),
            )
        })?;
        let target_path = destination.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target_path).map_err(|source_err| {
                FsOpsError::io("copy_tree.create_dir", &target_path, source_err)
            })?;
        } else {
            if let Some(parent) = target_path.parent() {
                fs::create_dir_all(parent).map_err(|source_err| {
                    FsOpsError::io("copy_tree.create_parent", parent, source_err)
                })?;
            }
            if entry.path_is_symlink() {
                copy_link(entry.path(), &target_path)?;
            } else {
                fs::copy(entry.path(), &target_path).map_err(|source_err| {
                    FsOpsError::io("copy_tree.copy_entry", &target_path, source_err)
                })?;
            }
        }
    }

    Ok(())
}

/// Recreate the link at `link` as `destination`, pointing at the same target.
fn copy_link(link: &Path, destination: &Path) -> FsOpsResult<()> {
    let target =
        fs::read_link(link).map_err(|source| FsOpsError::io("copy_tree.read_link", link, source))?;
    symlink(&target, link, destination)
        .map_err(|source| FsOpsError::io("copy_tree.symlink", destination, source))
}

#[cfg(unix)]
fn symlink(target: &Path, _link: &Path, destination: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, destination)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path, destination: &Path) -> io::Result<()> {
    use std::os::windows::fs::FileTypeExt;

    let is_dir_link = fs::symlink_metadata(link)?.file_type().is_symlink_dir();
    if is_dir_link {
        std::os::windows::fs::symlink_dir(target, destination)
    } else {
        std::os::windows::fs::symlink_file(target, destination)
    }
}

#[cfg(not(any(unix, windows)))]
fn symlink(_target: &Path, _link: &Path, _destination: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}

pub(crate) fn move_tree(source: &Path, destination: &Path) -> FsOpsResult<()> {
    if let Some(parent) = destination.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|source_err| FsOpsError::io("move_tree.create_parent", parent, source_err))?;
    }
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        // Cross-device renames fail; fall back to copy + remove.
        Err(_rename_err) => {
            copy_tree(source, destination)?;
            remove_tree(source)
        }
    }
}

/// Remove a file or directory tree. A path that is already gone is not an error.
pub(crate) fn remove_tree(path: &Path) -> FsOpsResult<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(FsOpsError::io("remove_tree.metadata", path, err)),
    };
    let removed = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match removed {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(FsOpsError::io("remove_tree.remove", path, err)),
    }
}

/// Remove every child of `dir`, keeping `dir` itself. Returns the number of children removed.
pub(crate) fn clear_dir(dir: &Path) -> FsOpsResult<usize> {
    let entries =
        fs::read_dir(dir).map_err(|source| FsOpsError::io("clear_dir.read_dir", dir, source))?;
    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(|source| FsOpsError::io("clear_dir.entry", dir, source))?;
        remove_tree(&entry.path())?;
        removed += 1;
    }
    Ok(removed)
}
