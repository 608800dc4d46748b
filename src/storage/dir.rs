//! Data directory lifecycle
//!
//! The data directory is created on first table creation and removed,
//! together with any ancestors left empty, when its last table goes away.

use std::env;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Whether `path` is an existing directory with no entries
pub fn is_dir_empty(path: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Remove an empty directory, then walk upward removing each now-empty
/// ancestor
///
/// Stops at the first ancestor that cannot be removed (non-empty, busy, no
/// permission) or at the filesystem root. A `path` that is a symlink is left
/// in place. Only a failure to remove `path` itself is returned.
pub fn remove_dir_cascade(path: &Path) -> io::Result<()> {
    // Absolute so relative paths still have ancestors to walk
    let absolute = absolute_path(path)?;

    // A symlinked directory stays, along with its target
    if fs::symlink_metadata(&absolute)?.file_type().is_symlink() {
        tracing::debug!("Keeping symlinked directory {}", absolute.display());
        return Ok(());
    }

    fs::remove_dir(&absolute)?;

    let mut current = absolute.parent();
    while let Some(dir) = current {
        // Never touch the root
        if dir.parent().is_none() {
            break;
        }
        if fs::remove_dir(dir).is_err() {
            break;
        }
        tracing::debug!("Removed empty ancestor directory {}", dir.display());
        current = dir.parent();
    }

    Ok(())
}

/// Join `path` onto the working directory and drop `.`/`..` lexically
///
/// Symlinks are left unresolved: a symlinked data directory is treated as
/// the link, never as its target.
fn absolute_path(path: &Path) -> io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}
