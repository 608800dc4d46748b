//! Path Resolver
//!
//! Maps table names to backing file paths inside the data directory.

use std::path::{Path, PathBuf};

use crate::error::{DhubError, Result};

/// Extension of every table file
pub const TABLE_FILE_EXTENSION: &str = "ndjson";

/// Resolves table names to `<data_dir>/<name>.ndjson`
#[derive(Debug, Clone)]
pub struct PathResolver {
    data_dir: PathBuf,
}

impl PathResolver {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Build the backing file path for a table
    ///
    /// Pure string construction: no filesystem access, no validation.
    pub fn resolve(&self, table: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", table, TABLE_FILE_EXTENSION))
    }

    /// Inverse of [`resolve`](Self::resolve)
    ///
    /// "users.ndjson" → Some("users"). Returns `None` for other extensions
    /// and for stems that are not valid table names.
    pub fn table_name(path: &Path) -> Option<String> {
        if path.extension()?.to_str()? != TABLE_FILE_EXTENSION {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        if !is_valid_table_name(stem) {
            return None;
        }
        Some(stem.to_string())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

/// `[A-Za-z0-9_-]+`
pub fn is_valid_table_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Reject names that could escape the data directory or collide with
/// another table's file
pub fn validate_table_name(name: &str) -> Result<()> {
    if is_valid_table_name(name) {
        Ok(())
    } else {
        Err(DhubError::InvalidTableName(name.to_string()))
    }
}
