//! Table Store
//!
//! Owns the table → file mapping and implements every table operation.
//!
//! ## Responsibilities
//! - Discover existing table files on startup (and on `reload`)
//! - Create/delete table files and manage the data directory lifecycle
//! - Append records and scan them back
//! - Fire the backup notifier after successful mutations

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::backup::{BackgroundNotifier, GitBackup, Mutation, NoopNotifier, Notifier};
use crate::config::{BackupMode, BackupPolicy, Config};
use crate::error::{DhubError, Result};

use super::dir;
use super::ndjson::{self, TableScan};
use super::resolver::{validate_table_name, PathResolver};
use super::Record;

/// The record store
///
/// ## Concurrency:
/// - Mutations (create/delete/insert): serialized by `write_lock`
/// - `tables`: RwLock, only held for map lookups and updates
/// - Reads (find_all/find_by_key) never take `write_lock`
/// - The notifier is called after `write_lock` is released
///
/// All methods take `&self`; share the store with `Arc<TableStore>`.
pub struct TableStore {
    /// Maps table names to backing file paths
    resolver: PathResolver,

    /// Known tables, rebuilt from disk by `reload`
    tables: RwLock<HashMap<String, PathBuf>>,

    /// Serializes mutations
    write_lock: Mutex<()>,

    backup_policy: BackupPolicy,

    notifier: Arc<dyn Notifier>,

    /// Undecodable lines skipped by reads since the store was opened
    corrupt_lines: AtomicU64,
}

impl TableStore {
    /// Open a store with the backup hook described by `config`
    ///
    /// `on_update` installs a `GitBackup` rooted at `config.backup_repo`,
    /// wrapped in a `BackgroundNotifier` when `backup_mode` is `background`.
    pub fn open(config: &Config) -> Result<Self> {
        let notifier: Arc<dyn Notifier> = match config.backup_policy {
            BackupPolicy::None => Arc::new(NoopNotifier),
            BackupPolicy::OnUpdate => {
                let git: Arc<dyn Notifier> = Arc::new(GitBackup::new(&config.backup_repo));
                match config.backup_mode {
                    BackupMode::Inline => git,
                    BackupMode::Background => Arc::new(BackgroundNotifier::spawn(git)?),
                }
            }
        };

        Ok(Self::with_notifier(config, notifier))
    }

    /// Open a store with an explicit notifier
    pub fn with_notifier(config: &Config, notifier: Arc<dyn Notifier>) -> Self {
        let store = Self {
            resolver: PathResolver::new(&config.data_dir),
            tables: RwLock::new(HashMap::new()),
            write_lock: Mutex::new(()),
            backup_policy: config.backup_policy,
            notifier,
            corrupt_lines: AtomicU64::new(0),
        };

        let count = store.reload();
        tracing::debug!(
            "Opened table store at {} ({} tables)",
            store.data_dir().display(),
            count
        );

        store
    }

    /// Rebuild the table mapping from the files on disk
    ///
    /// Returns the number of tables found.
    pub fn reload(&self) -> usize {
        let discovered = self.discover_tables();

        let mut tables = self.tables.write();
        tables.clear();
        tables.extend(discovered);
        tables.len()
    }

    /// Names of all tables on disk, sorted
    ///
    /// Empty when the data directory does not exist.
    pub fn list_tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .discover_tables()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        names.sort();
        names
    }

    /// Create an empty table
    ///
    /// Creates the data directory (and missing parents) first if needed.
    pub fn create_table(&self, name: &str) -> Result<()> {
        validate_table_name(name)?;

        {
            let _write_guard = self.write_lock.lock();
            let path = self.table_path(name);

            if path.is_file() {
                return Err(DhubError::AlreadyExists(name.to_string()));
            }

            let data_dir = self.data_dir();
            fs::create_dir_all(data_dir).map_err(|source| DhubError::Directory {
                path: data_dir.to_path_buf(),
                source,
            })?;

            OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .map_err(|source| match source.kind() {
                    ErrorKind::AlreadyExists => DhubError::AlreadyExists(name.to_string()),
                    _ => DhubError::File {
                        table: name.to_string(),
                        action: "creating",
                        source,
                    },
                })?;

            self.tables.write().insert(name.to_string(), path);
        }

        tracing::info!("Created table '{}'", name);
        self.notify(Mutation::CreateTable {
            table: name.to_string(),
        });

        Ok(())
    }

    /// Delete a table and its file
    ///
    /// If that leaves the data directory empty, the directory is removed
    /// along with any ancestors that become empty.
    pub fn delete_table(&self, name: &str) -> Result<()> {
        validate_table_name(name)?;

        {
            let _write_guard = self.write_lock.lock();
            let path = self.table_path(name);

            if !path.is_file() {
                return Err(DhubError::NotFound(name.to_string()));
            }

            fs::remove_file(&path).map_err(|source| DhubError::File {
                table: name.to_string(),
                action: "deleting",
                source,
            })?;

            self.remove_data_dir_if_empty();
            self.tables.write().remove(name);
        }

        tracing::info!("Deleted table '{}'", name);
        self.notify(Mutation::DeleteTable {
            table: name.to_string(),
        });

        Ok(())
    }

    /// Append one record to a table
    ///
    /// Never creates the table: inserting into a missing table is `NotFound`.
    pub fn insert(&self, name: &str, record: &Record) -> Result<()> {
        validate_table_name(name)?;

        let line = ndjson::encode_record(record).map_err(|source| DhubError::Encode {
            table: name.to_string(),
            source,
        })?;

        {
            let _write_guard = self.write_lock.lock();
            let path = self.table_path(name);

            if !path.is_file() {
                return Err(DhubError::NotFound(name.to_string()));
            }

            let file_error = |source: io::Error| match source.kind() {
                ErrorKind::NotFound => DhubError::NotFound(name.to_string()),
                _ => DhubError::File {
                    table: name.to_string(),
                    action: "inserting into",
                    source,
                },
            };

            let mut file = OpenOptions::new()
                .read(true)
                .append(true)
                .open(&path)
                .map_err(file_error)?;

            // An unterminated last line would swallow the new record
            let mut buf = Vec::with_capacity(line.len() + 1);
            if !ends_with_newline(&mut file).map_err(file_error)? {
                buf.push(b'\n');
            }
            buf.extend_from_slice(&line);

            // One write per line keeps each record contiguous in the file
            file.write_all(&buf).map_err(file_error)?;
        }

        tracing::debug!("Inserted record into '{}' ({} bytes)", name, line.len());
        self.notify(Mutation::Insert {
            table: name.to_string(),
        });

        Ok(())
    }

    /// All records of a table, in insertion order
    pub fn find_all(&self, name: &str) -> Result<Vec<Record>> {
        Ok(self.scan(name)?.records)
    }

    /// Records that contain `key` as a top-level field, whatever its value
    pub fn find_by_key(&self, name: &str, key: &str) -> Result<Vec<Record>> {
        let records = self.find_all(name)?;
        Ok(records
            .into_iter()
            .filter(|record| record.contains_key(key))
            .collect())
    }

    /// Read a table, reporting how many undecodable lines were skipped
    pub fn scan(&self, name: &str) -> Result<TableScan> {
        validate_table_name(name)?;

        let path = self.table_path(name);
        if !path.is_file() {
            return Err(DhubError::NotFound(name.to_string()));
        }

        let contents = fs::read(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => DhubError::NotFound(name.to_string()),
            _ => DhubError::Read {
                table: name.to_string(),
                source,
            },
        })?;

        let scan = ndjson::decode_records(&contents);
        if scan.skipped_lines > 0 {
            self.corrupt_lines
                .fetch_add(scan.skipped_lines, Ordering::Relaxed);
            tracing::warn!(
                "Skipped {} undecodable lines in table '{}'",
                scan.skipped_lines,
                name
            );
        }

        Ok(scan)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        self.resolver.data_dir()
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn backup_policy(&self) -> BackupPolicy {
        self.backup_policy
    }

    /// Number of tables in the in-memory mapping
    pub fn table_count(&self) -> usize {
        self.tables.read().len()
    }

    /// Total undecodable lines skipped by reads on this store
    pub fn corrupt_line_count(&self) -> u64 {
        self.corrupt_lines.load(Ordering::Relaxed)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Mapped path for a table, or the resolved path if it is not mapped yet
    fn table_path(&self, name: &str) -> PathBuf {
        self.tables
            .read()
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.resolver.resolve(name))
    }

    /// Table files currently in the data directory
    fn discover_tables(&self) -> Vec<(String, PathBuf)> {
        let data_dir = self.data_dir();

        let entries = match fs::read_dir(data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!("Cannot read data directory {}: {}", data_dir.display(), e);
                return Vec::new();
            }
        };

        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter_map(|path| PathResolver::table_name(&path).map(|name| (name, path)))
            .collect()
    }

    /// Called with `write_lock` held, after a table file was removed
    ///
    /// The table is already gone at this point, so failures are only logged.
    fn remove_data_dir_if_empty(&self) {
        let data_dir = self.data_dir();

        match dir::is_dir_empty(data_dir) {
            Ok(true) => {
                if let Err(e) = dir::remove_dir_cascade(data_dir) {
                    tracing::warn!(
                        "Failed to remove empty data directory {}: {}",
                        data_dir.display(),
                        e
                    );
                } else {
                    tracing::debug!("Removed empty data directory {}", data_dir.display());
                }
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!("Cannot inspect data directory {}: {}", data_dir.display(), e);
            }
        }
    }

    fn notify(&self, mutation: Mutation) {
        if self.backup_policy == BackupPolicy::OnUpdate {
            self.notifier.on_mutation(&mutation);
        }
    }
}

/// True for an empty file or one whose last byte is `\n`
fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
