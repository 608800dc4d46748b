//! Configuration for dhub
//!
//! Centralized configuration with sensible defaults.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::DhubError;

/// Main configuration for a dhub instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all table files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── users.ndjson
    ///     └── orders.ndjson
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Backup Configuration
    // -------------------------------------------------------------------------
    /// When to run the backup hook
    pub backup_policy: BackupPolicy,

    /// Whether the hook runs on the caller's thread or a worker thread
    pub backup_mode: BackupMode,

    /// Working directory for the git backup commands
    pub backup_repo: PathBuf,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// HTTP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds)
    pub write_timeout_ms: u64,
}

/// Backup policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackupPolicy {
    /// Never run the hook
    #[default]
    None,

    /// Run the hook after every successful create/delete/insert
    OnUpdate,
}

impl FromStr for BackupPolicy {
    type Err = DhubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(BackupPolicy::None),
            "on_update" | "on-update" => Ok(BackupPolicy::OnUpdate),
            other => Err(DhubError::Config(format!(
                "unknown backup policy '{}' (expected 'none' or 'on_update')",
                other
            ))),
        }
    }
}

impl fmt::Display for BackupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupPolicy::None => f.write_str("none"),
            BackupPolicy::OnUpdate => f.write_str("on_update"),
        }
    }
}

/// How the backup hook is dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackupMode {
    /// Run synchronously after the mutation (caller waits for the push)
    #[default]
    Inline,

    /// Queue to a worker thread and return immediately
    Background,
}

impl FromStr for BackupMode {
    type Err = DhubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inline" => Ok(BackupMode::Inline),
            "background" => Ok(BackupMode::Background),
            other => Err(DhubError::Config(format!(
                "unknown backup mode '{}' (expected 'inline' or 'background')",
                other
            ))),
        }
    }
}

impl fmt::Display for BackupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupMode::Inline => f.write_str("inline"),
            BackupMode::Background => f.write_str("background"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            backup_policy: BackupPolicy::None,
            backup_mode: BackupMode::Inline,
            backup_repo: PathBuf::from("."),
            listen_addr: "0.0.0.0:8000".to_string(),
            max_connections: 64,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all table files)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the backup policy
    pub fn backup_policy(mut self, policy: BackupPolicy) -> Self {
        self.config.backup_policy = policy;
        self
    }

    /// Set the backup dispatch mode
    pub fn backup_mode(mut self, mode: BackupMode) -> Self {
        self.config.backup_mode = mode;
        self
    }

    /// Set the working directory for backup commands
    pub fn backup_repo(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.backup_repo = path.into();
        self
    }

    /// Set the HTTP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
