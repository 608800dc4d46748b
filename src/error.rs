//! Error types for dhub
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using DhubError
pub type Result<T> = std::result::Result<T, DhubError>;

/// Unified error type for dhub operations
#[derive(Debug, Error)]
pub enum DhubError {
    // -------------------------------------------------------------------------
    // Table Errors
    // -------------------------------------------------------------------------
    #[error("Table '{0}' already exists")]
    AlreadyExists(String),

    #[error("Table '{0}' does not exist")]
    NotFound(String),

    #[error("Invalid table name '{0}': only letters, digits, '_' and '-' are allowed")]
    InvalidTableName(String),

    // -------------------------------------------------------------------------
    // Filesystem Errors
    // -------------------------------------------------------------------------
    #[error("Directory error at {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error {action} table '{table}': {source}")]
    File {
        table: String,
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Error reading table '{table}': {source}")]
    Read {
        table: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Error encoding record for table '{table}': {source}")]
    Encode {
        table: String,
        #[source]
        source: serde_json::Error,
    },

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Request body too large: {size} bytes (max {limit})")]
    BodyTooLarge { size: usize, limit: usize },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Backup Errors
    // -------------------------------------------------------------------------
    #[error("Backup failed: {0}")]
    Backup(String),
}
