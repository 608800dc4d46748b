//! # dhub
//!
//! A minimal record store:
//! - Named tables, each persisted as one newline-delimited JSON file
//! - Append-only inserts, linear-scan queries
//! - HTTP API and a table management CLI
//! - Optional git backup after every mutation
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────┐    ┌──────────────────────────┐
//! │       HTTP Server        │    │           CLI            │
//! │  POST/GET /<table>       │    │  --list/--create/--delete│
//! └────────────┬─────────────┘    └────────────┬─────────────┘
//!              │                               │
//! ┌────────────▼───────────────────────────────▼─────────────┐
//! │                       TableStore                         │
//! │          (write mutex + RwLock'd table mapping)          │
//! └────────────┬──────────────────────────────┬──────────────┘
//!              │                              │
//!              ▼                              ▼
//!   ┌─────────────────────┐        ┌─────────────────────┐
//!   │    PathResolver     │        │      Notifier       │
//!   │ <dir>/<name>.ndjson │        │ git add/commit/push │
//!   └─────────────────────┘        └─────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod storage;
pub mod backup;
pub mod protocol;
pub mod network;
pub mod cli;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{DhubError, Result};
pub use config::{BackupMode, BackupPolicy, Config};
pub use storage::{Record, TableStore};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of dhub
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
