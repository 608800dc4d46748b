//! Storage Module
//!
//! Tables persisted as newline-delimited JSON files.
//!
//! ## Responsibilities
//! - Resolve table names to files in the data directory
//! - Create/delete tables and manage the data directory lifecycle
//! - Append records and scan them back (linear scan, no indexes)
//!
//! ## File Layout
//! ```text
//! {data_dir}/
//!   ├── users.ndjson
//!   └── orders.ndjson
//! ```
//!
//! ## Table File Format
//! ```text
//! ┌────────────────────────────────────────┐
//! │ {"name":"Ivan","age":33}\n             │
//! │ \n                       (blank, skip) │
//! │ {"name":"Olga"}\n                      │
//! │ not json\n             (corrupt, skip) │
//! │ ... (append-only)                      │
//! └────────────────────────────────────────┘
//! ```

mod resolver;
mod ndjson;
mod dir;
mod store;

pub use resolver::{is_valid_table_name, validate_table_name, PathResolver, TABLE_FILE_EXTENSION};
pub use ndjson::{decode_records, encode_record, TableScan};
pub use dir::{is_dir_empty, remove_dir_cascade};
pub use store::TableStore;

/// A record: string keys to arbitrary JSON values
pub type Record = serde_json::Map<String, serde_json::Value>;
