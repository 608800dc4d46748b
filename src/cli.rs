//! CLI commands
//!
//! Table management commands shared by the `dhub` binary and its tests.

use std::io::Write;

use crate::error::Result;
use crate::storage::TableStore;

/// A table management command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableCommand {
    /// List all tables
    List,

    /// Create a table
    Create(String),

    /// Delete a table
    Delete(String),
}

/// Run a command against the store, writing its report to `out`
///
/// Store failures are returned untouched; nothing is written for them.
pub fn execute<W: Write>(store: &TableStore, command: &TableCommand, out: &mut W) -> Result<()> {
    match command {
        TableCommand::List => {
            let tables = store.list_tables();
            match tables.len() {
                0 => writeln!(out, "No tables found")?,
                1 => writeln!(out, "Found 1 table:")?,
                n => writeln!(out, "Found {} tables:", n)?,
            }
            for table in &tables {
                writeln!(out, "\t- {}", table)?;
            }
        }
        TableCommand::Create(name) => {
            store.create_table(name)?;
            writeln!(out, "Created table '{}'", name)?;
        }
        TableCommand::Delete(name) => {
            store.delete_table(name)?;
            writeln!(out, "Deleted table '{}'", name)?;
        }
    }

    Ok(())
}
