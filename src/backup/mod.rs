//! Backup Module
//!
//! Post-mutation hook fired by the table store.
//!
//! ## Responsibilities
//! - Define the `Notifier` capability the store calls after a successful
//!   create/delete/insert
//! - Push the data directory to a git remote (`GitBackup`)
//! - Move slow hooks off the caller's thread (`BackgroundNotifier`)
//!
//! A notifier never reports failure to the store: a failed backup is logged
//! and the triggering mutation still succeeds.

mod git;
mod background;

pub use git::GitBackup;
pub use background::BackgroundNotifier;

use std::fmt;

/// A successful store mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateTable { table: String },
    DeleteTable { table: String },
    Insert { table: String },
}

impl Mutation {
    /// Name of the table the mutation touched
    pub fn table(&self) -> &str {
        match self {
            Mutation::CreateTable { table }
            | Mutation::DeleteTable { table }
            | Mutation::Insert { table } => table,
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::CreateTable { table } => write!(f, "create table '{}'", table),
            Mutation::DeleteTable { table } => write!(f, "delete table '{}'", table),
            Mutation::Insert { table } => write!(f, "insert into '{}'", table),
        }
    }
}

/// Hook invoked after every successful mutation when the backup policy is
/// `on_update`
pub trait Notifier: Send + Sync {
    fn on_mutation(&self, mutation: &Mutation);
}

/// Notifier that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn on_mutation(&self, _mutation: &Mutation) {}
}
