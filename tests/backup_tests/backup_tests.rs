//! Tests for backup notifiers
//!
//! These tests verify:
//! - Mutation descriptions
//! - Background dispatch ordering and draining on drop
//! - Background dispatch never blocks the caller
//! - Git backup failures never fail the store mutation

use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use dhub::backup::{BackgroundNotifier, GitBackup, Mutation, NoopNotifier, Notifier};
use dhub::config::{BackupMode, BackupPolicy, Config};
use dhub::storage::TableStore;
use dhub::DhubError;
use parking_lot::Mutex;
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Helper Notifiers
// =============================================================================

#[derive(Default)]
struct RecordingNotifier {
    mutations: Mutex<Vec<Mutation>>,
}

impl Notifier for RecordingNotifier {
    fn on_mutation(&self, mutation: &Mutation) {
        self.mutations.lock().push(mutation.clone());
    }
}

/// Blocks every delivery until the test sends a permit
struct GatedNotifier {
    permits: Receiver<()>,
    delivered: Sender<Mutation>,
}

impl Notifier for GatedNotifier {
    fn on_mutation(&self, mutation: &Mutation) {
        let _ = self.permits.recv();
        let _ = self.delivered.send(mutation.clone());
    }
}

fn insert_of(table: &str) -> Mutation {
    Mutation::Insert {
        table: table.to_string(),
    }
}

// =============================================================================
// Mutation Tests
// =============================================================================

#[test]
fn test_mutation_table_and_display() {
    let create = Mutation::CreateTable { table: "users".to_string() };
    let delete = Mutation::DeleteTable { table: "users".to_string() };
    let insert = insert_of("users");

    assert_eq!(create.table(), "users");
    assert_eq!(delete.table(), "users");
    assert_eq!(insert.table(), "users");
    assert_eq!(create.to_string(), "create table 'users'");
    assert_eq!(delete.to_string(), "delete table 'users'");
    assert_eq!(insert.to_string(), "insert into 'users'");
}

#[test]
fn test_noop_notifier_does_nothing() {
    NoopNotifier.on_mutation(&insert_of("t"));
}

// =============================================================================
// BackgroundNotifier Tests
// =============================================================================

#[test]
fn test_background_delivers_in_order_and_drains_on_drop() {
    let inner = Arc::new(RecordingNotifier::default());
    let background = BackgroundNotifier::spawn(inner.clone()).unwrap();

    for i in 0..100 {
        background.on_mutation(&insert_of(&format!("t{}", i)));
    }
    drop(background);

    let delivered = inner.mutations.lock().clone();
    let expected: Vec<Mutation> = (0..100).map(|i| insert_of(&format!("t{}", i))).collect();
    assert_eq!(delivered, expected);
}

#[test]
fn test_background_does_not_block_caller() {
    let (permit_tx, permit_rx) = channel::unbounded();
    let (delivered_tx, delivered_rx) = channel::unbounded();
    let inner = Arc::new(GatedNotifier {
        permits: permit_rx,
        delivered: delivered_tx,
    });
    let background = BackgroundNotifier::spawn(inner).unwrap();

    // Returns even though the inner notifier is stuck waiting for a permit
    background.on_mutation(&insert_of("a"));
    background.on_mutation(&insert_of("b"));
    assert!(delivered_rx.try_recv().is_err());

    permit_tx.send(()).unwrap();
    permit_tx.send(()).unwrap();

    let timeout = Duration::from_secs(5);
    assert_eq!(delivered_rx.recv_timeout(timeout).unwrap(), insert_of("a"));
    assert_eq!(delivered_rx.recv_timeout(timeout).unwrap(), insert_of("b"));
}

#[test]
fn test_store_with_background_notifier() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path().join("data"))
        .backup_policy(BackupPolicy::OnUpdate)
        .build();
    let inner = Arc::new(RecordingNotifier::default());
    let background = Arc::new(BackgroundNotifier::spawn(inner.clone()).unwrap());
    let store = TableStore::with_notifier(&config, background);

    store.create_table("t").unwrap();
    store
        .insert("t", json!({"a": 1}).as_object().unwrap())
        .unwrap();

    // Dropping the store drops the last reference to the worker, which drains
    drop(store);

    assert_eq!(
        inner.mutations.lock().clone(),
        vec![
            Mutation::CreateTable { table: "t".to_string() },
            insert_of("t"),
        ]
    );
}

// =============================================================================
// GitBackup Tests
// =============================================================================

#[test]
fn test_git_backup_outside_repository_fails() {
    let temp_dir = TempDir::new().unwrap();
    let backup = GitBackup::new(temp_dir.path());

    assert_eq!(backup.repo_dir(), temp_dir.path());
    assert!(matches!(backup.run(), Err(DhubError::Backup(_))));
}

#[test]
fn test_git_backup_in_missing_directory_fails() {
    let temp_dir = TempDir::new().unwrap();
    let backup = GitBackup::new(temp_dir.path().join("missing"));

    assert!(matches!(backup.run(), Err(DhubError::Backup(_))));
}

#[test]
fn test_failed_backup_does_not_fail_mutations() {
    for mode in [BackupMode::Inline, BackupMode::Background] {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::builder()
            .data_dir(temp_dir.path().join("data"))
            .backup_policy(BackupPolicy::OnUpdate)
            .backup_mode(mode)
            .backup_repo(temp_dir.path().join("no-such-repo"))
            .build();
        let store = TableStore::open(&config).unwrap();

        store.create_table("t").unwrap();
        store
            .insert("t", json!({"a": 1}).as_object().unwrap())
            .unwrap();
        assert_eq!(store.find_all("t").unwrap().len(), 1);
        store.delete_table("t").unwrap();
    }
}
