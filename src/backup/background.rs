//! Background dispatch
//!
//! Runs a wrapped notifier on a dedicated worker thread so a slow or hanging
//! backup never stalls the store caller.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel::{self, Sender};

use super::{Mutation, Notifier};

/// Queues mutations to a worker thread that calls the inner notifier
///
/// Delivery is in submission order. Dropping the notifier closes the queue,
/// lets the worker drain what is pending, and joins it.
pub struct BackgroundNotifier {
    sender: Option<Sender<Mutation>>,
    worker: Option<JoinHandle<()>>,
}

impl BackgroundNotifier {
    /// Spawn the worker thread
    pub fn spawn(inner: Arc<dyn Notifier>) -> std::io::Result<Self> {
        let (sender, receiver) = channel::unbounded::<Mutation>();

        let worker = std::thread::Builder::new()
            .name("dhub-backup".to_string())
            .spawn(move || {
                for mutation in receiver.iter() {
                    inner.on_mutation(&mutation);
                }
                tracing::debug!("Backup worker stopped");
            })?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }
}

impl Notifier for BackgroundNotifier {
    fn on_mutation(&self, mutation: &Mutation) {
        let Some(sender) = &self.sender else {
            return;
        };
        if sender.send(mutation.clone()).is_err() {
            tracing::warn!("Backup worker is gone, dropping {}", mutation);
        }
    }
}

impl Drop for BackgroundNotifier {
    fn drop(&mut self) {
        // Closing the channel ends the worker's receive loop
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Backup worker panicked");
            }
        }
    }
}
