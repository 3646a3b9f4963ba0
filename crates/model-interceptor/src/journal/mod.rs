//! Bounded, newest-first audit journal of request outcomes.
//!
//! Recording never blocks or fails the request it describes. Entries are
//! queued to a single writer task that performs the read-prepend-truncate-write
//! cycle, so concurrent requests cannot lose each other's entries within one
//! process. Each write is atomic at the file level.

mod store;
mod types;

pub use store::{FileJournalStore, InMemoryJournalStore, JournalStore};
pub use types::{LogEntry, LogStatus, NewLogEntry};

use crate::error::StoreError;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

pub const DEFAULT_CAPACITY: usize = 100;
/// Hard upper bound on retained entries; a configured capacity may only lower it.
pub const MAX_CAPACITY: usize = 100;

enum Command {
    Record(LogEntry),
    Flush(oneshot::Sender<()>),
}

/// Handle to the journal. Cheap to clone.
#[derive(Clone)]
pub struct AuditLog {
    tx: mpsc::UnboundedSender<Command>,
    store: Arc<dyn JournalStore>,
}

impl AuditLog {
    /// Start the writer task. Must be called from within a tokio runtime.
    ///
    /// `capacity` is clamped to `1..=MAX_CAPACITY`.
    pub fn spawn(store: Arc<dyn JournalStore>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let capacity = capacity.clamp(1, MAX_CAPACITY);
        tokio::spawn(run_writer(rx, Arc::clone(&store), capacity));
        Self { tx, store }
    }

    /// Queue an outcome. Id and timestamp are assigned now.
    pub fn record(&self, entry: NewLogEntry) {
        let entry = entry.stamp();
        debug!(
            status = entry.status.as_str(),
            request_url = %entry.request_url,
            "Recording request outcome"
        );
        if self.tx.send(Command::Record(entry)).is_err() {
            warn!("Journal writer has stopped; dropping entry");
        }
    }

    /// The persisted journal, newest first.
    pub async fn list(&self) -> Result<Vec<LogEntry>, StoreError> {
        self.store.load().await
    }

    /// Wait until every entry queued before this call has been written.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }
}

async fn run_writer(
    mut rx: mpsc::UnboundedReceiver<Command>,
    store: Arc<dyn JournalStore>,
    capacity: usize,
) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Record(entry) => {
                if let Err(e) = append(store.as_ref(), entry, capacity).await {
                    warn!(error = %e, "Failed to persist journal entry");
                }
            }
            Command::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

/// Prepend `entry` and keep only the `capacity` most recent entries.
pub async fn append(
    store: &dyn JournalStore,
    entry: LogEntry,
    capacity: usize,
) -> Result<(), StoreError> {
    let mut entries = store.load().await?;
    entries.insert(0, entry);
    entries.truncate(capacity);
    store.store(&entries).await
}
