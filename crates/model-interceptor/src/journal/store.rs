//! Journal persistence backends.

use super::types::LogEntry;
use crate::error::StoreError;
use crate::persist::{read_or_init, write_json_atomic};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::path::PathBuf;

#[async_trait]
pub trait JournalStore: Send + Sync {
    /// The whole journal, newest first.
    async fn load(&self) -> Result<Vec<LogEntry>, StoreError>;

    /// Replace the whole journal.
    async fn store(&self, entries: &[LogEntry]) -> Result<(), StoreError>;
}

/// Journal stored as a JSON array on local disk.
pub struct FileJournalStore {
    path: PathBuf,
}

impl FileJournalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl JournalStore for FileJournalStore {
    async fn load(&self) -> Result<Vec<LogEntry>, StoreError> {
        read_or_init(&self.path, Vec::new()).await
    }

    async fn store(&self, entries: &[LogEntry]) -> Result<(), StoreError> {
        write_json_atomic(&self.path, entries).await
    }
}

#[derive(Default)]
pub struct InMemoryJournalStore {
    entries: RwLock<Vec<LogEntry>>,
}

#[async_trait]
impl JournalStore for InMemoryJournalStore {
    async fn load(&self) -> Result<Vec<LogEntry>, StoreError> {
        Ok(self.entries.read().clone())
    }

    async fn store(&self, entries: &[LogEntry]) -> Result<(), StoreError> {
        *self.entries.write() = entries.to_vec();
        Ok(())
    }
}
