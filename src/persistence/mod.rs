//! Persistence layer for run log records

#[cfg(feature = "sqlite")]
pub mod store;

#[cfg(feature = "sqlite")]
pub use store::SqliteRecordStore;

use crate::core::{LogRecord, OrchidError, Result};

/// Trait for record persistence backends
///
/// `list` returns records in creation order, oldest first.
#[async_trait::async_trait]
pub trait RecordBackend: Send + Sync {
    /// Persist a new record; fails if the id already exists
    async fn insert(&self, record: &LogRecord) -> Result<()>;

    /// Overwrite an existing record
    async fn update(&self, record: &LogRecord) -> Result<()>;

    /// Load a record by its full id
    async fn load(&self, id: &str) -> Result<Option<LogRecord>>;

    /// All records, oldest first
    async fn list(&self) -> Result<Vec<LogRecord>>;
}

/// In-memory records (for testing or ephemeral use)
pub struct InMemoryRecords {
    records: tokio::sync::RwLock<Vec<LogRecord>>,
}

impl InMemoryRecords {
    pub fn new() -> Self {
        Self {
            records: tokio::sync::RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryRecords {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RecordBackend for InMemoryRecords {
    async fn insert(&self, record: &LogRecord) -> Result<()> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id == record.id) {
            return Err(OrchidError::Storage(format!(
                "Log id collision: {}",
                record.id
            )));
        }
        records.push(record.clone());
        Ok(())
    }

    async fn update(&self, record: &LogRecord) -> Result<()> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(OrchidError::Storage(format!(
                "Cannot update unknown log {}",
                record.id
            ))),
        }
    }

    async fn load(&self, id: &str) -> Result<Option<LogRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<LogRecord>> {
        Ok(self.records.read().await.clone())
    }
}
