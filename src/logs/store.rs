//! Log store: run records plus their append-only log files

use crate::core::{is_trailer, LogRecord, OrchidError, Outcome, Result};
use crate::persistence::RecordBackend;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Creates, enumerates and appends to run logs
///
/// Each log is a plain text file at `<logs_dir>/<id>` closed by exactly
/// one trailer line. Only the run that owns an id writes to its file.
pub struct LogStore {
    logs_dir: PathBuf,
    records: Arc<dyn RecordBackend>,
}

impl LogStore {
    /// Open a store rooted at `logs_dir`, creating the directory if needed
    pub async fn open<P: Into<PathBuf>>(logs_dir: P, records: Arc<dyn RecordBackend>) -> Result<Self> {
        let logs_dir = logs_dir.into();
        tokio::fs::create_dir_all(&logs_dir).await.map_err(|e| {
            OrchidError::Storage(format!("Cannot create {}: {}", logs_dir.display(), e))
        })?;
        Ok(Self { logs_dir, records })
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    pub fn log_path(&self, id: &str) -> PathBuf {
        self.logs_dir.join(id)
    }

    /// Allocate a fresh pending record and its empty log file
    pub async fn create(&self, job_id: &str) -> Result<LogRecord> {
        let record = LogRecord::new(job_id);
        let path = self.log_path(&record.id);

        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => {
                    OrchidError::Storage(format!("Log id collision: {}", record.id))
                }
                _ => OrchidError::Storage(format!("Cannot create {}: {}", path.display(), e)),
            })?;

        if let Err(e) = self.records.insert(&record).await {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e);
        }

        debug!("Created log {} for job {}", record.id, job_id);
        Ok(record)
    }

    /// Append one line of step output
    pub async fn append(&self, id: &str, line: &str) -> Result<()> {
        if is_trailer(line) {
            return Err(OrchidError::Storage(format!(
                "Refusing to write reserved line '{}' to log {}",
                line, id
            )));
        }
        self.write_line(id, line).await
    }

    /// Move a pending record to running and stamp its start time
    pub async fn mark_running(&self, id: &str) -> Result<LogRecord> {
        let mut record = self.load(id).await?;
        record.start()?;
        self.records.update(&record).await?;
        debug!("Log {} is running", id);
        Ok(record)
    }

    /// Record the outcome, then close the log with its trailer
    ///
    /// The record is updated before the trailer is written, so a reader
    /// that has seen the trailer will also see the terminal status.
    pub async fn finalize(&self, id: &str, outcome: Outcome) -> Result<LogRecord> {
        let mut record = self.load(id).await?;
        record.finish(outcome)?;
        self.records.update(&record).await?;
        self.write_line(id, outcome.trailer()).await?;
        debug!("Log {} finalized as {}", id, record.status);
        Ok(record)
    }

    /// Write the trailer without touching the record
    ///
    /// For runs whose record can no longer be updated: the log still ends,
    /// so followers stop, while the record keeps its last stored status.
    pub async fn close(&self, id: &str, outcome: Outcome) -> Result<()> {
        self.write_line(id, outcome.trailer()).await?;
        debug!("Log {} closed as {} without a record update", id, outcome.status());
        Ok(())
    }

    /// Load a record by its full id
    pub async fn load(&self, id: &str) -> Result<LogRecord> {
        self.records
            .load(id)
            .await?
            .ok_or_else(|| OrchidError::NotFound(id.to_string()))
    }

    /// All records, oldest first
    pub async fn list(&self) -> Result<Vec<LogRecord>> {
        self.records.list().await
    }

    /// Resolve a full id or an id prefix to a full id
    ///
    /// An exact id wins. Otherwise the first record, oldest first, whose id
    /// starts with the prefix is returned; an ambiguous prefix is not an
    /// error, so callers that need a specific run must give enough
    /// characters.
    pub async fn resolve(&self, id_or_prefix: &str) -> Result<String> {
        if id_or_prefix.is_empty() {
            return Err(OrchidError::NotFound(String::new()));
        }

        if let Some(record) = self.records.load(id_or_prefix).await? {
            return Ok(record.id);
        }

        self.list()
            .await?
            .into_iter()
            .find(|r| r.id.starts_with(id_or_prefix))
            .map(|r| r.id)
            .ok_or_else(|| OrchidError::NotFound(id_or_prefix.to_string()))
    }

    async fn write_line(&self, id: &str, line: &str) -> Result<()> {
        let path = self.log_path(id);
        let mut file: File = OpenOptions::new()
            .append(true)
            .open(&path)
            .await
            .map_err(|e| OrchidError::Storage(format!("Cannot open {}: {}", path.display(), e)))?;

        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        file.write_all(buf.as_bytes())
            .await
            .map_err(|e| OrchidError::Storage(format!("Cannot write {}: {}", path.display(), e)))?;
        file.flush().await?;
        Ok(())
    }
}
