//! Log tailer: follow a run log until its trailer line

use crate::core::{OrchidError, Outcome, Result, ERROR_TRAILER, FINISHED_TRAILER};
use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// Follows log files from the beginning, live or finished alike
///
/// The tailer takes no lock: it reads while the owning runner appends,
/// and polls for growth when it reaches the current end of the file.
/// To stop following a run that never terminates, drop the future
/// (for example with `tokio::time::timeout` or `tokio::select!`).
#[derive(Debug, Clone)]
pub struct LogTailer {
    logs_dir: PathBuf,
    poll_interval: Duration,
}

impl LogTailer {
    pub fn new<P: Into<PathBuf>>(logs_dir: P, poll_interval: Duration) -> Self {
        Self {
            logs_dir: logs_dir.into(),
            poll_interval,
        }
    }

    /// Deliver every line of the log to `on_line` until a trailer is read
    ///
    /// The trailer itself is never delivered; it is returned as the run's
    /// outcome. A log that already ends with a trailer returns as soon as
    /// the existing lines are delivered.
    pub async fn follow<F>(&self, log_id: &str, on_line: F) -> Result<Outcome>
    where
        F: FnMut(&str),
    {
        self.follow_while(log_id, on_line, std::future::pending::<()>())
            .await?
            .ok_or_else(|| OrchidError::Storage(format!("Log {} ended without a trailer", log_id)))
    }

    /// Like `follow`, but gives up once `writer_done` has completed and the
    /// rest of the file has been read without finding a trailer
    ///
    /// Returns `None` for a log whose writer is gone and never closed it.
    pub async fn follow_while<F, D>(
        &self,
        log_id: &str,
        mut on_line: F,
        writer_done: D,
    ) -> Result<Option<Outcome>>
    where
        F: FnMut(&str),
        D: Future<Output = ()>,
    {
        let path = self.logs_dir.join(log_id);
        let file = File::open(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => OrchidError::NotFound(log_id.to_string()),
            _ => OrchidError::Storage(format!("Cannot open {}: {}", path.display(), e)),
        })?;

        let mut reader = BufReader::new(file);
        let mut pending: Vec<u8> = Vec::new();
        let mut writer_finished = false;
        tokio::pin!(writer_done);

        loop {
            let read = reader.read_until(b'\n', &mut pending).await?;

            if read == 0 || pending.last() != Some(&b'\n') {
                // At the current end of the file; a partial line stays
                // buffered until the writer completes it.
                if writer_finished {
                    debug!("Log {} has no trailer and no writer", log_id);
                    return Ok(None);
                }
                tokio::select! {
                    _ = tokio::time::sleep(self.poll_interval) => {}
                    _ = &mut writer_done => writer_finished = true,
                }
                continue;
            }

            pending.pop();
            if pending.last() == Some(&b'\r') {
                pending.pop();
            }
            let line = String::from_utf8_lossy(&pending).into_owned();
            pending.clear();

            match line.as_str() {
                FINISHED_TRAILER => {
                    debug!("Log {} reached finished trailer", log_id);
                    return Ok(Some(Outcome::Finished));
                }
                ERROR_TRAILER => {
                    debug!("Log {} reached error trailer", log_id);
                    return Ok(Some(Outcome::Error));
                }
                _ => on_line(&line),
            }
        }
    }
}
