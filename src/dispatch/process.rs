//! Process launching: streamed step processes and attached interactive runs

use crate::core::{OrchidError, Result};
use crate::dispatch::Invocation;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A running step whose output is consumed line by line
#[async_trait]
pub trait StepProcess: Send {
    /// Next line of combined stdout/stderr, `None` once both streams close
    async fn next_line(&mut self) -> Result<Option<String>>;

    /// Wait for the process to exit and return its exit code
    async fn wait(self: Box<Self>) -> Result<i32>;

    /// Stop the process and reap it
    async fn kill(self: Box<Self>) -> Result<()>;
}

/// Trait for starting step processes - allows for different implementations
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn spawn(&self, invocation: &Invocation) -> Result<Box<dyn StepProcess>>;
}

/// Launches real processes with tokio
#[derive(Debug, Clone, Default)]
pub struct TokioLauncher;

impl TokioLauncher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Launcher for TokioLauncher {
    async fn spawn(&self, invocation: &Invocation) -> Result<Box<dyn StepProcess>> {
        debug!("Spawning {}", invocation);

        let mut child = invocation
            .command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| OrchidError::Launch {
                program: invocation.program.clone(),
                reason: e.to_string(),
            })?;

        let (tx, rx) = mpsc::channel(256);
        if let Some(stdout) = child.stdout.take() {
            pump(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            pump(stderr, tx);
        }

        Ok(Box::new(ChildProcess {
            program: invocation.program.clone(),
            child,
            lines: rx,
        }))
    }
}

struct ChildProcess {
    program: String,
    child: Child,
    lines: mpsc::Receiver<String>,
}

#[async_trait]
impl StepProcess for ChildProcess {
    async fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.recv().await)
    }

    async fn wait(mut self: Box<Self>) -> Result<i32> {
        let status = self.child.wait().await.map_err(|e| OrchidError::Launch {
            program: self.program.clone(),
            reason: e.to_string(),
        })?;
        // Killed by a signal has no code
        Ok(status.code().unwrap_or(-1))
    }

    async fn kill(mut self: Box<Self>) -> Result<()> {
        debug!("Killing {}", self.program);
        self.child.kill().await.map_err(|e| OrchidError::Launch {
            program: self.program.clone(),
            reason: format!("cannot stop: {}", e),
        })
    }
}

/// Forward a pipe into the shared line channel
fn pump<R>(pipe: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                    }
                    if buf.last() == Some(&b'\r') {
                        buf.pop();
                    }
                    let line = String::from_utf8_lossy(&buf).into_owned();
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed reading process output: {}", e);
                    break;
                }
            }
        }
    });
}

/// Run an invocation attached to the caller's terminal
///
/// Used for actions, sessions, copies and mounts. A non-zero exit is an
/// `ExitStatus` error.
pub async fn run_attached(invocation: &Invocation) -> Result<()> {
    debug!("Running attached: {}", invocation);

    let status = invocation
        .command()
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| OrchidError::Launch {
            program: invocation.program.clone(),
            reason: e.to_string(),
        })?;

    if !status.success() {
        return Err(OrchidError::ExitStatus {
            program: invocation.program.clone(),
            code: status.code().unwrap_or(-1),
        });
    }

    Ok(())
}
