//! Test utilities: a scripted launcher and temp-rooted orchestrators

use async_trait::async_trait;
use orchid::core::{LogRecord, OrchidError, Result};
use orchid::dispatch::{Invocation, Launcher, StepProcess};
use orchid::logs::LogStore;
use orchid::persistence::{InMemoryRecords, RecordBackend};
use orchid::{Orchestrator, OrchidConfig, Registry, Setup};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const SETUP: &str = r#"
machines:
  - id: web1
    user: deploy
    address: 10.0.0.5
    privateKey: web1.pem
jobs:
  - id: deploy
    pipeline:
      - machine: local
        script: build.sh
      - machine: web1
        script: deploy.sh
        args: ["v2", "--force"]
      - machine: local
        script: notify.sh
  - id: single
    pipeline:
      - machine: local
        script: echo.sh
  - id: stray
    pipeline:
      - machine: nowhere
        script: x.sh
"#;

/// One scripted process: its output lines and exit code
#[derive(Debug, Clone)]
pub struct ScriptedStep {
    pub lines: Vec<String>,
    pub code: i32,
}

pub fn step(lines: &[&str], code: i32) -> ScriptedStep {
    ScriptedStep {
        lines: lines.iter().map(|l| l.to_string()).collect(),
        code,
    }
}

/// Launcher that replays scripted processes in spawn order
///
/// Each line is emitted after `line_delay`, so a follower can observe the
/// log while it grows.
pub struct ScriptedLauncher {
    script: Mutex<VecDeque<ScriptedStep>>,
    line_delay: Option<Duration>,
    pub spawned: Arc<Mutex<Vec<Invocation>>>,
}

impl ScriptedLauncher {
    pub fn new(script: Vec<ScriptedStep>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            line_delay: None,
            spawned: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_line_delay(mut self, delay: Duration) -> Self {
        self.line_delay = Some(delay);
        self
    }
}

struct ScriptedProcess {
    lines: VecDeque<String>,
    code: i32,
    line_delay: Option<Duration>,
}

#[async_trait]
impl StepProcess for ScriptedProcess {
    async fn next_line(&mut self) -> Result<Option<String>> {
        if let Some(delay) = self.line_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.lines.pop_front())
    }

    async fn wait(self: Box<Self>) -> Result<i32> {
        Ok(self.code)
    }

    async fn kill(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl Launcher for ScriptedLauncher {
    async fn spawn(&self, invocation: &Invocation) -> Result<Box<dyn StepProcess>> {
        self.spawned.lock().unwrap().push(invocation.clone());

        let next = self.script.lock().unwrap().pop_front();
        let step = next.ok_or_else(|| OrchidError::Launch {
            program: invocation.program.clone(),
            reason: format!("ScriptedLauncher: nothing scripted for {}", invocation),
        })?;

        Ok(Box::new(ScriptedProcess {
            lines: step.lines.into(),
            code: step.code,
            line_delay: self.line_delay,
        }))
    }
}

/// Records whose updates always fail, as on a full disk
#[derive(Default)]
pub struct FailingUpdates {
    inner: InMemoryRecords,
}

#[async_trait]
impl RecordBackend for FailingUpdates {
    async fn insert(&self, record: &LogRecord) -> Result<()> {
        self.inner.insert(record).await
    }

    async fn update(&self, _record: &LogRecord) -> Result<()> {
        Err(OrchidError::Storage("disk full".to_string()))
    }

    async fn load(&self, id: &str) -> Result<Option<LogRecord>> {
        self.inner.load(id).await
    }

    async fn list(&self) -> Result<Vec<LogRecord>> {
        self.inner.list().await
    }
}

/// Orchestrator over a fresh temp root; keep the `TempDir` alive
pub async fn orchestrator(launcher: ScriptedLauncher) -> (Orchestrator<ScriptedLauncher>, TempDir) {
    orchestrator_with_records(launcher, Arc::new(InMemoryRecords::new())).await
}

pub async fn orchestrator_with_records(
    launcher: ScriptedLauncher,
    records: Arc<dyn RecordBackend>,
) -> (Orchestrator<ScriptedLauncher>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = OrchidConfig::new()
        .with_root(dir.path())
        .with_poll_interval(Duration::from_millis(10));
    let store = LogStore::open(config.logs_dir(), records).await.unwrap();
    let registry = Registry::new(Setup::from_yaml(SETUP).unwrap());

    (Orchestrator::new(config, registry, store, launcher), dir)
}

/// Follow a log to its end, collecting the delivered lines
pub async fn collect<L: Launcher + 'static>(
    orchestrator: &Orchestrator<L>,
    id: &str,
) -> (orchid::Outcome, Vec<String>) {
    let mut lines = Vec::new();
    let outcome = tokio::time::timeout(
        Duration::from_secs(10),
        orchestrator.follow(id, |line| lines.push(line.to_string())),
    )
    .await
    .expect("follow did not reach a trailer")
    .unwrap();
    (outcome, lines)
}
