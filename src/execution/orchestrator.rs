//! Orchestrator - the operations offered to the command line

use crate::{
    core::{
        Action, Job, LogRecord, Machine, OrchidConfig, OrchidError, Outcome, Pipeline, Registry,
        Result, Setup,
    },
    dispatch::{run_attached, Dispatcher, Launcher, TokioLauncher},
    execution::PipelineRunner,
    logs::{LogStore, LogTailer},
    persistence::RecordBackend,
};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// A run that has been started in the background
pub struct RunHandle {
    /// Log id of the run, available before any step executes
    pub log_id: String,

    task: JoinHandle<Result<LogRecord>>,
}

impl RunHandle {
    /// Wait for the runner task and return the final record
    pub async fn wait(self) -> Result<LogRecord> {
        self.task
            .await
            .map_err(|e| OrchidError::Storage(format!("Run task for {} failed: {}", self.log_id, e)))?
    }
}

/// Ties the registry, the log store and the runner together
pub struct Orchestrator<L> {
    config: OrchidConfig,
    registry: Arc<Registry>,
    store: Arc<LogStore>,
    dispatcher: Dispatcher,
    runner: Arc<PipelineRunner<L>>,
    tailer: LogTailer,
}

impl Orchestrator<TokioLauncher> {
    /// Open the orchestrator rooted at `config.root`
    ///
    /// Loads `setup.yaml`, opens the record backend and the logs directory.
    pub async fn open(config: OrchidConfig) -> Result<Self> {
        tokio::fs::create_dir_all(config.root()).await.map_err(|e| {
            OrchidError::Storage(format!("Cannot create {}: {}", config.root().display(), e))
        })?;

        let setup = Setup::from_file(config.setup_path())?;
        let records = open_records(&config).await?;
        let store = LogStore::open(config.logs_dir(), records).await?;

        Ok(Self::new(config, Registry::new(setup), store, TokioLauncher::new()))
    }
}

#[cfg(feature = "sqlite")]
async fn open_records(config: &OrchidConfig) -> Result<Arc<dyn RecordBackend>> {
    let store = crate::persistence::SqliteRecordStore::open(&config.records_db_path()).await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "sqlite"))]
async fn open_records(_config: &OrchidConfig) -> Result<Arc<dyn RecordBackend>> {
    tracing::warn!("Built without sqlite: run records are kept in memory only");
    Ok(Arc::new(crate::persistence::InMemoryRecords::new()))
}

impl<L: Launcher + 'static> Orchestrator<L> {
    pub fn new(config: OrchidConfig, registry: Registry, store: LogStore, launcher: L) -> Self {
        let registry = Arc::new(registry);
        let store = Arc::new(store);
        let dispatcher = Dispatcher::new(registry.clone(), config.keys_dir());
        let runner = Arc::new(PipelineRunner::new(dispatcher.clone(), store.clone(), launcher));
        let tailer = LogTailer::new(config.logs_dir(), config.poll_interval);

        Self {
            config,
            registry,
            store,
            dispatcher,
            runner,
            tailer,
        }
    }

    pub fn config(&self) -> &OrchidConfig {
        &self.config
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }

    pub fn jobs(&self) -> &[Job] {
        self.registry.jobs()
    }

    pub fn actions(&self) -> &[Action] {
        self.registry.actions()
    }

    pub fn machines(&self) -> &[Machine] {
        self.registry.machines()
    }

    pub fn scripts(&self) -> &[String] {
        self.registry.scripts()
    }

    /// All run records, oldest first
    pub async fn logs(&self) -> Result<Vec<LogRecord>> {
        self.store.list().await
    }

    /// Build the job's pipeline and run it as a background task
    ///
    /// Returns as soon as the log record exists. The run's own failure is
    /// recorded in its log, never returned here.
    pub async fn start_run(&self, job_id: &str) -> Result<RunHandle> {
        let pipeline = Pipeline::build(&self.registry, &self.store, job_id).await?;
        let log_id = pipeline.log_id.clone();

        let runner = self.runner.clone();
        let task = tokio::spawn(async move {
            let result = runner.run(&pipeline).await;
            if let Err(e) = &result {
                error!("Run {} aborted: {}", pipeline.log_id, e);
            }
            result
        });

        info!("Run {} started for job {}", log_id, job_id);
        Ok(RunHandle { log_id, task })
    }

    /// Stream a log, live or finished, given its id or an id prefix
    pub async fn follow<F>(&self, id_or_prefix: &str, on_line: F) -> Result<Outcome>
    where
        F: FnMut(&str),
    {
        let log_id = self.store.resolve(id_or_prefix).await?;
        self.tailer.follow(&log_id, on_line).await
    }

    /// Stream a started run's log and wait for its task
    ///
    /// Ends at the trailer like `follow`. If the run task ends without
    /// the log ever receiving a trailer, the task's error is returned
    /// instead of waiting forever.
    pub async fn watch<F>(&self, handle: RunHandle, on_line: F) -> Result<Outcome>
    where
        F: FnMut(&str),
    {
        let log_id = handle.log_id.clone();
        let finished = Notify::new();

        let run = async {
            let result = handle.wait().await;
            finished.notify_one();
            result
        };
        let tail = self.tailer.follow_while(&log_id, on_line, finished.notified());
        let (run_result, tail_result) = tokio::join!(run, tail);

        match (tail_result?, run_result) {
            (Some(outcome), Ok(_)) => Ok(outcome),
            (Some(outcome), Err(e)) => {
                error!("Run {} closed its log but failed: {}", log_id, e);
                Ok(outcome)
            }
            (None, Err(e)) => Err(e),
            (None, Ok(_)) => Err(OrchidError::Storage(format!(
                "Run {} ended without closing its log",
                log_id
            ))),
        }
    }

    /// Run an action attached to the terminal
    pub async fn execute_action(&self, action_id: &str) -> Result<()> {
        let action = self.registry.action(action_id)?;
        let invocation = self.dispatcher.dispatch(&action.machine, &action.command, &[])?;
        run_attached(&invocation).await
    }

    /// Interactive session on a machine
    pub async fn ssh(&self, machine_id: &str) -> Result<()> {
        run_attached(&self.dispatcher.session(machine_id)?).await
    }

    /// Copy between this host and a machine (`machine:path` on one side)
    pub async fn scp(&self, from: &str, to: &str) -> Result<()> {
        run_attached(&self.dispatcher.copy(from, to)?).await
    }

    pub async fn mount(&self, machine_id: &str, remote: &str, local: &str) -> Result<()> {
        run_attached(&self.dispatcher.mount(machine_id, remote, local)?).await
    }

    pub async fn unmount(&self, local: &str) -> Result<()> {
        run_attached(&self.dispatcher.unmount(local)).await
    }
}
