//! Pipeline runner - executes a pipeline's steps in order into its log

use crate::{
    core::{LogRecord, OrchidError, Outcome, Pipeline, Result},
    dispatch::{Dispatcher, Launcher},
    logs::LogStore,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Runs pipelines step by step, fail-fast
///
/// Exactly one runner owns a given log id for the duration of its run.
pub struct PipelineRunner<L> {
    dispatcher: Dispatcher,
    store: Arc<LogStore>,
    launcher: L,
}

impl<L: Launcher> PipelineRunner<L> {
    pub fn new(dispatcher: Dispatcher, store: Arc<LogStore>, launcher: L) -> Self {
        Self {
            dispatcher,
            store,
            launcher,
        }
    }

    /// Execute the whole pipeline and finalize its log
    ///
    /// A failing step ends the run with status `Error` and is not an `Err`
    /// here: the status and the trailer are the record of the failure.
    /// `Err` is returned only when the log or its record cannot be
    /// written. Even then the log is closed with the error trailer when
    /// the file still accepts writes, so followers never wait forever.
    pub async fn run(&self, pipeline: &Pipeline) -> Result<LogRecord> {
        let log_id = pipeline.log_id.as_str();

        let result = match self.store.mark_running(log_id).await {
            Ok(_) => {
                info!(
                    "Starting run {} of job {} ({} steps)",
                    log_id,
                    pipeline.job_id,
                    pipeline.len()
                );
                self.run_steps(pipeline).await
            }
            Err(e) => Err(e),
        };

        let outcome = match &result {
            Ok(()) => Outcome::Finished,
            Err(e @ OrchidError::Storage(_)) => {
                error!("Run {} lost its log: {}", log_id, e);
                Outcome::Error
            }
            Err(e) => {
                warn!("Run {} failed: {}", log_id, e);
                Outcome::Error
            }
        };

        match self.store.finalize(log_id, outcome).await {
            Ok(record) => {
                info!("Run {} ended as {}", log_id, record.status);
                match result {
                    Err(e @ OrchidError::Storage(_)) => Err(e),
                    _ => Ok(record),
                }
            }
            Err(finalize_err) => {
                error!("Run {} could not be finalized: {}", log_id, finalize_err);
                if let Err(close_err) = self.store.close(log_id, Outcome::Error).await {
                    error!("Run {} could not be closed: {}", log_id, close_err);
                }
                match result {
                    Err(e @ OrchidError::Storage(_)) => Err(e),
                    _ => Err(finalize_err),
                }
            }
        }
    }

    async fn run_steps(&self, pipeline: &Pipeline) -> Result<()> {
        let total = pipeline.len();

        for (index, step) in pipeline.steps.iter().enumerate() {
            let invocation = self.dispatcher.dispatch_step(step)?;
            info!(
                "Run {} step {}/{} on {}: {}",
                pipeline.log_id,
                index + 1,
                total,
                step.machine,
                step.script
            );

            let mut process = self.launcher.spawn(&invocation).await?;
            while let Some(line) = process.next_line().await? {
                if let Err(e) = self.store.append(&pipeline.log_id, &line).await {
                    // The step must be gone before the run is finalized
                    if let Err(kill_err) = process.kill().await {
                        error!("Run {} could not stop {}: {}", pipeline.log_id, step.script, kill_err);
                    }
                    return Err(e);
                }
            }

            let code = process.wait().await?;
            debug!("Run {} step {} exited with {}", pipeline.log_id, step.script, code);
            if code != 0 {
                return Err(OrchidError::ExitStatus {
                    program: step.script.clone(),
                    code,
                });
            }
        }

        Ok(())
    }
}
