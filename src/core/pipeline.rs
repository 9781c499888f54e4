//! Pipeline domain model

use crate::core::{
    config::{Step, LOCAL_MACHINE},
    error::Result,
    registry::Registry,
};
use crate::logs::LogStore;
use tracing::info;

/// A job's steps bound to the log of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub job_id: String,

    /// Id of the log record this run writes to
    pub log_id: String,

    /// Steps in declaration order
    pub steps: Vec<Step>,
}

impl Pipeline {
    /// Look up the job, check its machines and create the run's log record
    ///
    /// Every lookup happens before the record is created, so an unknown job
    /// or machine leaves no record and no log file behind.
    pub async fn build(registry: &Registry, store: &LogStore, job_id: &str) -> Result<Self> {
        let job = registry.job(job_id)?;

        for step in &job.pipeline {
            if step.machine != LOCAL_MACHINE {
                registry.machine(&step.machine)?;
            }
        }

        let record = store.create(job_id).await?;
        info!(
            "Built pipeline for job {} ({} steps) as log {}",
            job_id,
            job.pipeline.len(),
            record.id
        );

        Ok(Pipeline {
            job_id: job.id.clone(),
            log_id: record.id,
            steps: job.pipeline.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
