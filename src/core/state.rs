//! Run state models

use crate::core::error::{OrchidError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Trailer line closing a successful run log
pub const FINISHED_TRAILER: &str = "-----Finished-----";

/// Trailer line closing a failed run log
pub const ERROR_TRAILER: &str = "-----Error-----";

/// Whether a line is one of the reserved trailer lines
pub fn is_trailer(line: &str) -> bool {
    line == FINISHED_TRAILER || line == ERROR_TRAILER
}

/// Overall run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Record created, runner not started yet
    Pending,
    /// Steps are executing
    Running,
    /// All steps exited with status zero
    Finished,
    /// A step failed or the log became unwritable
    Error,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "Pending",
            RunStatus::Running => "Running",
            RunStatus::Finished => "Finished",
            RunStatus::Error => "Error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Finished | RunStatus::Error)
    }

    /// Transitions only move forward: Pending -> Running -> Finished | Error
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        matches!(
            (self, next),
            (RunStatus::Pending, RunStatus::Running)
                | (RunStatus::Running, RunStatus::Finished)
                | (RunStatus::Running, RunStatus::Error)
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = OrchidError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Pending" => Ok(RunStatus::Pending),
            "Running" => Ok(RunStatus::Running),
            "Finished" => Ok(RunStatus::Finished),
            "Error" => Ok(RunStatus::Error),
            other => Err(OrchidError::Storage(format!("Unknown run status '{}'", other))),
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Finished,
    Error,
}

impl Outcome {
    pub fn trailer(&self) -> &'static str {
        match self {
            Outcome::Finished => FINISHED_TRAILER,
            Outcome::Error => ERROR_TRAILER,
        }
    }

    pub fn status(&self) -> RunStatus {
        match self {
            Outcome::Finished => RunStatus::Finished,
            Outcome::Error => RunStatus::Error,
        }
    }
}

/// Persisted record of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Unique run id, also the log file name
    pub id: String,

    pub job_id: String,

    pub status: RunStatus,

    /// Set when the runner picks the run up
    pub start_time: Option<DateTime<Utc>>,

    /// Set once the run reaches a terminal status
    pub end_time: Option<DateTime<Utc>>,
}

impl LogRecord {
    /// Create a pending record with a fresh id
    pub fn new(job_id: &str) -> Self {
        Self {
            id: new_log_id(),
            job_id: job_id.to_string(),
            status: RunStatus::Pending,
            start_time: None,
            end_time: None,
        }
    }

    /// Mark the run as started
    pub fn start(&mut self) -> Result<()> {
        self.transition(RunStatus::Running)?;
        self.start_time = Some(Utc::now());
        Ok(())
    }

    /// Mark the run as ended with the given outcome
    pub fn finish(&mut self, outcome: Outcome) -> Result<()> {
        self.transition(outcome.status())?;
        self.end_time = Some(Utc::now());
        Ok(())
    }

    fn transition(&mut self, next: RunStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(OrchidError::Storage(format!(
                "Log {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }
}

/// 32 lowercase hex characters
pub fn new_log_id() -> String {
    Uuid::new_v4().simple().to_string()
}
