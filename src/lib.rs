//! orchid - run jobs on local and remote machines, with a log per run

pub mod cli;
pub mod core;
pub mod dispatch;
pub mod execution;
pub mod logs;
pub mod persistence;

// Re-export commonly used types
pub use core::{LogRecord, OrchidConfig, OrchidError, Outcome, Pipeline, Registry, RunStatus, Setup};
pub use dispatch::{Dispatcher, Invocation, Launcher, StepProcess, TokioLauncher};
pub use execution::{Orchestrator, PipelineRunner, RunHandle};
pub use logs::{LogStore, LogTailer};
