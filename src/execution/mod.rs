//! Pipeline execution: the step runner and the orchestrator around it

pub mod orchestrator;
pub mod runner;

pub use orchestrator::{Orchestrator, RunHandle};
pub use runner::PipelineRunner;
