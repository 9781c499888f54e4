//! Core domain models for orchid
//!
//! This module defines the setup entries (machines, actions, jobs), the
//! run records and the pipeline value that binds a job to one run.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod settings;
pub mod state;

pub use config::{Action, Job, Machine, Setup, Step, LOCAL_MACHINE};
pub use error::{EntryKind, OrchidError, Result};
pub use pipeline::Pipeline;
pub use registry::Registry;
pub use settings::OrchidConfig;
pub use state::*;
