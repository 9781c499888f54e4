//! Read-only lookup of jobs, actions and machines

use crate::core::config::{Action, Job, Machine, Setup};
use crate::core::error::{EntryKind, OrchidError, Result};

/// Registry of everything a setup file declares
///
/// Never mutated after construction, so it can be shared across runs
/// behind an `Arc` without locking.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    setup: Setup,
}

impl Registry {
    pub fn new(setup: Setup) -> Self {
        Self { setup }
    }

    pub fn job(&self, id: &str) -> Result<&Job> {
        self.setup
            .jobs
            .iter()
            .find(|j| j.id == id)
            .ok_or_else(|| OrchidError::lookup(EntryKind::Job, id))
    }

    pub fn action(&self, id: &str) -> Result<&Action> {
        self.setup
            .actions
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| OrchidError::lookup(EntryKind::Action, id))
    }

    pub fn machine(&self, id: &str) -> Result<&Machine> {
        self.setup
            .machines
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| OrchidError::lookup(EntryKind::Machine, id))
    }

    pub fn jobs(&self) -> &[Job] {
        &self.setup.jobs
    }

    pub fn actions(&self) -> &[Action] {
        &self.setup.actions
    }

    pub fn machines(&self) -> &[Machine] {
        &self.setup.machines
    }

    pub fn scripts(&self) -> &[String] {
        &self.setup.scripts
    }
}

impl From<Setup> for Registry {
    fn from(setup: Setup) -> Self {
        Self::new(setup)
    }
}
