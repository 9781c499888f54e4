//! Setup file (machines, actions, jobs, scripts) loaded from YAML

use crate::core::error::{OrchidError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Machine id that always means "run on this host"
pub const LOCAL_MACHINE: &str = "local";

/// An SSH-reachable host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub id: String,
    pub user: String,
    pub address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// File name of the identity, resolved inside the keys directory
    #[serde(rename = "privateKey")]
    pub private_key: String,
}

fn default_port() -> u16 {
    22
}

/// A single ad-hoc command bound to one machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub machine: String,
    pub command: String,
}

/// One element of a job pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub machine: String,
    pub script: String,

    #[serde(default)]
    pub args: Vec<String>,
}

impl Step {
    pub fn new(machine: &str, script: &str, args: &[&str]) -> Self {
        Self {
            machine: machine.to_string(),
            script: script.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn is_local(&self) -> bool {
        self.machine == LOCAL_MACHINE
    }
}

/// A named, ordered sequence of steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,

    #[serde(default)]
    pub pipeline: Vec<Step>,
}

/// Top-level setup file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Setup {
    #[serde(default)]
    pub machines: Vec<Machine>,

    #[serde(default)]
    pub actions: Vec<Action>,

    #[serde(default)]
    pub jobs: Vec<Job>,

    #[serde(default)]
    pub scripts: Vec<String>,
}

impl Setup {
    /// Load the setup from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            OrchidError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse the setup from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let setup: Setup = serde_yaml::from_str(yaml)?;
        setup.validate()?;
        Ok(setup)
    }

    /// Validate id uniqueness and the reserved machine id
    pub fn validate(&self) -> Result<()> {
        check_unique("machine", self.machines.iter().map(|m| &m.id))?;
        check_unique("action", self.actions.iter().map(|a| &a.id))?;
        check_unique("job", self.jobs.iter().map(|j| &j.id))?;

        if self.machines.iter().any(|m| m.id == LOCAL_MACHINE) {
            return Err(OrchidError::Config(format!(
                "Machine id '{}' is reserved",
                LOCAL_MACHINE
            )));
        }

        Ok(())
    }
}

fn check_unique<'a>(kind: &str, ids: impl Iterator<Item = &'a String>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(OrchidError::Config(format!("Duplicate {} id: {}", kind, id)));
        }
    }
    Ok(())
}
