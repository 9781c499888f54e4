//! Runtime settings: where orchid keeps its keys, logs and records

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Runtime configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchidConfig {
    /// Root directory holding `setup.yaml`, `keys/` and `logs/`
    pub root: PathBuf,

    /// How long a tailer sleeps when it reaches the current end of a log
    pub poll_interval: Duration,
}

impl Default for OrchidConfig {
    fn default() -> Self {
        let root = dirs::home_dir()
            .map(|home| home.join(".orchid"))
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            root,
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl OrchidConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn keys_dir(&self) -> PathBuf {
        self.root.join("keys")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn setup_path(&self) -> PathBuf {
        self.root.join("setup.yaml")
    }

    pub fn records_db_path(&self) -> PathBuf {
        self.root.join("logs.db")
    }

    /// Identity file for a machine's private key name
    pub fn key_path(&self, private_key: &str) -> PathBuf {
        self.keys_dir().join(private_key)
    }
}
