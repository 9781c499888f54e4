//! CLI command definitions

use clap::Args;

/// List run records
#[derive(Debug, Args, Clone)]
pub struct LogsCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Start a job
#[derive(Debug, Args, Clone)]
pub struct JobCommand {
    /// Job id from setup.yaml
    pub job: String,
}

/// Execute an action
#[derive(Debug, Args, Clone)]
pub struct ActionCommand {
    /// Action id from setup.yaml
    pub action: String,
}

/// Follow a log
#[derive(Debug, Args, Clone)]
pub struct FollowCommand {
    /// Full log id or a prefix of one
    pub id: String,
}

/// Target a machine
#[derive(Debug, Args, Clone)]
pub struct MachineCommand {
    /// Machine id from setup.yaml
    pub machine: String,
}

/// Copy between this host and a machine
#[derive(Debug, Args, Clone)]
pub struct CopyCommand {
    pub from: String,

    pub to: String,
}

/// Mount a remote directory
#[derive(Debug, Args, Clone)]
pub struct MountCommand {
    pub machine: String,

    /// Directory on the machine
    pub remote: String,

    /// Local mount point
    pub local: String,
}

/// Unmount a local mount point
#[derive(Debug, Args, Clone)]
pub struct UnmountCommand {
    pub local: String,
}
