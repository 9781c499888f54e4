//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{
    ActionCommand, CopyCommand, FollowCommand, JobCommand, LogsCommand, MachineCommand,
    MountCommand, UnmountCommand,
};
use std::ffi::OsString;
use std::path::PathBuf;

/// Run jobs on local and remote machines and follow their logs
#[derive(Debug, Parser, Clone)]
#[command(name = "orchid")]
#[command(version)]
#[command(about = "Run jobs on local and remote machines and follow their logs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Root directory holding setup.yaml, keys/, logs/ and logs.db
    #[arg(short, long, global = true)]
    pub path: Option<PathBuf>,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// List configured jobs
    Jobs,

    /// List configured actions
    Actions,

    /// List configured machines
    Machines,

    /// List configured scripts
    Scripts,

    /// List run records, oldest first
    Logs(LogsCommand),

    /// Start a job and stream its log until it ends
    Run(JobCommand),

    /// Execute an action attached to this terminal
    Exec(ActionCommand),

    /// Stream a log given its id or an id prefix
    Log(FollowCommand),

    /// Open an interactive session on a machine
    Ssh(MachineCommand),

    /// Copy files to or from a machine (machine:path on one side)
    Scp(CopyCommand),

    /// Mount a machine's directory locally with sshfs
    Mount(MountCommand),

    /// Unmount a directory mounted with `mount`
    #[command(name = "umount")]
    Unmount(UnmountCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
