//! Command dispatch: decide where a command runs and build its invocation

pub mod invocation;
pub mod process;

pub use invocation::Invocation;
pub use process::{run_attached, Launcher, StepProcess, TokioLauncher};

use crate::core::{Machine, OrchidError, Registry, Result, Step, LOCAL_MACHINE};
use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Where a command executes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A process on this host
    Local,
    /// A command over ssh on a registered machine
    Remote(Machine),
}

/// Builds invocations for local and remote targets
///
/// Nothing is spawned here; callers decide how to wire the process streams.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    keys_dir: PathBuf,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, keys_dir: PathBuf) -> Self {
        Self { registry, keys_dir }
    }

    /// Resolve a machine id; `local` never touches the registry
    pub fn resolve_target(&self, machine_id: &str) -> Result<Target> {
        if machine_id == LOCAL_MACHINE {
            return Ok(Target::Local);
        }
        let machine = self.registry.machine(machine_id)?;
        Ok(Target::Remote(machine.clone()))
    }

    /// Invocation running `command args..` on the given machine
    ///
    /// Remote commands are joined with spaces and handed to the remote
    /// shell unescaped, so arguments with shell metacharacters are
    /// interpreted there.
    pub fn dispatch(&self, machine_id: &str, command: &str, args: &[String]) -> Result<Invocation> {
        let invocation = match self.resolve_target(machine_id)? {
            Target::Local => Invocation::new(command).args(args.iter().cloned()),
            Target::Remote(machine) => {
                let remote_command = std::iter::once(command)
                    .chain(args.iter().map(String::as_str))
                    .collect::<Vec<_>>()
                    .join(" ");
                invocation::ssh(&machine, &self.key_path(&machine), Some(&remote_command))
            }
        };
        debug!("Dispatching on {}: {}", machine_id, invocation);
        Ok(invocation)
    }

    /// Invocation for one pipeline step
    pub fn dispatch_step(&self, step: &Step) -> Result<Invocation> {
        self.dispatch(&step.machine, &step.script, &step.args)
    }

    /// Interactive login session; `local` opens the user's shell
    pub fn session(&self, machine_id: &str) -> Result<Invocation> {
        match self.resolve_target(machine_id)? {
            Target::Local => {
                let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
                Ok(Invocation::new(shell))
            }
            Target::Remote(machine) => Ok(invocation::ssh(&machine, &self.key_path(&machine), None)),
        }
    }

    /// Recursive copy between this host and one registered machine
    ///
    /// Exactly one of `from` and `to` must be written as `machine:path`.
    pub fn copy(&self, from: &str, to: &str) -> Result<Invocation> {
        let (machine_id, from, to) = match (split_remote(from)?, split_remote(to)?) {
            (None, Some((machine_id, path))) => (machine_id, Side::Local(from), Side::Remote(path)),
            (Some((machine_id, path)), None) => (machine_id, Side::Remote(path), Side::Local(to)),
            _ => {
                return Err(OrchidError::InvalidArgument(format!(
                    "Exactly one of '{}' and '{}' must be prefixed with a machine id",
                    from, to
                )))
            }
        };

        let machine = self.registry.machine(machine_id)?;
        let key = self.key_path(machine);
        Ok(invocation::scp(
            machine,
            &key,
            &from.render(machine),
            &to.render(machine),
        ))
    }

    /// Mount a remote directory locally over sshfs
    pub fn mount(&self, machine_id: &str, remote: &str, local: &str) -> Result<Invocation> {
        let machine = self.registry.machine(machine_id)?;
        Ok(invocation::sshfs(machine, &self.key_path(machine), remote, local))
    }

    /// Unmount a previous sshfs mount
    pub fn unmount(&self, local: &str) -> Invocation {
        invocation::fusermount(local)
    }

    fn key_path(&self, machine: &Machine) -> PathBuf {
        self.keys_dir.join(&machine.private_key)
    }
}

enum Side<'a> {
    Local(&'a str),
    Remote(&'a str),
}

impl Side<'_> {
    fn render(&self, machine: &Machine) -> String {
        match self {
            Side::Local(path) => path.to_string(),
            Side::Remote(path) => invocation::remote_path(machine, path),
        }
    }
}

const REMOTE_PATH: &str = r"^([A-Za-z0-9_.-]+):(.*)$";

/// Split `machine:path`; plain local paths yield `None`
fn split_remote(spec: &str) -> Result<Option<(&str, &str)>> {
    let re = Regex::new(REMOTE_PATH)
        .map_err(|e| OrchidError::InvalidArgument(format!("Bad remote path pattern: {}", e)))?;
    Ok(re.captures(spec).and_then(|caps| {
        let machine = caps.get(1)?.as_str();
        let path = caps.get(2)?.as_str();
        Some((machine, path))
    }))
}
