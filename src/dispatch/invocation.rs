//! Structured process invocations for local commands and the ssh tool family

use crate::core::Machine;
use std::fmt;
use std::path::Path;

const NO_HOST_KEY_CHECK: &str = "StrictHostKeyChecking no";
const BATCH_MODE: &str = "BatchMode yes";

/// A program plus its argument vector, ready to be executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Build a tokio command; stdio wiring is left to the caller
    pub fn command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

fn ssh_options(invocation: Invocation) -> Invocation {
    invocation
        .arg("-o")
        .arg(NO_HOST_KEY_CHECK)
        .arg("-o")
        .arg(BATCH_MODE)
}

fn user_at_host(machine: &Machine) -> String {
    format!("{}@{}", machine.user, machine.address)
}

/// `ssh -tt -o .. -o .. user@host -p port -i key [command]`
///
/// The remote command travels as one argument and is interpreted by the
/// remote login shell. It is not escaped.
pub fn ssh(machine: &Machine, key: &Path, command: Option<&str>) -> Invocation {
    let invocation = ssh_options(Invocation::new("ssh").arg("-tt"))
        .arg(user_at_host(machine))
        .arg("-p")
        .arg(machine.port.to_string())
        .arg("-i")
        .arg(key.display().to_string());

    match command {
        Some(command) => invocation.arg(command),
        None => invocation,
    }
}

/// `scp -o .. -o .. -i key -P port -r from to`
pub fn scp(machine: &Machine, key: &Path, from: &str, to: &str) -> Invocation {
    ssh_options(Invocation::new("scp"))
        .arg("-i")
        .arg(key.display().to_string())
        .arg("-P")
        .arg(machine.port.to_string())
        .arg("-r")
        .arg(from)
        .arg(to)
}

/// `user@host:path` as scp and sshfs expect it
pub fn remote_path(machine: &Machine, path: &str) -> String {
    format!("{}:{}", user_at_host(machine), path)
}

/// `sshfs user@host:remote local -p port -o IdentityFile=key -o sshfs_sync`
pub fn sshfs(machine: &Machine, key: &Path, remote: &str, local: &str) -> Invocation {
    Invocation::new("sshfs")
        .arg(remote_path(machine, remote))
        .arg(local)
        .arg("-p")
        .arg(machine.port.to_string())
        .arg("-o")
        .arg(format!("IdentityFile={}", key.display()))
        .arg("-o")
        .arg("sshfs_sync")
}

/// `fusermount -u local`
pub fn fusermount(local: &str) -> Invocation {
    Invocation::new("fusermount").arg("-u").arg(local)
}
