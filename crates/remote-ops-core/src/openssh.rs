//! Session backed by the system OpenSSH client.

use std::{path::Path, process::Stdio};

use async_trait::async_trait;
use tokio::process::Command;

use crate::{
    command::RemoteCommand,
    options::RunOptions,
    session::{CommandOutput, RemoteSession, SessionError, Transfer},
};

/// Remote session that shells out to `ssh` and `scp`.
///
/// Uses the OS-provided OpenSSH client binaries resolved from PATH; no SSH
/// protocol is implemented here. Authentication relies on the user's existing
/// SSH configuration (keys, agent, config aliases).
#[derive(Debug, Clone)]
pub struct OpenSshSession {
    destination: String,
    ssh_program: String,
    scp_program: String,
}

impl OpenSshSession {
    /// Create a session for `destination` (`user@host` or an ssh config alias).
    ///
    /// # Errors
    /// Returns an error if the `ssh` or `scp` binary cannot be found.
    pub fn new(destination: impl Into<String>) -> Result<Self, SessionError> {
        Ok(Self {
            destination: destination.into(),
            ssh_program: resolve_program("ssh")?,
            scp_program: resolve_program("scp")?,
        })
    }

    /// The configured destination.
    #[must_use]
    pub fn destination(&self) -> &str {
        &self.destination
    }
}

fn resolve_program(name: &str) -> Result<String, SessionError> {
    which::which(name)
        .map(|p| p.to_string_lossy().into_owned())
        .map_err(|_| SessionError::Transport(format!("{name} binary not found on PATH")))
}

#[async_trait]
impl RemoteSession for OpenSshSession {
    async fn run(
        &self,
        command: &RemoteCommand,
        options: &RunOptions,
    ) -> Result<CommandOutput, SessionError> {
        let line = command.render()?;

        let mut cmd = Command::new(&self.ssh_program);
        if options.pty {
            cmd.arg("-tt");
        }
        cmd.arg(&self.destination)
            .arg(&line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(destination = %self.destination, command = %line, "Running remote command");
        let child = cmd.spawn()?;
        let output = match options.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| SessionError::TimedOut {
                    command: line.clone(),
                })??,
            None => child.wait_with_output().await?,
        };

        let exit_status = output.status.code().unwrap_or(-1);
        if exit_status != 0 && !options.warn {
            return Err(SessionError::CommandFailed {
                command: line,
                exit_status,
            });
        }
        Ok(CommandOutput {
            command: line,
            exit_status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }

    async fn put(&self, local: &Path, remote: &str) -> Result<Transfer, SessionError> {
        let target = format!("{}:{remote}", self.destination);
        let output = Command::new(&self.scp_program)
            .arg("-q")
            .arg(local)
            .arg(&target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(SessionError::Transport(format!(
                "scp {} -> {target} failed: {}",
                local.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(Transfer {
            local: local.to_path_buf(),
            remote: remote.to_string(),
        })
    }
}
