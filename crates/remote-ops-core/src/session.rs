//! The remote session collaborator boundary.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    command::{CommandError, RemoteCommand},
    options::RunOptions,
};

/// Result of one remote command execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutput {
    /// The rendered command line that was executed.
    pub command: String,
    /// Process exit status.
    pub exit_status: i32,
    /// Captured standard output.
    pub stdout: String,
}

impl CommandOutput {
    /// Build a successful output.
    #[must_use]
    pub fn success(command: impl Into<String>, stdout: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            exit_status: 0,
            stdout: stdout.into(),
        }
    }

    /// Build a failed output with empty stdout.
    #[must_use]
    pub fn failure(command: impl Into<String>, exit_status: i32) -> Self {
        Self {
            command: command.into(),
            exit_status,
            stdout: String::new(),
        }
    }

    /// Whether the command exited with status zero.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.exit_status == 0
    }

    /// Whether the command exited with a non-zero status.
    #[must_use]
    pub const fn failed(&self) -> bool {
        !self.succeeded()
    }
}

/// Result of one file transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    /// Local source path.
    pub local: PathBuf,
    /// Remote destination path.
    pub remote: String,
}

/// Session error.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A command exited non-zero while `warn` was not set.
    #[error("Command failed with status {exit_status}: {command}")]
    CommandFailed { command: String, exit_status: i32 },
    /// A command exceeded the configured timeout.
    #[error("Command timed out: {command}")]
    TimedOut { command: String },
    /// Connection or subprocess failure.
    #[error("Transport error: {0}")]
    Transport(String),
    /// A command could not be rendered.
    #[error("Command build error: {0}")]
    Command(#[from] CommandError),
    /// Local I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for remote session collaborators.
///
/// Implementations hold the connection state; this workspace only orchestrates
/// around them. `run` must honor `RunOptions::warn`: with `warn` set, a
/// non-zero exit is reported in the returned `CommandOutput`, not as an error.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Execute a command on the remote host.
    async fn run(
        &self,
        command: &RemoteCommand,
        options: &RunOptions,
    ) -> Result<CommandOutput, SessionError>;

    /// Transfer a single local file to the full remote path `remote`.
    async fn put(&self, local: &Path, remote: &str) -> Result<Transfer, SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_and_failure_statuses() {
        assert!(CommandOutput::success("ls -l /tmp", "").succeeded());
        let failed = CommandOutput::failure("mkdir -pv /opt", 2);
        assert!(failed.failed());
        assert_eq!(failed.exit_status, 2);
    }

    #[test]
    fn output_serializes_with_command_line() {
        let output = CommandOutput::success("ls -l /tmp", "total 0");
        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("ls -l /tmp"));

        let parsed: CommandOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.stdout, "total 0");
    }
}
