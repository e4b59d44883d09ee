//! Kill-file driven process lifecycle.

use std::time::Duration;

use remote_ops_core::{RemoteCommand, RemoteSession, RunOptions};
use serde::{Deserialize, Serialize};
use tokio::time::{Instant, sleep};

use crate::{error::OperatorError, operator::RemoteOperator};

/// Bounds for the process start/stop confirmation loops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between consecutive probes.
    pub interval: Duration,
    /// Total time allowed before giving up.
    pub deadline: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            deadline: Duration::from_secs(60),
        }
    }
}

impl<S: RemoteSession> RemoteOperator<S> {
    /// Stop an application that watches for a kill file.
    ///
    /// A no-op when no matching process is running. Otherwise the kill file is
    /// created and the process listing re-probed until the process is gone or
    /// the poll deadline elapses.
    ///
    /// # Errors
    /// `Validation` for empty arguments, `CommandFailed` if the kill file
    /// cannot be created, `Timeout` if the process outlives the deadline.
    pub async fn stop_process_with_kill_file(
        &self,
        kill_file_path: &str,
        process_name_pattern: &str,
    ) -> Result<(), OperatorError> {
        Self::require_non_empty("kill_file_path", kill_file_path)?;
        Self::require_non_empty("process_name_pattern", process_name_pattern)?;

        if !self.process_running(process_name_pattern).await? {
            tracing::debug!(
                pattern = process_name_pattern,
                "Application is not running, skip stopping"
            );
            return Ok(());
        }

        let touched = self
            .run_tolerant(RemoteCommand::new("touch").arg(kill_file_path))
            .await?;
        if touched.failed() {
            return Err(OperatorError::CommandFailed {
                command: touched.command,
            });
        }

        let deadline = Instant::now() + self.poll.deadline;
        loop {
            if Instant::now() >= deadline {
                return Err(OperatorError::Timeout {
                    goal: "stopped",
                    limit: self.poll.deadline,
                });
            }
            if !self.process_running(process_name_pattern).await? {
                tracing::info!(
                    pattern = process_name_pattern,
                    "Confirmed that the application has stopped"
                );
                return Ok(());
            }
            sleep(self.poll.interval).await;
        }
    }

    /// Start an application that watches for a kill file.
    ///
    /// A no-op when a matching process is already running. Any leftover kill
    /// file is removed, the startup script launched detached, and the process
    /// listing re-probed until the process appears or the poll deadline
    /// elapses.
    ///
    /// # Errors
    /// `Validation` for empty arguments, `CommandFailed` if kill-file removal
    /// or the launch fails, `Timeout` if the process never appears.
    pub async fn start_process_with_kill_file(
        &self,
        kill_file_path: &str,
        process_name_pattern: &str,
        exec_file_path: &str,
    ) -> Result<(), OperatorError> {
        Self::require_non_empty("kill_file_path", kill_file_path)?;
        Self::require_non_empty("process_name_pattern", process_name_pattern)?;
        Self::require_non_empty("exec_file_path", exec_file_path)?;

        if self.process_running(process_name_pattern).await? {
            tracing::debug!(
                pattern = process_name_pattern,
                "Application is already running, skip starting"
            );
            return Ok(());
        }

        let kill_file = self
            .run_tolerant(RemoteCommand::new("ls").arg("-l").arg(kill_file_path))
            .await?;
        if kill_file.succeeded() {
            let removed = self
                .run_tolerant(RemoteCommand::new("rm").arg("-v").arg(kill_file_path))
                .await?;
            if removed.failed() {
                return Err(OperatorError::CommandFailed {
                    command: removed.command,
                });
            }
        } else {
            tracing::debug!(path = kill_file_path, "Kill file does not exist, skip removing");
        }

        // The startup script keeps running after this command returns.
        let launch = RemoteCommand::new("sh").arg(exec_file_path).detached();
        let options = RunOptions {
            warn: true,
            pty: true,
            ..self.options.clone()
        };
        let started = self.session.run(&launch, &options).await?;
        if started.failed() {
            return Err(OperatorError::CommandFailed {
                command: started.command,
            });
        }
        tracing::info!(command = %started.command, "Starting the application");

        let deadline = Instant::now() + self.poll.deadline;
        loop {
            if Instant::now() >= deadline {
                return Err(OperatorError::Timeout {
                    goal: "started",
                    limit: self.poll.deadline,
                });
            }
            if self.process_running(process_name_pattern).await? {
                tracing::info!(
                    pattern = process_name_pattern,
                    "Confirmed that the application has started"
                );
                return Ok(());
            }
            tracing::debug!("Waiting for the application to start");
            sleep(self.poll.interval).await;
        }
    }

    /// Whether a process matching `pattern` shows up in the process listing.
    async fn process_running(&self, pattern: &str) -> Result<bool, OperatorError> {
        let probe = self
            .run_tolerant(
                RemoteCommand::new("ps")
                    .arg("-ef")
                    .pipe(RemoteCommand::new("grep").arg(pattern))
                    .pipe(RemoteCommand::new("grep").arg("-v").arg("grep")),
            )
            .await?;
        Ok(probe.succeeded())
    }
}
