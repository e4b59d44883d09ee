//! The remote operator and its filesystem operations.

use std::path::Path;

use futures::future::BoxFuture;
use remote_ops_core::{CommandOutput, RemoteCommand, RemoteSession, RunOptions};

use crate::{error::OperatorError, process::PollConfig};

/// Orchestrates maintenance operations over one remote session.
///
/// Holds exactly one session collaborator and is otherwise stateless; every
/// operation funnels through the session's `run`/`put` primitives and inspects
/// exit statuses itself rather than relying on errors for expected failures.
pub struct RemoteOperator<S> {
    pub(crate) session: S,
    pub(crate) options: RunOptions,
    pub(crate) poll: PollConfig,
}

impl<S: RemoteSession> RemoteOperator<S> {
    /// Create an operator over `session` with default options.
    #[must_use]
    pub fn new(session: S) -> Self {
        Self {
            session,
            options: RunOptions::default(),
            poll: PollConfig::default(),
        }
    }

    /// Override the base execution options applied to every command.
    #[must_use]
    pub fn with_run_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Override the poll bounds used by the process lifecycle operations.
    #[must_use]
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Access the underlying session.
    pub const fn session(&self) -> &S {
        &self.session
    }

    /// Ensure a directory exists at `remote_path`.
    ///
    /// Probes with `ls -l` first; a pre-existing directory is a no-op.
    /// Creation uses `mkdir -pv`, so missing parents are created as well.
    ///
    /// # Errors
    /// `Validation` if the path is empty, `CommandFailed` if creation fails.
    pub async fn ensure_dir(&self, remote_path: &str) -> Result<(), OperatorError> {
        Self::require_non_empty("remote_path", remote_path)?;

        let probe = self
            .run_tolerant(RemoteCommand::new("ls").arg("-l").arg(remote_path))
            .await?;
        if probe.succeeded() {
            return Ok(());
        }

        let created = self
            .run_tolerant(RemoteCommand::new("mkdir").arg("-pv").arg(remote_path))
            .await?;
        if created.failed() {
            return Err(OperatorError::CommandFailed {
                command: created.command,
            });
        }
        tracing::info!(command = %created.command, "Directory created");
        Ok(())
    }

    /// Back up `path_from` into the directory `path_to`, creating it first.
    ///
    /// The source must exist on the remote host; a missing source is an error
    /// rather than a skip, so a backup can never silently cover nothing.
    ///
    /// # Errors
    /// `Validation` for empty paths, `NotFound` if the source is absent,
    /// `CommandFailed` if directory creation or the copy fails.
    pub async fn backup(&self, path_from: &str, path_to: &str) -> Result<(), OperatorError> {
        Self::require_non_empty("path_from", path_from)?;
        Self::require_non_empty("path_to", path_to)?;

        let probe = self
            .run_tolerant(RemoteCommand::new("ls").arg("-l").arg(path_from))
            .await?;
        if probe.failed() {
            return Err(OperatorError::NotFound {
                command: probe.command,
            });
        }

        self.ensure_dir(path_to).await?;

        let copied = self
            .run_tolerant(
                RemoteCommand::new("cp")
                    .arg("-prv")
                    .arg(path_from)
                    .arg(path_to),
            )
            .await?;
        if copied.failed() {
            return Err(OperatorError::CommandFailed {
                command: copied.command,
            });
        }
        tracing::info!(command = %copied.command, "Backed up files");
        Ok(())
    }

    /// Mirror a local file or directory into the remote directory `remote_path`.
    ///
    /// The remote destination must already exist as a directory; it is not
    /// created here. A local directory is recreated under its own name on the
    /// host and its contents uploaded recursively; a local file is transferred
    /// under its own name. Empty directories are created but transfer nothing.
    ///
    /// # Errors
    /// `Validation` if the remote path is empty or the local path is not a
    /// file or directory, `NotADirectory` if the remote destination is
    /// missing, `Io` on local traversal failure, plus any transfer error.
    pub async fn upload(&self, local_path: &Path, remote_path: &str) -> Result<(), OperatorError> {
        Self::require_non_empty("remote_path", remote_path)?;
        if !local_path.is_dir() && !local_path.is_file() {
            return Err(OperatorError::Validation(format!(
                "local_path {} is not a file or directory",
                local_path.display()
            )));
        }

        let probe = self.probe_remote_dir(remote_path).await?;
        if probe.failed() {
            return Err(OperatorError::NotADirectory {
                command: probe.command,
            });
        }

        self.upload_entry(local_path, remote_path).await
    }

    // Recursion through a boxed future; entries nest arbitrarily deep.
    fn upload_entry<'a>(
        &'a self,
        local: &'a Path,
        remote_dir: &'a str,
    ) -> BoxFuture<'a, Result<(), OperatorError>> {
        Box::pin(async move {
            let name = local
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    OperatorError::Validation(format!(
                        "local path {} has no file name",
                        local.display()
                    ))
                })?;

            if local.is_dir() {
                let target = format!("{remote_dir}/{name}");
                self.ensure_dir(&target).await?;
                let mut entries = tokio::fs::read_dir(local).await?;
                while let Some(entry) = entries.next_entry().await? {
                    let path = entry.path();
                    self.upload_entry(&path, &target).await?;
                }
            } else {
                let remote_file = format!("{remote_dir}/{name}");
                let transfer = self.session.put(local, &remote_file).await?;
                tracing::info!(
                    local = %transfer.local.display(),
                    remote = %transfer.remote,
                    "Uploaded"
                );
            }
            Ok(())
        })
    }

    /// Run `command` with non-zero exits tolerated, so callers can branch on
    /// the exit status.
    pub(crate) async fn run_tolerant(
        &self,
        command: RemoteCommand,
    ) -> Result<CommandOutput, OperatorError> {
        let options = RunOptions {
            warn: true,
            ..self.options.clone()
        };
        Ok(self.session.run(&command, &options).await?)
    }

    /// Probe whether `path` exists as a directory on the remote host.
    pub(crate) async fn probe_remote_dir(
        &self,
        path: &str,
    ) -> Result<CommandOutput, OperatorError> {
        self.run_tolerant(RemoteCommand::new("test").arg("-d").arg(path))
            .await
    }

    pub(crate) fn require_non_empty(name: &str, value: &str) -> Result<(), OperatorError> {
        if value.is_empty() {
            return Err(OperatorError::Validation(format!(
                "{name} must not be empty"
            )));
        }
        Ok(())
    }
}
