//! Scoped crontab suspension.

use std::future::Future;

use remote_ops_core::{RemoteCommand, RemoteSession};

use crate::{error::OperatorError, operator::RemoteOperator};

/// Scratch file installed as the empty crontab.
const EMPTY_CRONTAB_FILE: &str = "crontab.empty";

impl<S: RemoteSession> RemoteOperator<S> {
    /// Suspend the crontab around `work`, restoring it on every exit path.
    ///
    /// The current crontab is saved to `<workspace>/<save_filename>`, an empty
    /// crontab is installed, and `work` is awaited. Whether `work` succeeds or
    /// fails, the saved crontab is reinstalled afterwards; a restoration
    /// failure takes precedence over the work's own error.
    ///
    /// # Errors
    /// `Validation` for empty arguments, `NotADirectory` if the workspace is
    /// missing, `CommandFailed` if saving or installing a crontab fails, plus
    /// whatever `work` itself returns.
    pub async fn with_crontab_disabled<F, Fut, T>(
        &self,
        workspace: &str,
        save_filename: &str,
        work: F,
    ) -> Result<T, OperatorError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, OperatorError>>,
    {
        Self::require_non_empty("workspace", workspace)?;
        Self::require_non_empty("save_filename", save_filename)?;

        let probe = self.probe_remote_dir(workspace).await?;
        if probe.failed() {
            return Err(OperatorError::NotADirectory {
                command: probe.command,
            });
        }

        let save_path = format!("{workspace}/{save_filename}");
        let saved = self
            .run_tolerant(
                RemoteCommand::new("crontab")
                    .arg("-l")
                    .stdout_to(save_path.as_str()),
            )
            .await?;
        if saved.failed() {
            return Err(OperatorError::CommandFailed {
                command: saved.command,
            });
        }
        tracing::info!(command = %saved.command, "Saved original crontab");

        // A stale scratch from an earlier run may or may not exist.
        let scratch = format!("{workspace}/{EMPTY_CRONTAB_FILE}");
        let removed = self
            .run_tolerant(RemoteCommand::new("rm").arg(scratch.as_str()))
            .await?;
        if removed.failed() {
            tracing::warn!(command = %removed.command, "Could not remove stale scratch file");
        }

        let touched = self
            .run_tolerant(RemoteCommand::new("touch").arg(scratch.as_str()))
            .await?;
        if touched.failed() {
            return Err(OperatorError::CommandFailed {
                command: touched.command,
            });
        }

        let installed = self
            .run_tolerant(RemoteCommand::new("crontab").arg(scratch.as_str()))
            .await?;
        if installed.failed() {
            return Err(OperatorError::CommandFailed {
                command: installed.command,
            });
        }
        tracing::info!(command = %installed.command, "Disabled crontab");

        let result = work().await;

        // Restore runs regardless of how the work went.
        self.enable_crontab(&save_path).await?;
        result
    }

    /// Reinstall the crontab saved at `file_path`.
    ///
    /// # Errors
    /// `Validation` for an empty path, `NotFound` if the file is missing on
    /// the host, `CommandFailed` if installation fails.
    pub async fn enable_crontab(&self, file_path: &str) -> Result<(), OperatorError> {
        Self::require_non_empty("file_path", file_path)?;

        let probe = self
            .run_tolerant(RemoteCommand::new("ls").arg("-l").arg(file_path))
            .await?;
        if probe.failed() {
            return Err(OperatorError::NotFound {
                command: probe.command,
            });
        }

        let installed = self
            .run_tolerant(RemoteCommand::new("crontab").arg(file_path))
            .await?;
        if installed.failed() {
            return Err(OperatorError::CommandFailed {
                command: installed.command,
            });
        }
        tracing::info!(command = %installed.command, "Enabled crontab");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use remote_ops_core::ScriptedSession;

    use super::*;

    fn operator() -> RemoteOperator<ScriptedSession> {
        RemoteOperator::new(ScriptedSession::new())
    }

    fn exact_count(commands: &[String], line: &str) -> usize {
        commands.iter().filter(|c| c.as_str() == line).count()
    }

    #[tokio::test]
    async fn empty_arguments_are_rejected_before_any_remote_call() {
        let op = operator();

        let err = op
            .with_crontab_disabled("", "save.txt", || async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, OperatorError::Validation(_)));

        let err = op
            .with_crontab_disabled("/ws", "", || async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, OperatorError::Validation(_)));

        let err = op.enable_crontab("").await.unwrap_err();
        assert!(matches!(err, OperatorError::Validation(_)));

        assert!(op.session().commands().is_empty());
    }

    #[tokio::test]
    async fn suspension_runs_the_full_sequence() {
        let op = operator();

        let value = op
            .with_crontab_disabled("/ws", "save.txt", || async { Ok(42) })
            .await
            .unwrap();
        assert_eq!(value, 42);

        assert_eq!(
            op.session().commands(),
            vec![
                "test -d /ws",
                "crontab -l > /ws/save.txt",
                "rm /ws/crontab.empty",
                "touch /ws/crontab.empty",
                "crontab /ws/crontab.empty",
                "ls -l /ws/save.txt",
                "crontab /ws/save.txt",
            ]
        );
    }

    #[tokio::test]
    async fn failing_work_still_restores_exactly_once() {
        let op = operator();

        let err = op
            .with_crontab_disabled("/ws", "save.txt", || async {
                Err::<(), _>(OperatorError::Validation("work failed".into()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, OperatorError::Validation(_)));
        let commands = op.session().commands();
        assert_eq!(exact_count(&commands, "crontab /ws/save.txt"), 1);
    }

    #[tokio::test]
    async fn restoration_failure_takes_precedence() {
        let op = operator();
        op.session().fail_matching("crontab /ws/save.txt");

        let err = op
            .with_crontab_disabled("/ws", "save.txt", || async { Ok(()) })
            .await
            .unwrap_err();

        match err {
            OperatorError::CommandFailed { command } => {
                assert_eq!(command, "crontab /ws/save.txt");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_workspace_stops_before_touching_crontab() {
        let op = operator();
        op.session().fail_matching("test -d /ws");

        let err = op
            .with_crontab_disabled("/ws", "save.txt", || async { Ok(()) })
            .await
            .unwrap_err();

        assert!(matches!(err, OperatorError::NotADirectory { .. }));
        assert_eq!(op.session().command_count("crontab"), 0);
    }

    #[tokio::test]
    async fn stale_scratch_removal_failure_is_tolerated() {
        let op = operator();
        op.session().fail_matching("rm /ws/crontab.empty");

        let value = op
            .with_crontab_disabled("/ws", "save.txt", || async { Ok("done") })
            .await
            .unwrap();

        assert_eq!(value, "done");
        let commands = op.session().commands();
        assert_eq!(exact_count(&commands, "crontab /ws/crontab.empty"), 1);
        assert_eq!(exact_count(&commands, "crontab /ws/save.txt"), 1);
    }

    #[tokio::test]
    async fn enable_crontab_requires_the_saved_file() {
        let op = operator();
        op.session().fail_matching("ls -l /ws/save.txt");

        let err = op.enable_crontab("/ws/save.txt").await.unwrap_err();
        assert!(matches!(err, OperatorError::NotFound { .. }));
        assert_eq!(op.session().command_count("crontab"), 0);
    }
}
