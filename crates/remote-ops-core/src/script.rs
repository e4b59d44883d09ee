//! Scripted in-memory session.

use std::{path::Path, sync::Mutex};

use async_trait::async_trait;

use crate::{
    command::RemoteCommand,
    options::RunOptions,
    session::{CommandOutput, RemoteSession, SessionError, Transfer},
};

/// Canned outcome for commands containing a substring. First match wins;
/// exhausted limited rules are skipped.
#[derive(Debug)]
struct Rule {
    needle: String,
    exit_status: i32,
    stdout: String,
    remaining: Option<usize>,
}

/// In-memory session implementation.
///
/// Replays configured outcomes instead of reaching a real host, and records
/// every command and transfer it sees. Useful for development and tests.
/// Commands succeed with empty output unless a matching rule says otherwise.
#[derive(Debug, Default)]
pub struct ScriptedSession {
    rules: Mutex<Vec<Rule>>,
    commands: Mutex<Vec<String>>,
    transfers: Mutex<Vec<Transfer>>,
}

impl ScriptedSession {
    /// Create a session where every command succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every command containing `needle` fail.
    pub fn fail_matching(&self, needle: impl Into<String>) {
        self.push_rule(needle.into(), 1, String::new(), None);
    }

    /// Make the next `times` commands containing `needle` fail.
    pub fn fail_matching_times(&self, needle: impl Into<String>, times: usize) {
        self.push_rule(needle.into(), 1, String::new(), Some(times));
    }

    /// Make the next `times` commands containing `needle` succeed, shadowing
    /// any later rule for the same needle.
    pub fn succeed_matching_times(&self, needle: impl Into<String>, times: usize) {
        self.push_rule(needle.into(), 0, String::new(), Some(times));
    }

    /// Make every command containing `needle` succeed with `stdout`.
    pub fn stdout_matching(&self, needle: impl Into<String>, stdout: impl Into<String>) {
        self.push_rule(needle.into(), 0, stdout.into(), None);
    }

    /// Every command line executed so far, in order.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of executed commands containing `needle`.
    #[must_use]
    pub fn command_count(&self, needle: &str) -> usize {
        self.commands().iter().filter(|c| c.contains(needle)).count()
    }

    /// Every file transfer performed so far, in order.
    #[must_use]
    pub fn transfers(&self) -> Vec<Transfer> {
        self.transfers.lock().map(|t| t.clone()).unwrap_or_default()
    }

    fn push_rule(&self, needle: String, exit_status: i32, stdout: String, remaining: Option<usize>) {
        if let Ok(mut rules) = self.rules.lock() {
            rules.push(Rule {
                needle,
                exit_status,
                stdout,
                remaining,
            });
        }
    }

    fn outcome_for(&self, command: &str) -> (i32, String) {
        let Ok(mut rules) = self.rules.lock() else {
            return (0, String::new());
        };
        for rule in rules.iter_mut() {
            if !command.contains(&rule.needle) {
                continue;
            }
            match rule.remaining {
                Some(0) => continue,
                Some(ref mut n) => *n -= 1,
                None => {}
            }
            return (rule.exit_status, rule.stdout.clone());
        }
        (0, String::new())
    }
}

#[async_trait]
impl RemoteSession for ScriptedSession {
    async fn run(
        &self,
        command: &RemoteCommand,
        options: &RunOptions,
    ) -> Result<CommandOutput, SessionError> {
        let line = command.render()?;
        self.commands
            .lock()
            .map_err(|e| SessionError::Transport(e.to_string()))?
            .push(line.clone());

        let (exit_status, stdout) = self.outcome_for(&line);
        if exit_status != 0 && !options.warn {
            return Err(SessionError::CommandFailed {
                command: line,
                exit_status,
            });
        }
        Ok(CommandOutput {
            command: line,
            exit_status,
            stdout,
        })
    }

    async fn put(&self, local: &Path, remote: &str) -> Result<Transfer, SessionError> {
        let transfer = Transfer {
            local: local.to_path_buf(),
            remote: remote.to_string(),
        };
        self.transfers
            .lock()
            .map_err(|e| SessionError::Transport(e.to_string()))?
            .push(transfer.clone());
        Ok(transfer)
    }
}
