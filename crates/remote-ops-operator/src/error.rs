//! Operator error type.

use std::time::Duration;

use remote_ops_core::SessionError;
use thiserror::Error;

/// Remote operation error.
///
/// Every variant raised for a remote failure carries the offending command
/// line, so a failed maintenance run can be diagnosed from the error alone.
#[derive(Debug, Error)]
pub enum OperatorError {
    /// An argument failed validation before any remote call was made.
    #[error("Invalid argument: {0}")]
    Validation(String),
    /// An expected remote file is absent.
    #[error("Remote file not found by command: {command}")]
    NotFound { command: String },
    /// An expected remote directory is absent or not a directory.
    #[error("Remote path does not exist or is not a directory by command: {command}")]
    NotADirectory { command: String },
    /// A remote command failed where success was required.
    #[error("Remote operation failed by command: {command}")]
    CommandFailed { command: String },
    /// A poll loop exceeded its deadline.
    #[error("Process was not {goal} within {}s, check the server capacity", limit.as_secs())]
    Timeout { goal: &'static str, limit: Duration },
    /// The session collaborator itself failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
    /// Local filesystem failure while walking an upload tree.
    #[error("Local I/O error: {0}")]
    Io(#[from] std::io::Error),
}
