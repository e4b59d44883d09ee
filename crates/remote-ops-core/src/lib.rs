//! Core abstractions for remote host operations.
//!
//! This crate provides the collaborator boundary:
//! - `RemoteCommand` - Structured shell command building
//! - `RunOptions` - Explicit remote execution options
//! - `RemoteSession` - Trait for run/put collaborators
//! - `ScriptedSession` - In-memory session for development and tests
//! - `OpenSshSession` - Session backed by the system OpenSSH client

pub mod command;
pub mod openssh;
pub mod options;
pub mod script;
pub mod session;

pub use command::{CommandError, RemoteCommand};
pub use openssh::OpenSshSession;
pub use options::RunOptions;
pub use script::ScriptedSession;
pub use session::{CommandOutput, RemoteSession, SessionError, Transfer};
