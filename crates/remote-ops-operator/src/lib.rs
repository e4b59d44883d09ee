//! Remote host maintenance operations over an established session.
//!
//! Provides the `RemoteOperator`:
//! - Directory ensure, backup, recursive upload
//! - Scoped crontab suspension with guaranteed restore
//! - Kill-file driven process stop/start with bounded polling

pub mod crontab;
pub mod error;
pub mod operator;
pub mod process;

pub use error::OperatorError;
pub use operator::RemoteOperator;
pub use process::PollConfig;
