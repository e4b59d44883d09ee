//! Explicit remote execution options.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Options applied to a single remote command execution.
///
/// Every recognized option is enumerated and defaulted here; there is no
/// open-ended keyword pass-through to the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunOptions {
    /// Tolerate a non-zero exit status: report it in the returned
    /// `CommandOutput` instead of failing the `run` call.
    #[serde(default)]
    pub warn: bool,
    /// Request a pseudo-terminal for the command.
    #[serde(default)]
    pub pty: bool,
    /// Upper bound on command execution time, if any.
    #[serde(default)]
    pub timeout: Option<Duration>,
}

impl RunOptions {
    /// Options with `warn` set, for probes where a non-zero exit is expected.
    #[must_use]
    pub fn tolerant() -> Self {
        Self {
            warn: true,
            ..Self::default()
        }
    }

    /// Request a pseudo-terminal.
    #[must_use]
    pub const fn with_pty(mut self) -> Self {
        self.pty = true;
        self
    }

    /// Bound execution time.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
