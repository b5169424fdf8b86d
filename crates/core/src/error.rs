//! Core error types for mysql-tools operations.
//!
//! Errors are typed and recoverable. Nothing in this crate panics.

use thiserror::Error;

/// Core error type shared by every control-plane interaction.
#[derive(Debug, Error)]
pub enum Error {
    /// The command ran but reported failure. `output` is the combined
    /// stdout/stderr of the invocation.
    #[error("cf {command} failed: {status}\noutput:\n{output}")]
    CommandFailed {
        command: String,
        status: String,
        output: String,
    },

    /// The command could not be started at all.
    #[error("failed to run cf {command}: {reason}")]
    CommandSpawnFailed { command: String, reason: String },

    /// A retried operation used up its attempt budget.
    #[error("failed to {operation}")]
    RetriesExhausted { operation: String, attempts: u32 },

    #[error("invalid response: {reason}")]
    InvalidResponse { reason: String },
}

impl Error {
    /// Create a command failed error.
    pub fn command_failed(
        command: impl Into<String>,
        status: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            command: command.into(),
            status: status.into(),
            output: output.into(),
        }
    }

    /// Create a command spawn error.
    pub fn command_spawn_failed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CommandSpawnFailed {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Create a retries exhausted error.
    pub fn retries_exhausted(operation: impl Into<String>, attempts: u32) -> Self {
        Self::RetriesExhausted {
            operation: operation.into(),
            attempts,
        }
    }

    /// Create an invalid response error.
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }

    /// Output captured from a failed command, if this error carries one.
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { output, .. } => Some(output),
            _ => None,
        }
    }

    /// Whether the error text or captured output mentions `needle`.
    #[must_use]
    pub fn mentions(&self, needle: &str) -> bool {
        self.output().is_some_and(|out| out.contains(needle)) || self.to_string().contains(needle)
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
