//! Error types for device sessions.

use thiserror::Error;

/// Errors raised while talking to a device.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The device rejected the credentials.
    #[error("Authentication failed for {user}@{host}")]
    Auth { host: String, user: String },

    /// Connection, handshake or channel failure.
    #[error("Session error with {host}: {message}")]
    Transport { host: String, message: String },

    /// A status command exited with a non-zero status.
    #[error("Command '{command}' failed with exit status {status}")]
    Command { command: String, status: i32 },

    /// A status command produced output that could not be parsed.
    #[error("Failed to parse '{command}' output: {message}")]
    Parse { command: String, message: String },
}

impl SessionError {
    /// Create a transport error.
    pub fn transport(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Whether this is an authentication failure.
    ///
    /// Authentication failures never resolve by retrying.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}
