//! Error types for hanoi-playback.

use thiserror::Error;

/// Result type for hanoi-playback operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can surface to whoever drives a playback session.
///
/// Out-of-range transport controls are not errors; they are silently ignored
/// by the playback state machine.
#[derive(Debug, Error)]
pub enum Error {
    /// The disc count was rejected before the solver was contacted.
    #[error("{0}")]
    InvalidRequest(String),

    /// The solver answered, but reported a failure or sent a malformed solution.
    #[error("{0}")]
    SolverFailure(String),

    /// The solve request never produced a usable answer.
    #[error("Error connecting to server: {0}")]
    Transport(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The session task has shut down.
    #[error("playback session has been disposed")]
    SessionClosed,
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_facing_messages() {
        let err = Error::Transport("connection refused".into());
        assert_eq!(err.to_string(), "Error connecting to server: connection refused");

        let err = Error::SolverFailure("Number of discs must be between 1 and 10".into());
        assert_eq!(err.to_string(), "Number of discs must be between 1 and 10");
    }
}
