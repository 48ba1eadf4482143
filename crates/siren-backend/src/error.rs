//! Error types for the siren-backend crate.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when talking to a backend store.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Failed to establish the initial connection.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// The address that was being connected to.
        addr: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// I/O failure on an established connection.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer sent bytes that are not valid for the wire protocol.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The backend reported an error reply for a command.
    #[error("backend reported error: {0}")]
    Server(String),

    /// A reply arrived but had an unexpected shape for the command.
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),

    /// The per-call timeout elapsed before a reply arrived.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// The configured backend name is not in the supported set.
    #[error("unknown backend: {0:?}")]
    UnknownBackend(String),
}

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_server() {
        let err = BackendError::Server("WRONGTYPE Operation against a key".to_string());
        assert_eq!(
            err.to_string(),
            "backend reported error: WRONGTYPE Operation against a key"
        );
    }

    #[test]
    fn error_display_timeout() {
        let err = BackendError::Timeout(Duration::from_secs(2));
        assert_eq!(err.to_string(), "operation timed out after 2s");
    }

    #[test]
    fn error_display_unknown_backend() {
        let err = BackendError::UnknownBackend("etcd".to_string());
        assert_eq!(err.to_string(), "unknown backend: \"etcd\"");
    }
}
