//! Error types for the siren-store crate.

use siren_backend::BackendError;
use siren_model::ModelError;
use thiserror::Error;

/// Errors surfaced by the alert store facade.
///
/// The store performs no retries and suppresses no failures: every backend
/// error propagates to the caller, which decides the transport response.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying store failed, or backend selection failed at
    /// construction time.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// An in-memory value could not be serialized for storage.
    #[error("failed to serialize {what}: {source}")]
    Serialize {
        /// What was being serialized.
        what: &'static str,
        /// The underlying serde error.
        source: serde_json::Error,
    },

    /// A stored entry could not be decoded back into a model value.
    #[error(transparent)]
    Decode(#[from] ModelError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
