//! Error types for the siren-model crate.

use thiserror::Error;

/// Errors that can occur when decoding alert data.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Input bytes were not valid for the expected schema.
    #[error("failed to decode payload: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_decode() {
        let err = ModelError::Decode("unexpected end of input".to_string());
        assert_eq!(
            err.to_string(),
            "failed to decode payload: unexpected end of input"
        );
    }

    #[test]
    fn error_from_serde_json() {
        let json_err = serde_json::from_str::<String>("not json").unwrap_err();
        let err: ModelError = json_err.into();
        assert!(matches!(err, ModelError::Decode(_)));
    }
}
