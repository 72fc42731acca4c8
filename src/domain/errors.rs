//! Domain error types
//!
//! This module defines the error hierarchy for Redakt.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Redakt error type
///
/// This is the primary error type used throughout the application.
/// Callers distinguish fatal startup problems ([`RedaktError::Configuration`])
/// from per-document failures ([`RedaktError::Inconsistency`],
/// [`RedaktError::InvalidInput`]).
#[derive(Debug, Error)]
pub enum RedaktError {
    /// Configuration-related errors (malformed rule table, invalid mode, bad config file)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Name dictionary could not be loaded
    #[error("Dictionary unavailable: {0}")]
    Dictionary(String),

    /// Pattern evaluation failed while scanning a document
    #[error("Detection error: {0}")]
    Detection(String),

    /// Input text cannot be processed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Tag/map bijection violated after the consistency pass
    #[error("Inconsistency in document '{document}': {detail}")]
    Inconsistency { document: String, detail: String },

    /// Pipeline stage ordering violated
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl RedaktError {
    /// Creates an inconsistency error for a document
    pub fn inconsistency(document: impl Into<String>, detail: impl Into<String>) -> Self {
        RedaktError::Inconsistency {
            document: document.into(),
            detail: detail.into(),
        }
    }

    /// Whether this error must be escalated as a failed run requiring investigation
    pub fn is_inconsistency(&self) -> bool {
        matches!(self, RedaktError::Inconsistency { .. })
    }

    /// Process exit code associated with this error
    pub fn exit_code(&self) -> i32 {
        match self {
            RedaktError::Configuration(_) => 2,
            RedaktError::Inconsistency { .. } => 3,
            _ => 1,
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for RedaktError {
    fn from(err: std::io::Error) -> Self {
        RedaktError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for RedaktError {
    fn from(err: serde_json::Error) -> Self {
        RedaktError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for RedaktError {
    fn from(err: toml::de::Error) -> Self {
        RedaktError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redakt_error_display() {
        let err = RedaktError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_inconsistency_error() {
        let err = RedaktError::inconsistency("smlouva1.txt", "tag PERSON_2 has no map entry");
        assert!(err.is_inconsistency());
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("smlouva1.txt"));
        assert!(err.to_string().contains("PERSON_2"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(RedaktError::Configuration("x".into()).exit_code(), 2);
        assert_eq!(RedaktError::InvalidInput("x".into()).exit_code(), 1);
        assert_eq!(RedaktError::Io("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: RedaktError = io_err.into();
        assert!(matches!(err, RedaktError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: RedaktError = json_err.into();
        assert!(matches!(err, RedaktError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: RedaktError = toml_err.into();
        assert!(matches!(err, RedaktError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_redakt_error_implements_std_error() {
        let err = RedaktError::Validation("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
