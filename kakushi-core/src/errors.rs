//! errors.rs - Custom error types for the kakushi-core library.
//!
//! This module defines a structured error enum for the library, providing
//! specific, actionable error types that can be handled programmatically.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// This enum represents all possible error types in the `kakushi-core` library.
///
/// Marked `#[non_exhaustive]` so new variants can be added without breaking
/// downstream matches.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum KakushiError {
    #[error("Failed to compile pattern rule '{0}': {1}")]
    RuleCompilation(String, fancy_regex::Error),

    #[error("Rule '{0}': pattern length ({1}) exceeds maximum allowed ({2})")]
    PatternLengthExceeded(String, usize, usize),

    #[error("Rule '{rule}' failed while matching: {source}")]
    RuleExecution {
        rule: String,
        #[source]
        source: fancy_regex::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Pseudonym '{token}' for label '{label}' is itself matched by rule '{rule}'")]
    TokenMatchesPattern {
        label: String,
        token: String,
        rule: String,
    },

    #[error("Entity recognizer '{name}' failed: {message}")]
    Recognizer { name: String, message: String },

    #[error("Failed to build gazetteer: {0}")]
    Gazetteer(String),

    #[error("Failed to render token template: {0}")]
    Template(String),

    #[error("An unexpected I/O error occurred: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),
}

impl KakushiError {
    /// Create a recognizer error for the named recognizer.
    pub fn recognizer(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Recognizer {
            name: name.into(),
            message: message.into(),
        }
    }

    /// True if the error was raised while building or validating configuration,
    /// i.e. before any text was processed.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::RuleCompilation(..)
                | Self::PatternLengthExceeded(..)
                | Self::InvalidConfig(_)
                | Self::TokenMatchesPattern { .. }
                | Self::Template(_)
        )
    }
}

/// A specialized Result type for kakushi-core operations.
pub type Result<T> = std::result::Result<T, KakushiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_matches_pattern_display() {
        let err = KakushiError::TokenMatchesPattern {
            label: "PHONE".to_string(),
            token: "0901234567".to_string(),
            rule: "PHONE".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("0901234567"));
        assert!(msg.contains("PHONE"));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_recognizer_error_is_not_config_error() {
        let err = KakushiError::recognizer("gazetteer", "model not loaded");
        assert_eq!(
            err.to_string(),
            "Entity recognizer 'gazetteer' failed: model not loaded"
        );
        assert!(!err.is_config_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: KakushiError = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }
}
