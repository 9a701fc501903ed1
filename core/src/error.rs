//! Error types for wordstorm-core

use std::fmt;

/// Classification of engine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required builder field was not provided
    MissingConfig,
    /// Configuration failed validation
    InvalidConfig,
    /// No word sources were registered
    NoWordSources,
    /// Handle lifecycle invariant violated (bug)
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::MissingConfig => "missing configuration",
            ErrorKind::InvalidConfig => "invalid configuration",
            ErrorKind::NoWordSources => "no word sources",
            ErrorKind::Internal => "internal error",
        };
        f.write_str(name)
    }
}

/// Core error type returned by the engine and its builder
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct EngineError {
    /// What went wrong
    pub kind: ErrorKind,
    /// Human-readable detail
    pub message: String,
}

impl EngineError {
    /// Create a new error of the given kind
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A required builder field is missing
    pub fn missing_config(field: &str) -> Self {
        Self::new(ErrorKind::MissingConfig, format!("{field} is required"))
    }

    /// Configuration rejected by validation
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidConfig, message)
    }

    /// Nothing to fuzz
    pub fn no_word_sources() -> Self {
        Self::new(
            ErrorKind::NoWordSources,
            "at least one word list must be provided",
        )
    }

    /// Invariant violation inside the event loop
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// True for errors that indicate a bug rather than bad input
    pub fn is_internal(&self) -> bool {
        self.kind == ErrorKind::Internal
    }
}

/// Result type alias
pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_mentions_field() {
        let err = EngineError::missing_config("transport");
        assert_eq!(err.kind, ErrorKind::MissingConfig);
        assert!(err.message.contains("transport"));
        assert!(err.to_string().starts_with("missing configuration"));
    }

    #[test]
    fn test_internal_flag() {
        assert!(EngineError::internal("stale handle").is_internal());
        assert!(!EngineError::no_word_sources().is_internal());
    }
}
