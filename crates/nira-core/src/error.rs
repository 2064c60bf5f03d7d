//! Unified error types for the NIRA ecosystem
//!
//! This module provides a common error type [`NiraError`] that can represent
//! errors from any part of the system. Domain-specific error types can be
//! converted to `NiraError` for uniform error handling at API boundaries.

use thiserror::Error;

/// Unified error type for all NIRA operations.
///
/// Allows errors from I/O, parsing, solving, and validation to be handled
/// uniformly across the workspace crates.
#[derive(Error, Debug)]
pub enum NiraError {
    /// I/O errors (file access, dataset directories, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Solver/algorithm errors
    #[error("Solver error: {0}")]
    Solver(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Topology structure errors (dangling endpoints, missing assets)
    #[error("Topology error: {0}")]
    Topology(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using NiraError.
pub type NiraResult<T> = Result<T, NiraError>;

// Conversion from anyhow::Error
impl From<anyhow::Error> for NiraError {
    fn from(err: anyhow::Error) -> Self {
        NiraError::Other(err.to_string())
    }
}

// Conversion from string-like types for convenience
impl From<String> for NiraError {
    fn from(s: String) -> Self {
        NiraError::Other(s)
    }
}

impl From<&str> for NiraError {
    fn from(s: &str) -> Self {
        NiraError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NiraError::Solver("dual MIP not optimal".into());
        assert!(err.to_string().contains("Solver error"));
        assert!(err.to_string().contains("dual MIP not optimal"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: NiraError = io_err.into();
        assert!(matches!(err, NiraError::Io(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> NiraResult<()> {
            Err(NiraError::Validation("test".into()))
        }

        fn outer() -> NiraResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
