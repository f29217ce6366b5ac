//! Error types for the hitsieve library.
//!
//! All errors are represented by the [`SieveError`] enum. The selector itself
//! only ever produces [`SieveError::InvalidConfiguration`] and
//! [`SieveError::InvalidRequest`]; the remaining variants belong to the
//! configuration loader and the CLI.
//!
//! # Examples
//!
//! ```
//! use hitsieve::error::{SieveError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(SieveError::invalid_request("page size must not be negative"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for hitsieve operations.
#[derive(Error, Debug)]
pub enum SieveError {
    /// A sort or collapse slot outside the collection's value slots, or a
    /// malformed threshold.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A negative page size, offset or minimum hit count.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Malformed configuration parameter or candidate record.
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O errors (config files, candidate streams)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with SieveError.
pub type Result<T> = std::result::Result<T, SieveError>;

impl SieveError {
    /// Create a new invalid configuration error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        SieveError::InvalidConfiguration(msg.into())
    }

    /// Create a new invalid request error.
    pub fn invalid_request<S: Into<String>>(msg: S) -> Self {
        SieveError::InvalidRequest(msg.into())
    }

    /// Create a new parse error.
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        SieveError::Parse(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        SieveError::Other(msg.into())
    }

    /// Whether this error was raised by request or configuration validation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SieveError::InvalidConfiguration(_) | SieveError::InvalidRequest(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = SieveError::invalid_config("slot 300 out of range");
        assert_eq!(
            error.to_string(),
            "Invalid configuration: slot 300 out of range"
        );

        let error = SieveError::invalid_request("negative offset");
        assert_eq!(error.to_string(), "Invalid request: negative offset");

        let error = SieveError::parse("bad SORT");
        assert_eq!(error.to_string(), "Parse error: bad SORT");
    }

    #[test]
    fn test_validation_kinds() {
        assert!(SieveError::invalid_config("x").is_validation());
        assert!(SieveError::invalid_request("x").is_validation());
        assert!(!SieveError::other("x").is_validation());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let sieve_error = SieveError::from(io_error);

        match sieve_error {
            SieveError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }
}
