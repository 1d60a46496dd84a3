//! Error types for the foundation types.

use thiserror::Error;

/// Errors raised when parsing the foundation types.
#[derive(Debug, Error)]
pub enum TypeError {
    /// The input is not a valid lowercase hexadecimal string.
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    /// The input has the wrong length.
    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
