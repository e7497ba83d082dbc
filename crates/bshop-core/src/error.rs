//! # Validation Errors
//!
//! Raised when request input cannot be turned into a domain type.

use thiserror::Error;

/// Input validation failure for identifiers and download requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was absent or empty.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// The content identifier is not a well-formed CID string.
    #[error("invalid content id: {0}")]
    InvalidContentId(String),

    /// The address is not `0x` followed by 40 hex characters.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}
