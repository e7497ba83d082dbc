//! Errors from JSON-RPC contract reads.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The oracle could not be constructed.
    #[error("invalid oracle configuration: {0}")]
    Config(String),

    /// Connection failure or other transport error.
    #[error("{chain}: RPC transport error: {reason}")]
    Transport { chain: String, reason: String },

    /// The RPC call exceeded the configured timeout.
    #[error("{chain}: RPC request timed out")]
    Timeout { chain: String },

    /// The RPC endpoint answered with a non-2xx status.
    #[error("{chain}: RPC endpoint returned HTTP {status}")]
    HttpStatus { chain: String, status: u16 },

    /// The JSON-RPC response carried an `error` object (including reverts).
    #[error("{chain}: RPC error: {message}")]
    Rpc { chain: String, message: String },

    /// The response was not a decodable JSON-RPC result.
    #[error("{chain}: malformed RPC response: {reason}")]
    MalformedResponse { chain: String, reason: String },
}
