//! # Cryptographic Error Types

use thiserror::Error;

/// Errors from signature recovery and content sealing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Signature is not 65 bytes of hex.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// Public key recovery failed for an otherwise well-formed signature.
    #[error("signature recovery failed: {0}")]
    RecoveryFailed(String),

    /// Secret key bytes do not form a valid secp256k1 scalar.
    #[error("invalid secret key: {0}")]
    InvalidSecretKey(String),

    /// Key or nonce is not valid base64 or has the wrong length.
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Sealed input cannot hold a tag plus at least one byte.
    #[error("sealed data too short: {0} bytes")]
    TooShort(usize),

    /// AEAD tag did not verify.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// AEAD encryption failed.
    #[error("encryption failed")]
    EncryptionFailed,
}
