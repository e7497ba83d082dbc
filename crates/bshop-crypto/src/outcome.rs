//! # Decryption Outcomes
//!
//! Delivery must not crash on content it cannot decrypt, but it must also
//! not lose track of *why*. Every decryption attempt returns one of three
//! outcomes, and the caller chooses a policy for the failure case.

use std::fmt;

/// Why bytes were delivered without attempting decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassThroughReason {
    /// No key record exists; the object was stored unencrypted.
    NoKeyRecord,
    /// The key record names an algorithm this build does not implement.
    UnsupportedAlgorithm(String),
    /// The input cannot hold a 16-byte tag plus at least one byte.
    TooShort(usize),
}

impl fmt::Display for PassThroughReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoKeyRecord => write!(f, "no key record"),
            Self::UnsupportedAlgorithm(alg) => write!(f, "unsupported algorithm {alg}"),
            Self::TooShort(len) => write!(f, "too short ({len} bytes)"),
        }
    }
}

/// Why a decryption attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecryptFailure {
    /// Stored key or nonce is not valid base64 or has the wrong length.
    InvalidKeyMaterial(String),
    /// The AEAD tag did not verify: wrong key, wrong nonce, or tampered bytes.
    AuthenticationFailed,
}

impl fmt::Display for DecryptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKeyMaterial(reason) => write!(f, "invalid key material: {reason}"),
            Self::AuthenticationFailed => write!(f, "authentication failed"),
        }
    }
}

/// Result of running content through the decryption pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecryptOutcome {
    /// Decryption succeeded.
    Plaintext(Vec<u8>),
    /// Bytes were returned untouched by design.
    PassThrough {
        bytes: Vec<u8>,
        reason: PassThroughReason,
    },
    /// Decryption was attempted and failed. `original` is the input as fetched.
    Failed {
        original: Vec<u8>,
        failure: DecryptFailure,
    },
}

impl DecryptOutcome {
    /// Bytes to deliver under the fail-soft policy: plaintext when
    /// available, otherwise the bytes exactly as fetched.
    pub fn into_fail_soft_bytes(self) -> Vec<u8> {
        match self {
            Self::Plaintext(bytes) => bytes,
            Self::PassThrough { bytes, .. } => bytes,
            Self::Failed { original, .. } => original,
        }
    }

    /// Short label for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Plaintext(_) => "decrypted",
            Self::PassThrough { .. } => "pass_through",
            Self::Failed { .. } => "decrypt_failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_soft_bytes_for_each_variant() {
        assert_eq!(DecryptOutcome::Plaintext(vec![1]).into_fail_soft_bytes(), vec![1]);
        assert_eq!(
            DecryptOutcome::PassThrough {
                bytes: vec![2],
                reason: PassThroughReason::NoKeyRecord
            }
            .into_fail_soft_bytes(),
            vec![2]
        );
        assert_eq!(
            DecryptOutcome::Failed {
                original: vec![3],
                failure: DecryptFailure::AuthenticationFailed
            }
            .into_fail_soft_bytes(),
            vec![3]
        );
    }

    #[test]
    fn labels_and_failure_flag() {
        let failed = DecryptOutcome::Failed {
            original: vec![],
            failure: DecryptFailure::AuthenticationFailed,
        };
        assert_eq!(failed.label(), "decrypt_failed");
        assert!(failed.is_failure());
        assert!(!DecryptOutcome::Plaintext(vec![]).is_failure());
    }

    #[test]
    fn reason_display() {
        assert_eq!(PassThroughReason::TooShort(4).to_string(), "too short (4 bytes)");
        assert_eq!(
            DecryptFailure::AuthenticationFailed.to_string(),
            "authentication failed"
        );
    }
}
