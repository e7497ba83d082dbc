//! # Decryption Pipeline
//!
//! Joins the key vault to the AEAD layer:
//!
//! 1. No key record: the object was stored in the clear; pass it through.
//! 2. Record with an unknown algorithm tag: pass through.
//! 3. Fewer than 17 bytes: too short to hold a tag; pass through.
//! 4. Otherwise decrypt `ciphertext || tag` with the stored key and IV.
//!
//! What an authentication failure means for the response is decided by
//! [`DecryptFailurePolicy`], not here.

use std::fmt;
use std::str::FromStr;

use bshop_core::ContentId;
use bshop_crypto::{decrypt_content, DecryptOutcome, PassThroughReason};

use crate::vault::{KeyVault, VaultError};

/// What to deliver when decryption is attempted and fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecryptFailurePolicy {
    /// Serve the bytes exactly as fetched and log a warning.
    #[default]
    ServeOriginal,
    /// Fail the request with a 500.
    Reject,
}

impl DecryptFailurePolicy {
    /// Bytes to deliver for `outcome`, or `None` when the request must fail.
    pub fn resolve(self, outcome: DecryptOutcome) -> Option<Vec<u8>> {
        match (self, outcome) {
            (Self::Reject, DecryptOutcome::Failed { .. }) => None,
            (_, outcome) => Some(outcome.into_fail_soft_bytes()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServeOriginal => "serve-original",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for DecryptFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DecryptFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serve-original" | "serve_original" => Ok(Self::ServeOriginal),
            "reject" => Ok(Self::Reject),
            other => Err(other.to_string()),
        }
    }
}

/// Run fetched bytes for `cid` through decryption.
///
/// Only a vault read error is an `Err`; every crypto outcome is a value.
pub async fn decrypt_for_delivery(
    vault: &dyn KeyVault,
    cid: &ContentId,
    data: Vec<u8>,
) -> Result<DecryptOutcome, VaultError> {
    let Some(record) = vault.lookup(cid).await? else {
        return Ok(DecryptOutcome::PassThrough {
            bytes: data,
            reason: PassThroughReason::NoKeyRecord,
        });
    };

    Ok(decrypt_content(
        &record.algorithm,
        &record.key_b64,
        &record.iv_b64,
        data,
    ))
}
