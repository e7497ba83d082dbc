//! # Identifier Newtypes
//!
//! `ContentId` names an immutable object in content-addressed storage.
//! `EvmAddress` names a 20-byte account on an EVM chain.
//!
//! ## Security Invariant
//!
//! A `ContentId` is echoed into a `Content-Disposition` header and into the
//! gateway URL path. Construction admits only ASCII alphanumerics, so a
//! validated identifier can never carry quotes, slashes, or control bytes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Longest content identifier accepted. CIDv1 base32 strings run to ~60
/// characters; the margin covers longer multihash variants.
pub const MAX_CONTENT_ID_LEN: usize = 128;

/// Content-addressed identifier (an IPFS CID string such as `Qm...` or `bafy...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

impl ContentId {
    /// Validate and wrap a content identifier.
    ///
    /// The input is taken exactly as given: surrounding whitespace makes it
    /// invalid rather than being trimmed, since the signed message embeds the
    /// id verbatim. Empty input is reported as a missing field so the HTTP
    /// layer can answer with the same 400 it uses for an absent path segment.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let raw = raw.as_ref();
        if raw.is_empty() {
            return Err(ValidationError::MissingField("cid"));
        }
        if raw.len() > MAX_CONTENT_ID_LEN {
            return Err(ValidationError::InvalidContentId(format!(
                "longer than {MAX_CONTENT_ID_LEN} characters"
            )));
        }
        if !raw.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::InvalidContentId(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ContentId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ContentId> for String {
    fn from(value: ContentId) -> Self {
        value.0
    }
}

/// A 20-byte EVM account address.
///
/// Parsing accepts any letter case (checksummed or not); `Display` always
/// renders the canonical lowercase `0x`-prefixed form, so two addresses are
/// equal exactly when their bytes are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EvmAddress([u8; 20]);

impl EvmAddress {
    /// Parse `0x` followed by 40 hex characters.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| ValidationError::InvalidAddress(trimmed.to_string()))?;
        if hex_part.len() != 40 {
            return Err(ValidationError::InvalidAddress(trimmed.to_string()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(hex_part, &mut bytes)
            .map_err(|_| ValidationError::InvalidAddress(trimmed.to_string()))?;
        Ok(Self(bytes))
    }

    /// Wrap raw address bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// The raw 20 address bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase `0x`-prefixed hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for EvmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for EvmAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EvmAddress {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EvmAddress> for String {
    fn from(value: EvmAddress) -> Self {
        value.to_hex()
    }
}
