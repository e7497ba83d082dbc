//! # Download Authorization Message
//!
//! A caller proves control of an address by signing the ASCII string
//! `"download:" + contentId` with their wallet. Binding the content id into
//! the message means a signature for one object cannot unlock another.

use crate::error::ValidationError;
use crate::identity::{ContentId, EvmAddress};

/// Prefix of every download authorization message.
pub const DOWNLOAD_MESSAGE_PREFIX: &str = "download:";

/// Build the exact message a wallet must sign to download `cid`.
pub fn download_message(cid: &ContentId) -> String {
    format!("{DOWNLOAD_MESSAGE_PREFIX}{cid}")
}

/// A validated, ephemeral download request.
///
/// Constructed per HTTP call and dropped once the response is written.
/// The signature stays an opaque string here; the verifier decides whether
/// it is well formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub content_id: ContentId,
    pub caller: EvmAddress,
    pub signature: String,
}

impl DownloadRequest {
    /// Build a request from raw, possibly absent, inputs.
    ///
    /// Presence is checked before format so that an absent field is always
    /// reported as `MissingField`.
    pub fn from_parts(
        cid: Option<&str>,
        address: Option<&str>,
        signature: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let cid = non_empty(cid).ok_or(ValidationError::MissingField("cid"))?;
        let address = non_empty(address).ok_or(ValidationError::MissingField("address"))?;
        let signature = non_empty(signature).ok_or(ValidationError::MissingField("signature"))?;

        Ok(Self {
            content_id: ContentId::new(cid)?,
            caller: EvmAddress::parse(address)?,
            signature: signature.to_string(),
        })
    }

    /// The message this request's signature must cover.
    pub fn message(&self) -> String {
        download_message(&self.content_id)
    }
}

/// Blank counts as absent; non-blank values are passed on untouched.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
