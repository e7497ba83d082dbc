//! # Delivery Orchestrator
//!
//! Composes signature verification, the purchase check, the gateway fetch
//! and decryption into one request flow:
//!
//! ```text
//! Received ──► SignatureChecked ──► AccessChecked ──► Fetched ──► Decrypted ──► Delivered
//!    │               │                   │               │            │
//!    ▼               ▼                   ▼               ▼            ▼
//!  400/401          403                 502             500 (policy / vault)
//! ```
//!
//! The access check always completes before the fetch starts: bytes the
//! caller has not paid for are never pulled, even transiently. Nothing is
//! retried; a rejected caller starts over with a new request.

use std::fmt;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bshop_chain::AccessResult;
use bshop_core::{ContentId, DownloadRequest, ValidationError};
use bshop_crypto::{verify_message, DecryptOutcome};
use serde::Deserialize;

use crate::middleware::metrics::{record_access, record_decrypt, record_delivery};
use crate::pipeline::decrypt_for_delivery;
use crate::state::AppState;

/// Position in the delivery flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    SignatureChecked,
    AccessChecked,
    Fetched,
    Decrypted,
    Delivered,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::SignatureChecked => "signature_checked",
            Self::AccessChecked => "access_checked",
            Self::Fetched => "fetched",
            Self::Decrypted => "decrypted",
            Self::Delivered => "delivered",
        };
        f.write_str(name)
    }
}

/// Terminal failure of a delivery. Rendered as a plain-text response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingCid,
    MissingCredentials,
    InvalidCid,
    BadSignature,
    NoAccess,
    FetchFailed,
    KeyLookupFailed,
    DecryptionFailed,
}

impl Rejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingCid | Self::MissingCredentials | Self::InvalidCid => {
                StatusCode::BAD_REQUEST
            }
            Self::BadSignature => StatusCode::UNAUTHORIZED,
            Self::NoAccess => StatusCode::FORBIDDEN,
            Self::FetchFailed => StatusCode::BAD_GATEWAY,
            Self::KeyLookupFailed | Self::DecryptionFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Response body.
    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingCid => "Missing cid",
            Self::MissingCredentials => "Missing address/signature",
            Self::InvalidCid => "Invalid cid",
            Self::BadSignature => "Bad signature",
            Self::NoAccess => "No access",
            Self::FetchFailed => "Fetch failed",
            Self::KeyLookupFailed => "Internal error",
            Self::DecryptionFailed => "Decryption failed",
        }
    }

    /// Last stage reached before the rejection.
    pub fn stage(&self) -> Stage {
        match self {
            Self::MissingCid | Self::MissingCredentials | Self::InvalidCid | Self::BadSignature => {
                Stage::Received
            }
            Self::NoAccess => Stage::SignatureChecked,
            Self::FetchFailed => Stage::AccessChecked,
            Self::KeyLookupFailed | Self::DecryptionFailed => Stage::Fetched,
        }
    }

    /// Metrics label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MissingCid | Self::MissingCredentials | Self::InvalidCid => "invalid_request",
            Self::BadSignature => "bad_signature",
            Self::NoAccess => "no_access",
            Self::FetchFailed => "fetch_failed",
            Self::KeyLookupFailed => "key_lookup_failed",
            Self::DecryptionFailed => "decrypt_failed",
        }
    }

    fn from_validation(err: &ValidationError) -> Self {
        match err {
            ValidationError::MissingField("cid") => Self::MissingCid,
            ValidationError::MissingField(_) => Self::MissingCredentials,
            ValidationError::InvalidContentId(_) => Self::InvalidCid,
            // An unparseable address cannot have produced a valid signature.
            ValidationError::InvalidAddress(_) => Self::BadSignature,
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (self.status(), self.message()).into_response()
    }
}

/// Bytes ready to hand to the caller.
#[derive(Debug)]
pub struct Delivery {
    pub content_id: ContentId,
    pub bytes: Vec<u8>,
}

impl IntoResponse for Delivery {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.content_id);
        let mut response = self.bytes.into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );
        // Content ids are alphanumeric, so the header value is always valid.
        if let Ok(value) = HeaderValue::from_str(&disposition) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        response
    }
}

/// JSON request body. Fields the client omitted, or a body that is not
/// JSON at all, read as absent.
#[derive(Debug, Default, Deserialize)]
pub struct DownloadBody {
    pub address: Option<String>,
    pub signature: Option<String>,
}

impl DownloadBody {
    pub fn parse_lenient(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

/// Run one delivery from raw inputs to response bytes.
pub async fn deliver(
    state: &AppState,
    cid: Option<&str>,
    body: &DownloadBody,
) -> Result<Delivery, Rejection> {
    let result = run(state, cid, body).await;
    match &result {
        Ok(delivery) => {
            record_delivery("delivered");
            tracing::info!(cid = %delivery.content_id, bytes = delivery.bytes.len(), "delivered");
        }
        Err(rejection) => {
            record_delivery(rejection.label());
            let status = rejection.status().as_u16();
            if rejection.status().is_server_error() {
                tracing::warn!(stage = %rejection.stage(), status, reason = rejection.label(), "delivery rejected");
            } else {
                tracing::info!(stage = %rejection.stage(), status, reason = rejection.label(), "delivery rejected");
            }
        }
    }
    result
}

async fn run(
    state: &AppState,
    cid: Option<&str>,
    body: &DownloadBody,
) -> Result<Delivery, Rejection> {
    // Received
    let request = DownloadRequest::from_parts(cid, body.address.as_deref(), body.signature.as_deref())
        .map_err(|e| Rejection::from_validation(&e))?;

    if !verify_message(&request.caller, &request.message(), &request.signature) {
        return Err(Rejection::BadSignature);
    }

    // SignatureChecked
    let access = state
        .oracle
        .check_access(&request.caller, &request.content_id)
        .await;
    record_access(access.label());
    match &access {
        AccessResult::Granted => {}
        AccessResult::Denied => return Err(Rejection::NoAccess),
        AccessResult::Unknown(reason) => {
            tracing::warn!(cid = %request.content_id, reason = %reason, "access check inconclusive, denying");
            return Err(Rejection::NoAccess);
        }
    }

    // AccessChecked
    let fetched = state
        .fetcher
        .fetch(&request.content_id)
        .await
        .map_err(|e| {
            tracing::warn!(cid = %request.content_id, error = %e, "gateway fetch failed");
            Rejection::FetchFailed
        })?;

    // Fetched
    let outcome = decrypt_for_delivery(state.vault.as_ref(), &request.content_id, fetched)
        .await
        .map_err(|e| {
            tracing::error!(cid = %request.content_id, error = %e, "key vault lookup failed");
            Rejection::KeyLookupFailed
        })?;
    record_decrypt(outcome.label());
    log_outcome(&request.content_id, &outcome);

    // Decrypted
    let bytes = state
        .decrypt_failure
        .resolve(outcome)
        .ok_or(Rejection::DecryptionFailed)?;

    Ok(Delivery {
        content_id: request.content_id,
        bytes,
    })
}

fn log_outcome(cid: &ContentId, outcome: &DecryptOutcome) {
    match outcome {
        DecryptOutcome::Plaintext(_) => tracing::debug!(cid = %cid, "decrypted"),
        DecryptOutcome::PassThrough { reason, .. } => {
            tracing::debug!(cid = %cid, reason = %reason, "serving bytes as stored")
        }
        DecryptOutcome::Failed { failure, .. } => {
            tracing::warn!(cid = %cid, failure = %failure, "decryption failed")
        }
    }
}
