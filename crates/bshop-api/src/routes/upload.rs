//! `POST /upload`: encrypt a file and store it.
//!
//! Multipart form with a single `file` field. A fresh AES-256-GCM key and
//! IV are drawn per upload; the sealed bytes (`ciphertext || tag`) go to the
//! storage node, and the key record is written under the returned content
//! id. Responds `{"cid": "...", "encrypted": true}`.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use bshop_crypto::{seal, ContentKey};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::middleware::metrics::record_upload;
use crate::state::AppState;
use crate::vault::ContentKeyRecord;

/// File name sent to the storage node when the client gave none.
const DEFAULT_FILE_NAME: &str = "upload.bin";

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub cid: String,
    pub encrypted: bool,
}

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let result = handle_upload(&state, multipart).await;
    record_upload(if result.is_ok() { "stored" } else { "failed" });
    result
}

async fn handle_upload(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let uploader = state
        .uploader
        .as_ref()
        .ok_or_else(|| AppError::service_unavailable("storage API key not configured"))?;
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let (file_name, plaintext) = read_file_field(&mut multipart).await?;

    let key = ContentKey::generate();
    let sealed = seal(&key, &plaintext)?;

    let cid = uploader.upload(&file_name, sealed).await?;
    if let Err(e) = state
        .vault
        .store(ContentKeyRecord::for_key(cid.clone(), &key))
        .await
    {
        tracing::error!(cid = %cid, error = %e, "uploaded object has no stored key");
        return Err(e.into());
    }

    tracing::info!(cid = %cid, bytes = plaintext.len(), "stored encrypted upload");
    Ok(Json(UploadResponse {
        cid: cid.to_string(),
        encrypted: true,
    }))
}

async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Vec<u8>), AppError> {
    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(&e))?
            .ok_or_else(|| AppError::BadRequest("No file provided".into()))?;

        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_FILE_NAME)
            .to_string();
        let bytes = field.bytes().await.map_err(|e| multipart_error(&e))?;
        // An empty file seals to a bare tag, which downloads as passed-through bytes.
        if bytes.is_empty() {
            return Err(AppError::BadRequest("No file provided".into()));
        }
        return Ok((file_name, bytes.to_vec()));
    }
}

fn multipart_error(err: &MultipartError) -> AppError {
    if err.status() == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}
