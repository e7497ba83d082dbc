//! `POST /download/{cid}` with body `{"address": "0x…", "signature": "0x…"}`.
//!
//! The signature must cover exactly `download:{cid}`. Responses carry
//! plain-text bodies on failure and raw bytes on success.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;

use crate::delivery::{deliver, DownloadBody};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/download/{cid}", post(download))
        .route("/download", post(download_without_cid))
        .route("/download/", post(download_without_cid))
}

async fn download(State(state): State<AppState>, Path(cid): Path<String>, body: Bytes) -> Response {
    let body = DownloadBody::parse_lenient(&body);
    match deliver(&state, Some(&cid), &body).await {
        Ok(delivery) => delivery.into_response(),
        Err(rejection) => rejection.into_response(),
    }
}

async fn download_without_cid(State(state): State<AppState>, body: Bytes) -> Response {
    let body = DownloadBody::parse_lenient(&body);
    match deliver(&state, None, &body).await {
        Ok(delivery) => delivery.into_response(),
        Err(rejection) => rejection.into_response(),
    }
}
