//! # bshop-api: Gated Encrypted Delivery Service
//!
//! An Axum service that hands out purchased files. A buyer proves control of
//! their wallet by signing `download:{cid}`, the marketplace contract
//! confirms the purchase, and the object is fetched from the storage
//! gateway and decrypted with the per-object key recorded at upload.
//!
//! ## API Surface
//!
//! | Route | Module | Notes |
//! |---|---|---|
//! | `POST /download/{cid}` | [`routes::download`] | plain-text errors, raw bytes on success |
//! | `POST /upload` | [`routes::upload`] | multipart `file`, JSON response |
//! | `GET /health/liveness` | this module | always `ok` |
//! | `GET /health/readiness` | this module | checks the key vault |
//! | `GET /metrics` | this module | when metrics are enabled |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler
//! ```

pub mod config;
pub mod db;
pub mod delivery;
pub mod error;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod vault;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the application router.
///
/// Health probes and `/metrics` sit outside the tracing and metrics layers
/// so scrapes do not count as traffic.
pub fn app(state: AppState) -> Router {
    let metrics_on = state.metrics.is_some();

    let mut api = Router::new()
        .merge(routes::download::router())
        .merge(routes::upload::router(state.max_upload_bytes));

    if metrics_on {
        api = api.layer(from_fn(middleware::metrics::metrics_middleware));
    }

    let api = api
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let mut probes = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    if metrics_on {
        probes = probes.route("/metrics", get(prometheus_metrics));
    }

    Router::new().merge(probes.with_state(state)).merge(api)
}

/// GET /metrics: Prometheus text exposition.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 "ready" when the key vault answers, 503 otherwise.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Err(e) = state.vault.health_check().await {
        tracing::warn!("Key vault health check failed: {e}");
        return (StatusCode::SERVICE_UNAVAILABLE, "key vault unreachable").into_response();
    }
    (StatusCode::OK, "ready").into_response()
}
