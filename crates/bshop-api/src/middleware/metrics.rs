//! # Prometheus Metrics
//!
//! Recorded through the `metrics` facade and rendered by the
//! `metrics-exporter-prometheus` recorder installed in `main`. Without an
//! installed recorder every call here is a no-op.
//!
//! | Metric | Labels |
//! |---|---|
//! | `bshop_http_requests_total` | `method`, `path`, `status` |
//! | `bshop_http_request_duration_seconds` | `method`, `path` |
//! | `bshop_deliveries_total` | `outcome` |
//! | `bshop_access_checks_total` | `result` |
//! | `bshop_decrypt_outcomes_total` | `outcome` |
//! | `bshop_uploads_total` | `outcome` |

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Axum middleware recording request count and latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());
    let start = Instant::now();

    let response = next.run(request).await;

    record_request(
        method,
        path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}

pub fn record_request(method: String, path: &'static str, status: u16, duration_secs: f64) {
    metrics::counter!(
        "bshop_http_requests_total",
        "method" => method.clone(),
        "path" => path,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "bshop_http_request_duration_seconds",
        "method" => method,
        "path" => path
    )
    .record(duration_secs);
}

pub fn record_delivery(outcome: &'static str) {
    metrics::counter!("bshop_deliveries_total", "outcome" => outcome).increment(1);
}

pub fn record_access(result: &'static str) {
    metrics::counter!("bshop_access_checks_total", "result" => result).increment(1);
}

pub fn record_decrypt(outcome: &'static str) {
    metrics::counter!("bshop_decrypt_outcomes_total", "outcome" => outcome).increment(1);
}

pub fn record_upload(outcome: &'static str) {
    metrics::counter!("bshop_uploads_total", "outcome" => outcome).increment(1);
}

/// Collapse per-object paths so label cardinality stays bounded.
fn normalize_path(path: &str) -> &'static str {
    match path {
        "/upload" => "/upload",
        "/download" | "/download/" => "/download",
        p if p.starts_with("/download/") => "/download/{cid}",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn normalize_collapses_content_ids() {
        assert_eq!(normalize_path("/download/Qm123"), "/download/{cid}");
        assert_eq!(normalize_path("/download/"), "/download");
        assert_eq!(normalize_path("/upload"), "/upload");
        assert_eq!(normalize_path("/wp-admin"), "other");
    }

    #[test]
    fn counters_render_in_prometheus_format() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_request("POST".to_string(), "/download/{cid}", 403, 0.02);
            record_delivery("no_access");
            record_access("denied");
        });

        let rendered = handle.render();
        assert!(rendered.contains("bshop_http_requests_total"));
        assert!(rendered.contains("status=\"403\""));
        assert!(rendered.contains("bshop_deliveries_total{outcome=\"no_access\"} 1"));
        assert!(rendered.contains("bshop_access_checks_total{result=\"denied\"} 1"));
    }
}
