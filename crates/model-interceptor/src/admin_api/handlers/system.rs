//! System handlers: root, health, metrics.

use crate::admin_api::types::*;
use crate::metrics::collect_metrics;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

/// GET / - links to every endpoint
pub fn handle_root(base_url: &str) -> Response<Full<Bytes>> {
    let link = |path: &str| Link {
        href: format!("{base_url}{path}"),
    };
    let body = serde_json::json!({
        "_links": {
            "config": link("/config"),
            "logs": link("/logs"),
            "suggest": link("/suggest"),
            "health": link("/health"),
            "metrics": link("/metrics"),
        }
    });
    json_response(StatusCode::OK, &body)
}

/// GET /health - Health check
pub fn handle_health() -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &serde_json::json!({"status": "ok"}))
}

/// GET /metrics - Prometheus metrics
pub fn handle_metrics() -> Response<Full<Bytes>> {
    build_response_with_headers(
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        collect_metrics(),
    )
}
