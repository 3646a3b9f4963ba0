//! Prometheus metrics for the interceptor.
//!
//! Tracks how requests were resolved, how deliveries ended and how many bytes
//! each source served. Exported by the admin API on `/metrics`.
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};
use tracing::warn;

lazy_static! {
    /// Requests by how they were resolved
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "interceptor_requests_total",
        "Total number of requests handled by the interception listener",
        &["method", "resolution"]  // resolution: local|remote|proxy|error
    )
    .unwrap();

    /// Request failures by error kind
    pub static ref ERRORS_TOTAL: CounterVec = register_counter_vec!(
        "interceptor_errors_total",
        "Total number of requests that ended in an error response",
        &["kind", "status"]
    )
    .unwrap();

    /// How response bodies ended
    pub static ref DELIVERIES_TOTAL: CounterVec = register_counter_vec!(
        "interceptor_deliveries_total",
        "Total number of response bodies by final outcome",
        &["source", "outcome"]  // outcome: completed|failed|abandoned
    )
    .unwrap();

    /// Bytes written to clients
    pub static ref BYTES_SERVED_TOTAL: CounterVec = register_counter_vec!(
        "interceptor_bytes_served_total",
        "Total number of body bytes handed to client connections",
        &["source"]
    )
    .unwrap();

    /// Time until upstream response headers arrive
    pub static ref UPSTREAM_DURATION_MS: HistogramVec = register_histogram_vec!(
        "interceptor_upstream_duration_ms",
        "Time from outbound request to upstream response headers in milliseconds",
        &["source", "result"],  // result: ok|error
        vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0]
    )
    .unwrap();
}

/// Collect and return all metrics in Prometheus text format
pub fn collect_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

pub fn record_request(method: &str, resolution: &str) {
    REQUESTS_TOTAL
        .with_label_values(&[method, resolution])
        .inc();
}

pub fn record_error(kind: &str, status: u16) {
    ERRORS_TOTAL
        .with_label_values(&[kind, &status.to_string()])
        .inc();
}

/// Helper to record the end of a response body
pub fn record_delivery(source: &str, outcome: &str, bytes_sent: u64) {
    DELIVERIES_TOTAL
        .with_label_values(&[source, outcome])
        .inc();
    BYTES_SERVED_TOTAL
        .with_label_values(&[source])
        .inc_by(bytes_sent as f64);
}

pub fn record_upstream_duration(source: &str, ok: bool, duration_ms: f64) {
    let result = if ok { "ok" } else { "error" };
    UPSTREAM_DURATION_MS
        .with_label_values(&[source, result])
        .observe(duration_ms);
}
