//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "intake_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "intake_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "intake_http_requests_in_flight";

    // Analysis metrics
    pub const ANALYSES_TOTAL: &str = "intake_analyses_total";
    pub const STAGED_BYTES: &str = "intake_staged_bytes";
    pub const UPLOAD_DURATION_SECONDS: &str = "intake_upload_duration_seconds";
    pub const PROCESSING_WAIT_SECONDS: &str = "intake_processing_wait_seconds";
    pub const GENERATE_DURATION_SECONDS: &str = "intake_generate_duration_seconds";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "intake_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a finished analysis by outcome code (`ok`, `missing_query`, ...).
pub fn record_analysis(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::ANALYSES_TOTAL, &labels).increment(1);
}

/// Record size of a staged upload.
pub fn record_staged_bytes(bytes: u64) {
    histogram!(names::STAGED_BYTES).record(bytes as f64);
}

/// Record upload duration.
pub fn record_upload_duration(duration_secs: f64) {
    histogram!(names::UPLOAD_DURATION_SECONDS).record(duration_secs);
}

/// Record time spent waiting for the provider to process a file.
pub fn record_processing_wait(duration_secs: f64) {
    histogram!(names::PROCESSING_WAIT_SECONDS).record(duration_secs);
}

/// Record generation duration.
pub fn record_generate_duration(model: &str, duration_secs: f64) {
    let labels = [("model", model.to_string())];
    histogram!(names::GENERATE_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Metrics middleware for HTTP requests.
///
/// Labels use the matched route, so unknown paths collapse into one series.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
