//! Prometheus metrics for pixelstash.
//!
//! Installs a global Prometheus recorder using `metrics-exporter-prometheus`,
//! defines metric name constants, provides the HTTP middleware used by the
//! local server, and exposes the `/metrics` endpoint handler.  Handlers call
//! the recording helpers whether or not a recorder is installed; without
//! one the `metrics` macros are no-ops.

use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

// -- Metric name constants ----------------------------------------------------

/// Notification entries processed by the fan-out (counter). Labels: outcome.
pub const EXTRACT_ITEMS_TOTAL: &str = "pixelstash_extract_items_total";

/// Notification batch size (histogram).
pub const EXTRACT_BATCH_SIZE: &str = "pixelstash_extract_batch_size";

/// Responder envelopes returned (counter). Labels: handler, status.
pub const RESPONSES_TOTAL: &str = "pixelstash_responses_total";

/// Total HTTP requests on the local server (counter). Labels: method, path, status.
pub const HTTP_REQUESTS_TOTAL: &str = "pixelstash_http_requests_total";

/// HTTP request duration in seconds (histogram). Labels: method, path.
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "pixelstash_http_request_duration_seconds";

// -- Global recorder installation ---------------------------------------------

/// Singleton handle to the Prometheus recorder.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus metrics recorder. Idempotent.
pub fn init_metrics() -> anyhow::Result<&'static PrometheusHandle> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle);
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {e}"))?;
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle))
}

/// Register metric descriptions with the global recorder.
pub fn describe_metrics() {
    describe_counter!(EXTRACT_ITEMS_TOTAL, "Notification entries processed by outcome");
    describe_histogram!(EXTRACT_BATCH_SIZE, "Entries per notification batch");
    describe_counter!(RESPONSES_TOTAL, "Responder envelopes by handler and status");
    describe_counter!(HTTP_REQUESTS_TOTAL, "Total HTTP requests");
    describe_histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "HTTP request duration in seconds"
    );
}

// -- Recording helpers --------------------------------------------------------

pub fn record_extract_item(outcome: &'static str) {
    counter!(EXTRACT_ITEMS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_batch_size(size: usize) {
    histogram!(EXTRACT_BATCH_SIZE).record(size as f64);
}

pub fn record_response(handler: &'static str, status: u16) {
    counter!(RESPONSES_TOTAL, "handler" => handler, "status" => status.to_string()).increment(1);
}

// -- Metrics middleware -------------------------------------------------------

/// Axum middleware that records HTTP RED metrics for every request.
///
/// Excludes `/metrics` from self-instrumentation.
pub async fn metrics_middleware(
    req: Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Response {
    if req.uri().path() == "/metrics" {
        return next.run(req).await;
    }

    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    let start = Instant::now();
    let response = next.run(req).await;
    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status
    )
    .increment(1);
    histogram!(HTTP_REQUEST_DURATION_SECONDS, "method" => method, "path" => path).record(duration);

    response
}

// -- Path normalization -------------------------------------------------------

/// Normalize a request path to its route template so object keys do not
/// become label values.
///
/// - `/download/cat.png` -> `/download/{s3objectkey}`
/// - `/images/a/b.jpg` -> `/images/{s3objectkey}`
/// - `/summary` -> `/summary`
fn normalize_path(path: &str) -> String {
    for route in ["/download/", "/images/"] {
        if path.starts_with(route) && path.len() > route.len() {
            return format!("{route}{{s3objectkey}}");
        }
    }
    match path {
        "/" | "/health" | "/events" | "/summary" => path.to_string(),
        _ => "/{other}".to_string(),
    }
}

// -- Metrics endpoint handler -------------------------------------------------

/// `GET /metrics` -- Render Prometheus exposition format text.
pub async fn metrics_handler() -> impl IntoResponse {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            StatusCode::NOT_FOUND,
            [("content-type", "text/plain")],
            "metrics disabled\n".to_string(),
        ),
    }
}

// -- Tests --------------------------------------------------------------------
