//! Prometheus metrics for request traffic, PDF extraction, and quiz generation.

use std::{sync::LazyLock, time::Instant};

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use regex::Regex;

static UUID_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
        .expect("uuid pattern is valid")
});

static NUMBER_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\d+").expect("number pattern is valid"));

/// Initialize Prometheus metrics exporter
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )?
        // Upstream completions take seconds, not milliseconds
        .set_buckets_for_metric(
            Matcher::Full("quiz_generation_duration_seconds".to_string()),
            &[0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0],
        )?;

    Ok(builder.install_recorder()?)
}

/// Middleware to record HTTP request metrics
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    let in_flight = gauge!("http_requests_in_flight", "method" => method.clone(), "path" => path.clone());
    in_flight.increment(1.0);
    let response = next.run(req).await;
    in_flight.decrement(1.0);

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status.clone()
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => path,
        "status" => status
    )
    .record(duration);

    response
}

/// Normalize URL paths to reduce cardinality in metrics
/// Replaces UUIDs and numeric IDs with placeholders
fn normalize_path(path: &str) -> String {
    let normalized = UUID_SEGMENT.replace_all(path, ":id");
    NUMBER_SEGMENT.replace_all(&normalized, "/:id").into_owned()
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (StatusCode::OK, handle.render())
}

/// Record the outcome and duration of a quiz generation
pub fn record_generation_event(success: bool, duration_secs: f64) {
    let status = if success { "success" } else { "failure" };

    counter!("quiz_generations_total", "status" => status).increment(1);
    histogram!("quiz_generation_duration_seconds", "status" => status).record(duration_secs);
}

/// Record a PDF text extraction
pub fn record_pdf_extraction(success: bool, pages: usize) {
    let status = if success { "success" } else { "failure" };

    counter!("pdf_extractions_total", "status" => status).increment(1);
    if success {
        histogram!("pdf_extraction_pages").record(pages as f64);
    }
}
