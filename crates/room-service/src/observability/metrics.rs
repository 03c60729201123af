//! Metrics definitions for the room service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `room_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: 7 values max (GET, POST, PATCH, DELETE, PUT, HEAD, OPTIONS)
//! - `endpoint`: ~10 values (parameterized paths)
//! - `status`: 3 values (success, error, timeout)

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus metrics recorder and return the handle for
/// serving metrics via HTTP.
///
/// Must be called before any metrics are recorded, once per process.
///
/// # Errors
///
/// Returns an error if the recorder fails to install (e.g. already
/// installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("room_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `room_http_requests_total`, `room_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
///
/// This captures ALL HTTP responses including framework-level errors like:
/// - 400 Bad Request (JSON parse errors)
/// - 404 Not Found
/// - 405 Method Not Allowed
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    // Normalize endpoint to prevent cardinality explosion
    let normalized_endpoint = normalize_endpoint(endpoint);

    // Determine status category for simplified querying
    let status = categorize_status_code(status_code);

    histogram!("room_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("room_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion
///
/// Replaces dynamic segments (room codes, message ids) with placeholders.
fn normalize_endpoint(path: &str) -> String {
    // Known static paths
    match path {
        "/" => "/".to_string(),
        "/health" => "/health".to_string(),
        "/ready" => "/ready".to_string(),
        "/metrics" => "/metrics".to_string(),
        "/api/v1/rooms" => "/api/v1/rooms".to_string(),
        _ => normalize_dynamic_endpoint(path),
    }
}

/// Normalize paths with dynamic segments
fn normalize_dynamic_endpoint(path: &str) -> String {
    if path.starts_with("/api/v1/rooms/") {
        let parts: Vec<&str> = path.split('/').collect();

        // /api/v1/rooms/{code} → parts.len() == 5
        if parts.len() == 5 {
            return "/api/v1/rooms/{code}".to_string();
        }

        // /api/v1/rooms/{code}/<action> → parts.len() == 6
        if parts.len() == 6 {
            if let Some(action) = parts.get(5) {
                if matches!(*action, "exists" | "join" | "ttl" | "messages" | "typing") {
                    return format!("/api/v1/rooms/{{code}}/{action}");
                }
            }
        }

        // /api/v1/rooms/{code}/messages/{id} → parts.len() == 7
        if parts.len() == 7 && parts.get(5) == Some(&"messages") {
            return "/api/v1/rooms/{code}/messages/{id}".to_string();
        }

        // /api/v1/rooms/{code}/messages/{id}/reactions → parts.len() == 8
        if parts.len() == 8
            && parts.get(5) == Some(&"messages")
            && parts.get(7) == Some(&"reactions")
        {
            return "/api/v1/rooms/{code}/messages/{id}/reactions".to_string();
        }
    }

    // Unknown paths normalized to "/other" to bound cardinality
    "/other".to_string()
}
