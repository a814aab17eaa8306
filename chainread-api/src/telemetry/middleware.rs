//! Request metrics middleware.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};

use super::metrics::METRICS;

/// Record count and latency of every routed request.
///
/// Labels use the route template (`/logs/:log_id`) so identifiers never
/// become label values.
pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    let status = response.status();
    let duration = start.elapsed();
    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_http_request(method.as_str(), &route, status.as_u16(), duration.as_secs_f64());
    }
    if status.is_server_error() {
        tracing::warn!(%method, %route, status = status.as_u16(), duration_ms = duration.as_millis() as u64, "Request failed");
    } else {
        tracing::debug!(%method, %route, status = status.as_u16(), duration_ms = duration.as_millis() as u64, "Request completed");
    }

    response
}
