//! Prometheus Metrics Definitions
//!
//! HTTP request metrics are recorded by the middleware as requests complete.
//! Cache tier and population gauges are snapshots of the reader's atomic
//! counters, copied on every scrape of `/metrics`. Those that only grow carry
//! a `_since_start` suffix instead of `_total`, since they are not Prometheus
//! counters.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use chainread_storage::{CacheStats, PopulationStats, ReaderStats};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, register_histogram_vec, CounterVec,
    Encoder, Gauge, GaugeVec, HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// HTTP request latency buckets (seconds)
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics instance - initialized once at startup
pub static METRICS: Lazy<ApiResult<ChainreadMetrics>> = Lazy::new(ChainreadMetrics::new);

fn registration_error(name: &str, e: prometheus::Error) -> ApiError {
    ApiError::internal_error(format!("Failed to register {}: {}", name, e))
}

/// Container for all chainread metrics.
#[derive(Clone)]
pub struct ChainreadMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Snapshot of lookups answered per tier - labels: tier
    pub tier_lookups: GaugeVec,

    /// Snapshot of failed origin fetches
    pub origin_failures: Gauge,

    /// Events resident in the local cache
    pub local_entries: Gauge,

    /// Snapshot of local cache evictions
    pub local_evictions: Gauge,

    /// Snapshot of population activity - labels: state (enqueued, completed, dropped)
    pub population: GaugeVec,
}

impl ChainreadMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "chainread_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_error("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "chainread_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("http_request_duration_seconds", e))?,

            tier_lookups: register_gauge_vec!(
                "chainread_tier_lookups_since_start",
                "Event lookups answered by each tier since startup",
                &["tier"]
            )
            .map_err(|e| registration_error("tier_lookups", e))?,

            origin_failures: register_gauge!(
                "chainread_origin_failures_since_start",
                "Origin fetches that failed since startup"
            )
            .map_err(|e| registration_error("origin_failures", e))?,

            local_entries: register_gauge!(
                "chainread_local_cache_entries",
                "Events resident in the local cache"
            )
            .map_err(|e| registration_error("local_cache_entries", e))?,

            local_evictions: register_gauge!(
                "chainread_local_cache_evictions_since_start",
                "Local cache evictions since startup"
            )
            .map_err(|e| registration_error("local_cache_evictions", e))?,

            population: register_gauge_vec!(
                "chainread_population_events_since_start",
                "Cache population activity since startup",
                &["state"]
            )
            .map_err(|e| registration_error("population_events", e))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Copy reader counters into the gauges.
    pub fn observe_reader(&self, reader: ReaderStats, local: CacheStats, population: PopulationStats) {
        self.tier_lookups
            .with_label_values(&["local"])
            .set(reader.local_hits as f64);
        self.tier_lookups
            .with_label_values(&["remote"])
            .set(reader.remote_hits as f64);
        self.tier_lookups
            .with_label_values(&["origin"])
            .set(reader.origin_fetches as f64);
        self.origin_failures.set(reader.origin_failures as f64);

        self.local_entries.set(local.entry_count as f64);
        self.local_evictions.set(local.evictions as f64);

        self.population
            .with_label_values(&["enqueued"])
            .set(population.enqueued as f64);
        self.population
            .with_label_values(&["completed"])
            .set(population.completed as f64);
        self.population
            .with_label_values(&["dropped"])
            .set(population.dropped as f64);
    }
}

/// Handler for GET /metrics.
///
/// Returns Prometheus text format metrics.
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match METRICS.as_ref() {
        Ok(metrics) => metrics.observe_reader(
            state.reader.stats(),
            state.reader.local_stats(),
            state.reader.population_stats(),
        ),
        Err(e) => tracing::error!(error = %e, "Metrics unavailable"),
    }

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::core::Collector;

    #[test]
    fn test_metrics_creation() -> Result<(), String> {
        let metrics = METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.message))?;
        assert!(!metrics.http_requests_total.desc().is_empty());
        Ok(())
    }

    #[test]
    fn test_observe_reader() -> Result<(), String> {
        let metrics = METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.message))?;
        let reader = ReaderStats {
            local_hits: 5,
            remote_hits: 3,
            origin_fetches: 2,
            origin_failures: 1,
        };
        let population = PopulationStats {
            enqueued: 2,
            completed: 1,
            dropped: 0,
        };
        metrics.observe_reader(reader, CacheStats::default(), population);
        assert_eq!(metrics.tier_lookups.with_label_values(&["remote"]).get(), 3.0);
        assert_eq!(metrics.population.with_label_values(&["completed"]).get(), 1.0);
        Ok(())
    }
}
