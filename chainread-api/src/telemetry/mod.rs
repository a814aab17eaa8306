//! chainread Telemetry - Observability Infrastructure
//!
//! Structured logging through tracing-subscriber and Prometheus metrics for
//! the HTTP layer and the cache tiers.

pub mod metrics;
pub mod middleware;
pub mod tracer;

pub use metrics::{metrics_handler, ChainreadMetrics, METRICS};
pub use middleware::observability_middleware;
pub use tracer::init_tracing;
