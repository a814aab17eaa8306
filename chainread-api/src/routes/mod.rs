//! HTTP routes.

pub mod events;
pub mod health;
pub mod logs;

use axum::{middleware::from_fn, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

/// GET /
pub async fn root() -> &'static str {
    "The service is online!\n"
}

fn health_router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(health::ping))
        .route("/live", get(health::liveness))
        .route("/ready", get(health::readiness))
}

/// Build the full service router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .nest("/health", health_router())
        .route("/metrics", get(metrics_handler))
        .route("/logs/:log_id", get(logs::get_log_head))
        .route("/logs/:log_id/events", get(logs::get_log_events))
        .route("/events/:event_id", get(events::get_event))
        .route_layer(from_fn(observability_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
