//! Router tests over in-memory tiers.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chainread_api::{create_router, AppState};
use chainread_storage::{ChainReader, ReaderConfig};
use chainread_test_utils::fixtures::{build_chain, head_of, unknown_id};
use chainread_test_utils::{
    Event, EventId, InMemoryHeadLookup, InMemoryOrigin, InMemoryRemoteCache, LogId,
};
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

struct TestApp {
    router: Router,
    reader: Arc<ChainReader>,
    log_id: LogId,
    chain: Vec<Event>,
    origin: Arc<InMemoryOrigin>,
    remote: Arc<InMemoryRemoteCache>,
    heads: Arc<InMemoryHeadLookup>,
}

fn test_app(len: usize) -> TestApp {
    let chain = build_chain(len);
    let origin = Arc::new(InMemoryOrigin::with_events(&chain));
    let remote = Arc::new(InMemoryRemoteCache::new());
    let heads = Arc::new(InMemoryHeadLookup::new());
    let log_id = LogId::new_random();
    heads.set_head(log_id, head_of(&chain));

    let reader = Arc::new(
        ChainReader::new(&ReaderConfig::default(), remote.clone(), origin.clone()).unwrap(),
    );
    let state = AppState::new(Arc::clone(&reader), heads.clone());
    TestApp {
        router: create_router(state),
        reader,
        log_id,
        chain,
        origin,
        remote,
        heads,
    }
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(router, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn root_reports_online() {
    let app = test_app(0);
    let (status, body) = get(&app.router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"The service is online!\n");
}

#[tokio::test]
async fn log_head_is_returned() {
    let app = test_app(3);
    let (status, json) = get_json(&app.router, &format!("/logs/{}", app.log_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["logId"], app.log_id.to_string());
    assert_eq!(json["data"]["head"], app.chain[2].id.to_string());
}

#[tokio::test]
async fn unknown_log_has_sentinel_head_and_no_events() {
    let app = test_app(3);
    let other = LogId::new_random();

    let (status, json) = get_json(&app.router, &format!("/logs/{}", other)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["head"], EventId::SENTINEL.to_string());

    let (status, json) = get_json(&app.router, &format!("/logs/{}/events", other)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["events"].as_array().unwrap().len(), 0);
    assert_eq!(app.origin.total_fetches(), 0);
}

#[tokio::test]
async fn full_history_is_chronological() {
    let app = test_app(3);
    let (status, json) = get_json(&app.router, &format!("/logs/{}/events", app.log_id)).await;
    assert_eq!(status, StatusCode::OK);

    let events = json["data"]["events"].as_array().unwrap();
    let ids: Vec<&str> = events.iter().map(|e| e["eventId"].as_str().unwrap()).collect();
    let expected: Vec<String> = app.chain.iter().map(|e| e.id.to_string()).collect();
    assert_eq!(ids, expected);
    assert!(events[0].get("previous").is_none());
    assert_eq!(events[1]["previous"], app.chain[0].id.to_string());
    assert_eq!(events[2]["type"], "event.2");
}

#[tokio::test]
async fn history_after_cursor() {
    let app = test_app(3);
    let uri = format!("/logs/{}/events?after={}", app.log_id, app.chain[0].id);
    let (status, json) = get_json(&app.router, &uri).await;
    assert_eq!(status, StatusCode::OK);

    let events = json["data"]["events"].as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["eventId"], app.chain[1].id.to_string());
    assert_eq!(events[1]["eventId"], app.chain[2].id.to_string());
}

#[tokio::test]
async fn bad_identifiers_are_rejected() {
    let app = test_app(1);

    let (status, json) = get_json(&app.router, "/logs/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "INVALID_LOG_ID");

    let uri = format!("/logs/{}/events?after=xyz", app.log_id);
    let (status, json) = get_json(&app.router, &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "INVALID_EVENT_ID");

    let (status, _) = get_json(&app.router, "/events/abcd").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn event_lookup_reads_through() {
    let app = test_app(2);
    let uri = format!("/events/{}", app.chain[1].id);

    let (status, json) = get_json(&app.router, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["eventId"], app.chain[1].id.to_string());
    assert_eq!(json["data"]["previous"], app.chain[0].id.to_string());

    app.reader.wait_for_population().await;
    assert!(app.reader.local().contains(&app.chain[1].id));

    let (status, _) = get_json(&app.router, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.origin.fetch_count(&app.chain[1].id), 1);
    assert_eq!(app.reader.stats().local_hits, 1);
}

#[tokio::test]
async fn missing_event_is_not_found() {
    let app = test_app(1);
    let (status, json) = get_json(&app.router, &format!("/events/{}", unknown_id())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "EVENT_NOT_FOUND");
}

#[tokio::test]
async fn origin_failure_is_server_error() {
    let app = test_app(3);
    app.origin.fail_on(app.chain[1].id);

    let (status, json) = get_json(&app.router, &format!("/logs/{}/events", app.log_id)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["code"], "UPSTREAM_ERROR");
    assert!(json.get("data").is_none());
}

#[tokio::test]
async fn head_lookup_failure_is_server_error() {
    let app = test_app(1);
    app.heads.set_unavailable(true);
    let (status, json) = get_json(&app.router, &format!("/logs/{}", app.log_id)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["code"], "DATABASE_ERROR");
}

#[tokio::test]
async fn readiness_reflects_dependencies() {
    let app = test_app(0);

    let (status, json) = get_json(&app.router, "/health/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");

    app.remote.set_unavailable(true);
    let (status, json) = get_json(&app.router, "/health/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "degraded");

    app.heads.set_unavailable(true);
    let (status, json) = get_json(&app.router, "/health/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "unhealthy");
}

#[tokio::test]
async fn liveness_and_ping() {
    let app = test_app(0);
    let (status, body) = get(&app.router, "/health/ping").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"pong");

    let (status, json) = get_json(&app.router, "/health/live").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn metrics_expose_tier_counters() {
    let app = test_app(2);
    get(&app.router, &format!("/logs/{}/events", app.log_id)).await;

    let (status, body) = get(&app.router, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("chainread_tier_lookups_since_start{tier=\"origin\"} 2"));
    assert!(text.contains("chainread_http_requests_total"));
}
