//! Shared helpers for gateway integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use eventgate_core::clock::Clock;
use eventgate_core::store::EventStore;
use eventgate_ingest::pipeline::persist::RetryPolicy;
use eventgate_ingest::pipeline::queue::IngestQueue;
use eventgate_ingest::pipeline::worker::WorkerPool;
use eventgate_store::pg_event_store::PgEventStore;
use eventgate_test_support::FixedClock;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use eventgate_api::routes;
use eventgate_api::state::AppState;

/// Fixed arrival time used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock + Send + Sync> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// Builds the full router over a real `PgEventStore`, with a running pool of
/// `workers` persistence workers. Uses the same route structure as `main.rs`.
pub fn build_test_app(pool: PgPool, workers: usize) -> (Router, WorkerPool) {
    let store: Arc<dyn EventStore> = Arc::new(PgEventStore::new(pool));
    let queue = Arc::new(IngestQueue::new());
    let worker_pool = WorkerPool::spawn(
        workers,
        Arc::clone(&queue),
        Arc::clone(&store),
        RetryPolicy::default(),
    )
    .unwrap();
    let app_state = AppState::new(fixed_clock(), store, queue, worker_pool.monitor());

    (routes::build_router(app_state), worker_pool)
}

/// A valid event body with the given id and topic.
pub fn event_body(event_id: &str, topic: &str) -> serde_json::Value {
    serde_json::json!({
        "topic": topic,
        "event_id": event_id,
        "source": "s",
        "timestamp": "2025-01-01T00:00:00Z",
        "payload": {}
    })
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}
