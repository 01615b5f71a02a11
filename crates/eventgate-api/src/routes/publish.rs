//! Event intake routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use eventgate_ingest::application::command_handlers;
use eventgate_ingest::domain::validation;

use crate::error::ApiError;
use crate::state::AppState;

/// Response body for an accepted event.
#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    /// Always `"accepted"`.
    pub status: &'static str,
    /// The accepted event's idempotency key.
    pub event_id: String,
}

/// Response body for an accepted batch.
#[derive(Debug, Serialize)]
pub struct BatchAcceptedResponse {
    /// Always `"accepted"`.
    pub status: &'static str,
    /// Number of events accepted.
    pub count: usize,
}

/// POST /publish
#[instrument(skip(state, body))]
async fn publish(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    let event = validation::parse_event(&body)?;

    let receipt = command_handlers::handle_submit(
        event,
        state.clock.as_ref(),
        state.store.as_ref(),
        &state.queue,
    )
    .await?;

    info!(
        event_id = %receipt.event_id,
        ingest_id = %receipt.ingest_id,
        "event accepted"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            status: "accepted",
            event_id: receipt.event_id,
        }),
    ))
}

/// POST /publish/batch
#[instrument(skip(state, body))]
async fn publish_batch(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<BatchAcceptedResponse>), ApiError> {
    let events = validation::parse_batch(&body)?;

    let count = command_handlers::handle_submit_batch(
        events,
        state.clock.as_ref(),
        state.store.as_ref(),
        &state.queue,
    )
    .await?;

    info!(count, "batch accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(BatchAcceptedResponse {
            status: "accepted",
            count,
        }),
    ))
}

/// Returns the intake router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/publish", post(publish))
        .route("/publish/batch", post(publish_batch))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use eventgate_core::store::EventStore;
    use eventgate_ingest::pipeline::worker::ShutdownMode;
    use eventgate_test_support::{FailingEventStore, InMemoryEventStore};
    use serde_json::json;

    use super::*;
    use crate::routes::test_helpers::{app_state_with, post, send};

    fn event(event_id: &str) -> Value {
        json!({
            "topic": "t",
            "event_id": event_id,
            "source": "s",
            "timestamp": "2025-01-01T00:00:00Z",
            "payload": {}
        })
    }

    #[tokio::test]
    async fn test_publish_returns_202_and_persists() {
        // Arrange
        let store = Arc::new(InMemoryEventStore::new());
        let (state, pool) = app_state_with(store.clone());
        let app = router().with_state(state);

        // Act
        let (status, json) = send(app, post("/publish", &event("e1"))).await;
        pool.shutdown(ShutdownMode::Drain).await;

        // Assert
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(json["status"], "accepted");
        assert_eq!(json["event_id"], "e1");
        assert_eq!(store.count_of("e1"), 1);
        assert_eq!(store.stats().await.unwrap().received, 1);
    }

    #[tokio::test]
    async fn test_publish_missing_fields_returns_400_and_counts_nothing() {
        // Arrange
        let store = Arc::new(InMemoryEventStore::new());
        let (state, _pool) = app_state_with(store.clone());
        let app = router().with_state(state);

        // Act
        let (status, json) = send(app, post("/publish", &json!({"topic": "test"}))).await;

        // Assert
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
        assert_eq!(json["message"], "missing field: event_id");
        assert_eq!(store.stats().await.unwrap().received, 0);
    }

    #[tokio::test]
    async fn test_publish_invalid_timestamp_returns_400() {
        // Arrange
        let (state, _pool) = app_state_with(Arc::new(InMemoryEventStore::new()));
        let app = router().with_state(state);
        let mut body = event("invalid-ts");
        body["timestamp"] = json!("not-a-timestamp");

        // Act
        let (status, json) = send(app, post("/publish", &body)).await;

        // Assert
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "invalid timestamp format");
    }

    #[tokio::test]
    async fn test_publish_with_nul_character_returns_400_and_counts_nothing() {
        // Arrange
        let store = Arc::new(InMemoryEventStore::new());
        let (state, _pool) = app_state_with(store.clone());
        let app = router().with_state(state);

        // Act
        let (status, json) = send(app, post("/publish", &event("a\u{0}b"))).await;

        // Assert
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "field event_id must not contain NUL characters");
        assert_eq!(store.stats().await.unwrap().received, 0);
    }

    #[tokio::test]
    async fn test_publish_returns_500_when_store_fails() {
        // Arrange
        let (state, _pool) = app_state_with(Arc::new(FailingEventStore));
        let app = router().with_state(state);

        // Act
        let (status, json) = send(app, post("/publish", &event("e1"))).await;

        // Assert
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "infrastructure_error");
    }

    #[tokio::test]
    async fn test_publish_returns_503_once_intake_is_closed() {
        // Arrange
        let (state, pool) = app_state_with(Arc::new(InMemoryEventStore::new()));
        let app = router().with_state(state);
        pool.shutdown(ShutdownMode::Drain).await;

        // Act
        let (status, json) = send(app, post("/publish", &event("e1"))).await;

        // Assert
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "shutting_down");
    }

    #[tokio::test]
    async fn test_publish_batch_returns_202_with_count() {
        // Arrange
        let store = Arc::new(InMemoryEventStore::new());
        let (state, pool) = app_state_with(store.clone());
        let app = router().with_state(state);
        let body = json!({"events": [event("bd-1"), event("bd-1"), event("bd-2"), event("bd-2")]});

        // Act
        let (status, json) = send(app, post("/publish/batch", &body)).await;
        pool.shutdown(ShutdownMode::Drain).await;

        // Assert
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(json["count"], 4);
        assert_eq!(store.records().len(), 2);
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.received, 4);
        assert_eq!(stats.duplicate_dropped, 2);
    }

    #[tokio::test]
    async fn test_publish_batch_with_invalid_event_accepts_nothing() {
        // Arrange
        let store = Arc::new(InMemoryEventStore::new());
        let (state, _pool) = app_state_with(store.clone());
        let app = router().with_state(state);
        let body = json!({"events": [event("ok"), {"topic": "t"}]});

        // Act
        let (status, json) = send(app, post("/publish/batch", &body)).await;

        // Assert
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "event 1: missing field: event_id");
        assert_eq!(store.stats().await.unwrap().received, 0);
    }

    #[tokio::test]
    async fn test_publish_batch_without_events_returns_400() {
        // Arrange
        let (state, _pool) = app_state_with(Arc::new(InMemoryEventStore::new()));
        let app = router().with_state(state);

        // Act
        let (status, json) = send(app, post("/publish/batch", &json!({}))).await;

        // Assert
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "missing field: events");
    }
}
