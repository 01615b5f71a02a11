//! Stored event listing.

use axum::extract::{Query, State};
use axum::{Json, Router, routing::get};
use serde::Deserialize;
use tracing::instrument;

use eventgate_core::event::StoredRecord;
use eventgate_core::store::EventQuery;
use eventgate_ingest::application::query_handlers;

use crate::error::ApiError;
use crate::state::AppState;

/// Query string for `GET /events`.
#[derive(Debug, Default, Deserialize)]
pub struct ListEventsParams {
    /// Restrict to one topic.
    pub topic: Option<String>,
    /// Page size; defaults to 100, clamped to `1..=1000`.
    pub limit: Option<u32>,
    /// Records to skip.
    pub offset: Option<u32>,
}

/// GET /events
#[instrument(skip(state))]
async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<ListEventsParams>,
) -> Result<Json<Vec<StoredRecord>>, ApiError> {
    let query = EventQuery::new(params.topic, params.limit, params.offset);
    let records = query_handlers::list_events(&query, state.store.as_ref()).await?;
    Ok(Json(records))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/events", get(list_events))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use chrono::{Duration, TimeZone, Utc};
    use eventgate_core::event::PendingEvent;
    use eventgate_core::store::EventStore;
    use eventgate_test_support::{FailingEventStore, InMemoryEventStore, make_event};

    use super::*;
    use crate::routes::test_helpers::{app_state_with, get, send};

    async fn seeded_store() -> Arc<InMemoryEventStore> {
        let store = Arc::new(InMemoryEventStore::new());
        let base = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        for (i, (id, topic)) in [("a1", "alpha"), ("b1", "beta"), ("a2", "alpha")]
            .into_iter()
            .enumerate()
        {
            let pending = PendingEvent::new(
                make_event(id, topic),
                base + Duration::seconds(i64::try_from(i).unwrap()),
            );
            store
                .insert_event(&StoredRecord::from_pending(&pending))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_list_events_returns_newest_first() {
        // Arrange
        let (state, _pool) = app_state_with(seeded_store().await);
        let app = router().with_state(state);

        // Act
        let (status, json) = send(app, get("/events")).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["event_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["a2", "b1", "a1"]);
    }

    #[tokio::test]
    async fn test_list_events_filters_by_topic_and_pages() {
        // Arrange
        let (state, _pool) = app_state_with(seeded_store().await);
        let app = router().with_state(state);

        // Act
        let (status, json) = send(app, get("/events?topic=alpha&limit=1&offset=1")).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        let records = json.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["event_id"], "a1");
        assert_eq!(records[0]["topic"], "alpha");
    }

    #[tokio::test]
    async fn test_list_events_on_empty_store_returns_empty_array() {
        // Arrange
        let (state, _pool) = app_state_with(Arc::new(InMemoryEventStore::new()));
        let app = router().with_state(state);

        // Act
        let (status, json) = send(app, get("/events")).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_list_events_rejects_non_numeric_limit() {
        // Arrange
        let (state, _pool) = app_state_with(Arc::new(InMemoryEventStore::new()));
        let app = router().with_state(state);

        // Act
        let (status, _) = send(app, get("/events?limit=lots")).await;

        // Assert
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_events_returns_500_when_store_fails() {
        // Arrange
        let (state, _pool) = app_state_with(Arc::new(FailingEventStore));
        let app = router().with_state(state);

        // Act
        let (status, json) = send(app, get("/events")).await;

        // Assert
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "infrastructure_error");
    }
}
