//! Counter and pipeline status endpoints.

use axum::extract::State;
use axum::{Json, Router, routing::get};
use tracing::instrument;

use eventgate_core::counters::CounterSnapshot;
use eventgate_ingest::application::query_handlers;
use eventgate_ingest::pipeline::worker::PoolStatus;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /stats
///
/// Durable counters plus per-topic record counts. The counters are the
/// store's, so they survive restarts and agree across replicas.
#[instrument(skip(state))]
async fn stats(State(state): State<AppState>) -> Result<Json<CounterSnapshot>, ApiError> {
    let snapshot = query_handlers::get_stats(state.store.as_ref()).await?;
    Ok(Json(snapshot))
}

/// GET /queue/status
async fn queue_status(State(state): State<AppState>) -> Json<PoolStatus> {
    Json(query_handlers::queue_status(&state.pool_monitor))
}

/// Returns the stats router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/queue/status", get(queue_status))
}
