//! HTTP routes.

use axum::Router;

use crate::state::AppState;

pub mod events;
pub mod health;
pub mod publish;
pub mod stats;

/// Builds the full application router. Layers (tracing, CORS) are added by
/// the caller.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(publish::router())
        .merge(events::router())
        .merge(stats::router())
        .with_state(state)
}
