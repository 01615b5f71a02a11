//! Shared application state.

use std::sync::Arc;

use eventgate_core::clock::Clock;
use eventgate_core::store::EventStore;
use eventgate_ingest::pipeline::queue::IngestQueue;
use eventgate_ingest::pipeline::worker::PoolMonitor;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Source of `received_at` timestamps.
    pub clock: Arc<dyn Clock + Send + Sync>,
    /// Durable store, shared with the worker pool.
    pub store: Arc<dyn EventStore>,
    /// Queue feeding the worker pool.
    pub queue: Arc<IngestQueue>,
    /// Read handle on the running worker pool.
    pub pool_monitor: PoolMonitor,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock + Send + Sync>,
        store: Arc<dyn EventStore>,
        queue: Arc<IngestQueue>,
        pool_monitor: PoolMonitor,
    ) -> Self {
        Self {
            clock,
            store,
            queue,
            pool_monitor,
        }
    }
}
