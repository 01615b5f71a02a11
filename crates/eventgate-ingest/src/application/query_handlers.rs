//! Query handlers for the stats surface.
//!
//! Listing and counters read the durable store; queue status reads the
//! in-memory pipeline.

use eventgate_core::counters::CounterSnapshot;
use eventgate_core::error::DomainError;
use eventgate_core::event::StoredRecord;
use eventgate_core::store::{EventQuery, EventStore};

use crate::pipeline::worker::{PoolMonitor, PoolStatus};

/// Lists stored records matching `query`, newest arrival first.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the store cannot be read.
pub async fn list_events(
    query: &EventQuery,
    store: &dyn EventStore,
) -> Result<Vec<StoredRecord>, DomainError> {
    store.list_events(query).await
}

/// Reads the aggregate counters and per-topic record counts.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the store cannot be read.
pub async fn get_stats(store: &dyn EventStore) -> Result<CounterSnapshot, DomainError> {
    store.stats().await
}

/// Current queue depth, pool size and this process's outcome tallies.
#[must_use]
pub fn queue_status(monitor: &PoolMonitor) -> PoolStatus {
    monitor.status()
}
