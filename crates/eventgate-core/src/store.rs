//! Durable store abstraction.

use async_trait::async_trait;

use crate::counters::{Counter, CounterSnapshot, InsertOutcome};
use crate::error::DomainError;
use crate::event::StoredRecord;

/// Default page size for record listings.
pub const DEFAULT_LIST_LIMIT: u32 = 100;

/// Largest page size a listing will return.
pub const MAX_LIST_LIMIT: u32 = 1000;

/// Filter and page for [`EventStore::list_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    /// Only records with this topic, when set.
    pub topic: Option<String>,
    /// Page size, within `1..=MAX_LIST_LIMIT`.
    pub limit: u32,
    /// Number of records to skip.
    pub offset: u32,
}

impl EventQuery {
    /// Builds a query, applying defaults and clamping `limit` into range.
    #[must_use]
    pub fn new(topic: Option<String>, limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            topic: topic.filter(|t| !t.is_empty()),
            limit: limit
                .unwrap_or(DEFAULT_LIST_LIMIT)
                .clamp(1, MAX_LIST_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }
}

impl Default for EventQuery {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

/// A durable store offering a uniqueness constraint on `event_id`, single
/// transactions and atomic counter increments.
///
/// Implementations must enforce deduplication with the store's own
/// constraint, never with a read-then-write in the caller.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Inserts `record` and increments the matching counter in one
    /// transaction.
    ///
    /// Returns `Created` if the record is new, `Duplicate` if its `event_id`
    /// already exists. Concurrent calls with the same `event_id` yield
    /// exactly one `Created`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` for any failure other than the
    /// uniqueness conflict; nothing is committed in that case.
    async fn insert_event(&self, record: &StoredRecord) -> Result<InsertOutcome, DomainError>;

    /// Atomically adds one to `counter`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store is unreachable.
    async fn increment(&self, counter: Counter) -> Result<(), DomainError>;

    /// Lists stored records, newest arrival first.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store is unreachable.
    async fn list_events(&self, query: &EventQuery) -> Result<Vec<StoredRecord>, DomainError>;

    /// Reads the counters row and per-topic record counts.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store is unreachable.
    async fn stats(&self) -> Result<CounterSnapshot, DomainError>;
}
