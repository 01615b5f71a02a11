//! Aggregate counters and persist outcomes.

use std::collections::BTreeMap;

use serde::Serialize;

/// One of the three process-wide tallies kept in the store's counters row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    /// Events accepted by the gateway, duplicates included.
    Received,
    /// Events that created a new stored record.
    UniqueProcessed,
    /// Events whose insert collided with an existing `event_id`.
    DuplicateDropped,
}

impl Counter {
    /// Column name in the counters row.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::UniqueProcessed => "unique_processed",
            Self::DuplicateDropped => "duplicate_dropped",
        }
    }
}

/// Terminal outcome of an idempotent insert that reached the store.
///
/// Each outcome corresponds to exactly one counter increment performed by the
/// store in the same transaction as the insert attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new stored record was created; `unique_processed` was incremented.
    Created,
    /// The `event_id` already existed; `duplicate_dropped` was incremented.
    Duplicate,
}

impl InsertOutcome {
    /// The counter this outcome increments.
    #[must_use]
    pub fn counter(self) -> Counter {
        match self {
            Self::Created => Counter::UniqueProcessed,
            Self::Duplicate => Counter::DuplicateDropped,
        }
    }
}

/// Point-in-time read of the counters row plus per-topic record counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    /// Events accepted by the gateway.
    pub received: i64,
    /// Distinct events stored.
    pub unique_processed: i64,
    /// Duplicate submissions dropped at persist time.
    pub duplicate_dropped: i64,
    /// Stored records per topic.
    pub topics: BTreeMap<String, i64>,
}

impl CounterSnapshot {
    /// Events counted as received but not (yet) resolved to a persist
    /// outcome: still in flight, or dropped after a store failure.
    #[must_use]
    pub fn unresolved(&self) -> i64 {
        self.received - self.unique_processed - self.duplicate_dropped
    }
}
