//! `EventStore` implementations for tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use eventgate_core::counters::{Counter, CounterSnapshot, InsertOutcome};
use eventgate_core::error::DomainError;
use eventgate_core::event::StoredRecord;
use eventgate_core::store::{EventQuery, EventStore};

#[derive(Debug, Default)]
struct State {
    records: Vec<StoredRecord>,
    event_ids: HashSet<String>,
    received: i64,
    unique_processed: i64,
    duplicate_dropped: i64,
}

/// An in-memory store with the same uniqueness and counter semantics as the
/// PostgreSQL store. The check-and-insert happens under one lock, which plays
/// the role of the unique constraint.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    state: Mutex<State>,
    insert_delay: Option<Duration>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store whose inserts first sleep for `delay`, outside
    /// the lock, so concurrent workers interleave.
    #[must_use]
    pub fn with_insert_delay(delay: Duration) -> Self {
        Self {
            state: Mutex::default(),
            insert_delay: Some(delay),
        }
    }

    /// Returns a snapshot of every stored record in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn records(&self) -> Vec<StoredRecord> {
        self.state.lock().unwrap().records.clone()
    }

    /// Returns the number of stored records with `event_id`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn count_of(&self, event_id: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .filter(|r| r.event_id == event_id)
            .count()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn insert_event(&self, record: &StoredRecord) -> Result<InsertOutcome, DomainError> {
        if let Some(delay) = self.insert_delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        if state.event_ids.insert(record.event_id.clone()) {
            let mut stored = record.clone();
            stored.id = i64::try_from(state.records.len()).unwrap() + 1;
            state.records.push(stored);
            state.unique_processed += 1;
            Ok(InsertOutcome::Created)
        } else {
            state.duplicate_dropped += 1;
            Ok(InsertOutcome::Duplicate)
        }
    }

    async fn increment(&self, counter: Counter) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        match counter {
            Counter::Received => state.received += 1,
            Counter::UniqueProcessed => state.unique_processed += 1,
            Counter::DuplicateDropped => state.duplicate_dropped += 1,
        }
        Ok(())
    }

    async fn list_events(&self, query: &EventQuery) -> Result<Vec<StoredRecord>, DomainError> {
        let state = self.state.lock().unwrap();
        let mut matching: Vec<StoredRecord> = state
            .records
            .iter()
            .filter(|r| query.topic.as_deref().is_none_or(|t| r.topic == t))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.received_at
                .cmp(&a.received_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect())
    }

    async fn stats(&self) -> Result<CounterSnapshot, DomainError> {
        let state = self.state.lock().unwrap();
        let mut topics = BTreeMap::new();
        for record in &state.records {
            *topics.entry(record.topic.clone()).or_insert(0) += 1;
        }
        Ok(CounterSnapshot {
            received: state.received,
            unique_processed: state.unique_processed,
            duplicate_dropped: state.duplicate_dropped,
            topics,
        })
    }
}

/// A store that always returns an infrastructure error. Useful for testing
/// error-handling paths.
#[derive(Debug)]
pub struct FailingEventStore;

#[async_trait]
impl EventStore for FailingEventStore {
    async fn insert_event(&self, _record: &StoredRecord) -> Result<InsertOutcome, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn increment(&self, _counter: Counter) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn list_events(&self, _query: &EventQuery) -> Result<Vec<StoredRecord>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn stats(&self) -> Result<CounterSnapshot, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

/// A store whose inserts are always refused as bad data, counting how often
/// it was asked.
#[derive(Debug, Default)]
pub struct RejectingEventStore {
    insert_attempts: AtomicU32,
}

impl RejectingEventStore {
    /// Creates a store that has seen no inserts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `insert_event` calls so far.
    #[must_use]
    pub fn insert_attempts(&self) -> u32 {
        self.insert_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventStore for RejectingEventStore {
    async fn insert_event(&self, _record: &StoredRecord) -> Result<InsertOutcome, DomainError> {
        self.insert_attempts.fetch_add(1, Ordering::SeqCst);
        Err(DomainError::Rejected(
            "invalid byte sequence for encoding \"UTF8\": 0x00".into(),
        ))
    }

    async fn increment(&self, _counter: Counter) -> Result<(), DomainError> {
        Ok(())
    }

    async fn list_events(&self, _query: &EventQuery) -> Result<Vec<StoredRecord>, DomainError> {
        Ok(Vec::new())
    }

    async fn stats(&self) -> Result<CounterSnapshot, DomainError> {
        Ok(CounterSnapshot::default())
    }
}

/// An in-memory store whose first `failures` calls to `insert_event` fail
/// with an infrastructure error. Everything else delegates to the wrapped
/// [`InMemoryEventStore`].
#[derive(Debug)]
pub struct FlakyEventStore {
    inner: InMemoryEventStore,
    remaining_failures: AtomicU32,
}

impl FlakyEventStore {
    /// Creates a store that fails the next `failures` inserts.
    #[must_use]
    pub fn new(failures: u32) -> Self {
        Self {
            inner: InMemoryEventStore::new(),
            remaining_failures: AtomicU32::new(failures),
        }
    }

    /// The wrapped store, for assertions.
    #[must_use]
    pub fn inner(&self) -> &InMemoryEventStore {
        &self.inner
    }
}

#[async_trait]
impl EventStore for FlakyEventStore {
    async fn insert_event(&self, record: &StoredRecord) -> Result<InsertOutcome, DomainError> {
        let failed = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(DomainError::Infrastructure("connection reset".into()));
        }
        self.inner.insert_event(record).await
    }

    async fn increment(&self, counter: Counter) -> Result<(), DomainError> {
        self.inner.increment(counter).await
    }

    async fn list_events(&self, query: &EventQuery) -> Result<Vec<StoredRecord>, DomainError> {
        self.inner.list_events(query).await
    }

    async fn stats(&self) -> Result<CounterSnapshot, DomainError> {
        self.inner.stats().await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn record(event_id: &str) -> StoredRecord {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        StoredRecord {
            id: 0,
            event_id: event_id.into(),
            topic: "t".into(),
            timestamp: at,
            source: "s".into(),
            payload: serde_json::json!({}),
            received_at: at,
        }
    }

    #[tokio::test]
    async fn test_in_memory_store_deduplicates_on_event_id() {
        let store = InMemoryEventStore::new();

        assert_eq!(
            store.insert_event(&record("e1")).await.unwrap(),
            InsertOutcome::Created
        );
        assert_eq!(
            store.insert_event(&record("e1")).await.unwrap(),
            InsertOutcome::Duplicate
        );
        assert_eq!(store.count_of("e1"), 1);
    }

    #[tokio::test]
    async fn test_flaky_store_recovers_after_configured_failures() {
        let store = FlakyEventStore::new(2);

        assert!(store.insert_event(&record("e1")).await.is_err());
        assert!(store.insert_event(&record("e1")).await.is_err());
        assert_eq!(
            store.insert_event(&record("e1")).await.unwrap(),
            InsertOutcome::Created
        );
        assert_eq!(store.inner().count_of("e1"), 1);
    }
}
