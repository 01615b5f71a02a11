//! Event model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A single immutable fact submitted by a producer.
///
/// Fields are only readable after construction; the pipeline never rewrites
/// an accepted event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    event_id: String,
    topic: String,
    source: String,
    timestamp: DateTime<Utc>,
    payload: serde_json::Value,
}

impl Event {
    /// Creates a new event. Shape validation happens at the gateway before
    /// this is called.
    #[must_use]
    pub fn new(
        event_id: impl Into<String>,
        topic: impl Into<String>,
        source: impl Into<String>,
        timestamp: DateTime<Utc>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            topic: topic.into(),
            source: source.into(),
            timestamp,
            payload,
        }
    }

    /// The idempotency key.
    #[must_use]
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    /// Stream classification.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Producer identity.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Producer-supplied event time.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Opaque payload.
    #[must_use]
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }
}

/// An accepted event waiting in the ingest queue.
#[derive(Debug, Clone)]
pub struct PendingEvent {
    /// The event as submitted.
    pub event: Event,
    /// Arrival time at the gateway.
    pub received_at: DateTime<Utc>,
    /// Per-submission identifier used to correlate gateway and worker logs.
    /// Two submissions of the same `event_id` get different `ingest_id`s.
    pub ingest_id: Uuid,
}

impl PendingEvent {
    /// Wraps an event accepted at `received_at`.
    #[must_use]
    pub fn new(event: Event, received_at: DateTime<Utc>) -> Self {
        Self {
            event,
            received_at,
            ingest_id: Uuid::now_v7(),
        }
    }
}

/// The durable, deduplicated representation of an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRecord {
    /// Surrogate identity assigned by the store.
    #[serde(skip)]
    pub id: i64,
    /// The idempotency key; unique across all records.
    pub event_id: String,
    /// Stream classification.
    pub topic: String,
    /// Producer-supplied event time.
    pub timestamp: DateTime<Utc>,
    /// Producer identity.
    pub source: String,
    /// Opaque payload.
    pub payload: serde_json::Value,
    /// Arrival time at the gateway of the submission that created the record.
    pub received_at: DateTime<Utc>,
}

impl StoredRecord {
    /// Builds the record a first successful persist of `pending` would create.
    /// `id` is left at zero for the store to assign.
    #[must_use]
    pub fn from_pending(pending: &PendingEvent) -> Self {
        let event = &pending.event;
        Self {
            id: 0,
            event_id: event.event_id().to_owned(),
            topic: event.topic().to_owned(),
            timestamp: event.timestamp(),
            source: event.source().to_owned(),
            payload: event.payload().clone(),
            received_at: pending.received_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_from_pending_copies_event_fields_and_arrival_time() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let arrived = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 5).unwrap();
        let event = Event::new("e1", "t", "s", ts, serde_json::json!({"k": 1}));
        let pending = PendingEvent::new(event, arrived);

        let record = StoredRecord::from_pending(&pending);

        assert_eq!(record.event_id, "e1");
        assert_eq!(record.topic, "t");
        assert_eq!(record.source, "s");
        assert_eq!(record.timestamp, ts);
        assert_eq!(record.received_at, arrived);
        assert_eq!(record.payload, serde_json::json!({"k": 1}));
    }

    #[test]
    fn test_each_submission_gets_its_own_ingest_id() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let event = Event::new("e1", "t", "s", ts, serde_json::Value::Null);

        let a = PendingEvent::new(event.clone(), ts);
        let b = PendingEvent::new(event, ts);

        assert_ne!(a.ingest_id, b.ingest_id);
    }

    #[test]
    fn test_stored_record_serializes_without_surrogate_id() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let event = Event::new("e1", "t", "s", ts, serde_json::json!({}));
        let mut record = StoredRecord::from_pending(&PendingEvent::new(event, ts));
        record.id = 42;

        let json = serde_json::to_value(&record).unwrap();

        assert!(json.get("id").is_none());
        assert_eq!(json["event_id"], "e1");
        assert_eq!(json["timestamp"], "2025-01-01T00:00:00Z");
    }
}
