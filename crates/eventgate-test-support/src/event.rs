//! Event builders.

use chrono::{TimeZone, Utc};
use eventgate_core::event::Event;

/// Builds an event with the given id and topic, source `"s"`, timestamp
/// `2025-01-01T00:00:00Z` and an empty object payload.
///
/// # Panics
///
/// Never in practice; the fixed timestamp is always valid.
#[must_use]
pub fn make_event(event_id: &str, topic: &str) -> Event {
    Event::new(
        event_id,
        topic,
        "s",
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        serde_json::json!({}),
    )
}
