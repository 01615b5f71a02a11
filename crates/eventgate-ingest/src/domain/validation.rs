//! Shape validation for submitted events.
//!
//! Validation runs at the gateway boundary, before anything is counted or
//! enqueued. Every failure is a `DomainError::Validation`.

use chrono::{DateTime, NaiveDateTime, Utc};
use eventgate_core::error::DomainError;
use eventgate_core::event::Event;
use serde_json::{Map, Value};

/// Keys every submitted event must carry.
pub const REQUIRED_FIELDS: [&str; 5] = ["topic", "event_id", "timestamp", "source", "payload"];

/// Longest accepted `topic`, `event_id` or `source`, in characters.
pub const MAX_FIELD_CHARS: usize = 255;

fn invalid(message: impl Into<String>) -> DomainError {
    DomainError::Validation(message.into())
}

fn text_field<'a>(object: &'a Map<String, Value>, name: &str) -> Result<&'a str, DomainError> {
    let value = object
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(format!("field {name} must be a string")))?;

    if value.trim().is_empty() {
        return Err(invalid(format!("field {name} must not be empty")));
    }
    if value.contains('\0') {
        return Err(invalid(format!("field {name} must not contain NUL characters")));
    }
    if value.chars().count() > MAX_FIELD_CHARS {
        return Err(invalid(format!(
            "field {name} exceeds {MAX_FIELD_CHARS} characters"
        )));
    }
    Ok(value)
}

// PostgreSQL rejects U+0000 in JSONB strings and keys.
fn contains_nul(value: &Value) -> bool {
    match value {
        Value::String(text) => text.contains('\0'),
        Value::Array(items) => items.iter().any(contains_nul),
        Value::Object(map) => map
            .iter()
            .any(|(key, item)| key.contains('\0') || contains_nul(item)),
        Value::Null | Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Parses an RFC 3339 timestamp, or a naive ISO-8601 date-time taken as UTC.
///
/// # Errors
///
/// Returns `DomainError::Validation` if `text` is neither.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, DomainError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| invalid("invalid timestamp format"))
}

/// Validates one submitted event.
///
/// `payload` may be any JSON value, `null` included, but the key must be
/// present. No string may contain U+0000.
///
/// # Errors
///
/// Returns `DomainError::Validation` naming the first problem found.
pub fn parse_event(raw: &Value) -> Result<Event, DomainError> {
    let object = raw
        .as_object()
        .ok_or_else(|| invalid("event must be a JSON object"))?;

    if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| !object.contains_key(**f)) {
        return Err(invalid(format!("missing field: {missing}")));
    }

    let topic = text_field(object, "topic")?;
    let event_id = text_field(object, "event_id")?;
    let source = text_field(object, "source")?;
    let timestamp = object
        .get("timestamp")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("invalid timestamp format"))
        .and_then(parse_timestamp)?;
    let payload = object.get("payload").cloned().unwrap_or(Value::Null);
    if contains_nul(&payload) {
        return Err(invalid("field payload must not contain NUL characters"));
    }

    Ok(Event::new(event_id, topic, source, timestamp, payload))
}

/// Validates a batch body of the form `{"events": [...]}`.
///
/// The whole batch is validated before any event is submitted, so a malformed
/// entry rejects the batch without counting anything.
///
/// # Errors
///
/// Returns `DomainError::Validation`; per-event messages are prefixed with the
/// event's index.
pub fn parse_batch(raw: &Value) -> Result<Vec<Event>, DomainError> {
    let events = raw
        .get("events")
        .ok_or_else(|| invalid("missing field: events"))?
        .as_array()
        .ok_or_else(|| invalid("field events must be an array"))?;

    events
        .iter()
        .enumerate()
        .map(|(index, event)| {
            parse_event(event).map_err(|err| match err {
                DomainError::Validation(message) => invalid(format!("event {index}: {message}")),
                other => other,
            })
        })
        .collect()
}
