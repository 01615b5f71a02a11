//! Command handlers for the ingestion gateway.
//!
//! Accepting an event means: count it as received, then enqueue it. The
//! producer is acknowledged without waiting for persistence.

use eventgate_core::clock::Clock;
use eventgate_core::counters::Counter;
use eventgate_core::error::DomainError;
use eventgate_core::event::{Event, PendingEvent};
use eventgate_core::store::EventStore;
use tracing::warn;
use uuid::Uuid;

use crate::pipeline::queue::IngestQueue;

/// Acknowledgement for one accepted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    /// The submitted idempotency key.
    pub event_id: String,
    /// Correlates this submission with the worker's persist log line.
    pub ingest_id: Uuid,
}

/// Accepts one validated event.
///
/// `received` is incremented before the event is enqueued, so the stored
/// counters never show more outcomes than receipts.
///
/// # Errors
///
/// Returns `DomainError::ShuttingDown` if the queue no longer accepts events
/// (nothing is counted), or `DomainError::Infrastructure` if the `received`
/// increment fails (nothing is enqueued; the producer may resend).
pub async fn handle_submit(
    event: Event,
    clock: &dyn Clock,
    store: &dyn EventStore,
    queue: &IngestQueue,
) -> Result<SubmitReceipt, DomainError> {
    if !queue.is_accepting() {
        return Err(DomainError::ShuttingDown);
    }

    store.increment(Counter::Received).await?;

    let pending = PendingEvent::new(event, clock.now());
    let receipt = SubmitReceipt {
        event_id: pending.event.event_id().to_owned(),
        ingest_id: pending.ingest_id,
    };

    if let Err(err) = queue.enqueue(pending) {
        // Closed between the check above and now: counted but never queued.
        warn!(event_id = %receipt.event_id, "queue closed after event was counted");
        return Err(err);
    }

    Ok(receipt)
}

/// Accepts a batch by submitting each event in order.
///
/// There is no batch atomicity: events accepted before a failure stay
/// accepted. Returns the number of accepted events.
///
/// # Errors
///
/// Returns the first error from [`handle_submit`].
pub async fn handle_submit_batch(
    events: Vec<Event>,
    clock: &dyn Clock,
    store: &dyn EventStore,
    queue: &IngestQueue,
) -> Result<usize, DomainError> {
    let mut accepted = 0;
    for event in events {
        if let Err(err) = handle_submit(event, clock, store, queue).await {
            if accepted > 0 {
                warn!(accepted, error = %err, "batch interrupted after partial acceptance");
            }
            return Err(err);
        }
        accepted += 1;
    }
    Ok(accepted)
}
