//! Idempotent persistence of a single queued event.

use std::time::Duration;

use eventgate_core::counters::InsertOutcome;
use eventgate_core::event::{PendingEvent, StoredRecord};
use eventgate_core::store::EventStore;
use tracing::{error, warn};

/// Result of pushing one event through to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// A new stored record was created.
    Created,
    /// The `event_id` was already stored; the submission was dropped.
    Duplicate,
    /// The store failed on every attempt; the event was dropped and no
    /// counter moved.
    Failed,
}

impl From<InsertOutcome> for PersistOutcome {
    fn from(outcome: InsertOutcome) -> Self {
        match outcome {
            InsertOutcome::Created => Self::Created,
            InsertOutcome::Duplicate => Self::Duplicate,
        }
    }
}

/// Bounded exponential backoff for transient store failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per event, the first included. Treated as at least one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each later attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that gives up after the first failure.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Inserts `pending` into `store`, relying on the store's uniqueness
/// constraint for deduplication.
///
/// Transient failures are retried under `policy`. Retrying is safe because a
/// repeated insert of an already-committed record resolves to `Duplicate`.
/// Never returns an error: exhausting the policy yields
/// [`PersistOutcome::Failed`] after logging.
pub async fn persist_idempotent(
    store: &dyn EventStore,
    pending: &PendingEvent,
    policy: &RetryPolicy,
) -> PersistOutcome {
    let record = StoredRecord::from_pending(pending);
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match store.insert_event(&record).await {
            Ok(outcome) => return outcome.into(),
            Err(err) if err.is_transient() && attempt < max_attempts => {
                let delay = policy.delay_after(attempt);
                warn!(
                    topic = %record.topic,
                    event_id = %record.event_id,
                    ingest_id = %pending.ingest_id,
                    attempt,
                    max_attempts,
                    error = %err,
                    "persist failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                error!(
                    topic = %record.topic,
                    event_id = %record.event_id,
                    ingest_id = %pending.ingest_id,
                    attempts = attempt,
                    error = %err,
                    "persist failed, dropping event"
                );
                return PersistOutcome::Failed;
            }
        }
    }
}
