//! Domain error types.

use thiserror::Error;

/// Top-level error type shared by the pipeline, the stores and the gateway.
///
/// A duplicate `event_id` is deliberately not represented here: it is a
/// normal persist outcome (see [`crate::counters::InsertOutcome`]).
#[derive(Debug, Error)]
pub enum DomainError {
    /// The submitted event is malformed. Raised at the gateway boundary only;
    /// a rejected event never reaches the queue or the counters.
    #[error("validation error: {0}")]
    Validation(String),

    /// The durable store failed for a reason other than a uniqueness
    /// conflict: connectivity, timeouts, serialization failures.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),

    /// The store refused the data itself (bad encoding, constraint other than
    /// `event_id` uniqueness). Resending the same event fails the same way.
    #[error("rejected by store: {0}")]
    Rejected(String),

    /// The pipeline no longer accepts events.
    #[error("ingestion is shutting down")]
    ShuttingDown,
}

impl DomainError {
    /// Whether a retry of the same operation could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Infrastructure(_))
    }
}
