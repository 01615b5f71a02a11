//! The persistence worker pool.
//!
//! A fixed number of symmetric tokio tasks drain the [`IngestQueue`]. Workers
//! keep no state between events; a failed persist is logged and the worker
//! moves on to the next item.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use eventgate_core::error::DomainError;
use eventgate_core::store::EventStore;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::persist::{PersistOutcome, RetryPolicy, persist_idempotent};
use super::queue::IngestQueue;

/// How [`WorkerPool::shutdown`] treats events still in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Stop intake and persist everything already queued before exiting.
    Drain,
    /// Stop intake and discard queued events; workers only finish the
    /// persist they are in the middle of.
    Immediate,
}

/// Per-process tallies of worker outcomes. Volatile; the durable counters
/// live in the store.
#[derive(Debug, Default)]
struct Tally {
    persisted: AtomicU64,
    duplicates: AtomicU64,
    failed: AtomicU64,
}

impl Tally {
    fn record(&self, outcome: PersistOutcome) {
        let slot = match outcome {
            PersistOutcome::Created => &self.persisted,
            PersistOutcome::Duplicate => &self.duplicates,
            PersistOutcome::Failed => &self.failed,
        };
        slot.fetch_add(1, Ordering::Relaxed);
    }
}

/// Operational view of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    /// Events waiting in the ingest queue.
    pub queue_size: usize,
    /// Configured number of workers.
    pub workers: usize,
    /// Events this process stored as new records.
    pub persisted: u64,
    /// Events this process dropped as duplicates.
    pub duplicates: u64,
    /// Events this process dropped after exhausting persist retries.
    pub failed: u64,
}

/// Cloneable read-only handle on a running pool, for the stats surface.
#[derive(Debug, Clone)]
pub struct PoolMonitor {
    queue: Arc<IngestQueue>,
    tally: Arc<Tally>,
    workers: usize,
}

impl PoolMonitor {
    /// Snapshot of queue depth, pool size and outcome tallies.
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            queue_size: self.queue.len(),
            workers: self.workers,
            persisted: self.tally.persisted.load(Ordering::Relaxed),
            duplicates: self.tally.duplicates.load(Ordering::Relaxed),
            failed: self.tally.failed.load(Ordering::Relaxed),
        }
    }
}

/// Summary of a completed shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Queued events discarded without a persist attempt.
    pub discarded: usize,
}

/// A fixed-size pool of persistence workers sharing one queue and one store.
#[derive(Debug)]
pub struct WorkerPool {
    queue: Arc<IngestQueue>,
    tally: Arc<Tally>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `size` workers on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `size` is zero.
    pub fn spawn(
        size: usize,
        queue: Arc<IngestQueue>,
        store: Arc<dyn EventStore>,
        policy: RetryPolicy,
    ) -> Result<Self, DomainError> {
        if size == 0 {
            return Err(DomainError::Validation(
                "worker pool size must be at least 1".into(),
            ));
        }

        let tally = Arc::new(Tally::default());
        let handles = (0..size)
            .map(|worker| {
                tokio::spawn(run_worker(
                    worker,
                    Arc::clone(&queue),
                    Arc::clone(&store),
                    policy,
                    Arc::clone(&tally),
                ))
            })
            .collect();

        info!(workers = size, "persistence workers started");
        Ok(Self {
            queue,
            tally,
            handles,
        })
    }

    /// Number of workers.
    #[must_use]
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// A handle for reading pool status while the pool runs.
    #[must_use]
    pub fn monitor(&self) -> PoolMonitor {
        PoolMonitor {
            queue: Arc::clone(&self.queue),
            tally: Arc::clone(&self.tally),
            workers: self.size(),
        }
    }

    /// Stops intake and waits for every worker to exit.
    ///
    /// Workers always finish the persist they are running; `mode` decides
    /// whether the rest of the queue is persisted or discarded.
    pub async fn shutdown(self, mode: ShutdownMode) -> ShutdownReport {
        let discarded = match mode {
            ShutdownMode::Drain => {
                self.queue.close();
                0
            }
            ShutdownMode::Immediate => self.queue.halt(),
        };
        if discarded > 0 {
            warn!(discarded, "discarded queued events on shutdown");
        }

        for (worker, handle) in self.handles.into_iter().enumerate() {
            if let Err(err) = handle.await {
                error!(worker, error = %err, "persistence worker terminated abnormally");
            }
        }

        info!(?mode, "persistence workers stopped");
        ShutdownReport { discarded }
    }
}

async fn run_worker(
    worker: usize,
    queue: Arc<IngestQueue>,
    store: Arc<dyn EventStore>,
    policy: RetryPolicy,
    tally: Arc<Tally>,
) {
    while let Some(pending) = queue.dequeue_or_wait().await {
        let outcome = persist_idempotent(store.as_ref(), &pending, &policy).await;
        tally.record(outcome);

        let event = &pending.event;
        match outcome {
            PersistOutcome::Created => info!(
                worker,
                topic = event.topic(),
                event_id = event.event_id(),
                ingest_id = %pending.ingest_id,
                "persisted"
            ),
            PersistOutcome::Duplicate => info!(
                worker,
                topic = event.topic(),
                event_id = event.event_id(),
                ingest_id = %pending.ingest_id,
                "duplicate dropped"
            ),
            // Already logged with the store error by `persist_idempotent`.
            PersistOutcome::Failed => {}
        }
    }
}
