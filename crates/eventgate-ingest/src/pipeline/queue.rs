//! The ingest queue: a volatile FIFO buffer between the gateway and the
//! persistence workers.
//!
//! Producers never block: [`IngestQueue::enqueue`] takes the lock only long
//! enough to push. Workers suspend on a [`Notify`] while the queue is empty
//! instead of polling.

use std::collections::VecDeque;
use std::pin::pin;
use std::sync::{Mutex, MutexGuard, PoisonError};

use eventgate_core::error::DomainError;
use eventgate_core::event::PendingEvent;
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueueState {
    Open,
    Draining,
    Halted,
}

#[derive(Debug)]
struct Inner {
    items: VecDeque<PendingEvent>,
    state: QueueState,
}

enum Claim {
    Item(PendingEvent),
    Empty,
    Finished,
}

/// Unbounded, insertion-ordered, multi-producer multi-consumer queue.
///
/// Each dequeued item is handed to exactly one caller.
#[derive(Debug)]
pub struct IngestQueue {
    inner: Mutex<Inner>,
    available: Notify,
}

impl Default for IngestQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestQueue {
    /// Creates an empty, open queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                state: QueueState::Open,
            }),
            available: Notify::new(),
        }
    }

    // A panic while holding the lock cannot leave the deque half-updated, so
    // a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `pending` to the tail and wakes one idle worker.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ShuttingDown` once the queue has been closed or
    /// halted.
    pub fn enqueue(&self, pending: PendingEvent) -> Result<(), DomainError> {
        {
            let mut inner = self.lock();
            if inner.state != QueueState::Open {
                return Err(DomainError::ShuttingDown);
            }
            inner.items.push_back(pending);
        }
        self.available.notify_one();
        Ok(())
    }

    fn claim(&self) -> Claim {
        let mut inner = self.lock();
        if inner.state == QueueState::Halted {
            return Claim::Finished;
        }
        match inner.items.pop_front() {
            Some(pending) => Claim::Item(pending),
            None if inner.state == QueueState::Draining => Claim::Finished,
            None => Claim::Empty,
        }
    }

    /// Removes and returns the head of the queue, suspending while it is
    /// empty.
    ///
    /// Returns `None` once the queue is halted, or closed and fully drained.
    pub async fn dequeue_or_wait(&self) -> Option<PendingEvent> {
        loop {
            // Register interest before checking so a concurrent enqueue or
            // close between the check and the await is not missed.
            let mut notified = pin!(self.available.notified());
            notified.as_mut().enable();

            match self.claim() {
                Claim::Item(pending) => return Some(pending),
                Claim::Finished => return None,
                Claim::Empty => notified.await,
            }
        }
    }

    /// Stops accepting new events. Items already queued remain available to
    /// workers until the queue is empty.
    pub fn close(&self) {
        {
            let mut inner = self.lock();
            if inner.state == QueueState::Open {
                inner.state = QueueState::Draining;
            }
        }
        self.available.notify_waiters();
    }

    /// Stops accepting new events and discards everything still queued.
    /// Returns the number of discarded events.
    pub fn halt(&self) -> usize {
        let discarded = {
            let mut inner = self.lock();
            inner.state = QueueState::Halted;
            let discarded = inner.items.len();
            inner.items.clear();
            discarded
        };
        self.available.notify_waiters();
        discarded
    }

    /// Whether `enqueue` currently accepts events.
    #[must_use]
    pub fn is_accepting(&self) -> bool {
        self.lock().state == QueueState::Open
    }

    /// Current depth.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Whether no events are waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
