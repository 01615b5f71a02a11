//! Shared test doubles and utilities for eventgate.

mod clock;
mod event;
mod store;

pub use clock::FixedClock;
pub use event::make_event;
pub use store::{FailingEventStore, FlakyEventStore, InMemoryEventStore, RejectingEventStore};
