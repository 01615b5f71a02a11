//! Arrival-time source.

use chrono::{DateTime, Utc};

/// Supplies the `received_at` timestamp stamped on events at the gateway.
///
/// Injected so tests can pin arrival times and assert on listing order.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
