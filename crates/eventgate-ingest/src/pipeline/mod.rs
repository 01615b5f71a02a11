//! Queue, persistence and worker pool.

pub mod persist;
pub mod queue;
pub mod worker;
