//! The eventgate ingestion pipeline.
//!
//! Accepted events are counted, buffered in an [`pipeline::queue::IngestQueue`]
//! and drained by a [`pipeline::worker::WorkerPool`] that persists each one
//! idempotently. The `application` layer exposes the gateway-facing submit
//! and query operations; `domain` holds request validation.

pub mod application;
pub mod domain;
pub mod pipeline;
