//! Shared domain types for eventgate.
//!
//! This crate defines the event model, the aggregate counters and the
//! `EventStore` trait that every persistence backend implements. It contains
//! no infrastructure code.

pub mod clock;
pub mod counters;
pub mod error;
pub mod event;
pub mod store;
