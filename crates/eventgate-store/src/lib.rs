//! PostgreSQL persistence for eventgate.
//!
//! Provides [`pg_event_store::PgEventStore`], the production implementation of
//! `EventStore`, together with startup connection handling and the embedded
//! schema migrations.

pub mod connection;
pub mod pg_event_store;

/// Schema migrations for `processed_events` and the `stats` counters row.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
