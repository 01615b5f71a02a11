//! Eventgate HTTP gateway.
//!
//! Exposes the ingestion pipeline over HTTP: `/publish` and `/publish/batch`
//! accept events, `/events`, `/stats` and `/queue/status` read them back.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;
