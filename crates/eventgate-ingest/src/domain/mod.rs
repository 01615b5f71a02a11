//! Domain layer for ingestion.

pub mod validation;
