//! Observation store client.
//!
//! This crate talks to a SingleStore-compatible HTTP Data API and provides:
//! - Idempotent, concurrency-safe schema initialization
//! - The append-only observation write path
//! - Aggregate and vector-similarity reads for the analytics endpoint

pub mod client;
pub mod error;
pub mod metrics;
pub mod observations;

pub use client::{DataApiClient, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use observations::{ObservationStore, OBSERVATIONS_TABLE};
