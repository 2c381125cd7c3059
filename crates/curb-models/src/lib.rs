//! Shared data models for the CurbWatch backend.
//!
//! This crate provides Serde-serializable types for:
//! - Observations (scored inference results)
//! - Commentary log entries
//! - Sampled video frames
//! - Routes and waypoints
//! - Analytics time ranges
//! - Wire schemas for the commentary and analytics endpoints

pub mod commentary;
pub mod frame;
pub mod observation;
pub mod route;
pub mod time_range;
pub mod wire;

// Re-export common types
pub use commentary::CommentaryEntry;
pub use frame::{EncodedFrame, FrameError, MAX_FRAME_BYTES};
pub use observation::{Observation, FALLBACK_COMMENTARY};
pub use route::{GeoPoint, Route, Waypoint, WAYPOINT_PROBABILITY_THRESHOLD};
pub use time_range::TimeRange;
pub use wire::{
    AnalyticsQuery, AnalyticsResponse, CommentaryRequest, CommentaryResponse, CommentaryRow,
    DayCount, LatencyRow, ProbabilityRow, SimilarityHit,
};
