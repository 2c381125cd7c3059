//! Store metrics collection.
//!
//! Request counters and latency histograms for every Data API round trip,
//! plus a dedicated counter for observation writes.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total Data API requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "store_requests_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "store_latency_seconds";

    /// Observation rows appended.
    pub const OBSERVATIONS_APPENDED_TOTAL: &str = "store_observations_appended_total";
}

/// Record metrics for a completed Data API request.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record a successful observation append.
pub fn record_append() {
    counter!(names::OBSERVATIONS_APPENDED_TOTAL).increment(1);
}
