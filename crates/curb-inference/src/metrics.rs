//! Inference metrics collection.

use metrics::counter;

/// Metric name constants for consistency.
pub mod names {
    /// Vision attempts by outcome ("ok" / "error").
    pub const INFERENCE_ATTEMPTS_TOTAL: &str = "inference_attempts_total";

    /// Retries scheduled by operation.
    pub const INFERENCE_RETRIES_TOTAL: &str = "inference_retries_total";

    /// Runs that exhausted the retry ceiling.
    pub const INFERENCE_TERMINAL_TOTAL: &str = "inference_terminal_failures_total";

    /// Embedding calls swallowed to `None`.
    pub const EMBEDDING_FAILURES_TOTAL: &str = "embedding_failures_total";
}

pub fn record_attempt(outcome: &'static str) {
    counter!(names::INFERENCE_ATTEMPTS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_retry(operation: &str) {
    counter!(names::INFERENCE_RETRIES_TOTAL, "operation" => operation.to_string()).increment(1);
}

pub fn record_terminal_failure() {
    counter!(names::INFERENCE_TERMINAL_TOTAL).increment(1);
}

pub fn record_embedding_failure() {
    counter!(names::EMBEDDING_FAILURES_TOTAL).increment(1);
}
