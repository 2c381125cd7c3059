//! Vision inference and embedding clients for CurbWatch.
//!
//! This crate owns the commentary pipeline: one sampled frame goes to a
//! vision-capable model under a bounded retry policy, the resulting
//! commentary is embedded best-effort, and the scored observation is
//! appended to the store. Terminal failures come back as a sentinel value,
//! never as an error.

pub mod embedding;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod retry;
pub mod vision;

pub use embedding::EmbeddingClient;
pub use error::{InferenceError, InferenceResult};
pub use pipeline::{CommentaryOutcome, CommentaryPipeline, PipelineError};
pub use retry::{retry_fixed, RetryOutcome, RetryPolicy};
pub use vision::{FrameAnalysis, VisionClient};
