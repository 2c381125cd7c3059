//! The commentary pipeline.
//!
//! One call per sampled frame: vision inference under the retry policy,
//! best-effort embedding of the commentary, then exactly one observation
//! append. Terminal inference failure is a sentinel value, not an error —
//! only a rejected persistence write surfaces as `Err`, and it still
//! carries the generated observation so the caller can show the commentary.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use curb_models::{EncodedFrame, Observation};
use curb_store::{ObservationStore, StoreError};

use crate::embedding::EmbeddingClient;
use crate::metrics::record_terminal_failure;
use crate::retry::{retry_fixed, RetryOutcome, RetryPolicy};
use crate::vision::VisionClient;

/// Result of one pipeline run.
#[derive(Debug)]
pub enum CommentaryOutcome {
    /// Inference succeeded; the observation was appended to the store.
    Generated(Observation),
    /// Every attempt failed. Nothing was persisted; `message` is the fixed
    /// user-facing failure text.
    Exhausted { attempts: u32, message: String },
}

impl CommentaryOutcome {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The observation could not be persisted. The commentary itself is
    /// still attached — persistence is at-most-once, best-effort.
    #[error("observation not persisted: {source}")]
    Persistence {
        observation: Box<Observation>,
        #[source]
        source: StoreError,
    },
}

/// Frame-to-observation pipeline.
pub struct CommentaryPipeline {
    vision: VisionClient,
    embeddings: EmbeddingClient,
    store: Arc<ObservationStore>,
    retry: RetryPolicy,
}

impl CommentaryPipeline {
    pub fn new(
        vision: VisionClient,
        embeddings: EmbeddingClient,
        store: Arc<ObservationStore>,
    ) -> Self {
        Self {
            vision,
            embeddings,
            store,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the retry policy (tests shrink the delay).
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run the pipeline for one frame.
    pub async fn generate(&self, frame: &EncodedFrame) -> Result<CommentaryOutcome, PipelineError> {
        let analysis = match retry_fixed(&self.retry, "vision_inference", || {
            self.vision.describe_frame(frame)
        })
        .await
        {
            RetryOutcome::Success(analysis) => analysis,
            RetryOutcome::Exhausted { error, attempts } => {
                warn!("vision inference exhausted {} attempts: {}", attempts, error);
                record_terminal_failure();
                return Ok(CommentaryOutcome::Exhausted {
                    attempts,
                    message: format!("Error generating commentary after {} attempts.", attempts),
                });
            }
        };

        let embedding = self.embeddings.embed(&analysis.commentary).await;

        let observation = Observation::new(analysis.commentary)
            .with_embedding(embedding)
            .with_latency(analysis.latency_seconds)
            .with_probability(Some(analysis.likeliness_of_homelessness));

        if let Err(source) = self.store.append(&observation).await {
            return Err(PipelineError::Persistence {
                observation: Box::new(observation),
                source,
            });
        }

        info!(
            probability = ?observation.homelessness_probability,
            latency_seconds = observation.latency_seconds,
            "observation recorded"
        );

        Ok(CommentaryOutcome::Generated(observation))
    }
}
