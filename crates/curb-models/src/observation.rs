//! Observation models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Commentary text recorded when the model returned no usable text field.
pub const FALLBACK_COMMENTARY: &str = "No commentary generated.";

/// One scored inference result, as persisted in the observation store.
///
/// Observations are immutable once written; there is no update or delete
/// path. A row exists only for successful inference runs — terminal
/// failures are surfaced to the caller and never stored.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Observation {
    /// When the observation was recorded (assigned at response time).
    pub timestamp: DateTime<Utc>,

    /// Natural-language description of the frame. Never empty.
    pub commentary: String,

    /// Embedding of the commentary text. `None` when the embedding
    /// service failed — the observation is still valid without it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// Model-reported completion time in seconds. `0.0` when the model
    /// did not report one.
    pub latency_seconds: f64,

    /// Likelihood-of-homelessness score in [0, 100].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homelessness_probability: Option<u8>,
}

impl Observation {
    /// Create an observation stamped with the current time.
    pub fn new(commentary: impl Into<String>) -> Self {
        let commentary = commentary.into();
        let commentary = if commentary.is_empty() {
            FALLBACK_COMMENTARY.to_string()
        } else {
            commentary
        };

        Self {
            timestamp: Utc::now(),
            commentary,
            embedding: None,
            latency_seconds: 0.0,
            homelessness_probability: None,
        }
    }

    pub fn with_embedding(mut self, embedding: Option<Vec<f32>>) -> Self {
        self.embedding = embedding;
        self
    }

    pub fn with_latency(mut self, latency_seconds: f64) -> Self {
        self.latency_seconds = latency_seconds;
        self
    }

    /// Set the probability, clamping out-of-range model values into [0, 100].
    pub fn with_probability(mut self, probability: impl Into<Option<u32>>) -> Self {
        self.homelessness_probability = probability.into().map(|p| p.min(100) as u8);
        self
    }
}
