//! Analytics snapshot assembly.
//!
//! One call per poll: every aggregate read plus the similarity search over
//! stored embeddings. The similarity block degrades to empty when the query
//! prompt cannot be embedded.

use std::sync::Arc;

use tracing::debug;

use curb_inference::EmbeddingClient;
use curb_models::{AnalyticsResponse, TimeRange};
use curb_store::{ObservationStore, StoreResult};

/// Prompt used for the similarity search when the caller supplies none.
const DEFAULT_SIMILARITY_PROMPT: &str = "homelessness";

/// How many recent rows each "latest" section carries.
const RECENT_LIMIT: usize = 10;

/// Read-side service behind `GET /api/analytics`.
#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<ObservationStore>,
    embeddings: EmbeddingClient,
}

impl AnalyticsService {
    pub fn new(store: Arc<ObservationStore>, embeddings: EmbeddingClient) -> Self {
        Self { store, embeddings }
    }

    /// Build the full snapshot for one window.
    pub async fn snapshot(
        &self,
        user_prompt: Option<&str>,
        range: TimeRange,
    ) -> StoreResult<AnalyticsResponse> {
        let prompt = match user_prompt {
            Some(p) if !p.trim().is_empty() => p,
            _ => DEFAULT_SIMILARITY_PROMPT,
        };

        // Embedding failure degrades the similarity block to empty; every
        // other section still comes back.
        let similarity_search = match self.embeddings.embed(prompt).await {
            Some(query_embedding) => self.store.nearest(&query_embedding, range).await?,
            None => Vec::new(),
        };

        let latest_commentaries = self.store.recent(range, RECENT_LIMIT).await?;
        let total_commentaries = self.store.count(range).await?;
        let latest_latency = self.store.latency_recent(range, RECENT_LIMIT).await?;
        let commentaries_over_time = self.store.counts_by_day(range).await?;
        let homelessness_probability_over_time = self.store.probability_over_time(range).await?;

        debug!(
            total = total_commentaries,
            range = %range,
            "analytics snapshot assembled"
        );

        Ok(AnalyticsResponse {
            latest_commentaries,
            total_commentaries,
            latest_latency,
            similarity_search,
            commentaries_over_time,
            homelessness_probability_over_time,
        })
    }
}
