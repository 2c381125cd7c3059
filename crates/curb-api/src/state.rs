//! Application state.

use std::sync::Arc;

use curb_inference::{CommentaryPipeline, EmbeddingClient, VisionClient};
use curb_store::ObservationStore;

use crate::config::ApiConfig;
use crate::services::AnalyticsService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<ObservationStore>,
    pub pipeline: Arc<CommentaryPipeline>,
    pub analytics: AnalyticsService,
}

impl AppState {
    /// Create new application state from the environment.
    pub fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let store = Arc::new(ObservationStore::from_env()?);
        let vision = VisionClient::from_env()?;
        let embeddings = EmbeddingClient::from_env()?;

        let analytics = AnalyticsService::new(Arc::clone(&store), embeddings.clone());
        let pipeline = Arc::new(CommentaryPipeline::new(
            vision,
            embeddings,
            Arc::clone(&store),
        ));

        Ok(Self {
            config,
            store,
            pipeline,
            analytics,
        })
    }
}
