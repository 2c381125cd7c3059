//! CurbWatch API client.

use async_trait::async_trait;
use reqwest::Client;

use curb_models::{
    AnalyticsResponse, CommentaryRequest, CommentaryResponse, EncodedFrame, TimeRange,
};

use crate::error::{WatchError, WatchResult};

/// Boundary to the CurbWatch API.
///
/// The session engine only sees this trait, so tests swap in scripted
/// implementations.
#[async_trait]
pub trait CommentaryApi: Send + Sync + 'static {
    /// Submit one sampled frame for commentary.
    async fn submit_frame(&self, frame: EncodedFrame) -> WatchResult<CommentaryResponse>;

    /// Fetch the analytics snapshot for one window.
    async fn fetch_analytics(
        &self,
        user_prompt: Option<&str>,
        range: TimeRange,
    ) -> WatchResult<AnalyticsResponse>;
}

/// HTTP implementation against a running curb-api.
pub struct HttpCommentaryApi {
    base_url: String,
    client: Client,
}

impl HttpCommentaryApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl CommentaryApi for HttpCommentaryApi {
    async fn submit_frame(&self, frame: EncodedFrame) -> WatchResult<CommentaryResponse> {
        let url = format!("{}/api/commentary", self.base_url);
        let request = CommentaryRequest {
            image_data: frame.data_url,
            width: frame.width,
            height: frame.height,
        };

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(WatchError::TickFailed {
                status: status.as_u16(),
                detail,
            });
        }

        response
            .json::<CommentaryResponse>()
            .await
            .map_err(|e| WatchError::malformed(format!("undecodable commentary: {}", e)))
    }

    async fn fetch_analytics(
        &self,
        user_prompt: Option<&str>,
        range: TimeRange,
    ) -> WatchResult<AnalyticsResponse> {
        let url = format!("{}/api/analytics", self.base_url);

        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(prompt) = user_prompt {
            query.push(("userPrompt", prompt.to_string()));
        }
        if range != TimeRange::All {
            query.push(("timeRange", range.to_string()));
        }

        let response = self.client.get(&url).query(&query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(WatchError::TickFailed {
                status: status.as_u16(),
                detail,
            });
        }

        response
            .json::<AnalyticsResponse>()
            .await
            .map_err(|e| WatchError::malformed(format!("undecodable analytics: {}", e)))
    }
}
