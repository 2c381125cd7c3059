//! Embedding client.
//!
//! Embeddings are best-effort metadata for similarity search. A failed call
//! is logged and swallowed — commentary delivery never depends on it.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{InferenceError, InferenceResult};
use crate::metrics::record_embedding_failure;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

const EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Embedding API client.
#[derive(Clone)]
pub struct EmbeddingClient {
    api_key: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'static str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl EmbeddingClient {
    /// Create a new embedding client from the environment.
    pub fn from_env() -> InferenceResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| InferenceError::config("OPENAI_API_KEY not set"))?;
        Ok(Self::new(api_key))
    }

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: OPENAI_API_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Point the client at a different endpoint (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Embed a piece of text. Never fails, never retries — any error
    /// becomes `None`.
    pub async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        match self.try_embed(text).await {
            Ok(vector) => Some(vector),
            Err(e) => {
                warn!("embedding generation failed: {}", e);
                record_embedding_failure();
                None
            }
        }
    }

    async fn try_embed(&self, text: &str) -> InferenceResult<Vec<f32>> {
        let url = format!("{}/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: EMBEDDING_MODEL,
                input: text,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::malformed(format!("undecodable embedding: {}", e)))?;

        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| InferenceError::malformed("empty embedding data"))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_embed_returns_vector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"embedding": [0.25, -0.5, 0.75]}]
            })))
            .mount(&server)
            .await;

        let client = EmbeddingClient::new("k").with_base_url(server.uri());
        let vector = client.embed("tents on the sidewalk").await.unwrap();
        assert_eq!(vector, vec![0.25, -0.5, 0.75]);
    }

    #[tokio::test]
    async fn test_embed_swallows_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(500).set_body_string("downstream sad"))
            .expect(1)
            .mount(&server)
            .await;

        let client = EmbeddingClient::new("k").with_base_url(server.uri());
        // One call, no retry, failure converted to None.
        assert!(client.embed("anything").await.is_none());
    }
}
