//! Groq vision client for frame commentary.
//!
//! Sends one sampled frame plus a fixed instruction prompt to a
//! vision-capable chat model and parses the constrained JSON reply.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use curb_models::{EncodedFrame, FALLBACK_COMMENTARY};

use crate::error::{InferenceError, InferenceResult};
use crate::metrics::record_attempt;

const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1";

const VISION_MODEL: &str = "llama-3.2-11b-vision-preview";
const MAX_TOKENS: u32 = 150;

/// Instruction prompt sent with every frame. The model must answer with a
/// single JSON object matching the schema embedded here.
const INSTRUCTION: &str = "You are an expert analyst capable of analyzing and responding to data \
in JSON format. You are tasked with providing insights on what you see and whether you notice \
any signs of homelessness communities. The JSON schema should include:\n\n\
{\n  \"commentary\": str,\n  \"likeliness_of_homelessness\": int [0-100],\n  \"latency\": float\n}";

/// Vision API client.
#[derive(Clone)]
pub struct VisionClient {
    api_key: String,
    base_url: String,
    client: Client,
}

// =============================================================================
// Wire types
// =============================================================================

/// Chat completion request.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: Vec<Message<'a>>,
    response_format: ResponseFormat,
    model: &'static str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'static str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

/// Chat completion response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    completion_time: Option<f64>,
}

/// The model's constrained JSON payload, before fallbacks.
#[derive(Debug, Deserialize)]
struct ModelPayload {
    commentary: Option<String>,
    likeliness_of_homelessness: Option<u32>,
    latency: Option<f64>,
}

/// One parsed frame analysis.
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    /// Never empty — falls back to a fixed placeholder.
    pub commentary: String,
    /// Defaults to 0 when the model omits the field.
    pub likeliness_of_homelessness: u32,
    /// Model-reported completion time in seconds, 0 when unavailable.
    pub latency_seconds: f64,
}

impl VisionClient {
    /// Create a new vision client from the environment.
    pub fn from_env() -> InferenceResult<Self> {
        let api_key = std::env::var("GROQ_API_KEY")
            .map_err(|_| InferenceError::config("GROQ_API_KEY not set"))?;
        Ok(Self::new(api_key))
    }

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: GROQ_CHAT_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Point the client at a different endpoint (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// One inference attempt for one frame.
    ///
    /// Any network failure, non-2xx status, or unparseable/ill-shaped body
    /// is an error — the caller's retry policy treats them all the same.
    pub async fn describe_frame(&self, frame: &EncodedFrame) -> InferenceResult<FrameAnalysis> {
        let request = ChatRequest {
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentPart::Text { text: INSTRUCTION },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: &frame.data_url,
                        },
                    },
                ],
            }],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            model: VISION_MODEL,
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let result = self.send(&url, &request).await;
        record_attempt(if result.is_ok() { "ok" } else { "error" });
        result
    }

    async fn send(&self, url: &str, request: &ChatRequest<'_>) -> InferenceResult<FrameAnalysis> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(request)
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

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::malformed(format!("undecodable completion: {}", e)))?;

        let content = chat
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or_else(|| InferenceError::malformed("no content in completion"))?;

        let payload: ModelPayload = serde_json::from_str(strip_fences(content))
            .map_err(|e| InferenceError::malformed(format!("payload is not the expected JSON: {}", e)))?;

        let commentary = match payload.commentary {
            Some(text) if !text.is_empty() => text,
            _ => FALLBACK_COMMENTARY.to_string(),
        };

        let latency_seconds = chat
            .usage
            .and_then(|u| u.completion_time)
            .or(payload.latency)
            .unwrap_or(0.0);

        debug!(
            probability = payload.likeliness_of_homelessness.unwrap_or(0),
            latency_seconds, "frame analyzed"
        );

        Ok(FrameAnalysis {
            commentary,
            likeliness_of_homelessness: payload.likeliness_of_homelessness.unwrap_or(0),
            latency_seconds,
        })
    }
}

/// Strip a markdown code fence if the model wrapped its JSON in one.
fn strip_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text.strip_prefix("```json").unwrap_or(text);
    let text = text.strip_prefix("```").unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn frame() -> EncodedFrame {
        EncodedFrame::new("data:image/jpeg;base64,/9j/4AAQ", 640, 480)
    }

    fn completion(content: serde_json::Value) -> serde_json::Value {
        json!({
            "choices": [{"message": {"content": content.to_string()}}],
            "usage": {"completion_time": 0.31}
        })
    }

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_describe_frame_parses_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": VISION_MODEL,
                "response_format": {"type": "json_object"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(json!({
                "commentary": "a tent under the overpass",
                "likeliness_of_homelessness": 82,
                "latency": 0.9
            }))))
            .mount(&server)
            .await;

        let client = VisionClient::new("test-key").with_base_url(server.uri());
        let analysis = client.describe_frame(&frame()).await.unwrap();

        assert_eq!(analysis.commentary, "a tent under the overpass");
        assert_eq!(analysis.likeliness_of_homelessness, 82);
        // usage.completion_time wins over the model-reported latency
        assert!((analysis.latency_seconds - 0.31).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_describe_frame_applies_fallbacks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "{}"}}]
            })))
            .mount(&server)
            .await;

        let client = VisionClient::new("k").with_base_url(server.uri());
        let analysis = client.describe_frame(&frame()).await.unwrap();

        assert_eq!(analysis.commentary, FALLBACK_COMMENTARY);
        assert_eq!(analysis.likeliness_of_homelessness, 0);
        assert_eq!(analysis.latency_seconds, 0.0);
    }

    #[tokio::test]
    async fn test_describe_frame_rejects_non_json_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "I cannot help with that."}}]
            })))
            .mount(&server)
            .await;

        let client = VisionClient::new("k").with_base_url(server.uri());
        let err = client.describe_frame(&frame()).await.unwrap_err();
        assert!(matches!(err, InferenceError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_describe_frame_surfaces_bad_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let client = VisionClient::new("k").with_base_url(server.uri());
        let err = client.describe_frame(&frame()).await.unwrap_err();
        assert!(matches!(err, InferenceError::BadStatus { status: 429, .. }));
    }
}
