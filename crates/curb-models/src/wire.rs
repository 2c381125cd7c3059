//! Wire schemas for the commentary and analytics endpoints.
//!
//! Field names follow the browser-facing JSON convention (camelCase), not
//! the Rust one, so the dashboard can consume responses unchanged.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::time_range::TimeRange;

/// `POST /api/commentary` request body.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentaryRequest {
    /// Base64 data URL of the sampled frame.
    pub image_data: String,
    pub width: u32,
    pub height: u32,
}

/// `POST /api/commentary` success response.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentaryResponse {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likeliness_of_homelessness: Option<u8>,
}

/// `GET /api/analytics` query parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
}

/// One recent commentary row.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CommentaryRow {
    pub timestamp: DateTime<Utc>,
    pub commentary: String,
}

/// One recent latency sample.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LatencyRow {
    pub timestamp: DateTime<Utc>,
    pub latency: f64,
}

/// One probability sample in timestamp order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProbabilityRow {
    pub timestamp: DateTime<Utc>,
    pub homelessness_probability: Option<u8>,
}

/// Observations counted per calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DayCount {
    /// Day in `YYYY-MM-DD`.
    pub date: String,
    pub count: u64,
}

/// One similarity-search hit, nearest first.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SimilarityHit {
    pub timestamp: DateTime<Utc>,
    pub homelessness_probability: Option<u8>,
    /// Euclidean distance to the query embedding (ascending).
    pub distance: f64,
}

/// `GET /api/analytics` response body — the full analytics snapshot.
///
/// The dashboard replaces its snapshot wholesale on every poll, so this type
/// always carries every section, empty or not.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub latest_commentaries: Vec<CommentaryRow>,
    pub total_commentaries: u64,
    pub latest_latency: Vec<LatencyRow>,
    pub similarity_search: Vec<SimilarityHit>,
    pub commentaries_over_time: Vec<DayCount>,
    pub homelessness_probability_over_time: Vec<ProbabilityRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commentary_request_wire_names() {
        let json = r#"{"imageData":"data:image/jpeg;base64,AA","width":640,"height":480}"#;
        let req: CommentaryRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.width, 640);
        assert!(req.image_data.starts_with("data:"));
    }

    #[test]
    fn test_analytics_response_wire_names() {
        let snapshot = AnalyticsResponse::default();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("totalCommentaries").is_some());
        assert!(json.get("similaritySearch").is_some());
        assert!(json.get("homelessnessProbabilityOverTime").is_some());
    }

    #[test]
    fn test_analytics_query_time_range() {
        let q: AnalyticsQuery =
            serde_json::from_str(r#"{"userPrompt":"tents","timeRange":"5min"}"#).unwrap();
        assert_eq!(q.time_range, Some(TimeRange::Last5Minutes));
    }
}
