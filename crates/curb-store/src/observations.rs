//! Observation repository.
//!
//! Append-only write path plus the aggregate/vector reads behind the
//! analytics endpoint. All operations lazily initialize the schema first;
//! initialization is memoized and safe under concurrent first use.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::debug;

use curb_models::{
    CommentaryRow, DayCount, LatencyRow, Observation, ProbabilityRow, SimilarityHit, TimeRange,
};

use crate::client::{DataApiClient, StoreConfig};
use crate::error::{StoreError, StoreResult};
use crate::metrics::record_append;

/// Table holding one row per observation.
pub const OBSERVATIONS_TABLE: &str = "observations";

/// Similarity search result size.
const NEAREST_LIMIT: usize = 10;

const CREATE_TABLE_SQL: &str = "\
CREATE TABLE IF NOT EXISTS observations (
    timestamp DATETIME(6) NOT NULL,
    commentary TEXT NOT NULL,
    embedding BLOB,
    latency DOUBLE NOT NULL DEFAULT 0,
    homelessness_probability INT,
    SORT KEY (timestamp)
)";

/// Durable store of observations.
///
/// Holds one HTTP client and a memoized schema flag; clones share neither —
/// construct once and share behind an `Arc`.
pub struct ObservationStore {
    client: DataApiClient,
    schema_ready: RwLock<bool>,
}

impl ObservationStore {
    /// Create a store from a prepared config.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        Ok(Self {
            client: DataApiClient::new(config)?,
            schema_ready: RwLock::new(false),
        })
    }

    /// Create a store from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        Self::new(StoreConfig::from_env()?)
    }

    /// Idempotent schema initialization.
    ///
    /// Fast path is a shared read of the memo flag. The slow path
    /// double-checks under the write lock, so N concurrent first calls
    /// issue exactly one DDL round trip.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        {
            let ready = self.schema_ready.read().await;
            if *ready {
                return Ok(());
            }
        }

        let mut ready = self.schema_ready.write().await;
        if *ready {
            return Ok(());
        }

        self.client.exec(CREATE_TABLE_SQL, &[]).await?;
        debug!("observation table ready");
        *ready = true;
        Ok(())
    }

    /// Connectivity probe for readiness checks.
    pub async fn ping(&self) -> StoreResult<()> {
        self.client.query_rows("SELECT 1", &[]).await?;
        Ok(())
    }

    // =========================================================================
    // Write path
    // =========================================================================

    /// Append one observation. Exactly one INSERT per call; the write is
    /// rejected as an error when the backend refuses it or reports no
    /// affected rows.
    pub async fn append(&self, observation: &Observation) -> StoreResult<()> {
        self.ensure_schema().await?;

        let timestamp = format_timestamp(&observation.timestamp);
        let probability = observation
            .homelessness_probability
            .map(|p| json!(p))
            .unwrap_or(Value::Null);

        let affected = match &observation.embedding {
            Some(embedding) => {
                let packed = serde_json::to_string(embedding)?;
                self.client
                    .exec(
                        "INSERT INTO observations \
                         (timestamp, commentary, embedding, latency, homelessness_probability) \
                         VALUES (?, ?, JSON_ARRAY_PACK(?), ?, ?)",
                        &[
                            json!(timestamp),
                            json!(observation.commentary),
                            json!(packed),
                            json!(observation.latency_seconds),
                            probability,
                        ],
                    )
                    .await?
            }
            None => {
                self.client
                    .exec(
                        "INSERT INTO observations \
                         (timestamp, commentary, embedding, latency, homelessness_probability) \
                         VALUES (?, ?, NULL, ?, ?)",
                        &[
                            json!(timestamp),
                            json!(observation.commentary),
                            json!(observation.latency_seconds),
                            probability,
                        ],
                    )
                    .await?
            }
        };

        if affected == 0 {
            return Err(StoreError::write_rejected(
                "insert affected zero rows".to_string(),
            ));
        }

        record_append();
        Ok(())
    }

    // =========================================================================
    // Read path
    // =========================================================================

    /// Total observations inside the window.
    pub async fn count(&self, range: TimeRange) -> StoreResult<u64> {
        self.ensure_schema().await?;

        let sql = format!(
            "SELECT COUNT(*) AS total FROM observations {}",
            time_filter(range)
        );
        let rows = self.client.query_rows(&sql, &[]).await?;

        match rows.first() {
            Some(row) => get_u64(row, "total"),
            None => Ok(0),
        }
    }

    /// Most recent commentaries, newest first.
    pub async fn recent(&self, range: TimeRange, limit: usize) -> StoreResult<Vec<CommentaryRow>> {
        self.ensure_schema().await?;

        let sql = format!(
            "SELECT timestamp, commentary FROM observations {} \
             ORDER BY timestamp DESC LIMIT {}",
            time_filter(range),
            limit
        );
        let rows = self.client.query_rows(&sql, &[]).await?;

        rows.iter()
            .map(|row| {
                Ok(CommentaryRow {
                    timestamp: get_timestamp(row, "timestamp")?,
                    commentary: get_str(row, "commentary")?,
                })
            })
            .collect()
    }

    /// Most recent latency samples, newest first.
    pub async fn latency_recent(
        &self,
        range: TimeRange,
        limit: usize,
    ) -> StoreResult<Vec<LatencyRow>> {
        self.ensure_schema().await?;

        let sql = format!(
            "SELECT timestamp, latency FROM observations {} \
             ORDER BY timestamp DESC LIMIT {}",
            time_filter(range),
            limit
        );
        let rows = self.client.query_rows(&sql, &[]).await?;

        rows.iter()
            .map(|row| {
                Ok(LatencyRow {
                    timestamp: get_timestamp(row, "timestamp")?,
                    latency: get_f64(row, "latency").unwrap_or(0.0),
                })
            })
            .collect()
    }

    /// Observation counts grouped by calendar day, oldest first.
    pub async fn counts_by_day(&self, range: TimeRange) -> StoreResult<Vec<DayCount>> {
        self.ensure_schema().await?;

        let sql = format!(
            "SELECT DATE(timestamp) AS date, COUNT(*) AS count FROM observations {} \
             GROUP BY DATE(timestamp) ORDER BY date",
            time_filter(range)
        );
        let rows = self.client.query_rows(&sql, &[]).await?;

        rows.iter()
            .map(|row| {
                Ok(DayCount {
                    date: get_str(row, "date")?,
                    count: get_u64(row, "count")?,
                })
            })
            .collect()
    }

    /// Probability series in timestamp order.
    pub async fn probability_over_time(
        &self,
        range: TimeRange,
    ) -> StoreResult<Vec<ProbabilityRow>> {
        self.ensure_schema().await?;

        let sql = format!(
            "SELECT timestamp, homelessness_probability FROM observations {} \
             ORDER BY timestamp",
            time_filter(range)
        );
        let rows = self.client.query_rows(&sql, &[]).await?;

        rows.iter()
            .map(|row| {
                Ok(ProbabilityRow {
                    timestamp: get_timestamp(row, "timestamp")?,
                    homelessness_probability: get_probability(row, "homelessness_probability"),
                })
            })
            .collect()
    }

    /// Top-K stored observations by ascending distance to the query
    /// embedding, restricted to the window. Rows without an embedding are
    /// excluded.
    pub async fn nearest(
        &self,
        query_embedding: &[f32],
        range: TimeRange,
    ) -> StoreResult<Vec<SimilarityHit>> {
        self.ensure_schema().await?;

        let window = match range.window_seconds() {
            Some(secs) => format!(
                "AND timestamp >= DATE_SUB(NOW(6), INTERVAL {} SECOND)",
                secs
            ),
            None => String::new(),
        };

        let sql = format!(
            "SELECT timestamp, homelessness_probability, \
             EUCLIDEAN_DISTANCE(embedding, JSON_ARRAY_PACK(?)) AS distance \
             FROM observations WHERE embedding IS NOT NULL {} \
             ORDER BY distance LIMIT {}",
            window, NEAREST_LIMIT
        );
        let packed = serde_json::to_string(query_embedding)?;
        let rows = self.client.query_rows(&sql, &[json!(packed)]).await?;

        rows.iter()
            .map(|row| {
                Ok(SimilarityHit {
                    timestamp: get_timestamp(row, "timestamp")?,
                    homelessness_probability: get_probability(row, "homelessness_probability"),
                    distance: get_f64(row, "distance").unwrap_or(f64::MAX),
                })
            })
            .collect()
    }
}

// =============================================================================
// SQL helpers
// =============================================================================

/// WHERE clause for a relative window. Window sizes come from the
/// `TimeRange` enum, never from user input.
fn time_filter(range: TimeRange) -> String {
    match range.window_seconds() {
        Some(secs) => format!(
            "WHERE timestamp >= DATE_SUB(NOW(6), INTERVAL {} SECOND)",
            secs
        ),
        None => String::new(),
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

// =============================================================================
// Row extraction
// =============================================================================

fn get_str(row: &serde_json::Map<String, Value>, column: &str) -> StoreResult<String> {
    row.get(column)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StoreError::invalid_response(format!("missing column `{}`", column)))
}

fn get_u64(row: &serde_json::Map<String, Value>, column: &str) -> StoreResult<u64> {
    let value = row
        .get(column)
        .ok_or_else(|| StoreError::invalid_response(format!("missing column `{}`", column)))?;

    // The Data API may encode BIGINT aggregates as strings.
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| StoreError::invalid_response(format!("non-integer `{}`", column))),
        Value::String(s) => s
            .parse()
            .map_err(|_| StoreError::invalid_response(format!("non-integer `{}`", column))),
        _ => Err(StoreError::invalid_response(format!(
            "non-integer `{}`",
            column
        ))),
    }
}

fn get_f64(row: &serde_json::Map<String, Value>, column: &str) -> Option<f64> {
    match row.get(column)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn get_probability(row: &serde_json::Map<String, Value>, column: &str) -> Option<u8> {
    match row.get(column)? {
        Value::Number(n) => n.as_u64().map(|p| p.min(100) as u8),
        Value::String(s) => s.parse::<u64>().ok().map(|p| p.min(100) as u8),
        _ => None,
    }
}

fn get_timestamp(row: &serde_json::Map<String, Value>, column: &str) -> StoreResult<DateTime<Utc>> {
    let raw = row
        .get(column)
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::invalid_response(format!("missing column `{}`", column)))?;

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::invalid_response(format!("unparseable timestamp `{}`", raw)))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_store(base_url: &str) -> ObservationStore {
        ObservationStore::new(StoreConfig {
            api_url: base_url.to_string(),
            user: "root".to_string(),
            password: String::new(),
            database: "curbwatch_test".to_string(),
            timeout: std::time::Duration::from_secs(5),
            connect_timeout: std::time::Duration::from_secs(2),
        })
        .unwrap()
    }

    #[test]
    fn test_time_filter_windows() {
        assert_eq!(time_filter(TimeRange::All), "");
        assert_eq!(
            time_filter(TimeRange::Last30Seconds),
            "WHERE timestamp >= DATE_SUB(NOW(6), INTERVAL 30 SECOND)"
        );
        assert_eq!(
            time_filter(TimeRange::Last10Minutes),
            "WHERE timestamp >= DATE_SUB(NOW(6), INTERVAL 600 SECOND)"
        );
    }

    #[test]
    fn test_timestamp_roundtrip() {
        let mut row = serde_json::Map::new();
        row.insert(
            "timestamp".to_string(),
            json!("2026-08-07 12:30:45.123456"),
        );
        let parsed = get_timestamp(&row, "timestamp").unwrap();
        assert_eq!(format_timestamp(&parsed), "2026-08-07 12:30:45.123456");
    }

    #[test]
    fn test_get_u64_accepts_string_numbers() {
        let mut row = serde_json::Map::new();
        row.insert("total".to_string(), json!("42"));
        assert_eq!(get_u64(&row, "total").unwrap(), 42);

        row.insert("total".to_string(), json!(7));
        assert_eq!(get_u64(&row, "total").unwrap(), 7);
    }

    #[tokio::test]
    async fn test_ensure_schema_single_flight() {
        let server = MockServer::start().await;

        // Exactly one DDL round trip regardless of how many tasks race init.
        Mock::given(method("POST"))
            .and(path("/api/v2/exec"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rowsAffected": 0})))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(test_store(&server.uri()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.ensure_schema().await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
    }

    #[tokio::test]
    async fn test_append_inserts_once() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/exec"))
            .and(body_partial_json(json!({"database": "curbwatch_test"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rowsAffected": 1})))
            // One DDL call plus exactly one INSERT.
            .expect(2)
            .mount(&server)
            .await;

        let store = test_store(&server.uri());
        let observation = Observation::new("tents along the overpass")
            .with_probability(80u32)
            .with_latency(0.42)
            .with_embedding(Some(vec![0.1, 0.2, 0.3]));

        store.append(&observation).await.unwrap();
    }

    #[tokio::test]
    async fn test_append_without_embedding_writes_null() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/exec"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rowsAffected": 1})))
            .expect(2)
            .mount(&server)
            .await;

        let store = test_store(&server.uri());
        let observation = Observation::new("empty sidewalk").with_probability(5u32);

        // Embedding failure upstream means a NULL column, never a failed append.
        store.append(&observation).await.unwrap();
    }

    #[tokio::test]
    async fn test_count_zero_state() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/exec"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rowsAffected": 0})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v2/query/rows"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"rows": [{"total": 0}]}]
            })))
            .mount(&server)
            .await;

        let store = test_store(&server.uri());
        assert_eq!(store.count(TimeRange::All).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_write_rejected_propagates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/exec"))
            .respond_with(ResponseTemplate::new(500).set_body_string("disk full"))
            .mount(&server)
            .await;

        let store = test_store(&server.uri());
        let err = store
            .append(&Observation::new("anything"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::BadStatus { status: 500, .. }));
    }
}
