//! HTTP Data API client.
//!
//! Speaks the SingleStore-style SQL-over-HTTP protocol:
//! - `POST {base}/api/v2/exec` for statements (DDL, INSERT)
//! - `POST {base}/api/v2/query/rows` for row-returning queries
//!
//! Requests carry basic auth and a JSON body of `{sql, args, database}`.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::metrics::record_request;

// =============================================================================
// Configuration
// =============================================================================

/// Data API connection configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the Data API endpoint (no trailing slash).
    pub api_url: String,
    /// Basic auth user.
    pub user: String,
    /// Basic auth password.
    pub password: String,
    /// Database the observation table lives in.
    pub database: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Connect timeout.
    pub connect_timeout: Duration,
}

impl StoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        let api_url = std::env::var("STORE_API_URL")
            .map_err(|_| StoreError::config("STORE_API_URL must be set to reach the store"))?;

        if api_url.is_empty() {
            return Err(StoreError::config("STORE_API_URL cannot be empty"));
        }

        let connect_timeout_secs: u64 = std::env::var("STORE_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            user: std::env::var("STORE_USER").unwrap_or_else(|_| "root".to_string()),
            password: std::env::var("STORE_PASSWORD").unwrap_or_default(),
            database: std::env::var("STORE_DATABASE").unwrap_or_else(|_| "curbwatch".to_string()),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
        })
    }
}

// =============================================================================
// Client
// =============================================================================

#[derive(Debug, Serialize)]
struct SqlRequest<'a> {
    sql: &'a str,
    args: &'a [Value],
    database: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExecResponse {
    #[serde(rename = "rowsAffected", default)]
    rows_affected: u64,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    results: Vec<ResultSet>,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    #[serde(default)]
    rows: Vec<serde_json::Map<String, Value>>,
}

/// Thin client over the SQL HTTP endpoint.
#[derive(Clone)]
pub struct DataApiClient {
    http: Client,
    config: StoreConfig,
}

impl DataApiClient {
    /// Create a new client with tuned connection handling.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("curb-store/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(StoreError::Network)?;

        Ok(Self { http, config })
    }

    /// Execute a statement, returning the affected row count.
    pub async fn exec(&self, sql: &str, args: &[Value]) -> StoreResult<u64> {
        let url = format!("{}/api/v2/exec", self.config.api_url);
        let body: ExecResponse = self.post("exec", &url, sql, args).await?;
        Ok(body.rows_affected)
    }

    /// Run a row-returning query.
    pub async fn query_rows(
        &self,
        sql: &str,
        args: &[Value],
    ) -> StoreResult<Vec<serde_json::Map<String, Value>>> {
        let url = format!("{}/api/v2/query/rows", self.config.api_url);
        let body: QueryResponse = self.post("query", &url, sql, args).await?;

        let rows = body
            .results
            .into_iter()
            .next()
            .map(|set| set.rows)
            .unwrap_or_default();
        Ok(rows)
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        operation: &str,
        url: &str,
        sql: &str,
        args: &[Value],
    ) -> StoreResult<T> {
        let request = SqlRequest {
            sql,
            args,
            database: &self.config.database,
        };

        let start = Instant::now();
        let response = self
            .http
            .post(url)
            .basic_auth(&self.config.user, Some(&self.config.password))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        record_request(operation, status.as_u16(), start.elapsed().as_millis() as f64);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        debug!(operation, status = status.as_u16(), "store request ok");

        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::invalid_response(e.to_string()))
    }
}
