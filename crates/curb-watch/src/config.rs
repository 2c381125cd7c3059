//! Watch session configuration.

use std::time::Duration;

/// Watch session configuration.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Base URL of the CurbWatch API.
    pub api_base_url: String,
    /// Directory of pre-rendered frames standing in for the playback surface.
    pub frames_dir: String,
    /// Commentary cadence (active only while playing).
    pub commentary_interval: Duration,
    /// Analytics poll cadence (always active).
    pub analytics_interval: Duration,
    /// Optional similarity-search prompt forwarded on analytics polls.
    pub user_prompt: Option<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            frames_dir: "./frames".to_string(),
            commentary_interval: Duration::from_millis(2000),
            analytics_interval: Duration::from_millis(2000),
            user_prompt: None,
        }
    }
}

impl WatchConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            api_base_url: std::env::var("WATCH_API_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            frames_dir: std::env::var("WATCH_FRAMES_DIR").unwrap_or_else(|_| "./frames".to_string()),
            commentary_interval: Duration::from_millis(
                std::env::var("WATCH_COMMENTARY_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2000),
            ),
            analytics_interval: Duration::from_millis(
                std::env::var("WATCH_ANALYTICS_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2000),
            ),
            user_prompt: std::env::var("WATCH_USER_PROMPT").ok().filter(|p| !p.is_empty()),
        }
    }
}
