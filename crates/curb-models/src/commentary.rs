//! Commentary log entries.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One entry in the session's commentary log.
///
/// The log is append-only by arrival time and owned by the session — it is
/// never persisted, reordered, or deduplicated, and resets only when a new
/// session starts.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommentaryEntry {
    /// AI-sourced commentary with its probability score.
    Ai {
        timestamp: DateTime<Utc>,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        homelessness_probability: Option<u8>,
    },
    /// Free-text message typed by the user.
    User {
        timestamp: DateTime<Utc>,
        text: String,
    },
}

impl CommentaryEntry {
    /// Create an AI entry stamped now.
    pub fn ai(text: impl Into<String>, homelessness_probability: Option<u8>) -> Self {
        Self::Ai {
            timestamp: Utc::now(),
            text: text.into(),
            homelessness_probability,
        }
    }

    /// Create a user entry stamped now.
    pub fn user(text: impl Into<String>) -> Self {
        Self::User {
            timestamp: Utc::now(),
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Ai { text, .. } | Self::User { text, .. } => text,
        }
    }

    pub fn is_ai(&self) -> bool {
        matches!(self, Self::Ai { .. })
    }
}
