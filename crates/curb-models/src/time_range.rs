//! Analytics time ranges.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Relative time window applied to every analytics query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum TimeRange {
    #[serde(rename = "30s")]
    Last30Seconds,
    #[serde(rename = "1min")]
    LastMinute,
    #[serde(rename = "5min")]
    Last5Minutes,
    #[serde(rename = "10min")]
    Last10Minutes,
    /// No window — the full history.
    #[default]
    #[serde(other)]
    All,
}

impl TimeRange {
    /// Window size in seconds, or `None` for the unbounded range.
    pub fn window_seconds(&self) -> Option<u64> {
        match self {
            Self::Last30Seconds => Some(30),
            Self::LastMinute => Some(60),
            Self::Last5Minutes => Some(300),
            Self::Last10Minutes => Some(600),
            Self::All => None,
        }
    }
}

impl FromStr for TimeRange {
    type Err = ();

    /// Unknown values fall back to the unbounded range, matching the
    /// endpoint's treatment of an absent parameter.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "30s" => Self::Last30Seconds,
            "1min" => Self::LastMinute,
            "5min" => Self::Last5Minutes,
            "10min" => Self::Last10Minutes,
            _ => Self::All,
        })
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Last30Seconds => "30s",
            Self::LastMinute => "1min",
            Self::Last5Minutes => "5min",
            Self::Last10Minutes => "10min",
            Self::All => "all",
        };
        write!(f, "{}", s)
    }
}
