//! Wire records returned by the events API.
//!
//! Price fields are kept as raw JSON values: upstream sends them either as
//! numbers or as numeric strings, and an unparsable value must only skip
//! the one market carrying it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event with its nested markets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(default)]
    pub slug: String,
    /// RFC 3339 expiry instant.
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub markets: Vec<MarketRecord>,
}

impl EventRecord {
    /// Parsed expiry, or `None` when absent or not RFC 3339.
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_date
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// One market under an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub best_bid: Option<serde_json::Value>,
    #[serde(default)]
    pub best_ask: Option<serde_json::Value>,
    /// Serialized pair, e.g. `"[\"0.52\", \"0.48\"]"`.
    #[serde(default)]
    pub outcome_prices: Option<serde_json::Value>,
}

/// Response body that may be a single object or an array of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        match value {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}
