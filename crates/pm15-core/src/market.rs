//! Normalized market snapshot.
//!
//! Markets are immutable snapshots: every refresh builds new `Market`
//! values, which supersede the previous ones by `id`. Nothing mutates a
//! market in place.

use crate::types::Quote;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One binary-outcome contract.
///
/// Prices are not range-checked. Upstream may transiently report values
/// outside [0, 1], and callers must tolerate sums outside [0, 2].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    /// Upstream identifier, stable for the contract's lifetime.
    pub id: String,
    /// Display text.
    pub question: String,
    /// Price of the "yes" outcome.
    pub yes_price: f64,
    /// Price of the "no" outcome.
    pub no_price: f64,
    /// True once the market has resolved.
    pub closed: bool,
    /// Slug of the owning event.
    pub parent_slug: String,
    /// Expiry of the owning event, if known.
    pub end_time: Option<DateTime<Utc>>,
}

impl Market {
    /// Sum of both outcome prices.
    pub fn price_sum(&self) -> f64 {
        self.yes_price + self.no_price
    }

    /// Current quote for this market.
    pub fn quote(&self) -> Quote {
        Quote::new(self.yes_price, self.no_price)
    }

    /// Question truncated to at most `max_chars` characters.
    pub fn short_question(&self, max_chars: usize) -> &str {
        truncate_chars(&self.question, max_chars)
    }
}

/// Prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
