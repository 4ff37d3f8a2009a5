//! Transient price-change markers.
//!
//! A marker is set when a refresh observes a changed price and is reset by
//! its own expiry, a fixed TTL after creation. The session's default TTL
//! is `DEFAULT_DELTA_TTL`. Expiry is unconditional: a newer change in
//! between does not extend an older marker's lifetime.

use pm15_core::PriceDelta;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Lifetime of a price-change marker.
pub const DEFAULT_DELTA_TTL: Duration = Duration::from_secs(1);

/// Active price-change markers keyed by market id.
#[derive(Debug, Default)]
pub struct DeltaBoard {
    entries: HashMap<String, PriceDelta>,
}

impl DeltaBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the marker for a market, replacing any previous one.
    pub fn apply(&mut self, market_id: impl Into<String>, delta: PriceDelta) {
        self.entries.insert(market_id.into(), delta);
    }

    /// Reset a market's marker to `none`. Returns true if one was active.
    pub fn clear(&mut self, market_id: &str) -> bool {
        self.entries.remove(market_id).is_some()
    }

    /// Marker for a market; cleared when none is active.
    pub fn get(&self, market_id: &str) -> PriceDelta {
        self.entries.get(market_id).copied().unwrap_or_default()
    }

    /// All active markers.
    pub fn active(&self) -> BTreeMap<String, PriceDelta> {
        self.entries
            .iter()
            .map(|(id, delta)| (id.clone(), *delta))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
