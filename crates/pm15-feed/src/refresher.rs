//! Market refresh: fetch one event and diff it against the last snapshot.
//!
//! Fetching and diffing are separate steps. `Refresher::fetch` performs the
//! network call and normalization; `diff_markets` is a pure comparison of
//! two immutable snapshots, applied by the owner of the session state once
//! the response arrives.

use crate::error::{FeedError, FeedResult};
use crate::normalizer::{normalize_event, PriceBasis};
use chrono::{DateTime, Utc};
use pm15_core::{Market, PriceDelta, Quote};
use pm15_registry::EventProvider;
use pm15_telemetry::Metrics;
use std::collections::HashMap;
use tracing::debug;

/// Normalized contents of one fetched event.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedEvent {
    pub slug: String,
    pub end_time: Option<DateTime<Utc>>,
    pub markets: Vec<Market>,
}

impl FetchedEvent {
    /// Whether the event is over: expired at `now`, or every market closed.
    pub fn needs_rollover(&self, now: DateTime<Utc>) -> bool {
        let expired = self.end_time.is_some_and(|end| end <= now);
        let all_closed = !self.markets.is_empty() && self.markets.iter().all(|m| m.closed);
        expired || all_closed
    }
}

/// New snapshot plus the changes observed against the previous one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshResult {
    pub markets: Vec<Market>,
    pub deltas: Vec<(String, PriceDelta)>,
}

/// Fetches and normalizes events by slug.
#[derive(Debug, Clone, Copy, Default)]
pub struct Refresher {
    basis: PriceBasis,
}

impl Refresher {
    pub fn new(basis: PriceBasis) -> Self {
        Self { basis }
    }

    /// Fetch the event for `slug`.
    ///
    /// Only the first event is used when the provider returns several.
    pub async fn fetch(&self, provider: &dyn EventProvider, slug: &str) -> FeedResult<FetchedEvent> {
        let events = provider.get_event_by_slug(slug).await?;
        let returned = events.len();

        let event = events
            .into_iter()
            .next()
            .ok_or_else(|| FeedError::EventNotFound(slug.to_string()))?;

        if returned > 1 {
            debug!(%slug, returned, "Multiple events for slug, using the first");
        }

        Ok(FetchedEvent {
            slug: event.slug.clone(),
            end_time: event.end_time(),
            markets: normalize_event(&event, self.basis),
        })
    }
}

/// Compare a new snapshot against the previous one by market id.
///
/// Markets absent from `previous` produce no delta.
pub fn diff_markets(previous: &[Market], next: Vec<Market>) -> RefreshResult {
    let prior: HashMap<&str, Quote> = previous
        .iter()
        .map(|market| (market.id.as_str(), market.quote()))
        .collect();

    let deltas: Vec<(String, PriceDelta)> = next
        .iter()
        .filter_map(|market| {
            let old = prior.get(market.id.as_str())?;
            PriceDelta::between(*old, market.quote()).map(|delta| (market.id.clone(), delta))
        })
        .collect();

    for (_, delta) in &deltas {
        if !delta.yes.is_none() {
            Metrics::price_delta("yes", &delta.yes.to_string());
        }
        if !delta.no.is_none() {
            Metrics::price_delta("no", &delta.no.to_string());
        }
    }

    RefreshResult {
        markets: next,
        deltas,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pm15_core::Direction;
    use pm15_registry::{EventRecord, MarketRecord, MockEventProvider, RegistryError};
    use serde_json::json;

    fn market(id: &str, yes: f64, no: f64) -> Market {
        Market {
            id: id.to_string(),
            question: format!("Market {id}"),
            yes_price: yes,
            no_price: no,
            closed: false,
            parent_slug: "btc-updown-15m-1".to_string(),
            end_time: None,
        }
    }

    fn event_record(slug: &str, bid: f64) -> EventRecord {
        EventRecord {
            slug: slug.to_string(),
            end_date: None,
            markets: vec![MarketRecord {
                id: "m1".to_string(),
                question: "Bitcoin Up or Down?".to_string(),
                closed: false,
                best_bid: Some(json!(bid)),
                best_ask: Some(json!(0.5)),
                outcome_prices: None,
            }],
        }
    }

    #[test]
    fn test_identical_prices_no_delta() {
        let previous = vec![market("m1", 0.45, 0.55)];
        let result = diff_markets(&previous, vec![market("m1", 0.45, 0.55)]);
        assert!(result.deltas.is_empty());
        assert_eq!(result.markets.len(), 1);
    }

    #[test]
    fn test_changed_prices_directions() {
        let previous = vec![market("m1", 0.45, 0.55), market("m2", 0.30, 0.70)];
        let result = diff_markets(
            &previous,
            vec![market("m1", 0.47, 0.53), market("m2", 0.30, 0.71)],
        );

        assert_eq!(result.deltas.len(), 2);
        let (id, delta) = &result.deltas[0];
        assert_eq!(id, "m1");
        assert_eq!(delta.yes, Direction::Up);
        assert_eq!(delta.no, Direction::Down);

        let (id, delta) = &result.deltas[1];
        assert_eq!(id, "m2");
        assert_eq!(delta.yes, Direction::None);
        assert_eq!(delta.no, Direction::Up);
    }

    #[test]
    fn test_new_market_has_no_delta() {
        let result = diff_markets(&[], vec![market("m1", 0.45, 0.55)]);
        assert!(result.deltas.is_empty());
    }

    #[test]
    fn test_needs_rollover() {
        let now = Utc::now();
        let mut fetched = FetchedEvent {
            slug: "btc-updown-15m-1".to_string(),
            end_time: Some(now + Duration::minutes(5)),
            markets: vec![market("m1", 0.45, 0.55)],
        };
        assert!(!fetched.needs_rollover(now));

        fetched.markets[0].closed = true;
        assert!(fetched.needs_rollover(now));

        fetched.markets[0].closed = false;
        fetched.end_time = Some(now - Duration::seconds(1));
        assert!(fetched.needs_rollover(now));
    }

    #[tokio::test]
    async fn test_fetch_uses_first_event() {
        let mut provider = MockEventProvider::new();
        provider
            .expect_get_event_by_slug()
            .times(1)
            .returning(|_| Ok(vec![event_record("first", 0.41), event_record("second", 0.42)]));

        let fetched = Refresher::default().fetch(&provider, "first").await.unwrap();
        assert_eq!(fetched.slug, "first");
        assert_eq!(fetched.markets.len(), 1);
        assert_eq!(fetched.markets[0].yes_price, 0.41);
    }

    #[tokio::test]
    async fn test_fetch_empty_is_not_found() {
        let mut provider = MockEventProvider::new();
        provider
            .expect_get_event_by_slug()
            .returning(|_| Ok(Vec::new()));

        let result = Refresher::default().fetch(&provider, "gone").await;
        assert!(matches!(result, Err(FeedError::EventNotFound(slug)) if slug == "gone"));
    }

    #[tokio::test]
    async fn test_fetch_provider_error() {
        let mut provider = MockEventProvider::new();
        provider.expect_get_event_by_slug().returning(|_| {
            Err(RegistryError::Status {
                status: 503,
                body: String::new(),
            })
        });

        let result = Refresher::default().fetch(&provider, "btc").await;
        assert!(matches!(result, Err(FeedError::Provider(_))));
    }
}
