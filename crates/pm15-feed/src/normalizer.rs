//! Raw record -> `Market` normalization.
//!
//! Two price bases are supported:
//! - `BidAsk` (default): yes = best bid, no = best ask, each 0.5 when absent
//! - `OutcomePrices`: yes/no taken from the serialized outcome price pair
//!
//! Values are never clamped. A present but unparsable price rejects only
//! the market carrying it.

use crate::error::{FeedError, FeedResult};
use pm15_core::Market;
use pm15_registry::{EventRecord, MarketRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Price used for a side with no quote.
pub const DEFAULT_PRICE: f64 = 0.5;

/// Which record fields feed the yes/no prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBasis {
    #[default]
    BidAsk,
    OutcomePrices,
}

/// Normalize one market record owned by `owner`.
pub fn normalize(raw: &MarketRecord, owner: &EventRecord, basis: PriceBasis) -> FeedResult<Market> {
    let (yes_price, no_price) = match basis {
        PriceBasis::BidAsk => (
            parse_price("bestBid", raw.best_bid.as_ref())?.unwrap_or(DEFAULT_PRICE),
            parse_price("bestAsk", raw.best_ask.as_ref())?.unwrap_or(DEFAULT_PRICE),
        ),
        PriceBasis::OutcomePrices => parse_outcome_prices(raw.outcome_prices.as_ref())?
            .unwrap_or((DEFAULT_PRICE, DEFAULT_PRICE)),
    };

    Ok(Market {
        id: raw.id.clone(),
        question: raw.question.clone(),
        yes_price,
        no_price,
        closed: raw.closed,
        parent_slug: owner.slug.clone(),
        end_time: owner.end_time(),
    })
}

/// Normalize every market of an event, skipping malformed records.
pub fn normalize_event(event: &EventRecord, basis: PriceBasis) -> Vec<Market> {
    event
        .markets
        .iter()
        .filter_map(|raw| match normalize(raw, event, basis) {
            Ok(market) => Some(market),
            Err(e) => {
                warn!(market_id = %raw.id, slug = %event.slug, error = %e, "Skipping malformed market");
                None
            }
        })
        .collect()
}

/// Parse a price that may be a JSON number or a numeric string.
///
/// `None`/`null` is absent; anything else that is not a finite number is
/// malformed.
fn parse_price(field: &'static str, value: Option<&Value>) -> FeedResult<Option<f64>> {
    let parsed = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match parsed {
        Some(price) if price.is_finite() => Ok(Some(price)),
        _ => Err(FeedError::MalformedPrice {
            field,
            value: value.map(|v| v.to_string()).unwrap_or_default(),
        }),
    }
}

/// Parse the serialized outcome price pair.
///
/// Upstream sends a JSON-encoded string (`"[\"0.52\", \"0.48\"]"`), some
/// sources with single quotes; a plain array is accepted too.
fn parse_outcome_prices(value: Option<&Value>) -> FeedResult<Option<(f64, f64)>> {
    const FIELD: &str = "outcomePrices";

    let malformed = |v: &Value| FeedError::MalformedPrice {
        field: FIELD,
        value: v.to_string(),
    };

    let raw = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(raw) => raw,
    };

    let items: Vec<Value> = match raw {
        Value::Array(items) => items.clone(),
        Value::String(s) => {
            serde_json::from_str(&s.replace('\'', "\"")).map_err(|_| malformed(raw))?
        }
        _ => return Err(malformed(raw)),
    };

    match items.as_slice() {
        [yes, no, ..] => {
            let yes = parse_price(FIELD, Some(yes))?.unwrap_or(DEFAULT_PRICE);
            let no = parse_price(FIELD, Some(no))?.unwrap_or(DEFAULT_PRICE);
            Ok(Some((yes, no)))
        }
        _ => Err(malformed(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn owner() -> EventRecord {
        EventRecord {
            slug: "btc-updown-15m-1760000000".to_string(),
            end_date: Some("2025-10-09T10:15:00Z".to_string()),
            markets: Vec::new(),
        }
    }

    fn record(best_bid: Option<Value>, best_ask: Option<Value>) -> MarketRecord {
        MarketRecord {
            id: "512345".to_string(),
            question: "Bitcoin Up or Down?".to_string(),
            closed: false,
            best_bid,
            best_ask,
            outcome_prices: None,
        }
    }

    #[test]
    fn test_bid_ask_prices() {
        let market = normalize(
            &record(Some(json!(0.48)), Some(json!("0.51"))),
            &owner(),
            PriceBasis::BidAsk,
        )
        .unwrap();

        assert_eq!(market.yes_price, 0.48);
        assert_eq!(market.no_price, 0.51);
        assert_eq!(market.parent_slug, "btc-updown-15m-1760000000");
        assert!(market.end_time.is_some());
    }

    #[test]
    fn test_defaults_when_absent() {
        let market = normalize(&record(None, None), &owner(), PriceBasis::BidAsk).unwrap();
        assert_eq!(market.yes_price, DEFAULT_PRICE);
        assert_eq!(market.no_price, DEFAULT_PRICE);

        // Defaults apply per side
        let market =
            normalize(&record(Some(json!(0.3)), Some(Value::Null)), &owner(), PriceBasis::BidAsk)
                .unwrap();
        assert_eq!(market.yes_price, 0.3);
        assert_eq!(market.no_price, DEFAULT_PRICE);
    }

    #[test]
    fn test_no_clamping() {
        let market = normalize(
            &record(Some(json!(1.2)), Some(json!(-0.1))),
            &owner(),
            PriceBasis::BidAsk,
        )
        .unwrap();
        assert_eq!(market.yes_price, 1.2);
        assert_eq!(market.no_price, -0.1);
    }

    #[test]
    fn test_malformed_price_rejected() {
        let result = normalize(
            &record(Some(json!("n/a")), Some(json!(0.5))),
            &owner(),
            PriceBasis::BidAsk,
        );
        assert!(matches!(
            result,
            Err(FeedError::MalformedPrice { field: "bestBid", .. })
        ));
    }

    #[test]
    fn test_outcome_prices_basis() {
        let mut raw = record(None, None);
        raw.outcome_prices = Some(json!("['0.52', '0.48']"));
        let market = normalize(&raw, &owner(), PriceBasis::OutcomePrices).unwrap();
        assert_eq!(market.yes_price, 0.52);
        assert_eq!(market.no_price, 0.48);

        raw.outcome_prices = Some(json!("[\"0.6\", \"0.4\"]"));
        let market = normalize(&raw, &owner(), PriceBasis::OutcomePrices).unwrap();
        assert_eq!(market.yes_price, 0.6);

        raw.outcome_prices = Some(json!("[0.6]"));
        assert!(normalize(&raw, &owner(), PriceBasis::OutcomePrices).is_err());

        raw.outcome_prices = None;
        let market = normalize(&raw, &owner(), PriceBasis::OutcomePrices).unwrap();
        assert_eq!(market.yes_price, DEFAULT_PRICE);
    }

    #[test]
    fn test_normalize_event_skips_malformed() {
        let mut event = owner();
        event.markets = vec![
            record(Some(json!(0.4)), Some(json!(0.5))),
            record(Some(json!({"bad": true})), None),
            record(None, Some(json!("0.55"))),
        ];

        let markets = normalize_event(&event, PriceBasis::BidAsk);
        assert_eq!(markets.len(), 2);
        assert_eq!(markets[1].no_price, 0.55);
    }
}
