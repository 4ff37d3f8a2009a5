//! Tracked asset enumeration.
//!
//! Each tracked asset has exactly one "current" 15-minute up/down event
//! upstream. Event slugs start with the lowercase symbol followed by `-`
//! (e.g. `btc-updown-15m-1760000000`).

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between the leading asset token and the rest of a slug.
pub const SLUG_SEPARATOR: char = '-';

/// One of the fixed set of assets with a short-window market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrackedAsset {
    Btc,
    Eth,
    Sol,
    Xrp,
}

impl TrackedAsset {
    /// All tracked assets, in display order.
    pub const ALL: [TrackedAsset; 4] = [Self::Btc, Self::Eth, Self::Sol, Self::Xrp];

    /// Upper-case ticker symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Btc => "BTC",
            Self::Eth => "ETH",
            Self::Sol => "SOL",
            Self::Xrp => "XRP",
        }
    }

    /// Match the leading token of an event slug against the tracked set.
    ///
    /// Returns `None` for slugs whose leading token is not a tracked symbol.
    pub fn from_slug(slug: &str) -> Option<Self> {
        let token = slug.split(SLUG_SEPARATOR).next()?;
        Self::ALL
            .into_iter()
            .find(|asset| asset.symbol().eq_ignore_ascii_case(token))
    }
}

impl fmt::Display for TrackedAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for TrackedAsset {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|asset| asset.symbol().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownAsset(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!("btc".parse::<TrackedAsset>().unwrap(), TrackedAsset::Btc);
        assert_eq!(" Eth ".parse::<TrackedAsset>().unwrap(), TrackedAsset::Eth);
        assert!("doge".parse::<TrackedAsset>().is_err());
    }

    #[test]
    fn test_from_slug_leading_token() {
        assert_eq!(
            TrackedAsset::from_slug("sol-updown-15m-1760000000"),
            Some(TrackedAsset::Sol)
        );
        assert_eq!(
            TrackedAsset::from_slug("XRP-updown-15m-1"),
            Some(TrackedAsset::Xrp)
        );
        // Token must match exactly, not as a prefix
        assert_eq!(TrackedAsset::from_slug("btcx-updown-15m"), None);
        assert_eq!(TrackedAsset::from_slug("will-btc-close-higher"), None);
    }

    #[test]
    fn test_serde_uppercase() {
        let json = serde_json::to_string(&TrackedAsset::Btc).unwrap();
        assert_eq!(json, r#""BTC""#);
        let asset: TrackedAsset = serde_json::from_str(r#""XRP""#).unwrap();
        assert_eq!(asset, TrackedAsset::Xrp);
    }
}
