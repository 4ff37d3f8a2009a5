//! Price change markers and quotes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of an observed price change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    #[default]
    None,
}

impl Direction {
    /// Compare a previous and a new value.
    ///
    /// Any numeric difference is a change: `Up` iff `new > old`, otherwise
    /// `Down`. Equal values yield `None`.
    pub fn between(old: f64, new: f64) -> Self {
        if new == old {
            Self::None
        } else if new > old {
            Self::Up
        } else {
            Self::Down
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Per-market change marker for both outcome prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceDelta {
    pub yes: Direction,
    pub no: Direction,
}

impl PriceDelta {
    /// Delta between two quotes. Returns `None` when neither side moved.
    pub fn between(old: Quote, new: Quote) -> Option<Self> {
        let delta = Self {
            yes: Direction::between(old.yes, new.yes),
            no: Direction::between(old.no, new.no),
        };
        (!delta.is_cleared()).then_some(delta)
    }

    /// True when both sides are `None`.
    pub fn is_cleared(&self) -> bool {
        self.yes.is_none() && self.no.is_none()
    }
}

/// Yes/no price pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub yes: f64,
    pub no: f64,
}

impl Quote {
    pub fn new(yes: f64, no: f64) -> Self {
        Self { yes, no }
    }

    /// Cost of buying one share of each outcome.
    pub fn sum(&self) -> f64 {
        self.yes + self.no
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_between() {
        assert_eq!(Direction::between(0.50, 0.51), Direction::Up);
        assert_eq!(Direction::between(0.50, 0.49), Direction::Down);
        assert_eq!(Direction::between(0.50, 0.50), Direction::None);
    }

    #[test]
    fn test_delta_unchanged_is_none() {
        let q = Quote::new(0.45, 0.55);
        assert!(PriceDelta::between(q, q).is_none());
    }

    #[test]
    fn test_delta_one_side() {
        let delta = PriceDelta::between(Quote::new(0.45, 0.55), Quote::new(0.47, 0.55)).unwrap();
        assert_eq!(delta.yes, Direction::Up);
        assert_eq!(delta.no, Direction::None);
    }

    #[test]
    fn test_default_delta_is_cleared() {
        assert!(PriceDelta::default().is_cleared());
    }
}
