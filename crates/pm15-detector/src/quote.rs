//! Quote strategies and randomness sources.

use crate::config::SimulationConfig;
use pm15_core::{Market, Quote};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Source of uniform samples in [0, 1).
pub trait RandomSource: Send {
    fn next_f64(&mut self) -> f64;
}

/// `StdRng`-backed randomness.
pub struct StdRandom(StdRng);

impl StdRandom {
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for StdRandom {
    fn next_f64(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

/// Replays a fixed sequence of samples, cycling when exhausted.
///
/// An empty sequence always yields 0.0.
#[derive(Debug, Clone, Default)]
pub struct SequenceRandom {
    samples: VecDeque<f64>,
}

impl SequenceRandom {
    pub fn new(samples: impl IntoIterator<Item = f64>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
        }
    }

    /// Always returns `value`.
    pub fn constant(value: f64) -> Self {
        Self::new([value])
    }
}

impl RandomSource for SequenceRandom {
    fn next_f64(&mut self) -> f64 {
        match self.samples.pop_front() {
            Some(sample) => {
                self.samples.push_back(sample);
                sample
            }
            None => 0.0,
        }
    }
}

/// Produces the quote a scanner tick evaluates.
pub trait QuoteStrategy: Send {
    fn quote(&mut self, market: &Market) -> Quote;
}

/// Uses the market's live prices unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveQuotes;

impl QuoteStrategy for LiveQuotes {
    fn quote(&mut self, market: &Market) -> Quote {
        market.quote()
    }
}

/// Occasionally replaces the live quote with a synthetic tight spread.
pub struct SimulatedSpread {
    config: SimulationConfig,
    rng: Box<dyn RandomSource>,
}

impl SimulatedSpread {
    pub fn new(config: SimulationConfig, rng: Box<dyn RandomSource>) -> Self {
        Self { config, rng }
    }
}

impl QuoteStrategy for SimulatedSpread {
    fn quote(&mut self, market: &Market) -> Quote {
        if self.rng.next_f64() >= self.config.probability {
            return market.quote();
        }

        let span = self.config.max_gap - self.config.min_gap;
        let gap = self.config.min_gap + self.rng.next_f64() * span;
        let price = round_cents(0.50 - gap);
        Quote::new(price, price)
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market() -> Market {
        Market {
            id: "m1".to_string(),
            question: "Bitcoin Up or Down?".to_string(),
            yes_price: 0.51,
            no_price: 0.50,
            closed: false,
            parent_slug: "btc-updown-15m-1".to_string(),
            end_time: None,
        }
    }

    #[test]
    fn test_sequence_random_cycles() {
        let mut rng = SequenceRandom::new([0.1, 0.9]);
        assert_eq!(rng.next_f64(), 0.1);
        assert_eq!(rng.next_f64(), 0.9);
        assert_eq!(rng.next_f64(), 0.1);
        assert_eq!(SequenceRandom::default().next_f64(), 0.0);
    }

    #[test]
    fn test_seeded_random_in_range() {
        let mut rng = StdRandom::seeded(7);
        for _ in 0..100 {
            let sample = rng.next_f64();
            assert!((0.0..1.0).contains(&sample));
        }
    }

    #[test]
    fn test_simulated_spread_injects() {
        // First sample triggers, second picks gap = 0.02 + 0.9 * 0.03 = 0.047
        let mut strategy = SimulatedSpread::new(
            SimulationConfig::default(),
            Box::new(SequenceRandom::new([0.1, 0.9])),
        );
        let quote = strategy.quote(&market());
        assert_eq!(quote.yes, quote.no);
        assert_eq!(quote.yes, 0.45);
    }

    #[test]
    fn test_simulated_spread_passthrough() {
        let mut strategy = SimulatedSpread::new(
            SimulationConfig::default(),
            Box::new(SequenceRandom::constant(0.2)),
        );
        // Probability check is strict: 0.2 does not trigger at p = 0.2
        assert_eq!(strategy.quote(&market()), Quote::new(0.51, 0.50));
    }

    #[test]
    fn test_live_quotes() {
        assert_eq!(LiveQuotes.quote(&market()), Quote::new(0.51, 0.50));
    }
}
