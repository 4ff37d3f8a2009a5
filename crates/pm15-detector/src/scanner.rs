//! Per-tick price-sum scanner.
//!
//! Trade rule: with quote (yes, no) and sum = yes + no, a trade triggers
//! iff sum < threshold (strict). Profit is `(trade_size / sum) * (1 - sum)`.

use crate::config::ScannerConfig;
use crate::opportunity::{profit_for, ArbOpportunity};
use crate::quote::{LiveQuotes, QuoteStrategy, RandomSource, SimulatedSpread, StdRandom};
use chrono::Utc;
use pm15_core::Market;
use tracing::debug;

/// Characters of the question kept in a scanning log line.
const SCAN_QUESTION_CHARS: usize = 30;

/// Result of evaluating one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Opportunity(ArbOpportunity),
    NoEdge {
        sum: f64,
        /// Occasional "still scanning" line for the session log.
        log_line: Option<String>,
    },
}

impl ScanOutcome {
    pub fn is_opportunity(&self) -> bool {
        matches!(self, Self::Opportunity(_))
    }
}

/// Arbitrage scanner.
pub struct ArbScanner {
    config: ScannerConfig,
    quotes: Box<dyn QuoteStrategy>,
    dice: Box<dyn RandomSource>,
}

impl ArbScanner {
    /// Create a scanner with explicit quote and log-sampling sources.
    pub fn new(
        config: ScannerConfig,
        quotes: Box<dyn QuoteStrategy>,
        dice: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            config,
            quotes,
            dice,
        }
    }

    /// Create a scanner from configuration using entropy-seeded randomness.
    ///
    /// Simulation is wired in only when `simulation.enabled` is set.
    pub fn from_config(config: ScannerConfig) -> Self {
        let quotes: Box<dyn QuoteStrategy> = if config.simulation.enabled {
            Box::new(SimulatedSpread::new(
                config.simulation.clone(),
                Box::new(StdRandom::from_entropy()),
            ))
        } else {
            Box::new(LiveQuotes)
        };
        Self::new(config, quotes, Box::new(StdRandom::from_entropy()))
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Evaluate the selected market once.
    pub fn evaluate(&mut self, market: &Market) -> ScanOutcome {
        let quote = self.quotes.quote(market);
        let sum = quote.sum();

        // Non-positive sums carry no meaningful edge and would divide by zero.
        if sum > 0.0 && sum < self.config.threshold {
            let profit = profit_for(self.config.trade_size, sum);
            debug!(
                market_id = %market.id,
                yes = quote.yes,
                no = quote.no,
                sum,
                profit,
                "Arbitrage opportunity"
            );
            return ScanOutcome::Opportunity(ArbOpportunity {
                market_id: market.id.clone(),
                question: market.question.clone(),
                quote,
                sum,
                profit,
                detected_at: Utc::now(),
            });
        }

        let log_line = (self.dice.next_f64() < self.config.scan_log_probability).then(|| {
            format!(
                "Scanning: {}... (Sum: {:.2})",
                market.short_question(SCAN_QUESTION_CHARS),
                sum
            )
        });

        ScanOutcome::NoEdge { sum, log_line }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::SequenceRandom;

    fn market(yes: f64, no: f64) -> Market {
        Market {
            id: "m1".to_string(),
            question: "Bitcoin Up or Down - October 9, 10:00AM-10:15AM ET".to_string(),
            yes_price: yes,
            no_price: no,
            closed: false,
            parent_slug: "btc-updown-15m-1".to_string(),
            end_time: None,
        }
    }

    fn live_scanner(log_sample: f64) -> ArbScanner {
        let config = ScannerConfig::default();
        ArbScanner::new(
            config,
            Box::new(LiveQuotes),
            Box::new(SequenceRandom::constant(log_sample)),
        )
    }

    #[test]
    fn test_opportunity_below_threshold() {
        let mut scanner = live_scanner(0.9);
        match scanner.evaluate(&market(0.45, 0.50)) {
            ScanOutcome::Opportunity(opp) => {
                assert!((opp.sum - 0.95).abs() < 1e-12);
                assert!((opp.profit - 5.263_157_894_736_842).abs() < 1e-9);
                assert_eq!(opp.market_id, "m1");
            }
            other => panic!("expected opportunity, got {other:?}"),
        }
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut scanner = live_scanner(0.9);
        let outcome = scanner.evaluate(&market(0.495, 0.495));
        assert_eq!(
            outcome,
            ScanOutcome::NoEdge {
                sum: 0.99,
                log_line: None
            }
        );
    }

    #[test]
    fn test_scanning_log_line() {
        let mut scanner = live_scanner(0.05);
        match scanner.evaluate(&market(0.52, 0.50)) {
            ScanOutcome::NoEdge { log_line, .. } => {
                assert_eq!(
                    log_line.as_deref(),
                    Some("Scanning: Bitcoin Up or Down - October 9... (Sum: 1.02)")
                );
            }
            other => panic!("expected no edge, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_sum_is_not_a_trade() {
        let mut scanner = live_scanner(0.9);
        assert!(!scanner.evaluate(&market(0.0, 0.0)).is_opportunity());
    }

    #[test]
    fn test_simulated_spread_trades() {
        let config = ScannerConfig::default();
        let quotes = SimulatedSpread::new(
            config.simulation.clone(),
            Box::new(SequenceRandom::new([0.0, 0.0])),
        );
        let mut scanner = ArbScanner::new(
            config,
            Box::new(quotes),
            Box::new(SequenceRandom::constant(0.9)),
        );

        // gap = 0.02, both prices 0.48, sum 0.96
        match scanner.evaluate(&market(0.55, 0.55)) {
            ScanOutcome::Opportunity(opp) => {
                assert_eq!(opp.quote.yes, 0.48);
                assert!((opp.sum - 0.96).abs() < 1e-12);
            }
            other => panic!("expected opportunity, got {other:?}"),
        }
    }
}
