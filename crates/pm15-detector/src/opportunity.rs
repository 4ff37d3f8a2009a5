//! Detected arbitrage opportunity.

use chrono::{DateTime, Utc};
use pm15_core::{truncate_chars, Quote};
use serde::{Deserialize, Serialize};

/// Characters of the question kept in a trade log line.
const TRADE_QUESTION_CHARS: usize = 25;

/// Synthetic profit of buying both sides for `trade_size` at `sum`.
///
/// `trade_size / sum` shares of each outcome pay out 1 each at
/// resolution, so the margin per share is `1 - sum`.
pub fn profit_for(trade_size: f64, sum: f64) -> f64 {
    (trade_size / sum) * (1.0 - sum)
}

/// A price-sum opportunity found on one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbOpportunity {
    pub market_id: String,
    pub question: String,
    pub quote: Quote,
    pub sum: f64,
    pub profit: f64,
    pub detected_at: DateTime<Utc>,
}

impl ArbOpportunity {
    /// Multi-line session log message.
    pub fn log_message(&self) -> String {
        format!(
            "ARB FOUND! {}...\n   Yes: {:.2} | No: {:.2} | Sum: {:.2}\n   +${:.2} Profit",
            truncate_chars(&self.question, TRADE_QUESTION_CHARS),
            self.quote.yes,
            self.quote.no,
            self.sum,
            self.profit
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profit_formula() {
        let profit = profit_for(100.0, 0.95);
        assert!((profit - 5.263_157_894_736_842).abs() < 1e-12);
    }

    #[test]
    fn test_log_message_format() {
        let opportunity = ArbOpportunity {
            market_id: "m1".to_string(),
            question: "Bitcoin Up or Down - October 9, 10:00AM-10:15AM ET".to_string(),
            quote: Quote::new(0.45, 0.50),
            sum: 0.95,
            profit: profit_for(100.0, 0.95),
            detected_at: Utc::now(),
        };

        assert_eq!(
            opportunity.log_message(),
            "ARB FOUND! Bitcoin Up or Down - Octo...\n   Yes: 0.45 | No: 0.50 | Sum: 0.95\n   +$5.26 Profit"
        );
    }
}
