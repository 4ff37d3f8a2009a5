//! Session ledger: balance, trade history and the rolling log.
//!
//! The log is a presentation artifact, most recent entry first, capped at
//! `capacity`. Each append is mirrored to tracing at debug level.

use chrono::{DateTime, Local};
use pm15_telemetry::Metrics;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tracing::debug;

/// One timestamped log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub at: DateTime<Local>,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.at.format("%H:%M:%S"), self.message)
    }
}

#[derive(Debug, Clone)]
pub struct SessionLedger {
    starting_balance: f64,
    balance: f64,
    trade_history: Vec<f64>,
    log: VecDeque<LogEntry>,
    capacity: usize,
}

impl SessionLedger {
    pub fn new(starting_balance: f64, capacity: usize) -> Self {
        Self {
            starting_balance,
            balance: starting_balance,
            trade_history: Vec::new(),
            log: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Prepend a log entry stamped with the current local time.
    pub fn append_log(&mut self, message: impl Into<String>) {
        self.append_log_at(message, Local::now());
    }

    /// Prepend a log entry with an explicit timestamp.
    pub fn append_log_at(&mut self, message: impl Into<String>, at: DateTime<Local>) {
        let message = message.into();
        debug!(target: "pm15::session_log", "{}", message);
        self.log.push_front(LogEntry { at, message });
        self.log.truncate(self.capacity);
    }

    /// Realize a simulated trade.
    ///
    /// Balance, history and log change together; no reader observes one
    /// without the others.
    pub fn record_trade(&mut self, profit: f64, message: impl Into<String>) {
        self.balance += profit;
        self.trade_history.push(profit);
        self.append_log(message);
        Metrics::trade(profit, self.balance);
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn starting_balance(&self) -> f64 {
        self.starting_balance
    }

    pub fn trade_history(&self) -> &[f64] {
        &self.trade_history
    }

    pub fn trade_count(&self) -> usize {
        self.trade_history.len()
    }

    pub fn last_profit(&self) -> Option<f64> {
        self.trade_history.last().copied()
    }

    pub fn total_profit(&self) -> f64 {
        self.trade_history.iter().sum()
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.log.iter()
    }

    /// Rendered log lines, most recent first.
    pub fn log_lines(&self) -> Vec<String> {
        self.log.iter().map(ToString::to_string).collect()
    }
}
