//! Run diagnostics: everything the engine skipped, defaulted or recovered
//! from, so nothing is lost silently.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::Decision;

/// A strategy failure on one date, recovered as HOLD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyIncident {
    pub date: NaiveDate,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Position sizing rounded down to zero shares.
    ZeroShares,
    /// Cash cannot cover one share plus commission.
    InsufficientCash { required: f64, available: f64 },
    /// SELL with nothing held.
    NoPosition,
}

/// A BUY or SELL that produced no trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedOrder {
    pub date: NaiveDate,
    pub decision: Decision,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub strategy_failures: Vec<StrategyIncident>,
    pub skipped_orders: Vec<SkippedOrder>,
    /// Precomputed signal dates with no matching bar.
    pub unaligned_signal_dates: Vec<NaiveDate>,
    /// Bars with no precomputed signal, treated as HOLD.
    pub defaulted_holds: usize,
    /// Free-form notes: coverage gaps, unavailable benchmark, capped commissions.
    pub warnings: Vec<String>,
}

impl Diagnostics {
    pub fn record_strategy_failure(&mut self, date: NaiveDate, message: impl Into<String>) {
        self.strategy_failures.push(StrategyIncident {
            date,
            message: message.into(),
        });
    }

    pub fn record_skip(&mut self, date: NaiveDate, decision: Decision, reason: SkipReason) {
        self.skipped_orders.push(SkippedOrder {
            date,
            decision,
            reason,
        });
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// True when the run needed no recovery of any kind.
    pub fn is_clean(&self) -> bool {
        self.strategy_failures.is_empty()
            && self.skipped_orders.is_empty()
            && self.unaligned_signal_dates.is_empty()
            && self.defaulted_holds == 0
            && self.warnings.is_empty()
    }
}
