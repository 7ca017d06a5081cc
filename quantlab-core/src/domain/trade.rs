//! Trade — one executed fill in the simulation's trade log.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::decision::Side;

/// A single executed order.
///
/// `cash_delta` is the signed change to cash: negative for buys
/// (cost plus commission), positive for sells (proceeds minus commission).
/// `realized_pnl` is set on sells only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub date: NaiveDate,
    pub side: Side,
    pub shares: u64,
    /// Execution price after slippage.
    pub price: f64,
    pub commission: f64,
    pub cash_delta: f64,
    pub realized_pnl: Option<f64>,
}

impl Trade {
    /// Gross notional at the execution price.
    pub fn notional(&self) -> f64 {
        self.shares as f64 * self.price
    }

    pub fn is_sell(&self) -> bool {
        self.side == Side::Sell
    }

    /// True for a sell that closed at a profit after commission.
    pub fn is_winner(&self) -> bool {
        self.realized_pnl.is_some_and(|p| p > 0.0)
    }
}
