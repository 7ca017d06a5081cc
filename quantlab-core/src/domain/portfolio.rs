//! Portfolio state and equity curve points.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::position::Position;

/// Cash plus the single-ticker position, valued at a bar close.
///
/// The accounting identity `total_value == cash + shares * close` holds
/// after every simulated bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    pub cash: f64,
    pub position: Position,
    pub total_value: f64,
}

impl PortfolioState {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            cash: initial_capital,
            position: Position::flat(),
            total_value: initial_capital,
        }
    }

    /// Re-value the portfolio at `price`.
    pub fn mark(&mut self, price: f64) {
        self.total_value = self.cash + self.position.market_value(price);
    }
}

/// One point of the equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_applies_identity() {
        let mut state = PortfolioState::new(1_000.0);
        state.cash = 500.0;
        state.position.add(5, 100.0);
        state.mark(110.0);
        assert!((state.total_value - 1_050.0).abs() < 1e-12);
    }
}
