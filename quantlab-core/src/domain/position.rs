//! Position — long-only share holding with weighted-average cost.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub shares: u64,
    pub avg_cost: f64,
}

impl Position {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn is_flat(&self) -> bool {
        self.shares == 0
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.shares as f64 * (price - self.avg_cost)
    }

    /// Add shares bought at `price`, re-averaging the cost basis.
    pub fn add(&mut self, shares: u64, price: f64) {
        if shares == 0 {
            return;
        }
        let held = self.shares as f64;
        let added = shares as f64;
        self.avg_cost = (held * self.avg_cost + added * price) / (held + added);
        self.shares += shares;
    }

    /// Close the whole position, returning the shares and cost basis it held.
    pub fn close(&mut self) -> (u64, f64) {
        let closed = (self.shares, self.avg_cost);
        *self = Self::flat();
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_reaverages_cost() {
        let mut pos = Position::flat();
        pos.add(10, 100.0);
        pos.add(30, 120.0);
        assert_eq!(pos.shares, 40);
        assert!((pos.avg_cost - 115.0).abs() < 1e-12);
    }

    #[test]
    fn close_resets_to_flat() {
        let mut pos = Position::flat();
        pos.add(5, 50.0);
        let (shares, cost) = pos.close();
        assert_eq!(shares, 5);
        assert_eq!(cost, 50.0);
        assert!(pos.is_flat());
        assert_eq!(pos.avg_cost, 0.0);
    }

    #[test]
    fn unrealized_pnl_uses_avg_cost() {
        let pos = Position {
            shares: 10,
            avg_cost: 100.0,
        };
        assert!((pos.unrealized_pnl(105.0) - 50.0).abs() < 1e-12);
        assert!((pos.market_value(105.0) - 1050.0).abs() < 1e-12);
    }
}
