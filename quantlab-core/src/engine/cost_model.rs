//! Cost model — slippage and commission calculation.
//!
//! Slippage is directional: buyers pay more, sellers receive less.
//! Commission is a rate on order value with a per-trade floor.

use serde::{Deserialize, Serialize};

use crate::domain::Side;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostModel {
    /// Fractional slippage applied to the close, e.g. 0.001 = 10 bps.
    pub slippage_rate: f64,
    /// Fraction of order value charged as commission.
    pub commission_rate: f64,
    /// Minimum commission per executed trade.
    pub min_commission: f64,
}

impl CostModel {
    pub fn new(slippage_rate: f64, commission_rate: f64, min_commission: f64) -> Self {
        Self {
            slippage_rate,
            commission_rate,
            min_commission,
        }
    }

    pub fn frictionless() -> Self {
        Self::default()
    }

    /// Close price adjusted for slippage against the trader.
    pub fn execution_price(&self, close: f64, side: Side) -> f64 {
        match side {
            Side::Buy => close * (1.0 + self.slippage_rate),
            Side::Sell => close * (1.0 - self.slippage_rate),
        }
    }

    /// `max(order_value * commission_rate, min_commission)`
    pub fn commission(&self, order_value: f64) -> f64 {
        (order_value * self.commission_rate).max(self.min_commission)
    }

    /// Largest share count whose cost plus commission fits in `cash` at
    /// `price`. Ignores sizing; callers cap it further.
    pub fn max_affordable_shares(&self, cash: f64, price: f64) -> u64 {
        if !(cash > 0.0 && price > 0.0) {
            return 0;
        }
        let by_rate = (cash / (price * (1.0 + self.commission_rate))).floor();
        let by_floor = ((cash - self.min_commission) / price).floor();
        let cap = by_rate.min(by_floor);
        if cap.is_finite() && cap >= 1.0 {
            cap as u64
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frictionless_returns_close() {
        let cost = CostModel::frictionless();
        assert_eq!(cost.execution_price(100.0, Side::Buy), 100.0);
        assert_eq!(cost.execution_price(100.0, Side::Sell), 100.0);
        assert_eq!(cost.commission(10_000.0), 0.0);
    }

    #[test]
    fn slippage_is_directional() {
        let cost = CostModel::new(0.001, 0.0, 0.0);
        assert!((cost.execution_price(100.0, Side::Buy) - 100.1).abs() < 1e-10);
        assert!((cost.execution_price(100.0, Side::Sell) - 99.9).abs() < 1e-10);
    }

    #[test]
    fn commission_respects_minimum() {
        let cost = CostModel::new(0.0, 0.001, 5.0);
        assert!((cost.commission(1_000.0) - 5.0).abs() < 1e-12);
        assert!((cost.commission(100_000.0) - 100.0).abs() < 1e-12);
    }

    #[test]
    fn affordable_shares_include_commission() {
        let cost = CostModel::new(0.0, 0.01, 0.0);
        // 1000 / (100 * 1.01) = 9.9 -> 9
        assert_eq!(cost.max_affordable_shares(1_000.0, 100.0), 9);
    }

    #[test]
    fn affordable_shares_include_min_commission() {
        let cost = CostModel::new(0.0, 0.0, 50.0);
        // (1000 - 50) / 100 = 9.5 -> 9
        assert_eq!(cost.max_affordable_shares(1_000.0, 100.0), 9);
        assert_eq!(cost.max_affordable_shares(120.0, 100.0), 0);
    }
}
