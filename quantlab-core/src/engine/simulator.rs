//! PortfolioSimulator — long-only cash/position state machine.
//!
//! One transition per bar:
//! - BUY sizes a fraction of cash at the slipped close, pays commission, and
//!   re-averages cost when adding to an open position
//! - SELL liquidates the whole position, commission comes out of proceeds
//! - HOLD changes nothing
//!
//! Every bar ends with a mark-to-market equity point at that bar's close.
//! The final position is never auto-liquidated.

use serde::{Deserialize, Serialize};

use super::cost_model::CostModel;
use super::diagnostics::{Diagnostics, SkipReason};
use crate::domain::{Decision, EquityPoint, PortfolioState, PriceBar, Side, Trade};

/// What a completed simulation hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub final_state: PortfolioState,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
}

#[derive(Debug, Clone)]
pub struct PortfolioSimulator {
    position_size_fraction: f64,
    cost_model: CostModel,
    state: PortfolioState,
    equity_curve: Vec<EquityPoint>,
    trades: Vec<Trade>,
}

impl PortfolioSimulator {
    /// Caller is responsible for passing validated parameters:
    /// positive capital and a sizing fraction in (0, 1].
    pub fn new(initial_capital: f64, position_size_fraction: f64, cost_model: CostModel) -> Self {
        Self {
            position_size_fraction,
            cost_model,
            state: PortfolioState::new(initial_capital),
            equity_curve: Vec::new(),
            trades: Vec::new(),
        }
    }

    pub fn with_capacity(mut self, bars: usize) -> Self {
        self.equity_curve.reserve(bars);
        self
    }

    pub fn state(&self) -> &PortfolioState {
        &self.state
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    /// Apply one bar's decision and record the closing equity.
    pub fn step(&mut self, bar: &PriceBar, decision: Decision, diagnostics: &mut Diagnostics) {
        match decision {
            Decision::Buy => self.buy(bar, diagnostics),
            Decision::Sell => self.sell(bar, diagnostics),
            Decision::Hold => {}
        }
        self.state.mark(bar.close);
        self.equity_curve.push(EquityPoint {
            date: bar.date,
            value: self.state.total_value,
        });
    }

    pub fn finish(self) -> SimulationOutput {
        SimulationOutput {
            final_state: self.state,
            equity_curve: self.equity_curve,
            trades: self.trades,
        }
    }

    fn buy(&mut self, bar: &PriceBar, diagnostics: &mut Diagnostics) {
        let cash = self.state.cash;
        let price = self.cost_model.execution_price(bar.close, Side::Buy);

        let sized = (cash * self.position_size_fraction / price).floor();
        let sized = if sized.is_finite() && sized >= 1.0 {
            sized as u64
        } else {
            0
        };
        let affordable = self.cost_model.max_affordable_shares(cash, price);
        let mut shares = sized.min(affordable);

        // Guard against rounding at the affordability boundary.
        while shares > 0 && self.buy_cost(shares, price) > cash {
            shares -= 1;
        }

        if shares == 0 {
            let reason = if sized == 0 {
                SkipReason::ZeroShares
            } else {
                SkipReason::InsufficientCash {
                    required: self.buy_cost(1, price),
                    available: cash,
                }
            };
            tracing::warn!(date = %bar.date, price, cash, ?reason, "buy skipped");
            diagnostics.record_skip(bar.date, Decision::Buy, reason);
            return;
        }

        let value = shares as f64 * price;
        let commission = self.cost_model.commission(value);
        let cash_delta = -(value + commission);
        self.state.cash += cash_delta;
        self.state.position.add(shares, price);

        tracing::debug!(date = %bar.date, shares, price, commission, "buy filled");
        self.trades.push(Trade {
            date: bar.date,
            side: Side::Buy,
            shares,
            price,
            commission,
            cash_delta,
            realized_pnl: None,
        });
    }

    fn sell(&mut self, bar: &PriceBar, diagnostics: &mut Diagnostics) {
        if self.state.position.is_flat() {
            tracing::debug!(date = %bar.date, "sell with no position ignored");
            diagnostics.record_skip(bar.date, Decision::Sell, SkipReason::NoPosition);
            return;
        }

        let price = self.cost_model.execution_price(bar.close, Side::Sell);
        let (shares, avg_cost) = self.state.position.close();
        let proceeds = shares as f64 * price;
        let mut commission = self.cost_model.commission(proceeds);
        if commission > proceeds {
            diagnostics.warn(format!(
                "{}: commission {commission:.2} capped at sale proceeds {proceeds:.2}",
                bar.date
            ));
            commission = proceeds;
        }
        let cash_delta = proceeds - commission;
        self.state.cash += cash_delta;
        let realized = (price - avg_cost) * shares as f64 - commission;

        tracing::debug!(date = %bar.date, shares, price, commission, realized, "sell filled");
        self.trades.push(Trade {
            date: bar.date,
            side: Side::Sell,
            shares,
            price,
            commission,
            cash_delta,
            realized_pnl: Some(realized),
        });
    }

    fn buy_cost(&self, shares: u64, price: f64) -> f64 {
        let value = shares as f64 * price;
        value + self.cost_model.commission(value)
    }
}
