//! Rate-of-change momentum with a symmetric threshold.

use anyhow::ensure;
use chrono::NaiveDate;

use crate::domain::{Decision, PriceBar};
use crate::indicators::rate_of_change;
use crate::signals::Strategy;

/// BUY when the `lookback`-bar return exceeds `threshold`, SELL when it is
/// below `-threshold`, HOLD otherwise.
#[derive(Debug, Clone)]
pub struct Momentum {
    lookback: usize,
    threshold: f64,
    name: String,
}

impl Momentum {
    pub fn new(lookback: usize, threshold: f64) -> anyhow::Result<Self> {
        ensure!(lookback > 0, "lookback must be > 0");
        ensure!(
            threshold.is_finite() && threshold >= 0.0,
            "threshold must be a finite non-negative fraction, got {threshold}"
        );
        Ok(Self {
            lookback,
            threshold,
            name: format!("momentum_{lookback}_{threshold}"),
        })
    }
}

impl Default for Momentum {
    fn default() -> Self {
        Self {
            lookback: 20,
            threshold: 0.02,
            name: "momentum_20_0.02".to_string(),
        }
    }
}

impl Strategy for Momentum {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&self, history: &[PriceBar], _date: NaiveDate) -> anyhow::Result<Decision> {
        let Some(roc) = rate_of_change(history, self.lookback) else {
            return Ok(Decision::Hold);
        };
        Ok(if roc > self.threshold {
            Decision::Buy
        } else if roc < -self.threshold {
            Decision::Sell
        } else {
            Decision::Hold
        })
    }
}
