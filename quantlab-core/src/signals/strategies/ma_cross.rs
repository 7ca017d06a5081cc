//! Moving Average Crossover
//!
//! Classic trend-following signal:
//! - BUY when the short SMA crosses above the long SMA
//! - SELL when the short SMA crosses below the long SMA
//! - HOLD otherwise, including warmup

use anyhow::ensure;
use chrono::NaiveDate;

use crate::domain::{Decision, PriceBar};
use crate::indicators::sma;
use crate::signals::Strategy;

#[derive(Debug, Clone)]
pub struct MaCrossover {
    short: usize,
    long: usize,
    name: String,
}

impl MaCrossover {
    pub fn new(short: usize, long: usize) -> anyhow::Result<Self> {
        ensure!(short > 0, "short period must be > 0");
        ensure!(long > short, "long period ({long}) must exceed short period ({short})");
        Ok(Self {
            short,
            long,
            name: format!("ma_crossover_{short}_{long}"),
        })
    }

    pub fn short(&self) -> usize {
        self.short
    }

    pub fn long(&self) -> usize {
        self.long
    }
}

impl Strategy for MaCrossover {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&self, history: &[PriceBar], _date: NaiveDate) -> anyhow::Result<Decision> {
        // Need one extra bar for the previous crossover state.
        if history.len() < self.long + 1 {
            return Ok(Decision::Hold);
        }
        let prev = &history[..history.len() - 1];
        let values = (
            sma(history, self.short),
            sma(history, self.long),
            sma(prev, self.short),
            sma(prev, self.long),
        );
        let (Some(short_now), Some(long_now), Some(short_prev), Some(long_prev)) = values else {
            return Ok(Decision::Hold);
        };

        Ok(if short_prev <= long_prev && short_now > long_now {
            Decision::Buy
        } else if short_prev >= long_prev && short_now < long_now {
            Decision::Sell
        } else {
            Decision::Hold
        })
    }
}
