//! Buy on the first bar and hold for the rest of the run.

use chrono::NaiveDate;

use crate::domain::{Decision, PriceBar};
use crate::signals::Strategy;

#[derive(Debug, Clone, Copy, Default)]
pub struct BuyAndHold;

impl Strategy for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn decide(&self, history: &[PriceBar], _date: NaiveDate) -> anyhow::Result<Decision> {
        Ok(if history.len() == 1 {
            Decision::Buy
        } else {
            Decision::Hold
        })
    }
}
