//! RSI mean reversion: buy oversold, sell overbought.

use anyhow::ensure;
use chrono::NaiveDate;

use crate::domain::{Decision, PriceBar};
use crate::indicators::rsi;
use crate::signals::Strategy;

#[derive(Debug, Clone)]
pub struct RsiReversion {
    period: usize,
    oversold: f64,
    overbought: f64,
    name: String,
}

impl RsiReversion {
    pub fn new(period: usize, oversold: f64, overbought: f64) -> anyhow::Result<Self> {
        ensure!(period > 0, "period must be > 0");
        ensure!(
            (0.0..=100.0).contains(&oversold)
                && (0.0..=100.0).contains(&overbought)
                && oversold < overbought,
            "need 0 <= oversold ({oversold}) < overbought ({overbought}) <= 100"
        );
        Ok(Self {
            period,
            oversold,
            overbought,
            name: format!("rsi_{period}_{oversold}_{overbought}"),
        })
    }
}

impl Default for RsiReversion {
    fn default() -> Self {
        Self {
            period: 14,
            oversold: 30.0,
            overbought: 70.0,
            name: "rsi_14_30_70".to_string(),
        }
    }
}

impl Strategy for RsiReversion {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&self, history: &[PriceBar], _date: NaiveDate) -> anyhow::Result<Decision> {
        let Some(value) = rsi(history, self.period) else {
            return Ok(Decision::Hold);
        };
        Ok(if value < self.oversold {
            Decision::Buy
        } else if value > self.overbought {
            Decision::Sell
        } else {
            Decision::Hold
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn decide(s: &RsiReversion, closes: &[f64]) -> Decision {
        let bars = make_bars(closes);
        s.decide(&bars, bars[bars.len() - 1].date).unwrap()
    }

    #[test]
    fn steady_decline_is_oversold() {
        let s = RsiReversion::new(3, 30.0, 70.0).unwrap();
        assert_eq!(decide(&s, &[10.0, 9.0, 8.0, 7.0]), Decision::Buy);
    }

    #[test]
    fn steady_rise_is_overbought() {
        let s = RsiReversion::new(3, 30.0, 70.0).unwrap();
        assert_eq!(decide(&s, &[7.0, 8.0, 9.0, 10.0]), Decision::Sell);
    }

    #[test]
    fn name_carries_period_and_bands() {
        assert_eq!(RsiReversion::new(14, 25.0, 75.0).unwrap().name(), "rsi_14_25_75");
        assert_eq!(RsiReversion::new(7, 22.5, 80.0).unwrap().name(), "rsi_7_22.5_80");
        assert_eq!(
            RsiReversion::default().name(),
            RsiReversion::new(14, 30.0, 70.0).unwrap().name()
        );
    }

    #[test]
    fn rejects_inverted_bands() {
        assert!(RsiReversion::new(14, 70.0, 30.0).is_err());
    }
}
