//! PriceBar — the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Daily OHLCV bar for a single ticker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Why a single bar failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("non-finite price on {date}")]
    NonFinite { date: NaiveDate },

    #[error("non-positive price on {date}")]
    NonPositive { date: NaiveDate },

    #[error("OHLC out of order on {date}: low={low}, open={open}, close={close}, high={high}")]
    OhlcOrder {
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },

    #[error("negative volume on {date}: {volume}")]
    NegativeVolume { date: NaiveDate, volume: f64 },
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Check the OHLCV invariants: finite positive prices,
    /// `low <= {open, close} <= high`, and `volume >= 0`.
    pub fn validate(&self) -> Result<(), BarError> {
        let date = self.date;
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) || !self.volume.is_finite() {
            return Err(BarError::NonFinite { date });
        }
        if prices.iter().any(|&p| p <= 0.0) {
            return Err(BarError::NonPositive { date });
        }
        let ordered = self.low <= self.open
            && self.low <= self.close
            && self.open <= self.high
            && self.close <= self.high;
        if !ordered {
            return Err(BarError::OhlcOrder {
                date,
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
            });
        }
        if self.volume < 0.0 {
            return Err(BarError::NegativeVolume {
                date,
                volume: self.volume,
            });
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
