//! Deterministic synthetic price series.
//!
//! A bounded random walk seeded from the ticker name, so the same ticker and
//! seed always produce the same bars. Weekends are skipped.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, PriceDataSource};
use crate::domain::{PriceBar, PriceSeries};

/// Generate weekday bars from `start` to `end` inclusive.
pub fn random_walk(
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
    seed: u64,
) -> Result<PriceSeries, DataError> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(ticker.as_bytes());
    hasher.update(&seed.to_le_bytes());
    let mut rng = StdRng::from_seed(*hasher.finalize().as_bytes());

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;
    while current <= end {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000.0..5_000_000.0_f64).floor();

        bars.push(PriceBar::new(current, open, high, low, close, volume));
        price = close;
        current += Duration::days(1);
    }

    PriceSeries::new(ticker, bars).map_err(|e| DataError::Validation {
        ticker: ticker.to_string(),
        reason: e.to_string(),
    })
}

/// Source that synthesizes a random walk for any ticker it is asked for.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticSource {
    pub seed: u64,
}

impl SyntheticSource {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl PriceDataSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn load_price_series(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        let series = random_walk(ticker, start, end, self.seed)?;
        if series.is_empty() {
            return Err(DataError::unavailable(
                ticker,
                format!("no trading days between {start} and {end}"),
            ));
        }
        Ok(series)
    }
}
