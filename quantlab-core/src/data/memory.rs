//! In-memory data source over preloaded series.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::provider::{DataError, PriceDataSource};
use crate::domain::PriceSeries;

/// Serves range slices of series registered up front.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    series: HashMap<String, PriceSeries>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a series under its own ticker, replacing any previous one.
    pub fn insert(&mut self, series: PriceSeries) {
        self.series.insert(series.ticker().to_string(), series);
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.insert(series);
        self
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }
}

impl PriceDataSource for InMemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn load_price_series(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        let series = self
            .series
            .get(ticker)
            .ok_or_else(|| DataError::unavailable(ticker, "ticker not loaded"))?;
        let sliced = series.slice_range(start, end);
        if sliced.is_empty() {
            return Err(DataError::unavailable(
                ticker,
                format!("no bars between {start} and {end}"),
            ));
        }
        Ok(sliced)
    }
}
