//! PriceSeries — an immutable, validated sequence of daily bars for one ticker.
//!
//! Construction is the only validation point: once a `PriceSeries` exists,
//! every bar satisfies the OHLCV invariants and dates are strictly increasing.
//! Bars live behind an `Arc<[PriceBar]>`, so cloning a series is cheap and
//! every clone observes the same snapshot.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bar::{BarError, PriceBar};

/// Errors raised while building a series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("{ticker}: invalid bar at index {index}: {source}")]
    InvalidBar {
        ticker: String,
        index: usize,
        #[source]
        source: BarError,
    },

    #[error("{ticker}: dates not strictly increasing at index {index} ({previous} then {date})")]
    DatesNotIncreasing {
        ticker: String,
        index: usize,
        previous: NaiveDate,
        date: NaiveDate,
    },
}

/// Aggregation period for [`PriceSeries::resample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    Weekly,
    Monthly,
}

#[derive(Debug, Clone)]
pub struct PriceSeries {
    ticker: String,
    bars: Arc<[PriceBar]>,
}

impl PriceSeries {
    /// Validate and wrap a list of bars. Bars must already be sorted.
    pub fn new(ticker: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, SeriesError> {
        let ticker = ticker.into();
        for (index, bar) in bars.iter().enumerate() {
            bar.validate().map_err(|source| SeriesError::InvalidBar {
                ticker: ticker.clone(),
                index,
                source,
            })?;
            if index > 0 {
                let previous = bars[index - 1].date;
                if bar.date <= previous {
                    return Err(SeriesError::DatesNotIncreasing {
                        ticker,
                        index,
                        previous,
                        date: bar.date,
                    });
                }
            }
        }
        Ok(Self {
            ticker,
            bars: bars.into(),
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.bars.iter().map(|b| b.date)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Close-to-close simple returns; one shorter than the series.
    pub fn daily_returns(&self) -> Vec<f64> {
        self.bars
            .windows(2)
            .map(|w| w[1].close / w[0].close - 1.0)
            .collect()
    }

    /// Bars up to and including `index`. This is the only view a strategy
    /// receives for the decision at `index`.
    pub fn history(&self, index: usize) -> &[PriceBar] {
        let end = (index + 1).min(self.bars.len());
        &self.bars[..end]
    }

    /// Position of `date` in the series, if present.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.bars.binary_search_by_key(&date, |b| b.date).ok()
    }

    /// Sub-series with `start <= date <= end`.
    pub fn slice_range(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        let lo = self.bars.partition_point(|b| b.date < start);
        let hi = self.bars.partition_point(|b| b.date <= end);
        let bars: Vec<PriceBar> = if lo < hi {
            self.bars[lo..hi].to_vec()
        } else {
            Vec::new()
        };
        PriceSeries {
            ticker: self.ticker.clone(),
            bars: bars.into(),
        }
    }

    /// Aggregate daily bars into weekly or monthly bars.
    ///
    /// Each period takes the first open, highest high, lowest low, last close
    /// and summed volume, and is dated by its last trading day.
    pub fn resample(&self, frequency: Frequency) -> PriceSeries {
        let period_key = |date: NaiveDate| -> (i32, u32) {
            match frequency {
                Frequency::Weekly => {
                    let week = date.iso_week();
                    (week.year(), week.week())
                }
                Frequency::Monthly => (date.year(), date.month()),
            }
        };

        let mut out: Vec<PriceBar> = Vec::new();
        let mut current_key: Option<(i32, u32)> = None;
        for bar in self.bars.iter() {
            let key = period_key(bar.date);
            match out.last_mut() {
                Some(agg) if current_key == Some(key) => {
                    agg.high = agg.high.max(bar.high);
                    agg.low = agg.low.min(bar.low);
                    agg.close = bar.close;
                    agg.volume += bar.volume;
                    agg.date = bar.date;
                }
                _ => {
                    out.push(*bar);
                    current_key = Some(key);
                }
            }
        }

        PriceSeries {
            ticker: self.ticker.clone(),
            bars: out.into(),
        }
    }

    /// Deterministic BLAKE3 hash over the ticker and every OHLCV value.
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.ticker.as_bytes());
        for bar in self.bars.iter() {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: NaiveDate, close: f64) -> PriceBar {
        PriceBar::new(date, close, close + 1.0, close - 1.0, close, 1_000.0)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn sample_series() -> PriceSeries {
        let bars = (1..=10).map(|d| bar(day(d), 100.0 + d as f64)).collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    #[test]
    fn rejects_unsorted_dates() {
        let bars = vec![bar(day(2), 100.0), bar(day(1), 101.0)];
        let err = PriceSeries::new("TEST", bars).unwrap_err();
        assert!(matches!(err, SeriesError::DatesNotIncreasing { index: 1, .. }));
    }

    #[test]
    fn rejects_duplicate_dates() {
        let bars = vec![bar(day(2), 100.0), bar(day(2), 101.0)];
        assert!(PriceSeries::new("TEST", bars).is_err());
    }

    #[test]
    fn rejects_invalid_bar_with_index() {
        let mut bad = bar(day(3), 100.0);
        bad.high = 50.0;
        let bars = vec![bar(day(1), 100.0), bar(day(2), 100.0), bad];
        let err = PriceSeries::new("TEST", bars).unwrap_err();
        assert!(matches!(err, SeriesError::InvalidBar { index: 2, .. }));
    }

    #[test]
    fn history_is_truncated_inclusive() {
        let series = sample_series();
        let h = series.history(3);
        assert_eq!(h.len(), 4);
        assert_eq!(h.last().unwrap().date, day(4));
    }

    #[test]
    fn history_past_end_is_clamped() {
        let series = sample_series();
        assert_eq!(series.history(100).len(), 10);
    }

    #[test]
    fn slice_range_inclusive_bounds() {
        let series = sample_series();
        let sliced = series.slice_range(day(3), day(6));
        assert_eq!(sliced.len(), 4);
        assert_eq!(sliced.first().unwrap().date, day(3));
        assert_eq!(sliced.last().unwrap().date, day(6));
    }

    #[test]
    fn slice_range_outside_is_empty() {
        let series = sample_series();
        let sliced = series.slice_range(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
        );
        assert!(sliced.is_empty());
    }

    #[test]
    fn daily_returns_length_and_values() {
        let series = sample_series();
        let r = series.daily_returns();
        assert_eq!(r.len(), 9);
        assert!((r[0] - (102.0 / 101.0 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn index_of_finds_dates() {
        let series = sample_series();
        assert_eq!(series.index_of(day(5)), Some(4));
        assert_eq!(series.index_of(day(20)), None);
    }

    #[test]
    fn resample_weekly_aggregates() {
        // 2024-01-01 is a Monday: days 1..=7 form one ISO week, 8..=10 the next.
        let series = sample_series();
        let weekly = series.resample(Frequency::Weekly);
        assert_eq!(weekly.len(), 2);
        let first = weekly.bars()[0];
        assert_eq!(first.date, day(7));
        assert_eq!(first.open, 101.0);
        assert_eq!(first.close, 107.0);
        assert_eq!(first.high, 108.0);
        assert_eq!(first.low, 100.0);
        assert_eq!(first.volume, 7_000.0);
    }

    #[test]
    fn resample_monthly_single_period() {
        let monthly = sample_series().resample(Frequency::Monthly);
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly.bars()[0].close, 110.0);
    }

    #[test]
    fn content_hash_is_stable_and_sensitive() {
        let a = sample_series();
        let b = sample_series();
        assert_eq!(a.content_hash(), b.content_hash());

        let mut bars = a.bars().to_vec();
        bars[4].close += 0.5;
        bars[4].high += 0.5;
        let c = PriceSeries::new("TEST", bars).unwrap();
        assert_ne!(a.content_hash(), c.content_hash());
    }
}
