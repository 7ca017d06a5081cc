//! PriceDataSource trait and structured error types.
//!
//! The trait abstracts over where bars come from (preloaded memory, CSV
//! files, a caching wrapper) so the engine can be driven by any of them and
//! tests can inject fixtures directly.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::PriceSeries;

/// Structured error types for data operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    /// The ticker or date range has no data.
    #[error("data unavailable for '{ticker}': {reason}")]
    Unavailable { ticker: String, reason: String },

    /// Bars were found but failed OHLCV or ordering validation.
    #[error("invalid data for '{ticker}': {reason}")]
    Validation { ticker: String, reason: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl DataError {
    pub fn unavailable(ticker: &str, reason: impl Into<String>) -> Self {
        DataError::Unavailable {
            ticker: ticker.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, DataError::Unavailable { .. })
    }
}

/// Source of validated daily price series.
///
/// Implementations return bars sorted ascending with `start <= date <= end`,
/// already validated through [`PriceSeries::new`]. A ticker or range with no
/// bars is reported as [`DataError::Unavailable`]. Any retry policy belongs
/// to the implementation; the engine never retries.
pub trait PriceDataSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    fn load_price_series(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError>;
}
