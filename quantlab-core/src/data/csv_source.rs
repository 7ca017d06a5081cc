//! CSV-backed data source: one `{TICKER}.csv` file per ticker.
//!
//! Expected header: `date,open,high,low,close,volume` with ISO dates.
//! Rows may appear in any order; they are sorted before validation.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use super::provider::{DataError, PriceDataSource};
use crate::domain::{PriceBar, PriceSeries};

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    dir: PathBuf,
}

impl CsvDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{ticker}.csv"))
    }

    /// Read every row of a ticker's file into a validated series.
    pub fn read_all(&self, ticker: &str) -> Result<PriceSeries, DataError> {
        let path = self.path_for(ticker);
        if !path.exists() {
            return Err(DataError::unavailable(
                ticker,
                format!("no file at {}", path.display()),
            ));
        }

        let mut reader = csv::Reader::from_path(&path)
            .map_err(|e| DataError::Io(format!("{}: {e}", path.display())))?;
        let mut bars = Vec::new();
        for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
            let row = row.map_err(|e| {
                DataError::Parse(format!("{} row {}: {e}", path.display(), line + 1))
            })?;
            bars.push(PriceBar::new(
                row.date, row.open, row.high, row.low, row.close, row.volume,
            ));
        }
        bars.sort_by_key(|b| b.date);

        PriceSeries::new(ticker, bars).map_err(|e| DataError::Validation {
            ticker: ticker.to_string(),
            reason: e.to_string(),
        })
    }
}

impl PriceDataSource for CsvDirectorySource {
    fn name(&self) -> &str {
        "csv"
    }

    fn load_price_series(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        let sliced = self.read_all(ticker)?.slice_range(start, end);
        if sliced.is_empty() {
            return Err(DataError::unavailable(
                ticker,
                format!("no bars between {start} and {end}"),
            ));
        }
        tracing::debug!(ticker, bars = sliced.len(), "loaded csv series");
        Ok(sliced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_csv(dir: &Path, ticker: &str, body: &str) {
        fs::write(dir.join(format!("{ticker}.csv")), body).unwrap();
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn loads_and_sorts_rows() {
        let tmp = tempfile::tempdir().unwrap();
        write_csv(
            tmp.path(),
            "AAA",
            "date,open,high,low,close,volume\n\
             2024-01-03,11,12,10,11.5,100\n\
             2024-01-02,10,11,9,10.5,100\n",
        );
        let source = CsvDirectorySource::new(tmp.path());
        let series = source
            .load_price_series("AAA", d("2024-01-01"), d("2024-01-31"))
            .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.first().unwrap().date, d("2024-01-02"));
    }

    #[test]
    fn missing_file_is_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let source = CsvDirectorySource::new(tmp.path());
        let err = source
            .load_price_series("NOPE", d("2024-01-01"), d("2024-01-31"))
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[test]
    fn invalid_bar_is_validation_error() {
        let tmp = tempfile::tempdir().unwrap();
        write_csv(
            tmp.path(),
            "BAD",
            "date,open,high,low,close,volume\n2024-01-02,10,9,8,10,100\n",
        );
        let source = CsvDirectorySource::new(tmp.path());
        let err = source.read_all("BAD").unwrap_err();
        assert!(matches!(err, DataError::Validation { .. }));
    }

    #[test]
    fn malformed_row_is_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        write_csv(
            tmp.path(),
            "MAL",
            "date,open,high,low,close,volume\nnot-a-date,10,11,9,10,100\n",
        );
        let source = CsvDirectorySource::new(tmp.path());
        assert!(matches!(source.read_all("MAL"), Err(DataError::Parse(_))));
    }
}
