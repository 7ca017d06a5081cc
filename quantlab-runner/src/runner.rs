//! Backtest runner — wires together data source, simulation loop, and metrics.
//!
//! Entry points on [`BacktestEngine`]:
//! - `run_backtest()`: loads the series from the injected source, then runs.
//! - `run_with_series()`: takes a pre-loaded series. Used by grid search so
//!   the data is fetched once per search, not once per combination.
//! - `run_multiple_backtests()`: one independent run per ticker, optionally
//!   in parallel. A failing ticker never aborts the batch.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use quantlab_core::data::{DataError, PriceDataSource};
use quantlab_core::domain::{EquityPoint, PortfolioState, PriceSeries, Trade};
use quantlab_core::engine::{run_simulation, Diagnostics, SimulationParams};
use quantlab_core::signals::SignalSource;

use crate::config::{BacktestConfig, ConfigError};
use crate::metrics::{BenchmarkComparison, PerformanceMetrics};

/// Errors from a single run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error(
        "{ticker}: insufficient data for {start}..{end}: {available} bars, need at least {required}"
    )]
    InsufficientData {
        ticker: String,
        start: NaiveDate,
        end: NaiveDate,
        required: usize,
        available: usize,
    },

    #[error("invalid date range: start {start} is not before end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("strategy error: {0}")]
    Strategy(String),
}

/// Current schema version for persisted results.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub ticker: String,
    pub strategy_name: String,
    /// Requested range; the series may cover less (see diagnostics).
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub bar_count: usize,
    pub metrics: PerformanceMetrics,
    pub benchmark: Option<BenchmarkComparison>,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
    pub final_state: PortfolioState,
    pub config: BacktestConfig,
    pub config_hash: String,
    pub dataset_hash: String,
    pub diagnostics: Diagnostics,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Outcome of a multi-ticker batch.
///
/// Every requested ticker lands in exactly one of the three collections.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub results: BTreeMap<String, BacktestResult>,
    pub failures: BTreeMap<String, RunError>,
    /// Tickers never started because cancellation was requested.
    pub cancelled: Vec<String>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.cancelled.is_empty()
    }
}

enum TickerOutcome {
    Done(Box<BacktestResult>),
    Failed(RunError),
    Cancelled,
}

/// Benchmark series prepared once per run or search.
pub(crate) enum BenchmarkData {
    Disabled,
    Loaded(PriceSeries),
    Failed(String),
}

/// Runs backtests against an injected price source.
///
/// The config is validated at construction and never changes afterwards.
pub struct BacktestEngine {
    config: BacktestConfig,
    config_hash: String,
    source: Arc<dyn PriceDataSource>,
    parallel: bool,
}

impl std::fmt::Debug for BacktestEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BacktestEngine")
            .field("config", &self.config)
            .field("source", &self.source.name())
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl BacktestEngine {
    pub fn new(
        config: BacktestConfig,
        source: Arc<dyn PriceDataSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let config_hash = config.fingerprint();
        Ok(Self {
            config,
            config_hash,
            source,
            parallel: true,
        })
    }

    /// Enables or disables parallel execution of batches and grids.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    pub(crate) fn source(&self) -> &dyn PriceDataSource {
        self.source.as_ref()
    }

    /// Load `ticker` over `[start, end]` and simulate `signals` on it.
    pub fn run_backtest(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        signals: &SignalSource,
    ) -> Result<BacktestResult, RunError> {
        check_range(start, end)?;
        let series = self.source.load_price_series(ticker, start, end)?;
        let benchmark = self.load_benchmark(start, end);
        self.execute(&series, start, end, signals, &benchmark)
    }

    /// Simulate `signals` on an already loaded series, restricted to `[start, end]`.
    pub fn run_with_series(
        &self,
        series: &PriceSeries,
        start: NaiveDate,
        end: NaiveDate,
        signals: &SignalSource,
    ) -> Result<BacktestResult, RunError> {
        check_range(start, end)?;
        let benchmark = self.load_benchmark(start, end);
        self.execute(series, start, end, signals, &benchmark)
    }

    /// One independent backtest per ticker.
    ///
    /// Failures are captured per ticker. If `cancel` is set, tickers not yet
    /// started are reported as cancelled; runs already in progress finish.
    pub fn run_multiple_backtests<T>(
        &self,
        tickers: &[T],
        start: NaiveDate,
        end: NaiveDate,
        signals: &SignalSource,
        cancel: Option<&AtomicBool>,
    ) -> BatchOutcome
    where
        T: AsRef<str> + Sync,
    {
        let mut unique: Vec<&str> = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            let ticker = ticker.as_ref();
            if !unique.contains(&ticker) {
                unique.push(ticker);
            }
        }

        let run_one = |ticker: &str| -> TickerOutcome {
            if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                return TickerOutcome::Cancelled;
            }
            match self.run_backtest(ticker, start, end, signals) {
                Ok(result) => TickerOutcome::Done(Box::new(result)),
                Err(err) => {
                    tracing::warn!(ticker = %ticker, error = %err, "backtest failed");
                    TickerOutcome::Failed(err)
                }
            }
        };

        let outcomes: Vec<TickerOutcome> = if self.parallel {
            unique.par_iter().map(|t| run_one(*t)).collect()
        } else {
            unique.iter().map(|t| run_one(*t)).collect()
        };

        let mut batch = BatchOutcome::default();
        for (ticker, outcome) in unique.into_iter().zip(outcomes) {
            match outcome {
                TickerOutcome::Done(result) => {
                    batch.results.insert(ticker.to_string(), *result);
                }
                TickerOutcome::Failed(err) => {
                    batch.failures.insert(ticker.to_string(), err);
                }
                TickerOutcome::Cancelled => batch.cancelled.push(ticker.to_string()),
            }
        }

        tracing::info!(
            succeeded = batch.results.len(),
            failed = batch.failures.len(),
            cancelled = batch.cancelled.len(),
            "batch complete"
        );
        batch
    }

    pub(crate) fn load_benchmark(&self, start: NaiveDate, end: NaiveDate) -> BenchmarkData {
        let Some(ticker) = self.config.benchmark.as_deref() else {
            return BenchmarkData::Disabled;
        };
        match self.source.load_price_series(ticker, start, end) {
            Ok(series) => BenchmarkData::Loaded(series),
            Err(err) => BenchmarkData::Failed(format!("benchmark {ticker} unavailable: {err}")),
        }
    }

    pub(crate) fn execute(
        &self,
        series: &PriceSeries,
        start: NaiveDate,
        end: NaiveDate,
        signals: &SignalSource,
        benchmark: &BenchmarkData,
    ) -> Result<BacktestResult, RunError> {
        let series = series.slice_range(start, end);
        let ticker = series.ticker().to_string();
        if series.len() < self.config.min_bars {
            return Err(RunError::InsufficientData {
                ticker,
                start,
                end,
                required: self.config.min_bars,
                available: series.len(),
            });
        }

        tracing::info!(
            ticker = %ticker,
            strategy = signals.name(),
            bars = series.len(),
            %start,
            %end,
            "backtest started"
        );

        let params = SimulationParams {
            initial_capital: self.config.initial_capital,
            position_size_fraction: self.config.position_size_fraction,
            cost_model: self.config.cost_model(),
        };
        let (output, mut diagnostics) = run_simulation(&series, signals, &params);
        record_coverage_gaps(&series, start, end, &mut diagnostics);

        let metrics = PerformanceMetrics::compute(
            &output.equity_curve,
            &output.trades,
            self.config.initial_capital,
            self.config.risk_free_rate,
        );

        let benchmark = match benchmark {
            BenchmarkData::Disabled => None,
            BenchmarkData::Loaded(bench) => {
                let comparison = BenchmarkComparison::compute(
                    &output.equity_curve,
                    bench,
                    self.config.risk_free_rate,
                );
                if comparison.is_none() {
                    let message = format!(
                        "benchmark {} shares fewer than two dates with {ticker}",
                        bench.ticker()
                    );
                    tracing::warn!(ticker = %ticker, "{message}");
                    diagnostics.warn(message);
                }
                comparison
            }
            BenchmarkData::Failed(reason) => {
                tracing::warn!(ticker = %ticker, "{reason}");
                diagnostics.warn(reason.clone());
                None
            }
        };

        tracing::info!(
            ticker = %ticker,
            trades = output.trades.len(),
            total_return = metrics.total_return,
            sharpe = metrics.sharpe,
            "backtest complete"
        );

        Ok(BacktestResult {
            schema_version: SCHEMA_VERSION,
            strategy_name: signals.name().to_string(),
            start_date: start,
            end_date: end,
            bar_count: series.len(),
            metrics,
            benchmark,
            equity_curve: output.equity_curve,
            trades: output.trades,
            final_state: output.final_state,
            config: self.config.clone(),
            config_hash: self.config_hash.clone(),
            dataset_hash: series.content_hash(),
            diagnostics,
            ticker,
        })
    }
}

pub(crate) fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), RunError> {
    if start >= end {
        return Err(RunError::InvalidDateRange { start, end });
    }
    Ok(())
}

fn record_coverage_gaps(
    series: &PriceSeries,
    start: NaiveDate,
    end: NaiveDate,
    diagnostics: &mut Diagnostics,
) {
    if let Some(first) = series.first() {
        if first.date > start {
            diagnostics.warn(format!(
                "{}: data starts {}, after requested start {start}",
                series.ticker(),
                first.date
            ));
        }
    }
    if let Some(last) = series.last() {
        if last.date < end {
            diagnostics.warn(format!(
                "{}: data ends {}, before requested end {end}",
                series.ticker(),
                last.date
            ));
        }
    }
}
