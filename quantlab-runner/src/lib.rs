//! QuantLab Runner — backtest orchestration, grid search, performance metrics.
//!
//! This crate builds on `quantlab-core` to provide:
//! - Validated, TOML-loadable backtest configuration
//! - `BacktestEngine`: single runs and isolated multi-ticker batches
//! - Exhaustive parameter grid search with deterministic tie-breaking
//! - Performance metrics and benchmark-relative statistics

pub mod config;
pub mod fitness;
pub mod metrics;
pub mod runner;
pub mod sweep;

pub use config::{BacktestConfig, ConfigError, ConfigIssue};
pub use fitness::Objective;
pub use metrics::{BenchmarkComparison, DrawdownInfo, PerformanceMetrics};
pub use runner::{BacktestEngine, BacktestResult, BatchOutcome, RunError, SCHEMA_VERSION};
pub use sweep::{
    EntryStatus, GridEntry, MaCrossoverTemplate, OptimizationResult, ParamGrid, ParamSet,
    ParamValue, StrategyTemplate,
};
