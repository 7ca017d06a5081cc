//! QuantLab Core — domain types, data sources, signals and the portfolio simulator.
//!
//! This crate contains the single-run simulation machinery:
//! - Domain types (bars, validated series, decisions, trades, positions)
//! - The `PriceDataSource` contract plus memory, CSV, caching and synthetic sources
//! - Trailing indicators and built-in strategies
//! - Signal evaluation with look-ahead prevented by history truncation
//! - The long-only portfolio state machine and its bar loop

pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod signals;

pub use data::{DataError, PriceDataSource};
pub use domain::{Decision, EquityPoint, PortfolioState, Position, PriceBar, PriceSeries, Side, Trade};
pub use engine::{run_simulation, CostModel, Diagnostics, SimulationOutput, SimulationParams};
pub use signals::{FnStrategy, SignalSource, Strategy};
