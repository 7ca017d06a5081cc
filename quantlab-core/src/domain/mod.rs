//! Domain types: bars, series, decisions, trades, positions, portfolio state.

pub mod bar;
pub mod decision;
pub mod portfolio;
pub mod position;
pub mod series;
pub mod trade;

pub use bar::{BarError, PriceBar};
pub use decision::{Decision, Side};
pub use portfolio::{EquityPoint, PortfolioState};
pub use position::Position;
pub use series::{Frequency, PriceSeries, SeriesError};
pub use trade::Trade;
