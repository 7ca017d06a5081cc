//! Built-in strategies.

pub mod buy_and_hold;
pub mod ma_cross;
pub mod momentum;
pub mod rsi_reversion;

pub use buy_and_hold::BuyAndHold;
pub use ma_cross::MaCrossover;
pub use momentum::Momentum;
pub use rsi_reversion::RsiReversion;
