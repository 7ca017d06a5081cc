//! Simple Moving Average (SMA) over the trailing window.

use crate::domain::PriceBar;

/// Mean close of the last `period` bars of `bars`.
///
/// Returns `None` when `period` is zero or fewer than `period` bars exist.
pub fn sma(bars: &[PriceBar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period {
        return None;
    }
    let window = &bars[bars.len() - period..];
    let sum: f64 = window.iter().map(|b| b.close).sum();
    Some(sum / period as f64)
}
