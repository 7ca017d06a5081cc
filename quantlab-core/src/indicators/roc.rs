//! Rate of Change (ROC) as a fraction.
//!
//! ROC = close[t] / close[t - period] - 1, where t is the last bar.

use crate::domain::PriceBar;

pub fn rate_of_change(bars: &[PriceBar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() <= period {
        return None;
    }
    let last = bars[bars.len() - 1].close;
    let prev = bars[bars.len() - 1 - period].close;
    Some(last / prev - 1.0)
}
