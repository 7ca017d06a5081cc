//! Relative Strength Index (RSI) with simple-average gains and losses.
//!
//! Uses the mean of the last `period` close-to-close gains and losses.
//! A window with no losses reads 100; a window with no movement reads 50.

use crate::domain::PriceBar;

pub fn rsi(bars: &[PriceBar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() <= period {
        return None;
    }
    let window = &bars[bars.len() - period - 1..];
    let (mut gain, mut loss) = (0.0, 0.0);
    for pair in window.windows(2) {
        let delta = pair[1].close - pair[0].close;
        if delta > 0.0 {
            gain += delta;
        } else {
            loss -= delta;
        }
    }
    let avg_gain = gain / period as f64;
    let avg_loss = loss / period as f64;

    if avg_loss == 0.0 {
        return Some(if avg_gain == 0.0 { 50.0 } else { 100.0 });
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}
