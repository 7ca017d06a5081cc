//! Trailing indicators over a bar history.
//!
//! Every function reads only the slice it is given and reports the value at
//! its last bar, so a strategy handed a truncated history cannot see ahead.

pub mod roc;
pub mod rsi;
pub mod sma;

pub use roc::rate_of_change;
pub use rsi::rsi;
pub use sma::sma;

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0 floored above
/// zero, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::PriceBar> {
    use crate::domain::PriceBar;
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let high = open.max(close) + 1.0;
            let low = (open.min(close) - 1.0).max(0.01);
            PriceBar::new(
                base_date + chrono::Duration::days(i as i64),
                open,
                high,
                low,
                close,
                1000.0,
            )
        })
        .collect()
}
