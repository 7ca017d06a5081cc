//! Performance metrics — pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: equity curve and/or trade list in, scalar out.
//! Every function is total: on insufficient data it returns a defined sentinel
//! (0, `None`, or +∞ for a lossless profit factor) rather than failing, so a
//! single no-trade combination cannot abort a batch or grid search.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use quantlab_core::domain::{EquityPoint, PriceSeries, Trade};

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Calendar days per year used by CAGR.
pub const DAYS_PER_YEAR: f64 = 365.25;

const STD_EPSILON: f64 = 1e-15;

/// Deepest peak-to-trough decline and where it happened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownInfo {
    /// Positive fraction, e.g. 0.15 for a 15% decline.
    pub max_drawdown: f64,
    pub peak_date: Option<NaiveDate>,
    pub trough_date: Option<NaiveDate>,
}

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub cagr: f64,
    pub volatility: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub max_drawdown: f64,
    pub drawdown: DrawdownInfo,
    pub calmar: f64,
    /// `None` when no position was ever closed.
    pub win_rate: Option<f64>,
    /// Serialized as `"inf"` when there were wins and no losses.
    #[serde(with = "non_finite")]
    pub profit_factor: f64,
    pub num_wins: usize,
    pub num_losses: usize,
    pub closed_trades: usize,
    pub total_trades: usize,
    pub total_commission: f64,
    pub final_value: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics from an equity curve and trade ledger.
    ///
    /// Returns are measured against `initial_capital`, so commission paid on
    /// the first bar counts against the result.
    pub fn compute(
        equity_curve: &[EquityPoint],
        trades: &[Trade],
        initial_capital: f64,
        risk_free_rate: f64,
    ) -> Self {
        let values: Vec<f64> = equity_curve.iter().map(|p| p.value).collect();
        let returns = daily_returns(&values);
        let drawdown = drawdown_info(equity_curve);
        let cagr = cagr(equity_curve, initial_capital);
        let closed: Vec<f64> = trades.iter().filter_map(|t| t.realized_pnl).collect();

        Self {
            total_return: total_return(&values, initial_capital),
            cagr,
            volatility: volatility(&returns),
            sharpe: sharpe_ratio(&returns, risk_free_rate),
            sortino: sortino_ratio(&returns, risk_free_rate),
            max_drawdown: drawdown.max_drawdown,
            drawdown,
            calmar: calmar_ratio(cagr, drawdown.max_drawdown),
            win_rate: win_rate(&closed),
            profit_factor: profit_factor(&closed),
            num_wins: closed.iter().filter(|p| **p > 0.0).count(),
            num_losses: closed.iter().filter(|p| **p <= 0.0).count(),
            closed_trades: closed.len(),
            total_trades: trades.len(),
            total_commission: trades.iter().map(|t| t.commission).sum(),
            final_value: values.last().copied().unwrap_or(initial_capital),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: final / initial - 1.
///
/// Returns 0.0 for a curve with fewer than 2 points.
pub fn total_return(values: &[f64], initial_capital: f64) -> f64 {
    let Some(&final_value) = values.last() else {
        return 0.0;
    };
    if values.len() < 2 || initial_capital <= 0.0 {
        return 0.0;
    }
    final_value / initial_capital - 1.0
}

/// Compound annual growth rate over elapsed calendar days (365.25 per year).
///
/// Returns 0.0 if less than one day elapsed, either endpoint is non-positive,
/// or the annualized figure overflows (a large gain over a few days).
pub fn cagr(equity_curve: &[EquityPoint], initial_capital: f64) -> f64 {
    let (Some(first), Some(last)) = (equity_curve.first(), equity_curve.last()) else {
        return 0.0;
    };
    let days = (last.date - first.date).num_days();
    if days < 1 || initial_capital <= 0.0 || last.value <= 0.0 {
        return 0.0;
    }
    let years = days as f64 / DAYS_PER_YEAR;
    let rate = (last.value / initial_capital).powf(1.0 / years) - 1.0;
    if rate.is_finite() {
        rate
    } else {
        0.0
    }
}

/// Annualized standard deviation of daily returns.
pub fn volatility(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    std_dev(returns) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Annualized Sharpe ratio from daily returns.
///
/// Sharpe = mean(daily returns - rf/252) / std(daily returns) * sqrt(252).
/// Returns 0.0 if variance is zero or fewer than 2 returns.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
    let excess: Vec<f64> = returns.iter().map(|r| r - daily_rf).collect();
    let std = std_dev(&excess);
    if std < STD_EPSILON {
        return 0.0;
    }
    (mean_f64(&excess) / std) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Annualized Sortino ratio.
///
/// Sortino = mean(daily returns - rf/252) / downside_dev * sqrt(252), where
/// downside_dev = sqrt(sum of squared negative returns / n).
/// Returns 0.0 if there are no negative returns.
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let downside_sq: f64 = returns.iter().filter(|&&r| r < 0.0).map(|r| r * r).sum();
    if downside_sq == 0.0 {
        return 0.0;
    }
    let downside_dev = (downside_sq / returns.len() as f64).sqrt();
    if downside_dev < STD_EPSILON {
        return 0.0;
    }
    let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
    let mean_excess = mean_f64(returns) - daily_rf;
    (mean_excess / downside_dev) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Maximum drawdown as a positive fraction, with peak and trough dates.
///
/// Returns 0.0 (and no dates) if the curve never decreases.
pub fn drawdown_info(equity_curve: &[EquityPoint]) -> DrawdownInfo {
    let mut info = DrawdownInfo {
        max_drawdown: 0.0,
        peak_date: None,
        trough_date: None,
    };
    let Some(first) = equity_curve.first() else {
        return info;
    };

    let mut peak = *first;
    for point in equity_curve {
        if point.value > peak.value {
            peak = *point;
        }
        if peak.value > 0.0 {
            let dd = (peak.value - point.value) / peak.value;
            if dd > info.max_drawdown {
                info = DrawdownInfo {
                    max_drawdown: dd,
                    peak_date: Some(peak.date),
                    trough_date: Some(point.date),
                };
            }
        }
    }
    info
}

/// Maximum drawdown over raw values.
pub fn max_drawdown(values: &[f64]) -> f64 {
    drawdown_series(values).into_iter().fold(0.0, f64::max)
}

/// Per-point drawdown from the running peak, as positive fractions.
pub fn drawdown_series(values: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    values
        .iter()
        .map(|&v| {
            peak = peak.max(v);
            if peak > 0.0 {
                (peak - v) / peak
            } else {
                0.0
            }
        })
        .collect()
}

/// Calmar ratio: CAGR / max_drawdown. Returns 0.0 if max drawdown is zero
/// or the ratio is not finite.
pub fn calmar_ratio(cagr: f64, max_drawdown: f64) -> f64 {
    if max_drawdown.abs() < STD_EPSILON {
        return 0.0;
    }
    let ratio = cagr / max_drawdown.abs();
    if ratio.is_finite() {
        ratio
    } else {
        0.0
    }
}

/// Fraction of closed trades with positive realized P&L.
///
/// `None` (not 0) when nothing was closed.
pub fn win_rate(realized: &[f64]) -> Option<f64> {
    if realized.is_empty() {
        return None;
    }
    let winners = realized.iter().filter(|p| **p > 0.0).count();
    Some(winners as f64 / realized.len() as f64)
}

/// Gross profit / gross loss over closed trades.
///
/// +∞ when there is profit and no loss; 0.0 when there are no closed trades
/// or no profit.
pub fn profit_factor(realized: &[f64]) -> f64 {
    if realized.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = realized.iter().filter(|p| **p > 0.0).sum();
    let gross_loss: f64 = realized.iter().filter(|p| **p < 0.0).map(|p| p.abs()).sum();
    if gross_loss == 0.0 {
        return if gross_profit > 0.0 { f64::INFINITY } else { 0.0 };
    }
    gross_profit / gross_loss
}

// ─── Benchmark comparison ───────────────────────────────────────────

/// Strategy statistics relative to a buy-and-hold benchmark.
///
/// Both series are aligned on their common dates before any return is taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    pub benchmark: String,
    pub common_days: usize,
    pub strategy_return: f64,
    pub benchmark_return: f64,
    pub excess_return: f64,
    /// cov(strategy, benchmark) / var(benchmark); `None` if the benchmark is flat.
    pub beta: Option<f64>,
    /// strategy_return - beta * benchmark_return.
    pub alpha: Option<f64>,
    pub correlation: Option<f64>,
    /// Annualized standard deviation of active returns.
    pub tracking_error: f64,
    pub information_ratio: f64,
    pub strategy_sharpe: f64,
    pub benchmark_sharpe: f64,
    pub strategy_volatility: f64,
    pub benchmark_volatility: f64,
}

impl BenchmarkComparison {
    /// Compare a strategy curve against the benchmark's closes.
    ///
    /// Returns `None` when fewer than two dates are shared.
    pub fn compute(
        equity_curve: &[EquityPoint],
        benchmark: &PriceSeries,
        risk_free_rate: f64,
    ) -> Option<Self> {
        let mut strat_values = Vec::new();
        let mut bench_values = Vec::new();
        for point in equity_curve {
            if let Some(i) = benchmark.index_of(point.date) {
                strat_values.push(point.value);
                bench_values.push(benchmark.bars()[i].close);
            }
        }
        if strat_values.len() < 2 {
            return None;
        }

        let strat_returns = daily_returns(&strat_values);
        let bench_returns = daily_returns(&bench_values);
        let strategy_return = cumulative_return(&strat_returns);
        let benchmark_return = cumulative_return(&bench_returns);

        let bench_var = variance(&bench_returns);
        let beta = (bench_var > STD_EPSILON)
            .then(|| covariance(&strat_returns, &bench_returns) / bench_var);
        let alpha = beta.map(|b| strategy_return - b * benchmark_return);
        let correlation = correlation(&strat_returns, &bench_returns);

        let active: Vec<f64> = strat_returns
            .iter()
            .zip(&bench_returns)
            .map(|(s, b)| s - b)
            .collect();
        let active_std = std_dev(&active);
        let information_ratio = if active_std > STD_EPSILON {
            mean_f64(&active) / active_std * TRADING_DAYS_PER_YEAR.sqrt()
        } else {
            0.0
        };

        Some(Self {
            benchmark: benchmark.ticker().to_string(),
            common_days: strat_values.len(),
            strategy_return,
            benchmark_return,
            excess_return: strategy_return - benchmark_return,
            beta,
            alpha,
            correlation,
            tracking_error: active_std * TRADING_DAYS_PER_YEAR.sqrt(),
            information_ratio,
            strategy_sharpe: sharpe_ratio(&strat_returns, risk_free_rate),
            benchmark_sharpe: sharpe_ratio(&bench_returns, risk_free_rate),
            strategy_volatility: volatility(&strat_returns),
            benchmark_volatility: volatility(&bench_returns),
        })
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Compute daily returns from an equity curve.
pub fn daily_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

/// Compounded return of a return series: prod(1 + r) - 1.
pub fn cumulative_return(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n - 1).
pub(crate) fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Sample covariance (n - 1) over the shorter of the two slices.
pub(crate) fn covariance(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let (ma, mb) = (mean_f64(a), mean_f64(b));
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - ma) * (y - mb))
        .sum::<f64>()
        / (n - 1) as f64
}

fn correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    let (sa, sb) = (std_dev(a), std_dev(b));
    if sa < STD_EPSILON || sb < STD_EPSILON {
        return None;
    }
    Some(covariance(a, b) / (sa * sb))
}

/// JSON has no infinity, so non-finite values are written as strings.
///
/// Reads numbers, `"inf"`, `"-inf"`, `"nan"`, and `null` (what older results
/// hold for an infinite profit factor).
mod non_finite {
    use serde::de::{self, Deserializer};
    use serde::{Deserialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("nan")
        } else if *value > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Option::<Repr>::deserialize(deserializer)? {
            None => Ok(f64::INFINITY),
            Some(Repr::Number(v)) => Ok(v),
            Some(Repr::Text(s)) => match s.as_str() {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                "nan" => Ok(f64::NAN),
                other => Err(de::Error::invalid_value(
                    de::Unexpected::Str(other),
                    &"a number, \"inf\", \"-inf\" or \"nan\"",
                )),
            },
        }
    }
}
