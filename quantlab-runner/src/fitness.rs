//! Objective — configurable metric selector for grid-search ranking.

use serde::{Deserialize, Serialize};

use crate::metrics::PerformanceMetrics;

/// Which metric `optimize_parameters` maximizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    #[default]
    Sharpe,
    Sortino,
    Calmar,
    Cagr,
    TotalReturn,
    WinRate,
    ProfitFactor,
    MaxDrawdown,
}

impl Objective {
    /// Extract the raw metric value.
    pub fn extract(&self, metrics: &PerformanceMetrics) -> f64 {
        match self {
            Self::Sharpe => metrics.sharpe,
            Self::Sortino => metrics.sortino,
            Self::Calmar => metrics.calmar,
            Self::Cagr => metrics.cagr,
            Self::TotalReturn => metrics.total_return,
            Self::WinRate => metrics.win_rate.unwrap_or(0.0),
            Self::ProfitFactor => metrics.profit_factor,
            Self::MaxDrawdown => metrics.max_drawdown,
        }
    }

    /// Whether higher raw values are better.
    ///
    /// Max drawdown is a positive fraction, so smaller is better.
    pub fn is_higher_better(&self) -> bool {
        !matches!(self, Self::MaxDrawdown)
    }

    /// Score oriented so that higher is always better.
    ///
    /// NaN maps to `f64::NEG_INFINITY`, the same score a failed run gets.
    pub fn score(&self, metrics: &PerformanceMetrics) -> f64 {
        let raw = self.extract(metrics);
        if raw.is_nan() {
            return f64::NEG_INFINITY;
        }
        if self.is_higher_better() {
            raw
        } else {
            -raw
        }
    }
}

impl std::fmt::Display for Objective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Sharpe => "sharpe",
            Self::Sortino => "sortino",
            Self::Calmar => "calmar",
            Self::Cagr => "cagr",
            Self::TotalReturn => "total_return",
            Self::WinRate => "win_rate",
            Self::ProfitFactor => "profit_factor",
            Self::MaxDrawdown => "max_drawdown",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::DrawdownInfo;

    fn sample_metrics() -> PerformanceMetrics {
        PerformanceMetrics {
            total_return: 0.15,
            cagr: 0.12,
            volatility: 0.2,
            sharpe: 1.5,
            sortino: 2.0,
            max_drawdown: 0.10,
            drawdown: DrawdownInfo {
                max_drawdown: 0.10,
                peak_date: None,
                trough_date: None,
            },
            calmar: 1.2,
            win_rate: Some(0.55),
            profit_factor: 1.8,
            num_wins: 11,
            num_losses: 9,
            closed_trades: 20,
            total_trades: 40,
            total_commission: 12.0,
            final_value: 115_000.0,
        }
    }

    #[test]
    fn default_is_sharpe() {
        assert_eq!(Objective::default(), Objective::Sharpe);
        assert!((Objective::default().score(&sample_metrics()) - 1.5).abs() < 1e-10);
    }

    #[test]
    fn max_drawdown_is_negated() {
        let m = sample_metrics();
        assert!((Objective::MaxDrawdown.extract(&m) - 0.10).abs() < 1e-10);
        assert!((Objective::MaxDrawdown.score(&m) + 0.10).abs() < 1e-10);
    }

    #[test]
    fn missing_win_rate_scores_zero() {
        let mut m = sample_metrics();
        m.win_rate = None;
        assert_eq!(Objective::WinRate.score(&m), 0.0);
    }

    #[test]
    fn nan_scores_worst() {
        let mut m = sample_metrics();
        m.sharpe = f64::NAN;
        assert_eq!(Objective::Sharpe.score(&m), f64::NEG_INFINITY);
    }

    #[test]
    fn infinite_profit_factor_ranks_highest() {
        let mut m = sample_metrics();
        m.profit_factor = f64::INFINITY;
        assert!(Objective::ProfitFactor.score(&m) > 1e300);
    }

    #[test]
    fn serde_snake_case() {
        let json = serde_json::to_string(&Objective::TotalReturn).unwrap();
        assert_eq!(json, "\"total_return\"");
        let back: Objective = serde_json::from_str("\"max_drawdown\"").unwrap();
        assert_eq!(back, Objective::MaxDrawdown);
        assert_eq!(Objective::Calmar.to_string(), "calmar");
    }
}
