//! Parameter grid search.
//!
//! A [`ParamGrid`] is an ordered list of named axes. Its combinations are
//! enumerated lexicographically (last axis varies fastest), and that order is
//! both the order of [`OptimizationResult::entries`] and the tie-break order
//! for the best combination.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use quantlab_core::signals::{MaCrossover, SignalSource};

use crate::config::{ConfigError, ConfigIssue};
use crate::fitness::Objective;
use crate::runner::{check_range, BacktestEngine, BacktestResult, BenchmarkData, RunError};

/// One value on a grid axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Choice(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Choice(v) => f.write_str(v),
        }
    }
}

/// Named axes whose Cartesian product is searched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    axes: Vec<(String, Vec<ParamValue>)>,
}

impl ParamGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn axis(mut self, name: impl Into<String>, values: Vec<ParamValue>) -> Self {
        self.axes.push((name.into(), values));
        self
    }

    pub fn int_axis(self, name: impl Into<String>, values: &[i64]) -> Self {
        self.axis(name, values.iter().map(|&v| ParamValue::Int(v)).collect())
    }

    pub fn float_axis(self, name: impl Into<String>, values: &[f64]) -> Self {
        self.axis(name, values.iter().map(|&v| ParamValue::Float(v)).collect())
    }

    pub fn choice_axis(self, name: impl Into<String>, values: &[&str]) -> Self {
        self.axis(
            name,
            values
                .iter()
                .map(|v| ParamValue::Choice((*v).to_string()))
                .collect(),
        )
    }

    /// MA crossover grid.
    ///
    /// Short periods: 10, 20, 30
    /// Long periods: 50, 100, 200
    pub fn ma_crossover_default() -> Self {
        Self::new()
            .int_axis("short", &[10, 20, 30])
            .int_axis("long", &[50, 100, 200])
    }

    pub fn axes(&self) -> &[(String, Vec<ParamValue>)] {
        &self.axes
    }

    /// Number of combinations; 0 for a grid with no axes.
    pub fn size(&self) -> usize {
        if self.axes.is_empty() {
            return 0;
        }
        self.axes
            .iter()
            .fold(1usize, |acc, (_, values)| acc.saturating_mul(values.len()))
    }

    /// Reject grids that would search nothing or are ambiguous.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut issues = Vec::new();
        if self.axes.is_empty() {
            issues.push(ConfigIssue::new("param_grid", "{}", "at least one axis"));
        }
        for (i, (name, values)) in self.axes.iter().enumerate() {
            if name.trim().is_empty() {
                issues.push(ConfigIssue::new(
                    format!("param_grid[{i}]"),
                    format!("{name:?}"),
                    "a non-blank axis name",
                ));
            }
            if values.is_empty() {
                issues.push(ConfigIssue::new(
                    format!("param_grid.{name}"),
                    "[]",
                    "at least one value",
                ));
            }
            if self.axes[..i].iter().any(|(other, _)| other == name) {
                issues.push(ConfigIssue::new(
                    format!("param_grid.{name}"),
                    "duplicate",
                    "unique axis names",
                ));
            }
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(issues))
        }
    }

    /// Every combination, lexicographic over axis order.
    pub fn combinations(&self) -> Vec<ParamSet> {
        let total = self.size();
        let mut out = Vec::with_capacity(total);
        if total == 0 {
            return out;
        }

        let mut cursor = vec![0usize; self.axes.len()];
        loop {
            out.push(ParamSet {
                values: self
                    .axes
                    .iter()
                    .zip(&cursor)
                    .map(|((name, values), &i)| (name.clone(), values[i].clone()))
                    .collect(),
            });

            // Odometer increment, last axis fastest.
            let mut axis = self.axes.len();
            loop {
                if axis == 0 {
                    return out;
                }
                axis -= 1;
                cursor[axis] += 1;
                if cursor[axis] < self.axes[axis].1.len() {
                    break;
                }
                cursor[axis] = 0;
            }
        }
    }
}

/// One point in the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSet {
    values: Vec<(String, ParamValue)>,
}

impl ParamSet {
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float value; integer values widen.
    pub fn get_float(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Choice(_) => None,
        }
    }

    pub fn get_choice(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            ParamValue::Choice(v) => Some(v),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

/// Builds a signal source from one parameter combination.
pub trait StrategyTemplate: Send + Sync {
    fn build(&self, params: &ParamSet) -> anyhow::Result<SignalSource>;
}

impl<F> StrategyTemplate for F
where
    F: Fn(&ParamSet) -> anyhow::Result<SignalSource> + Send + Sync,
{
    fn build(&self, params: &ParamSet) -> anyhow::Result<SignalSource> {
        self(params)
    }
}

/// Template for [`MaCrossover`] over integer `short` and `long` axes.
///
/// Combinations with `short >= long` fail to build and score worst.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaCrossoverTemplate;

impl StrategyTemplate for MaCrossoverTemplate {
    fn build(&self, params: &ParamSet) -> anyhow::Result<SignalSource> {
        let short = params
            .get_int("short")
            .ok_or_else(|| anyhow::anyhow!("missing integer parameter 'short'"))?;
        let long = params
            .get_int("long")
            .ok_or_else(|| anyhow::anyhow!("missing integer parameter 'long'"))?;
        let short = usize::try_from(short)?;
        let long = usize::try_from(long)?;
        Ok(SignalSource::strategy(MaCrossover::new(short, long)?))
    }
}

/// What happened to one combination.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryStatus {
    Completed(Box<BacktestResult>),
    Failed(RunError),
    /// Not run because cancellation was requested first.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridEntry {
    pub params: ParamSet,
    /// Objective score, higher is better; `NEG_INFINITY` unless completed.
    pub score: f64,
    pub status: EntryStatus,
}

impl GridEntry {
    pub fn result(&self) -> Option<&BacktestResult> {
        match &self.status {
            EntryStatus::Completed(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&RunError> {
        match &self.status {
            EntryStatus::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Full result matrix of a grid search, in grid order.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    pub objective: Objective,
    pub best_index: usize,
    pub best_params: ParamSet,
    pub best_score: f64,
    pub entries: Vec<GridEntry>,
    pub total_combinations: usize,
    /// True if at least one combination was skipped by cancellation.
    pub cancelled: bool,
}

impl OptimizationResult {
    /// Backtest of the best combination, if it completed.
    pub fn best_result(&self) -> Option<&BacktestResult> {
        self.entries.get(self.best_index).and_then(GridEntry::result)
    }

    /// Completed entries sorted by score, best first. Ties keep grid order.
    pub fn ranked(&self) -> Vec<&GridEntry> {
        let mut ranked: Vec<&GridEntry> = self
            .entries
            .iter()
            .filter(|e| e.result().is_some())
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }

    pub fn top_n(&self, n: usize) -> Vec<&GridEntry> {
        self.ranked().into_iter().take(n).collect()
    }

    pub fn failed(&self) -> impl Iterator<Item = &GridEntry> {
        self.entries.iter().filter(|e| e.error().is_some())
    }
}

impl BacktestEngine {
    /// Exhaustive search over `grid`, scoring each combination by `objective`.
    ///
    /// The series (and benchmark) are loaded once. A combination that fails
    /// to build or run scores `NEG_INFINITY` and stays in the matrix, so a
    /// non-empty grid always yields a result. The only error is an invalid
    /// grid.
    #[allow(clippy::too_many_arguments)]
    pub fn optimize_parameters<T>(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        template: &T,
        grid: &ParamGrid,
        objective: Objective,
        cancel: Option<&AtomicBool>,
    ) -> Result<OptimizationResult, ConfigError>
    where
        T: StrategyTemplate + ?Sized,
    {
        grid.validate()?;
        let combinations = grid.combinations();

        let loaded = check_range(start, end).and_then(|()| {
            self.source()
                .load_price_series(ticker, start, end)
                .map_err(RunError::from)
        });
        let benchmark = match loaded {
            Ok(_) => self.load_benchmark(start, end),
            Err(_) => BenchmarkData::Disabled,
        };

        tracing::info!(
            ticker = %ticker,
            combinations = combinations.len(),
            %objective,
            "grid search started"
        );

        let run_one = |params: &ParamSet| -> (f64, EntryStatus) {
            if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                return (f64::NEG_INFINITY, EntryStatus::Cancelled);
            }
            let outcome = match &loaded {
                Err(err) => Err(err.clone()),
                Ok(series) => template
                    .build(params)
                    .map_err(|e| RunError::Strategy(format!("{params}: {e:#}")))
                    .and_then(|signals| self.execute(series, start, end, &signals, &benchmark)),
            };
            match outcome {
                Ok(result) => (
                    objective.score(&result.metrics),
                    EntryStatus::Completed(Box::new(result)),
                ),
                Err(err) => {
                    tracing::warn!(ticker = %ticker, params = %params, error = %err, "combination failed");
                    (f64::NEG_INFINITY, EntryStatus::Failed(err))
                }
            }
        };

        let scored: Vec<(f64, EntryStatus)> = if self.is_parallel() {
            combinations.par_iter().map(run_one).collect()
        } else {
            combinations.iter().map(run_one).collect()
        };

        let entries: Vec<GridEntry> = combinations
            .into_iter()
            .zip(scored)
            .map(|(params, (score, status))| GridEntry {
                params,
                score,
                status,
            })
            .collect();

        // First strictly greater score wins, so ties go to the earliest combination.
        let mut best_index = 0;
        for (i, entry) in entries.iter().enumerate().skip(1) {
            if entry.score > entries[best_index].score {
                best_index = i;
            }
        }
        let cancelled = entries
            .iter()
            .any(|e| matches!(e.status, EntryStatus::Cancelled));

        let best_params = entries[best_index].params.clone();
        let best_score = entries[best_index].score;
        tracing::info!(
            ticker = %ticker,
            best = %best_params,
            score = best_score,
            cancelled,
            "grid search complete"
        );

        Ok(OptimizationResult {
            objective,
            best_index,
            best_params,
            best_score,
            total_combinations: entries.len(),
            entries,
            cancelled,
        })
    }
}
