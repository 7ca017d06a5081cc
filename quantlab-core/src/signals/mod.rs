//! Signal generation: the strategy contract and its evaluator.
//!
//! Strategies are pure market-timing logic. They see only the bars up to and
//! including the decision date and never touch portfolio state.

pub mod evaluator;
pub mod strategies;

pub use evaluator::{SignalEvaluator, SignalSource};
pub use strategies::{BuyAndHold, MaCrossover, Momentum, RsiReversion};

use chrono::NaiveDate;

use crate::domain::{Decision, PriceBar};

/// A trading strategy: one decision per bar from the trailing history.
///
/// # Invariants
/// - `history` always ends at `date`; later bars are never passed in
/// - `decide()` must be deterministic for the same history
/// - an `Err` is treated as a failure for that date only: the engine records
///   it and holds
/// - a panic is caught and recorded the same way, but the process panic hook
///   still runs first and prints to stderr once per failing bar; report
///   expected failures as `Err`
pub trait Strategy: Send + Sync {
    /// Strategy name for results and logging.
    fn name(&self) -> &str;

    fn decide(&self, history: &[PriceBar], date: NaiveDate) -> anyhow::Result<Decision>;
}

/// Adapter turning a closure into a [`Strategy`].
pub struct FnStrategy<F> {
    name: String,
    f: F,
}

impl<F> FnStrategy<F>
where
    F: Fn(&[PriceBar], NaiveDate) -> anyhow::Result<Decision> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Strategy for FnStrategy<F>
where
    F: Fn(&[PriceBar], NaiveDate) -> anyhow::Result<Decision> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&self, history: &[PriceBar], date: NaiveDate) -> anyhow::Result<Decision> {
        (self.f)(history, date)
    }
}

impl std::fmt::Debug for dyn Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Strategy({})", self.name())
    }
}
