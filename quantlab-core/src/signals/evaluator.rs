//! SignalEvaluator — turns a strategy or a precomputed signal map into one
//! decision per bar, with no look-ahead.
//!
//! Look-ahead is prevented by truncation: for bar `i` the strategy receives
//! `series.history(i)`, a slice that physically ends at bar `i`.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::NaiveDate;

use super::Strategy;
use crate::domain::{Decision, PriceSeries};
use crate::engine::Diagnostics;

/// Where decisions come from.
#[derive(Clone)]
pub enum SignalSource {
    /// Called once per bar with the truncated history.
    Strategy(Arc<dyn Strategy>),
    /// Decisions keyed by date. Dates missing from the map default to HOLD.
    Precomputed(BTreeMap<NaiveDate, Decision>),
}

impl SignalSource {
    pub fn strategy<S: Strategy + 'static>(strategy: S) -> Self {
        SignalSource::Strategy(Arc::new(strategy))
    }

    pub fn precomputed(decisions: impl IntoIterator<Item = (NaiveDate, Decision)>) -> Self {
        SignalSource::Precomputed(decisions.into_iter().collect())
    }

    pub fn name(&self) -> &str {
        match self {
            SignalSource::Strategy(s) => s.name(),
            SignalSource::Precomputed(_) => "precomputed",
        }
    }
}

impl std::fmt::Debug for SignalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalSource::Strategy(s) => write!(f, "SignalSource::Strategy({})", s.name()),
            SignalSource::Precomputed(m) => {
                write!(f, "SignalSource::Precomputed({} dates)", m.len())
            }
        }
    }
}

pub struct SignalEvaluator<'a> {
    source: &'a SignalSource,
}

impl<'a> SignalEvaluator<'a> {
    pub fn new(source: &'a SignalSource) -> Self {
        Self { source }
    }

    /// Record precomputed signal dates that have no bar in `series`.
    ///
    /// Call once per run before evaluating bars.
    pub fn check_alignment(&self, series: &PriceSeries, diagnostics: &mut Diagnostics) {
        if let SignalSource::Precomputed(map) = self.source {
            let unaligned: Vec<NaiveDate> = map
                .keys()
                .copied()
                .filter(|d| series.index_of(*d).is_none())
                .collect();
            if !unaligned.is_empty() {
                tracing::warn!(
                    ticker = series.ticker(),
                    count = unaligned.len(),
                    "precomputed signals on dates without bars are ignored"
                );
            }
            diagnostics.unaligned_signal_dates.extend(unaligned);
        }
    }

    /// Decision for bar `index`. Strategy failures become HOLD and are
    /// recorded in `diagnostics`.
    pub fn decide(
        &self,
        series: &PriceSeries,
        index: usize,
        diagnostics: &mut Diagnostics,
    ) -> Decision {
        let history = series.history(index);
        let Some(bar) = history.last() else {
            return Decision::Hold;
        };
        let date = bar.date;

        match self.source {
            SignalSource::Precomputed(map) => match map.get(&date) {
                Some(decision) => *decision,
                None => {
                    diagnostics.defaulted_holds += 1;
                    Decision::Hold
                }
            },
            SignalSource::Strategy(strategy) => {
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| strategy.decide(history, date)));
                let message = match outcome {
                    Ok(Ok(decision)) => return decision,
                    Ok(Err(err)) => format!("{err:#}"),
                    Err(payload) => panic_message(payload.as_ref()),
                };
                tracing::warn!(
                    ticker = series.ticker(),
                    %date,
                    strategy = strategy.name(),
                    error = %message,
                    "strategy failed; holding"
                );
                diagnostics.record_strategy_failure(date, message);
                Decision::Hold
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
