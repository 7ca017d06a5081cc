//! Look-ahead contamination tests.
//!
//! Invariant: the decision at bar t may not depend on any bar after t.
//!
//! Method: run the same strategy on a truncated series (bars 0..D) and on a
//! longer one (bars 0..D+10). Decisions for bars 0..D must be identical.
//! A "cheating" strategy that tries to peek past its date is also run to show
//! the evaluator never hands it future bars.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use quantlab_core::data::random_walk;
use quantlab_core::domain::{Decision, PriceBar, PriceSeries};
use quantlab_core::engine::Diagnostics;
use quantlab_core::signals::{
    FnStrategy, MaCrossover, Momentum, RsiReversion, SignalEvaluator, SignalSource,
};

fn full_series() -> PriceSeries {
    random_walk(
        "LOOK",
        NaiveDate::from_ymd_opt(2022, 1, 3).unwrap(),
        NaiveDate::from_ymd_opt(2022, 12, 30).unwrap(),
        42,
    )
    .unwrap()
}

fn decisions(source: &SignalSource, series: &PriceSeries) -> Vec<Decision> {
    let evaluator = SignalEvaluator::new(source);
    let mut diag = Diagnostics::default();
    (0..series.len())
        .map(|i| evaluator.decide(series, i, &mut diag))
        .collect()
}

fn truncated(series: &PriceSeries, len: usize) -> PriceSeries {
    PriceSeries::new(series.ticker(), series.bars()[..len].to_vec()).unwrap()
}

fn assert_no_lookahead(source: &SignalSource) {
    let full = full_series();
    let cut = 120;
    let short = truncated(&full, cut);
    let longer = truncated(&full, cut + 10);

    let a = decisions(source, &short);
    let b = decisions(source, &longer);
    assert_eq!(a[..], b[..cut], "{}: decisions changed with future bars", source.name());
}

#[test]
fn ma_crossover_has_no_lookahead() {
    assert_no_lookahead(&SignalSource::strategy(MaCrossover::new(5, 20).unwrap()));
}

#[test]
fn momentum_has_no_lookahead() {
    assert_no_lookahead(&SignalSource::strategy(Momentum::new(10, 0.01).unwrap()));
}

#[test]
fn rsi_has_no_lookahead() {
    assert_no_lookahead(&SignalSource::strategy(RsiReversion::default()));
}

#[test]
fn cheating_strategy_cannot_see_future() {
    // Tries to read the bar after `date` and buy if it is higher.
    let peeks = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&peeks);
    let cheat = FnStrategy::new("cheat", move |history: &[PriceBar], date| {
        let pos = history.iter().position(|b| b.date == date);
        let next = pos.and_then(|p| history.get(p + 1));
        log.lock().unwrap().push((date, history.len(), next.is_some()));
        Ok(match next {
            Some(n) if n.close > history[history.len() - 1].close => Decision::Buy,
            _ => Decision::Hold,
        })
    });
    let source = SignalSource::strategy(cheat);
    let series = full_series();
    let out = decisions(&source, &series);

    assert!(out.iter().all(|d| *d == Decision::Hold));
    let peeks = peeks.lock().unwrap();
    assert_eq!(peeks.len(), series.len());
    for (i, (date, len, saw_next)) in peeks.iter().enumerate() {
        assert_eq!(*len, i + 1);
        assert_eq!(*date, series.bars()[i].date);
        assert!(!saw_next);
    }
}

#[test]
fn truncated_and_extended_histories_agree_at_every_cut() {
    let source = SignalSource::strategy(MaCrossover::new(3, 8).unwrap());
    let full = full_series();
    let reference = decisions(&source, &full);
    for cut in [10, 40, 90, 150] {
        let partial = decisions(&source, &truncated(&full, cut));
        assert_eq!(partial[..], reference[..cut], "cut at {cut}");
    }
}
