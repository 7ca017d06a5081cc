//! Portfolio simulator scenarios driven through the full bar loop.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use quantlab_core::domain::{Decision, PriceBar, PriceSeries, Side};
use quantlab_core::engine::{run_simulation, CostModel, SimulationParams, SkipReason};
use quantlab_core::signals::{BuyAndHold, SignalSource};

fn series_from_closes(closes: &[f64]) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            PriceBar::new(
                start + chrono::Duration::days(i as i64),
                c,
                c * 1.01,
                c * 0.99,
                c,
                10_000.0,
            )
        })
        .collect();
    PriceSeries::new("SIM", bars).unwrap()
}

fn params(fraction: f64, cost_model: CostModel) -> SimulationParams {
    SimulationParams {
        initial_capital: 100_000.0,
        position_size_fraction: fraction,
        cost_model,
    }
}

fn signals_at(series: &PriceSeries, plan: &[(usize, Decision)]) -> SignalSource {
    let dates: Vec<NaiveDate> = series.dates().collect();
    SignalSource::precomputed(plan.iter().map(|(i, d)| (dates[*i], *d)))
}

#[test]
fn hold_only_keeps_flat_curve() {
    let series = series_from_closes(&[100.0, 90.0, 120.0, 80.0]);
    let (out, diag) = run_simulation(
        &series,
        &SignalSource::Precomputed(BTreeMap::new()),
        &params(1.0, CostModel::frictionless()),
    );
    assert!(out.trades.is_empty());
    assert!(out.equity_curve.iter().all(|p| p.value == 100_000.0));
    assert_eq!(diag.defaulted_holds, 4);
}

#[test]
fn round_trip_with_costs() {
    let series = series_from_closes(&[100.0, 105.0, 110.0]);
    let cost = CostModel::new(0.001, 0.001, 1.0);
    let signals = signals_at(&series, &[(0, Decision::Buy), (2, Decision::Sell)]);
    let (out, _) = run_simulation(&series, &signals, &params(0.5, cost));

    assert_eq!(out.trades.len(), 2);
    let buy = &out.trades[0];
    let sell = &out.trades[1];
    assert_eq!(buy.side, Side::Buy);
    assert!((buy.price - 100.1).abs() < 1e-9);
    assert_eq!(sell.shares, buy.shares);
    assert!((sell.price - 110.0 * 0.999).abs() < 1e-9);

    let expected_cash = 100_000.0 + buy.cash_delta + sell.cash_delta;
    assert!((out.final_state.cash - expected_cash).abs() < 1e-6);
    assert!(out.final_state.position.is_flat());
    assert_eq!(
        out.equity_curve.last().unwrap().value,
        out.final_state.total_value
    );
}

#[test]
fn buy_and_hold_is_not_liquidated() {
    let series = series_from_closes(&[50.0, 55.0, 60.0]);
    let (out, _) = run_simulation(
        &series,
        &SignalSource::strategy(BuyAndHold),
        &params(1.0, CostModel::frictionless()),
    );
    assert_eq!(out.trades.len(), 1);
    assert_eq!(out.final_state.position.shares, 2_000);
    assert!((out.final_state.total_value - 120_000.0).abs() < 1e-6);
}

#[test]
fn repeated_sells_after_exit_are_recorded_skips() {
    let series = series_from_closes(&[10.0, 11.0, 12.0, 13.0]);
    let signals = signals_at(
        &series,
        &[
            (0, Decision::Buy),
            (1, Decision::Sell),
            (2, Decision::Sell),
            (3, Decision::Sell),
        ],
    );
    let (out, diag) = run_simulation(&series, &signals, &params(1.0, CostModel::frictionless()));
    assert_eq!(out.trades.len(), 2);
    let no_position = diag
        .skipped_orders
        .iter()
        .filter(|s| s.reason == SkipReason::NoPosition)
        .count();
    assert_eq!(no_position, 2);
}

#[test]
fn equity_identity_holds_every_bar() {
    let closes: Vec<f64> = (0..30).map(|i| 50.0 + (i as f64 * 0.7).sin() * 5.0).collect();
    let series = series_from_closes(&closes);
    let plan: Vec<(usize, Decision)> = (0..30)
        .map(|i| {
            let d = match i % 5 {
                0 | 1 => Decision::Buy,
                3 => Decision::Sell,
                _ => Decision::Hold,
            };
            (i, d)
        })
        .collect();
    let signals = signals_at(&series, &plan);
    let (out, _) = run_simulation(&series, &signals, &params(0.3, CostModel::new(0.0005, 0.001, 2.0)));

    // Replay the ledger and check each equity point.
    let mut cash = 100_000.0;
    let mut shares: u64 = 0;
    let mut trades = out.trades.iter().peekable();
    for (bar, point) in series.bars().iter().zip(&out.equity_curve) {
        while let Some(t) = trades.next_if(|t| t.date == bar.date) {
            cash += t.cash_delta;
            match t.side {
                Side::Buy => shares += t.shares,
                Side::Sell => shares -= t.shares,
            }
        }
        assert!(cash >= 0.0);
        let expected = cash + shares as f64 * bar.close;
        assert!((point.value - expected).abs() < 1e-6, "on {}", bar.date);
    }
}
