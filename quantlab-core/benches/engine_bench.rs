//! Criterion benchmarks for QuantLab hot paths.
//!
//! Benchmarks:
//! 1. Bar loop with a precomputed signal map (simulator throughput)
//! 2. Bar loop with a strategy evaluated on truncated history
//! 3. Trailing indicators over a growing history

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use quantlab_core::data::random_walk;
use quantlab_core::domain::{Decision, PriceSeries};
use quantlab_core::engine::{run_simulation, CostModel, SimulationParams};
use quantlab_core::indicators::{rate_of_change, rsi, sma};
use quantlab_core::signals::{MaCrossover, Momentum, SignalSource};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(bar_count: usize) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2010, 1, 4).unwrap();
    // Weekdays only; pad the calendar span generously and trim.
    let end = start + chrono::Duration::days((bar_count as i64) * 2);
    let full = random_walk("BENCH", start, end, 1).unwrap();
    PriceSeries::new("BENCH", full.bars()[..bar_count].to_vec()).unwrap()
}

fn params() -> SimulationParams {
    SimulationParams {
        initial_capital: 100_000.0,
        position_size_fraction: 0.5,
        cost_model: CostModel::new(0.0005, 0.001, 1.0),
    }
}

// ── 1. Precomputed signals ───────────────────────────────────────────

fn bench_precomputed_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("precomputed_loop");

    for &bar_count in &[252, 1260, 2520] {
        let series = make_series(bar_count);
        let signals = SignalSource::precomputed(series.dates().enumerate().map(|(i, d)| {
            let decision = match i % 10 {
                0 => Decision::Buy,
                5 => Decision::Sell,
                _ => Decision::Hold,
            };
            (d, decision)
        }));
        let params = params();

        group.bench_with_input(BenchmarkId::from_parameter(bar_count), &bar_count, |b, _| {
            b.iter(|| run_simulation(black_box(&series), black_box(&signals), &params));
        });
    }

    group.finish();
}

// ── 2. Strategy signals ──────────────────────────────────────────────

fn bench_strategy_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategy_loop");
    let series = make_series(1260);
    let params = params();

    let ma = SignalSource::strategy(MaCrossover::new(20, 50).unwrap());
    group.bench_function("ma_crossover_20_50", |b| {
        b.iter(|| run_simulation(black_box(&series), &ma, &params));
    });

    let momentum = SignalSource::strategy(Momentum::default());
    group.bench_function("momentum_20", |b| {
        b.iter(|| run_simulation(black_box(&series), &momentum, &params));
    });

    group.finish();
}

// ── 3. Indicators ────────────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicators");
    let series = make_series(2520);
    let bars = series.bars();

    group.bench_function("sma_200_full_walk", |b| {
        b.iter(|| {
            (1..=bars.len())
                .filter_map(|n| sma(black_box(&bars[..n]), 200))
                .sum::<f64>()
        });
    });
    group.bench_function("roc_20_full_walk", |b| {
        b.iter(|| {
            (1..=bars.len())
                .filter_map(|n| rate_of_change(black_box(&bars[..n]), 20))
                .sum::<f64>()
        });
    });
    group.bench_function("rsi_14_full_walk", |b| {
        b.iter(|| {
            (1..=bars.len())
                .filter_map(|n| rsi(black_box(&bars[..n]), 14))
                .sum::<f64>()
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_precomputed_loop,
    bench_strategy_loop,
    bench_indicators,
);
criterion_main!(benches);
