//! Bar-by-bar simulation loop.
//!
//! Strictly sequential: each decision may depend on everything before it.
//! Per bar:
//! 1. Evaluate the signal on the history truncated at this bar
//! 2. Apply the decision to the portfolio at this bar's close
//! 3. Mark to market and append the equity point

use super::cost_model::CostModel;
use super::diagnostics::Diagnostics;
use super::simulator::{PortfolioSimulator, SimulationOutput};
use crate::domain::PriceSeries;
use crate::signals::{SignalEvaluator, SignalSource};

/// Capital and sizing for one simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    pub initial_capital: f64,
    pub position_size_fraction: f64,
    pub cost_model: CostModel,
}

/// Simulate `signals` over every bar of `series`.
///
/// Returns the simulation output together with the diagnostics gathered
/// along the way. Never fails: strategy errors become HOLD and unfillable
/// orders are skipped, both recorded in the diagnostics.
pub fn run_simulation(
    series: &PriceSeries,
    signals: &SignalSource,
    params: &SimulationParams,
) -> (SimulationOutput, Diagnostics) {
    let mut diagnostics = Diagnostics::default();
    let evaluator = SignalEvaluator::new(signals);
    evaluator.check_alignment(series, &mut diagnostics);

    let mut simulator = PortfolioSimulator::new(
        params.initial_capital,
        params.position_size_fraction,
        params.cost_model,
    )
    .with_capacity(series.len());

    for (index, bar) in series.bars().iter().enumerate() {
        let decision = evaluator.decide(series, index, &mut diagnostics);
        simulator.step(bar, decision, &mut diagnostics);
    }

    (simulator.finish(), diagnostics)
}
