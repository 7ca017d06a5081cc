//! Simulation engine: cost model, portfolio state machine, bar loop and
//! run diagnostics.

pub mod cost_model;
pub mod diagnostics;
pub mod loop_runner;
pub mod simulator;

pub use cost_model::CostModel;
pub use diagnostics::{Diagnostics, SkipReason, SkippedOrder, StrategyIncident};
pub use loop_runner::{run_simulation, SimulationParams};
pub use simulator::{PortfolioSimulator, SimulationOutput};
