//! Analysis layer built on top of the simulation engine.
//!
//! Every analyzer treats the engine as a black box: it assembles a modified
//! configuration, runs a full simulation per candidate, and aggregates the
//! results. Invocations are independent and run in parallel when the
//! `parallel` feature is enabled; results never depend on execution order.

pub mod monte_carlo;
pub mod ranking;
pub mod sensitivity;
pub mod stress;

pub use monte_carlo::{MonteCarloSummary, PercentileBands, run_monte_carlo};
pub use ranking::{
    StrategyCandidate, WeightProfile, evaluate_strategies, rank_strategies, recommended,
};
pub use sensitivity::{
    ParameterSweep, SensitivityPoint, SensitivityResult, SweepParameter,
    run_sensitivity_analysis,
};
pub use stress::{
    StressScenarioResult, StressTestReport, StressTestSummary, run_stress_scenario,
    run_stress_test,
};
