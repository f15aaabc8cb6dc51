//! Wealth-projection and withdrawal-strategy comparison library
//!
//! This crate simulates a portfolio through an accumulation (savings) phase
//! and a decumulation (withdrawal) phase under German tax rules, and ranks
//! alternative withdrawal strategies on top of that engine. It supports:
//! - Fixed, random (seeded normal), historical-index and black-swan return modes
//! - Capital gains tax with partial exemption and yearly allowance, church
//!   tax, progressive income tax and relationship-based inheritance tax
//! - A cash-flow event ledger with inheritances and credit-financed expenses
//! - Four withdrawal strategies (fixed percentage, fixed monthly, dynamic,
//!   bucket) assignable per decumulation segment
//! - Sensitivity sweeps, crisis stress tests, Monte Carlo aggregation and
//!   weighted multi-criteria strategy ranking
//!
//! Every run is deterministic for a fixed configuration and seed; analysis
//! batches parallelize behind the default-on `parallel` feature without
//! affecting results.
//!
//! ```ignore
//! use ruhestand_core::{SimulationConfig, simulate};
//!
//! let config: SimulationConfig = serde_json::from_str(&plan_json)?;
//! let result = simulate(&config)?;
//! println!("final capital: {:.2}", result.final_capital());
//! ```

#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod model;
pub mod simulation;
pub mod taxes;

#[cfg(test)]
mod tests;

pub use analysis::{
    evaluate_strategies, rank_strategies, run_monte_carlo, run_sensitivity_analysis,
    run_stress_test,
};
pub use config::{SimulationConfig, WithdrawalPlan};
pub use error::{ConfigIssue, SimulationError, ValidationError};
pub use model::{
    CashFlowEvent, EventKind, ReturnConfig, Segment, SimulationResult, SimulationYear,
    WithdrawalStrategy,
};
pub use simulation::simulate;
