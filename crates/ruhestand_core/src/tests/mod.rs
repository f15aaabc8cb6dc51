//! Integration tests for the projection engine
//!
//! Tests are organized by topic:
//! - `basic` - year-loop mechanics, continuity, determinism, ledger events
//! - `strategies` - withdrawal strategies, segments, bucket and depletion
//! - `analysis` - sensitivity, stress, Monte Carlo and ranking end-to-end

mod analysis;
mod strategies;

use crate::config::{SimulationConfig, WithdrawalPlan};
use crate::model::{ReferenceCapital, ReturnConfig, WithdrawalStrategy};
use crate::taxes::TaxConfig;

/// Tax config with every rate zeroed, for closed-form arithmetic checks.
fn no_tax() -> TaxConfig {
    TaxConfig {
        capital_gains_rate: 0.0,
        partial_exemption: 0.0,
        annual_allowance: 0.0,
        church_tax: false,
        church_tax_rate: 0.0,
    }
}

/// Frictionless baseline: fixed return, no fees, no taxes, no events.
fn plain_config(rate: f64) -> SimulationConfig {
    SimulationConfig {
        start_date: jiff::civil::date(2025, 1, 1),
        end_year: 2034,
        withdrawal_start_year: 2035,
        initial_capital: 0.0,
        monthly_contribution: 0.0,
        annual_contribution_increase: 0.0,
        expense_ratio: 0.0,
        transaction_cost_rate: 0.0,
        events: Vec::new(),
        returns: ReturnConfig::Fixed { rate },
        tax: no_tax(),
        withdrawal: WithdrawalPlan::Single {
            strategy: WithdrawalStrategy::FixedPercentage {
                rate: 0.04,
                reference: ReferenceCapital::Initial,
            },
        },
        currency: "EUR".to_string(),
    }
}
