//! Stress tester
//!
//! Replays the user's configuration against the fixed crisis catalogue: each
//! scenario wraps the configured return mode in a black-swan override
//! starting at the chosen onset year, re-runs the full simulation, and
//! compares it against the no-crisis baseline.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::error::SimulationError;
use crate::model::{BlackSwanEvent, ReturnConfig, SimulationResult};
use crate::simulation::simulate;

/// Outcome of one crisis scenario compared to the no-crisis baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressScenarioResult {
    pub scenario_id: String,
    pub scenario_name: String,
    /// `Π(1+rᵢ) − 1` over the crisis window.
    pub cumulative_impact: f64,
    /// Baseline final capital minus scenario final capital.
    pub capital_loss: f64,
    /// Capital loss as a percentage of the baseline final capital.
    pub percentage_loss: f64,
    /// Years after the crisis window until capital regained its pre-crisis
    /// level; `None` when it never does within the horizon (unbounded).
    pub recovery_years: Option<u32>,
    pub final_capital: f64,
}

/// Aggregates over all scenarios of one stress test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressTestSummary {
    /// Scenario with the largest percentage loss.
    pub worst_case: String,
    pub average_capital_loss: f64,
    pub average_percentage_loss: f64,
    /// Mean recovery time over the scenarios that recovered at all.
    pub average_recovery_years: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressTestReport {
    pub results: Vec<StressScenarioResult>,
    pub summary: StressTestSummary,
    pub baseline_final_capital: f64,
}

/// Run a single crisis scenario against an already-computed baseline.
pub fn run_stress_scenario(
    config: &SimulationConfig,
    baseline: &SimulationResult,
    event: &BlackSwanEvent,
    onset_year: i32,
) -> Result<StressScenarioResult, SimulationError> {
    let mut scenario_config = config.clone();
    scenario_config.returns = ReturnConfig::BlackSwan {
        event: event.clone(),
        event_start_year: onset_year,
        base: Box::new(config.returns.clone()),
    };
    let scenario = simulate(&scenario_config)?;

    let baseline_final = baseline.final_capital();
    let capital_loss = baseline_final - scenario.final_capital();
    let percentage_loss = if baseline_final > 0.0 {
        capital_loss / baseline_final * 100.0
    } else {
        0.0
    };

    // Recovery is measured against the capital held when the crisis hit.
    let pre_crisis_level = scenario
        .years
        .iter()
        .find(|y| y.year == onset_year)
        .map_or(0.0, |y| y.start_capital);
    let crisis_end = onset_year + event.duration.max(1) as i32 - 1;
    let recovery_years = scenario
        .years
        .iter()
        .filter(|y| y.year > crisis_end)
        .find(|y| y.end_capital >= pre_crisis_level)
        .map(|y| (y.year - crisis_end).max(0) as u32);

    Ok(StressScenarioResult {
        scenario_id: event.id.clone(),
        scenario_name: event.name.clone(),
        cumulative_impact: event.cumulative_impact(),
        capital_loss,
        percentage_loss,
        recovery_years,
        final_capital: scenario.final_capital(),
    })
}

/// Run the full crisis catalogue with the given onset year.
pub fn run_stress_test(
    config: &SimulationConfig,
    onset_year: i32,
) -> Result<StressTestReport, SimulationError> {
    config.validate()?;
    let baseline = simulate(config)?;
    let catalogue = BlackSwanEvent::catalogue();

    #[cfg(feature = "parallel")]
    let results = catalogue
        .par_iter()
        .map(|event| run_stress_scenario(config, &baseline, event, onset_year))
        .collect::<Result<Vec<_>, SimulationError>>()?;

    #[cfg(not(feature = "parallel"))]
    let results = catalogue
        .iter()
        .map(|event| run_stress_scenario(config, &baseline, event, onset_year))
        .collect::<Result<Vec<_>, SimulationError>>()?;

    let summary = summarize(&results);
    Ok(StressTestReport {
        results,
        summary,
        baseline_final_capital: baseline.final_capital(),
    })
}

fn summarize(results: &[StressScenarioResult]) -> StressTestSummary {
    let count = results.len().max(1) as f64;
    let worst_case = results
        .iter()
        .max_by(|a, b| a.percentage_loss.total_cmp(&b.percentage_loss))
        .map_or_else(String::new, |r| r.scenario_name.clone());
    let recovered: Vec<u32> = results.iter().filter_map(|r| r.recovery_years).collect();
    StressTestSummary {
        worst_case,
        average_capital_loss: results.iter().map(|r| r.capital_loss).sum::<f64>() / count,
        average_percentage_loss: results.iter().map(|r| r.percentage_loss).sum::<f64>() / count,
        average_recovery_years: if recovered.is_empty() {
            None
        } else {
            Some(recovered.iter().sum::<u32>() as f64 / recovered.len() as f64)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WithdrawalPlan;
    use crate::model::{ReferenceCapital, WithdrawalStrategy};
    use crate::taxes::TaxConfig;
    use std::collections::BTreeMap;

    fn flat_config(rate: f64) -> SimulationConfig {
        SimulationConfig {
            start_date: jiff::civil::date(2025, 1, 1),
            end_year: 2034,
            withdrawal_start_year: 2035, // accumulation only
            initial_capital: 300_000.0,
            monthly_contribution: 0.0,
            annual_contribution_increase: 0.0,
            expense_ratio: 0.0,
            transaction_cost_rate: 0.0,
            events: Vec::new(),
            returns: ReturnConfig::Fixed { rate },
            tax: TaxConfig {
                capital_gains_rate: 0.0,
                partial_exemption: 0.0,
                annual_allowance: 0.0,
                church_tax: false,
                church_tax_rate: 0.0,
            },
            withdrawal: WithdrawalPlan::Single {
                strategy: WithdrawalStrategy::FixedPercentage {
                    rate: 0.04,
                    reference: ReferenceCapital::Initial,
                },
            },
            currency: "EUR".to_string(),
        }
    }

    #[test]
    fn test_half_crash_with_zero_growth_never_recovers() {
        let config = flat_config(0.0);
        let baseline = simulate(&config).unwrap();
        let shock = BlackSwanEvent {
            id: "half".to_string(),
            name: "-50% single year".to_string(),
            duration: 1,
            yearly_returns: BTreeMap::from([(0, -0.5)]),
            recovery_years: None,
        };
        let result = run_stress_scenario(&config, &baseline, &shock, 2026).unwrap();
        assert!((result.capital_loss - 150_000.0).abs() < 1e-6);
        assert!((result.percentage_loss - 50.0).abs() < 1e-9);
        assert_eq!(result.recovery_years, None);
        assert!((result.final_capital - 150_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_recovery_counted_after_crisis_window() {
        // 10% growth everywhere, one -20% year: recovery takes a few years.
        let config = flat_config(0.10);
        let baseline = simulate(&config).unwrap();
        let dip = BlackSwanEvent {
            id: "dip".to_string(),
            name: "-20% dip".to_string(),
            duration: 1,
            yearly_returns: BTreeMap::from([(0, -0.2)]),
            recovery_years: None,
        };
        let result = run_stress_scenario(&config, &baseline, &dip, 2027).unwrap();
        // 0.8 × 1.1^n >= 1 at n = 3.
        assert_eq!(result.recovery_years, Some(3));
        assert!(result.capital_loss > 0.0);
    }

    #[test]
    fn test_full_catalogue_report() {
        let report = run_stress_test(&flat_config(0.05), 2027).unwrap();
        assert_eq!(report.results.len(), BlackSwanEvent::catalogue().len());
        assert!(!report.summary.worst_case.is_empty());
        assert!(report.summary.average_percentage_loss > 0.0);
        // The dotcom sequence is the deepest cumulative drawdown.
        assert_eq!(report.summary.worst_case, "Dotcom Crash (2000-2002)");
    }
}
