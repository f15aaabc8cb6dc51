//! Sensitivity analyzer
//!
//! Perturbs one named configuration parameter across a list of candidate
//! values while holding everything else fixed, including the random seed,
//! and records the resulting outcomes. The impact score compares the spread
//! of final capitals against the result at the base value, so parameters can
//! be ranked by how much the outcome depends on them.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::error::SimulationError;
use crate::model::ReturnConfig;
use crate::simulation::simulate;

/// A configuration field the sensitivity analyzer can sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepParameter {
    InitialCapital,
    MonthlyContribution,
    AnnualContributionIncrease,
    ExpenseRatio,
    /// Fixed rate, random mean, or the base mode behind a black-swan
    /// override, depending on the configured return mode.
    MeanReturn,
}

impl SweepParameter {
    /// Stable declaration order, used to break impact-score ties.
    fn order(self) -> usize {
        match self {
            SweepParameter::InitialCapital => 0,
            SweepParameter::MonthlyContribution => 1,
            SweepParameter::AnnualContributionIncrease => 2,
            SweepParameter::ExpenseRatio => 3,
            SweepParameter::MeanReturn => 4,
        }
    }

    fn apply(self, config: &mut SimulationConfig, value: f64) {
        match self {
            SweepParameter::InitialCapital => config.initial_capital = value,
            SweepParameter::MonthlyContribution => config.monthly_contribution = value,
            SweepParameter::AnnualContributionIncrease => {
                config.annual_contribution_increase = value;
            }
            SweepParameter::ExpenseRatio => config.expense_ratio = value,
            SweepParameter::MeanReturn => apply_mean_return(&mut config.returns, value),
        }
    }
}

fn apply_mean_return(returns: &mut ReturnConfig, value: f64) {
    match returns {
        ReturnConfig::Fixed { rate } => *rate = value,
        ReturnConfig::Random { mean, .. } => *mean = value,
        // Historical series are recorded data; sweeping the mean leaves them
        // untouched.
        ReturnConfig::Historical { .. } => {}
        ReturnConfig::BlackSwan { base, .. } => apply_mean_return(base, value),
    }
}

/// One parameter sweep: the candidate values and the reference value the
/// impact score is measured against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSweep {
    pub parameter: SweepParameter,
    pub values: Vec<f64>,
    pub base_value: f64,
}

/// Outcome of one simulation inside a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    pub value: f64,
    pub final_capital: f64,
    pub total_contributions: f64,
    pub total_gains: f64,
}

/// All points of one sweep plus its impact score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityResult {
    pub parameter: SweepParameter,
    pub points: Vec<SensitivityPoint>,
    /// `(max − min) / base × 100` over final capitals, with base taken at
    /// the value closest to `base_value`.
    pub impact_score: f64,
}

fn run_sweep(
    config: &SimulationConfig,
    sweep: &ParameterSweep,
) -> Result<SensitivityResult, SimulationError> {
    let points = sweep
        .values
        .iter()
        .map(|&value| {
            let mut candidate = config.clone();
            sweep.parameter.apply(&mut candidate, value);
            let result = simulate(&candidate)?;
            Ok(SensitivityPoint {
                value,
                final_capital: result.final_capital(),
                total_contributions: result.total_contributions,
                total_gains: result.total_growth,
            })
        })
        .collect::<Result<Vec<_>, SimulationError>>()?;

    let impact_score = impact_score(&points, sweep.base_value);
    Ok(SensitivityResult {
        parameter: sweep.parameter,
        points,
        impact_score,
    })
}

fn impact_score(points: &[SensitivityPoint], base_value: f64) -> f64 {
    let base = points
        .iter()
        .min_by(|a, b| {
            (a.value - base_value)
                .abs()
                .total_cmp(&(b.value - base_value).abs())
        })
        .map(|p| p.final_capital);
    let (Some(base), Some(min), Some(max)) = (
        base,
        points
            .iter()
            .map(|p| p.final_capital)
            .min_by(f64::total_cmp),
        points
            .iter()
            .map(|p| p.final_capital)
            .max_by(f64::total_cmp),
    ) else {
        return 0.0;
    };
    if base.abs() < f64::EPSILON {
        0.0
    } else {
        (max - min) / base * 100.0
    }
}

/// Run every sweep against the same base configuration and rank the results
/// by descending impact score. Ties keep parameter declaration order.
pub fn run_sensitivity_analysis(
    config: &SimulationConfig,
    sweeps: &[ParameterSweep],
) -> Result<Vec<SensitivityResult>, SimulationError> {
    config.validate()?;

    #[cfg(feature = "parallel")]
    let mut results = sweeps
        .par_iter()
        .map(|sweep| run_sweep(config, sweep))
        .collect::<Result<Vec<_>, SimulationError>>()?;

    #[cfg(not(feature = "parallel"))]
    let mut results = sweeps
        .iter()
        .map(|sweep| run_sweep(config, sweep))
        .collect::<Result<Vec<_>, SimulationError>>()?;

    results.sort_by(|a, b| {
        b.impact_score
            .total_cmp(&a.impact_score)
            .then_with(|| a.parameter.order().cmp(&b.parameter.order()))
    });
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WithdrawalPlan;
    use crate::model::{ReferenceCapital, WithdrawalStrategy};
    use crate::taxes::TaxConfig;

    fn config() -> SimulationConfig {
        SimulationConfig {
            start_date: jiff::civil::date(2025, 1, 1),
            end_year: 2044,
            withdrawal_start_year: 2045, // never decumulates
            initial_capital: 50_000.0,
            monthly_contribution: 500.0,
            annual_contribution_increase: 0.0,
            expense_ratio: 0.0,
            transaction_cost_rate: 0.0,
            events: Vec::new(),
            returns: ReturnConfig::Fixed { rate: 0.05 },
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
    fn test_sweep_is_monotone_in_contribution() {
        let sweep = ParameterSweep {
            parameter: SweepParameter::MonthlyContribution,
            values: vec![100.0, 500.0, 1_000.0],
            base_value: 500.0,
        };
        let results = run_sensitivity_analysis(&config(), &[sweep]).unwrap();
        let points = &results[0].points;
        assert!(points[0].final_capital < points[1].final_capital);
        assert!(points[1].final_capital < points[2].final_capital);
        assert!(results[0].impact_score > 0.0);
    }

    #[test]
    fn test_ranking_is_descending_and_stable() {
        let sweeps = vec![
            ParameterSweep {
                parameter: SweepParameter::ExpenseRatio,
                values: vec![0.0, 0.005, 0.01],
                base_value: 0.005,
            },
            ParameterSweep {
                parameter: SweepParameter::MeanReturn,
                values: vec![0.02, 0.05, 0.08],
                base_value: 0.05,
            },
        ];
        let results = run_sensitivity_analysis(&config(), &sweeps).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].impact_score >= results[1].impact_score);
        // The return assumption dominates a half-percent fee spread.
        assert_eq!(results[0].parameter, SweepParameter::MeanReturn);
    }

    #[test]
    fn test_seed_held_fixed_across_sweep() {
        let mut cfg = config();
        cfg.returns = ReturnConfig::Random {
            mean: 0.05,
            std_dev: 0.10,
            seed: Some(7),
        };
        let sweep = ParameterSweep {
            parameter: SweepParameter::InitialCapital,
            values: vec![50_000.0, 50_000.0],
            base_value: 50_000.0,
        };
        let results = run_sensitivity_analysis(&cfg, &[sweep]).unwrap();
        // Identical value + identical seed: bit-identical outcome.
        assert_eq!(
            results[0].points[0].final_capital,
            results[0].points[1].final_capital
        );
    }
}
