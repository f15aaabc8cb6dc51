//! Analysis layer end-to-end: evaluation, ranking, Monte Carlo and
//! sensitivity against the real engine.

use super::plain_config;
use crate::analysis::ranking::StrategyCandidate;
use crate::analysis::{
    ParameterSweep, SweepParameter, WeightProfile, evaluate_strategies, rank_strategies,
    recommended, run_monte_carlo, run_sensitivity_analysis,
};
use crate::model::{ReferenceCapital, ReturnConfig, WithdrawalStrategy};

fn retirement_config() -> crate::config::SimulationConfig {
    let mut config = plain_config(0.04);
    config.end_year = 2054;
    config.withdrawal_start_year = 2025;
    config.initial_capital = 500_000.0;
    config
}

#[test]
fn test_evaluate_and_rank_end_to_end() {
    let candidates = vec![
        StrategyCandidate {
            name: "3% rule".to_string(),
            strategy: WithdrawalStrategy::FixedPercentage {
                rate: 0.03,
                reference: ReferenceCapital::Initial,
            },
        },
        StrategyCandidate {
            name: "heavy spending".to_string(),
            strategy: WithdrawalStrategy::FixedMonthly {
                monthly_amount: 5_000.0,
                inflation_rate: None,
            },
        },
    ];
    let results = evaluate_strategies(&retirement_config(), &candidates).unwrap();
    assert_eq!(results.len(), 2);

    let three_percent = results.iter().find(|r| r.name == "3% rule").unwrap();
    let heavy = results.iter().find(|r| r.name == "heavy spending").unwrap();
    // 3% of 500k at 4% growth never depletes; 60k/year does.
    assert!(three_percent.success);
    assert!(!heavy.success);
    assert!(heavy.portfolio_life_years.is_some());

    let ranked = rank_strategies(results, WeightProfile::Conservative);
    assert_eq!(ranked[0].name, "3% rule");
    assert_eq!(ranked[0].rank, 1);
    assert_eq!(ranked[1].rank, 2);

    let top = recommended(&ranked, 1);
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].name, "3% rule");
}

#[test]
fn test_monte_carlo_certain_survival() {
    let mut config = retirement_config();
    // Zero variance: every iteration is the same guaranteed-survival path.
    config.returns = ReturnConfig::Random {
        mean: 0.05,
        std_dev: 0.0,
        seed: None,
    };
    config.withdrawal = crate::config::WithdrawalPlan::Single {
        strategy: WithdrawalStrategy::FixedPercentage {
            rate: 0.03,
            reference: ReferenceCapital::Current,
        },
    };
    let summary = run_monte_carlo(&config, 200, 11).unwrap();
    assert_eq!(summary.success_rate, 1.0);
    assert_eq!(summary.percentiles.p5, summary.percentiles.p95);
}

#[test]
fn test_sensitivity_ranks_return_above_fees() {
    let mut config = plain_config(0.05);
    config.monthly_contribution = 1_000.0;
    let sweeps = vec![
        ParameterSweep {
            parameter: SweepParameter::ExpenseRatio,
            values: vec![0.0, 0.002, 0.005],
            base_value: 0.002,
        },
        ParameterSweep {
            parameter: SweepParameter::MeanReturn,
            values: vec![0.02, 0.05, 0.09],
            base_value: 0.05,
        },
    ];
    let results = run_sensitivity_analysis(&config, &sweeps).unwrap();
    assert_eq!(results[0].parameter, SweepParameter::MeanReturn);
    assert!(results[0].impact_score > results[1].impact_score);
    // Each sweep records one point per candidate value, in order.
    assert_eq!(results[0].points.len(), 3);
    assert!(results[0].points[0].value < results[0].points[2].value);
}
