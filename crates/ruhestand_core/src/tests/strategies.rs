//! Withdrawal strategies inside the full engine: bucket mechanics,
//! depletion clamping and segment switching.

use super::plain_config;
use crate::config::WithdrawalPlan;
use crate::model::{ReferenceCapital, Segment, WithdrawalStrategy};
use crate::simulation::simulate;

fn decumulating_config(initial_capital: f64) -> crate::config::SimulationConfig {
    let mut config = plain_config(0.0);
    config.initial_capital = initial_capital;
    config.withdrawal_start_year = 2025; // decumulation from day one
    config
}

#[test]
fn test_bucket_first_year_draws_cushion_only() {
    let mut config = decumulating_config(500_000.0);
    config.withdrawal = WithdrawalPlan::Single {
        strategy: WithdrawalStrategy::Bucket {
            initial_cushion: 20_000.0,
            refill_threshold: 5_000.0,
            refill_fraction: 0.5,
            base: Box::new(WithdrawalStrategy::FixedPercentage {
                rate: 0.04,
                reference: ReferenceCapital::Initial,
            }),
        },
    };
    let result = simulate(&config).unwrap();

    // Year one: 4% of 500k = 20k, served entirely by the carved-out
    // cushion; the growth portfolio stays at 480k.
    let first = &result.years[0];
    assert!((first.withdrawal - 20_000.0).abs() < 1e-9);
    assert!((first.end_capital - 480_000.0).abs() < 1e-9);

    // Year two: the cushion is empty and flat returns produce no gain to
    // refill from, so the portfolio pays directly.
    let second = &result.years[1];
    assert!((second.withdrawal - 20_000.0).abs() < 1e-9);
    assert!((second.end_capital - 460_000.0).abs() < 1e-9);
}

#[test]
fn test_depletion_clamps_and_zeroes_tail() {
    let mut config = decumulating_config(100_000.0);
    config.withdrawal = WithdrawalPlan::Single {
        strategy: WithdrawalStrategy::FixedMonthly {
            monthly_amount: 2_000.0,
            inflation_rate: None,
        },
    };
    let result = simulate(&config).unwrap();

    // 24k/year from 100k at 0% growth: 4 full years, partial fifth.
    assert_eq!(result.depletion_year, Some(2029));
    let depletion = result.years.iter().find(|y| y.year == 2029).unwrap();
    assert!(depletion.depleted);
    assert!((depletion.withdrawal - 4_000.0).abs() < 1e-9);
    assert_eq!(depletion.end_capital, 0.0);

    for year in result.years.iter().filter(|y| y.year > 2029) {
        assert!(year.depleted);
        assert_eq!(year.withdrawal, 0.0);
        assert_eq!(year.end_capital, 0.0);
    }
    for year in &result.years {
        assert!(year.end_capital >= 0.0);
    }
    assert_eq!(result.portfolio_life_years(), Some(5));
    assert!((result.total_withdrawn - 100_000.0).abs() < 1e-9);
}

#[test]
fn test_segment_switch_changes_withdrawal() {
    let mut config = decumulating_config(500_000.0);
    config.withdrawal = WithdrawalPlan::Segmented {
        segments: vec![
            Segment {
                start_year: 2025,
                end_year: 2029,
                strategy: WithdrawalStrategy::FixedMonthly {
                    monthly_amount: 1_000.0,
                    inflation_rate: None,
                },
            },
            Segment {
                start_year: 2030,
                end_year: 2034,
                strategy: WithdrawalStrategy::FixedMonthly {
                    monthly_amount: 2_000.0,
                    inflation_rate: None,
                },
            },
        ],
    };
    let result = simulate(&config).unwrap();

    assert!((result.capital_at_year(2029).unwrap() - 440_000.0).abs() < 1e-9);
    let before = result.years.iter().find(|y| y.year == 2029).unwrap();
    let after = result.years.iter().find(|y| y.year == 2030).unwrap();
    assert!((before.withdrawal - 12_000.0).abs() < 1e-9);
    assert!((after.withdrawal - 24_000.0).abs() < 1e-9);
    assert!((result.final_capital() - 320_000.0).abs() < 1e-9);
}

#[test]
fn test_bucket_segment_folds_cushion_back() {
    // Bucket for five years, then a plain strategy: the cushion must fold
    // back into the portfolio, losing nothing.
    let mut config = decumulating_config(500_000.0);
    config.withdrawal = WithdrawalPlan::Segmented {
        segments: vec![
            Segment {
                start_year: 2025,
                end_year: 2029,
                strategy: WithdrawalStrategy::Bucket {
                    initial_cushion: 50_000.0,
                    refill_threshold: 10_000.0,
                    refill_fraction: 0.5,
                    base: Box::new(WithdrawalStrategy::FixedMonthly {
                        monthly_amount: 1_000.0,
                        inflation_rate: None,
                    }),
                },
            },
            Segment {
                start_year: 2030,
                end_year: 2034,
                strategy: WithdrawalStrategy::FixedMonthly {
                    monthly_amount: 2_000.0,
                    inflation_rate: None,
                },
            },
        ],
    };
    let result = simulate(&config).unwrap();

    // Flat returns: withdrawals are the only outflow, cushion or not.
    assert!((result.final_capital() - 320_000.0).abs() < 1e-9);
    for pair in result.years.windows(2) {
        assert_eq!(pair[0].end_capital, pair[1].start_capital);
    }
}
