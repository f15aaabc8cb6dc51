//! Strategy ranker
//!
//! `evaluate_strategies` runs the engine once per candidate strategy and
//! produces one comparison row each; `rank_strategies` is a pure function
//! over those rows: it normalizes the four ranking metrics to a shared
//! 0-100 scale across the candidate set, applies the weight profile, and
//! orders by descending score with stable ties.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{SimulationConfig, WithdrawalPlan};
use crate::error::SimulationError;
use crate::model::{StrategyComparisonResult, WithdrawalStrategy};
use crate::simulation::simulate;

/// A named withdrawal strategy to evaluate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyCandidate {
    pub name: String,
    pub strategy: WithdrawalStrategy,
}

/// Fixed weight vectors over {portfolio life, total withdrawal, capital
/// preservation, stability}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeightProfile {
    Conservative,
    Balanced,
    Aggressive,
}

struct Weights {
    portfolio_life: f64,
    total_withdrawal: f64,
    capital_preservation: f64,
    stability: f64,
}

impl WeightProfile {
    fn weights(self) -> Weights {
        match self {
            WeightProfile::Conservative => Weights {
                portfolio_life: 0.40,
                total_withdrawal: 0.10,
                capital_preservation: 0.30,
                stability: 0.20,
            },
            WeightProfile::Balanced => Weights {
                portfolio_life: 0.25,
                total_withdrawal: 0.25,
                capital_preservation: 0.25,
                stability: 0.25,
            },
            WeightProfile::Aggressive => Weights {
                portfolio_life: 0.05,
                total_withdrawal: 0.55,
                capital_preservation: 0.25,
                stability: 0.15,
            },
        }
    }
}

/// Run the engine once per candidate and collect unranked comparison rows.
pub fn evaluate_strategies(
    config: &SimulationConfig,
    candidates: &[StrategyCandidate],
) -> Result<Vec<StrategyComparisonResult>, SimulationError> {
    let evaluate = |candidate: &StrategyCandidate| {
        let mut candidate_config = config.clone();
        candidate_config.withdrawal = WithdrawalPlan::Single {
            strategy: candidate.strategy.clone(),
        };
        let result = simulate(&candidate_config)?;
        Ok(StrategyComparisonResult {
            name: candidate.name.clone(),
            strategy: candidate.strategy.clone(),
            final_capital: result.final_capital(),
            total_withdrawn: result.total_withdrawn,
            average_annual_withdrawal: result.average_annual_withdrawal(),
            portfolio_life_years: result.portfolio_life_years(),
            success: result.depletion_year.is_none(),
            downside_risk: result.max_drawdown_percent(),
            overall_score: 0.0,
            rank: 0,
        })
    };

    #[cfg(feature = "parallel")]
    let results = candidates
        .par_iter()
        .map(evaluate)
        .collect::<Result<Vec<_>, SimulationError>>()?;

    #[cfg(not(feature = "parallel"))]
    let results = candidates
        .iter()
        .map(evaluate)
        .collect::<Result<Vec<_>, SimulationError>>()?;

    Ok(results)
}

/// Normalize a metric vector to 0-100 across the candidate set. A constant
/// metric maps everyone to 50 so it neither rewards nor penalizes.
fn normalize(values: &[f64]) -> Vec<f64> {
    let (Some(min), Some(max)) = (
        values.iter().copied().min_by(f64::total_cmp),
        values.iter().copied().max_by(f64::total_cmp),
    ) else {
        return Vec::new();
    };
    if (max - min).abs() < f64::EPSILON {
        return vec![50.0; values.len()];
    }
    values
        .iter()
        .map(|v| (v - min) / (max - min) * 100.0)
        .collect()
}

/// Score and rank an evaluated candidate set. Pure: no simulation happens
/// here, and re-ranking an already-ranked set with the same profile leaves
/// the order unchanged.
#[must_use]
pub fn rank_strategies(
    mut results: Vec<StrategyComparisonResult>,
    profile: WeightProfile,
) -> Vec<StrategyComparisonResult> {
    if results.is_empty() {
        return results;
    }
    let weights = profile.weights();

    // A portfolio that outlives the horizon beats every finite life.
    let longest_finite = results
        .iter()
        .filter_map(|r| r.portfolio_life_years)
        .max()
        .unwrap_or(0);
    let life: Vec<f64> = results
        .iter()
        .map(|r| {
            r.portfolio_life_years
                .map_or(f64::from(longest_finite + 1), f64::from)
        })
        .collect();
    let withdrawal: Vec<f64> = results.iter().map(|r| r.total_withdrawn).collect();
    let preservation: Vec<f64> = results.iter().map(|r| r.final_capital).collect();
    // Lower drawdown is better, so stability is the negated risk.
    let stability: Vec<f64> = results.iter().map(|r| -r.downside_risk).collect();

    let life = normalize(&life);
    let withdrawal = normalize(&withdrawal);
    let preservation = normalize(&preservation);
    let stability = normalize(&stability);

    for (i, result) in results.iter_mut().enumerate() {
        result.overall_score = weights.portfolio_life * life[i]
            + weights.total_withdrawal * withdrawal[i]
            + weights.capital_preservation * preservation[i]
            + weights.stability * stability[i];
    }

    // Stable sort: equal scores keep their incoming order.
    results.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score));
    for (i, result) in results.iter_mut().enumerate() {
        result.rank = i + 1;
    }
    results
}

/// Top-K rows of an already-ranked comparison.
#[must_use]
pub fn recommended(
    results: &[StrategyComparisonResult],
    k: usize,
) -> Vec<StrategyComparisonResult> {
    results.iter().take(k).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReferenceCapital;

    fn row(name: &str, final_capital: f64, withdrawn: f64, risk: f64) -> StrategyComparisonResult {
        StrategyComparisonResult {
            name: name.to_string(),
            strategy: WithdrawalStrategy::FixedPercentage {
                rate: 0.04,
                reference: ReferenceCapital::Initial,
            },
            final_capital,
            total_withdrawn: withdrawn,
            average_annual_withdrawal: withdrawn / 20.0,
            portfolio_life_years: None,
            success: true,
            downside_risk: risk,
            overall_score: 0.0,
            rank: 0,
        }
    }

    #[test]
    fn test_rank_descending_with_rank_one_best() {
        let ranked = rank_strategies(
            vec![
                row("weak", 50_000.0, 200_000.0, 40.0),
                row("strong", 400_000.0, 500_000.0, 10.0),
                row("middle", 200_000.0, 350_000.0, 25.0),
            ],
            WeightProfile::Balanced,
        );
        assert_eq!(ranked[0].name, "strong");
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[2].name, "weak");
        assert_eq!(ranked[2].rank, 3);
        assert!(ranked[0].overall_score >= ranked[1].overall_score);
    }

    #[test]
    fn test_ranking_idempotent() {
        let once = rank_strategies(
            vec![
                row("a", 100_000.0, 300_000.0, 30.0),
                row("b", 250_000.0, 250_000.0, 20.0),
                row("c", 180_000.0, 280_000.0, 15.0),
            ],
            WeightProfile::Conservative,
        );
        let twice = rank_strategies(once.clone(), WeightProfile::Conservative);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unlimited_life_beats_finite() {
        let mut depleting = row("depleting", 0.0, 600_000.0, 60.0);
        depleting.portfolio_life_years = Some(18);
        depleting.success = false;
        let surviving = row("surviving", 300_000.0, 400_000.0, 20.0);
        let ranked = rank_strategies(vec![depleting, surviving], WeightProfile::Conservative);
        assert_eq!(ranked[0].name, "surviving");
    }

    #[test]
    fn test_profiles_can_disagree() {
        // High payout but depleting vs. modest payout that survives.
        let mut spender = row("spender", 0.0, 900_000.0, 55.0);
        spender.portfolio_life_years = Some(22);
        spender.success = false;
        let keeper = row("keeper", 350_000.0, 450_000.0, 18.0);

        let conservative =
            rank_strategies(vec![spender.clone(), keeper.clone()], WeightProfile::Conservative);
        let aggressive = rank_strategies(vec![spender, keeper], WeightProfile::Aggressive);
        assert_eq!(conservative[0].name, "keeper");
        assert_eq!(aggressive[0].name, "spender");
    }
}
