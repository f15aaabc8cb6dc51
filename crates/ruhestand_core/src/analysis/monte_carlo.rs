//! Monte Carlo aggregator
//!
//! Runs N independent simulations with per-iteration seeds derived from one
//! master seed, then summarizes the distribution of final capitals. Seeds
//! are drawn per batch from a batch-indexed generator, so the set of seeds
//! (and therefore the summary) is identical whether batches run
//! sequentially or in parallel.

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::error::SimulationError;
use crate::model::ReturnConfig;
use crate::simulation::simulate;

const MAX_BATCH_SIZE: usize = 100;

/// Percentile bands of the final-capital distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileBands {
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloSummary {
    pub iterations: usize,
    /// Fraction of runs whose portfolio never depleted.
    pub success_rate: f64,
    pub mean_final_capital: f64,
    pub percentiles: PercentileBands,
}

#[derive(Debug, Clone, Copy)]
struct IterationOutcome {
    final_capital: f64,
    depleted: bool,
}

fn run_iteration(
    config: &SimulationConfig,
    seed: u64,
) -> Result<IterationOutcome, SimulationError> {
    let mut candidate = config.clone();
    reseed(&mut candidate.returns, seed);
    let result = simulate(&candidate)?;
    Ok(IterationOutcome {
        final_capital: result.final_capital(),
        depleted: result.depletion_year.is_some(),
    })
}

fn reseed(returns: &mut ReturnConfig, seed: u64) {
    match returns {
        ReturnConfig::Random { seed: s, .. } => *s = Some(seed),
        ReturnConfig::BlackSwan { base, .. } => reseed(base, seed),
        // Deterministic modes ignore the seed; every iteration is identical.
        ReturnConfig::Fixed { .. } | ReturnConfig::Historical { .. } => {}
    }
}

fn batch_seeds(master_seed: u64, batch: usize, batch_size: usize) -> Vec<u64> {
    let mut rng = SmallRng::seed_from_u64(master_seed.wrapping_add(batch as u64));
    (0..batch_size).map(|_| rng.next_u64()).collect()
}

/// Run `iterations` independently seeded simulations and summarize them.
pub fn run_monte_carlo(
    config: &SimulationConfig,
    iterations: usize,
    master_seed: u64,
) -> Result<MonteCarloSummary, SimulationError> {
    config.validate()?;

    let num_batches = iterations.div_ceil(MAX_BATCH_SIZE);
    let batch_size = |batch: usize| {
        if batch == num_batches - 1 {
            iterations - batch * MAX_BATCH_SIZE
        } else {
            MAX_BATCH_SIZE
        }
    };

    #[cfg(feature = "parallel")]
    let outcomes = (0..num_batches)
        .into_par_iter()
        .flat_map(|batch| {
            batch_seeds(master_seed, batch, batch_size(batch))
                .into_iter()
                .map(|seed| run_iteration(config, seed))
                .collect::<Vec<_>>()
        })
        .collect::<Result<Vec<_>, SimulationError>>()?;

    #[cfg(not(feature = "parallel"))]
    let outcomes = (0..num_batches)
        .flat_map(|batch| {
            batch_seeds(master_seed, batch, batch_size(batch))
                .into_iter()
                .map(|seed| run_iteration(config, seed))
                .collect::<Vec<_>>()
        })
        .collect::<Result<Vec<_>, SimulationError>>()?;

    let mut finals: Vec<f64> = outcomes.iter().map(|o| o.final_capital).collect();
    finals.sort_by(f64::total_cmp);
    let successes = outcomes.iter().filter(|o| !o.depleted).count();
    let count = outcomes.len().max(1) as f64;

    Ok(MonteCarloSummary {
        iterations: outcomes.len(),
        success_rate: successes as f64 / count,
        mean_final_capital: finals.iter().sum::<f64>() / count,
        percentiles: PercentileBands {
            p5: percentile(&finals, 0.05),
            p25: percentile(&finals, 0.25),
            p50: percentile(&finals, 0.50),
            p75: percentile(&finals, 0.75),
            p95: percentile(&finals, 0.95),
        },
    })
}

/// Nearest-rank percentile over an already-sorted slice.
fn percentile(sorted: &[f64], fraction: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = (fraction * (sorted.len() - 1) as f64).round() as usize;
    sorted[index.min(sorted.len() - 1)]
}
