//! Command-line harness for the projection library.
//!
//! Reads a JSON plan file, runs the requested analysis, and prints the
//! result as JSON. The plan file carries the `SimulationConfig` plus the
//! optional strategy candidates and sensitivity sweeps the subcommands use.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use ruhestand_core::analysis::{
    ParameterSweep, StrategyCandidate, WeightProfile, evaluate_strategies, rank_strategies,
    recommended, run_monte_carlo, run_sensitivity_analysis, run_stress_test,
};
use ruhestand_core::{SimulationConfig, simulate};

#[derive(Parser, Debug)]
#[command(name = "ruhestand")]
#[command(about = "Wealth projection and withdrawal-strategy comparison")]
struct Args {
    /// Path to the JSON plan file
    #[arg(short, long)]
    plan: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one simulation and print the yearly snapshots
    Simulate,
    /// Sweep the plan's configured parameters and rank them by impact
    Sensitivity,
    /// Replay the crisis catalogue against the plan
    Stress {
        /// Year the crisis begins
        #[arg(long)]
        onset_year: i32,
    },
    /// Aggregate independently seeded random-return runs
    MonteCarlo {
        #[arg(long, default_value_t = 1_000)]
        iterations: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Evaluate and rank the plan's candidate strategies
    Compare {
        #[arg(long, value_enum, default_value_t = Profile::Balanced)]
        profile: Profile,
        /// Print only the top K strategies
        #[arg(long)]
        top: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Profile {
    Conservative,
    Balanced,
    Aggressive,
}

impl From<Profile> for WeightProfile {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::Conservative => WeightProfile::Conservative,
            Profile::Balanced => WeightProfile::Balanced,
            Profile::Aggressive => WeightProfile::Aggressive,
        }
    }
}

/// On-disk plan: the simulation configuration plus the inputs the analysis
/// subcommands need.
#[derive(Debug, Deserialize)]
struct PlanFile {
    simulation: SimulationConfig,
    #[serde(default)]
    candidates: Vec<StrategyCandidate>,
    #[serde(default)]
    sweeps: Vec<ParameterSweep>,
}

fn print_json<T: serde::Serialize>(value: &T) -> color_eyre::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let plan: PlanFile = serde_json::from_str(&fs::read_to_string(&args.plan)?)?;
    tracing::info!(plan = %args.plan.display(), "loaded plan");

    match args.command {
        Command::Simulate => {
            let result = simulate(&plan.simulation)?;
            tracing::info!(
                years = result.years.len(),
                final_capital = result.final_capital(),
                "simulation finished"
            );
            print_json(&result)?;
        }
        Command::Sensitivity => {
            let results = run_sensitivity_analysis(&plan.simulation, &plan.sweeps)?;
            tracing::info!(sweeps = results.len(), "sensitivity analysis finished");
            print_json(&results)?;
        }
        Command::Stress { onset_year } => {
            let report = run_stress_test(&plan.simulation, onset_year)?;
            tracing::info!(
                scenarios = report.results.len(),
                worst_case = %report.summary.worst_case,
                "stress test finished"
            );
            print_json(&report)?;
        }
        Command::MonteCarlo { iterations, seed } => {
            let summary = run_monte_carlo(&plan.simulation, iterations, seed)?;
            tracing::info!(
                iterations,
                success_rate = summary.success_rate,
                "monte carlo finished"
            );
            print_json(&summary)?;
        }
        Command::Compare { profile, top } => {
            let results = evaluate_strategies(&plan.simulation, &plan.candidates)?;
            let ranked = rank_strategies(results, profile.into());
            tracing::info!(candidates = ranked.len(), "strategy comparison finished");
            match top {
                Some(k) => print_json(&recommended(&ranked, k))?,
                None => print_json(&ranked)?,
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_file_parses_minimal_config() {
        let json = r#"{
            "simulation": {
                "start_date": "2025-01-01",
                "end_year": 2060,
                "withdrawal_start_year": 2050,
                "initial_capital": 10000.0,
                "monthly_contribution": 500.0,
                "returns": { "mode": "Fixed", "rate": 0.05 },
                "withdrawal": {
                    "plan": "Single",
                    "strategy": {
                        "type": "FixedPercentage",
                        "rate": 0.04,
                        "reference": "Initial"
                    }
                }
            }
        }"#;
        let plan: PlanFile = serde_json::from_str(json).unwrap();
        assert!(plan.candidates.is_empty());
        assert!(plan.sweeps.is_empty());
        assert!(plan.simulation.validate().is_ok());
    }
}
