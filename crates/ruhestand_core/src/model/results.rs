//! Simulation results and snapshots
//!
//! The engine emits one immutable `SimulationYear` per simulated year, in
//! chronological order, plus run-level aggregates on `SimulationResult`.

use serde::{Deserialize, Serialize};

use crate::model::{EventId, Phase, WithdrawalStrategy};

/// A ledger entry realized in a specific simulated year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealizedCashFlow {
    pub event_id: EventId,
    pub name: String,
    /// Signed amount before taxes and financing.
    pub gross_amount: f64,
    /// Signed amount actually applied to capital (net of inheritance tax,
    /// or the annual installment for financed expenses).
    pub net_amount: f64,
}

/// One year's snapshot. Immutable once produced.
///
/// Invariant: `end_capital = start_capital + gross_growth - fees - tax_paid
/// + net cash flows - withdrawal`, and year N's `end_capital` equals year
/// N+1's `start_capital`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationYear {
    pub year: i32,
    pub phase: Phase,
    pub start_capital: f64,
    /// Return rate applied this year.
    pub return_rate: f64,
    pub gross_growth: f64,
    pub fees: f64,
    pub tax_paid: f64,
    /// Ledger entries realized this year, including the synthetic recurring
    /// contribution flow.
    pub cash_flows: Vec<RealizedCashFlow>,
    /// 0 in accumulation.
    pub withdrawal: f64,
    pub end_capital: f64,
    /// True from the depletion year onwards.
    pub depleted: bool,
}

impl SimulationYear {
    /// Sum of net cash flows realized this year.
    #[must_use]
    pub fn net_cash_flow(&self) -> f64 {
        self.cash_flows.iter().map(|c| c.net_amount).sum()
    }
}

/// Complete results from a single simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub years: Vec<SimulationYear>,
    pub total_contributions: f64,
    pub total_growth: f64,
    pub total_fees: f64,
    pub total_taxes: f64,
    pub total_withdrawn: f64,
    /// Year the portfolio ran dry, if it did.
    pub depletion_year: Option<i32>,
    /// False when a historical return series did not cover the full horizon
    /// and the long-run-average fallback was used for some years.
    pub full_return_coverage: bool,
}

impl SimulationResult {
    /// Capital at the end of the last simulated year.
    #[must_use]
    pub fn final_capital(&self) -> f64 {
        self.years.last().map_or(0.0, |y| y.end_capital)
    }

    /// End-of-year capital for a calendar year, if simulated.
    #[must_use]
    pub fn capital_at_year(&self, year: i32) -> Option<f64> {
        self.years
            .iter()
            .find(|y| y.year == year)
            .map(|y| y.end_capital)
    }

    /// Average withdrawal over the decumulation years actually simulated.
    #[must_use]
    pub fn average_annual_withdrawal(&self) -> f64 {
        let decumulation_years = self
            .years
            .iter()
            .filter(|y| y.phase == Phase::Decumulation)
            .count();
        if decumulation_years == 0 {
            0.0
        } else {
            self.total_withdrawn / decumulation_years as f64
        }
    }

    /// Years the portfolio lasted from decumulation start, or `None` when
    /// it survived the whole horizon ("unlimited").
    #[must_use]
    pub fn portfolio_life_years(&self) -> Option<u32> {
        let depletion_year = self.depletion_year?;
        let first_decumulation = self
            .years
            .iter()
            .find(|y| y.phase == Phase::Decumulation)
            .map(|y| y.year)?;
        Some((depletion_year - first_decumulation).max(0) as u32 + 1)
    }

    /// Largest peak-to-trough decline of end-of-year capital, as a
    /// percentage of the peak. 0 when capital never declines.
    #[must_use]
    pub fn max_drawdown_percent(&self) -> f64 {
        let mut peak = f64::MIN;
        let mut worst = 0.0_f64;
        for year in &self.years {
            peak = peak.max(year.end_capital);
            if peak > 0.0 {
                let drawdown = (peak - year.end_capital) / peak * 100.0;
                worst = worst.max(drawdown);
            }
        }
        worst
    }
}

/// One row of a strategy comparison, scored and ranked by the ranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyComparisonResult {
    pub name: String,
    pub strategy: WithdrawalStrategy,
    pub final_capital: f64,
    pub total_withdrawn: f64,
    pub average_annual_withdrawal: f64,
    /// `None` means the portfolio outlived the horizon ("unlimited").
    pub portfolio_life_years: Option<u32>,
    /// Whether capital stayed positive through the full horizon.
    pub success: bool,
    /// Maximum drawdown in percent; lower is better.
    pub downside_risk: f64,
    /// Weighted 0-100 score assigned by the ranker.
    pub overall_score: f64,
    /// 1 = best. 0 until ranked.
    pub rank: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(year: i32, phase: Phase, end_capital: f64) -> SimulationYear {
        SimulationYear {
            year,
            phase,
            start_capital: 0.0,
            return_rate: 0.0,
            gross_growth: 0.0,
            fees: 0.0,
            tax_paid: 0.0,
            cash_flows: Vec::new(),
            withdrawal: 0.0,
            end_capital,
            depleted: false,
        }
    }

    #[test]
    fn test_max_drawdown() {
        let result = SimulationResult {
            years: vec![
                snapshot(2025, Phase::Accumulation, 100.0),
                snapshot(2026, Phase::Accumulation, 150.0),
                snapshot(2027, Phase::Accumulation, 75.0),
                snapshot(2028, Phase::Accumulation, 160.0),
            ],
            total_contributions: 0.0,
            total_growth: 0.0,
            total_fees: 0.0,
            total_taxes: 0.0,
            total_withdrawn: 0.0,
            depletion_year: None,
            full_return_coverage: true,
        };
        // Peak 150 -> trough 75 = 50%
        assert!((result.max_drawdown_percent() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_portfolio_life() {
        let result = SimulationResult {
            years: vec![
                snapshot(2040, Phase::Decumulation, 50.0),
                snapshot(2041, Phase::Decumulation, 20.0),
                snapshot(2042, Phase::Decumulation, 0.0),
            ],
            total_contributions: 0.0,
            total_growth: 0.0,
            total_fees: 0.0,
            total_taxes: 0.0,
            total_withdrawn: 60.0,
            depletion_year: Some(2042),
            full_return_coverage: true,
        };
        assert_eq!(result.portfolio_life_years(), Some(3));
        assert!((result.average_annual_withdrawal() - 20.0).abs() < 1e-9);
    }
}
