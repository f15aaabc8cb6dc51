//! Withdrawal strategies
//!
//! Each strategy kind maps the current withdrawal state to an amount and an
//! updated state. The functions here are pure; the engine owns the state and
//! threads it through year by year.

use serde::{Deserialize, Serialize};

/// Which capital a percentage-based withdrawal refers to.
///
/// The distinction is explicit in configuration, never inferred: `Initial`
/// freezes the capital at decumulation start, `Current` recalculates from
/// each year's capital.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceCapital {
    Initial,
    Current,
}

/// Withdrawal-amount policy for the decumulation phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WithdrawalStrategy {
    /// Fixed percentage of the reference capital (e.g. the 4% rule).
    FixedPercentage {
        rate: f64,
        reference: ReferenceCapital,
    },
    /// Fixed monthly amount, optionally compounding with inflation.
    FixedMonthly {
        monthly_amount: f64,
        #[serde(default)]
        inflation_rate: Option<f64>,
    },
    /// Base rate adjusted when the prior year's return crosses a threshold.
    /// Adjustments never compound: each year starts from `base_rate` and
    /// applies at most one adjustment.
    Dynamic {
        base_rate: f64,
        upper_threshold_return: f64,
        upper_adjustment: f64,
        lower_threshold_return: f64,
        lower_adjustment: f64,
    },
    /// Cash-cushion strategy: withdrawals drain the cushion first, and the
    /// cushion is refilled from positive growth-portfolio gains whenever it
    /// falls below the threshold. The target amount comes from the embedded
    /// base strategy applied to total (cushion + growth) capital.
    Bucket {
        initial_cushion: f64,
        refill_threshold: f64,
        refill_fraction: f64,
        base: Box<WithdrawalStrategy>,
    },
}

impl WithdrawalStrategy {
    /// Short display name used in comparison tables.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            WithdrawalStrategy::FixedPercentage { .. } => "fixed percentage",
            WithdrawalStrategy::FixedMonthly { .. } => "fixed monthly",
            WithdrawalStrategy::Dynamic { .. } => "dynamic",
            WithdrawalStrategy::Bucket { .. } => "bucket",
        }
    }

    /// Whether this strategy maintains a cash cushion.
    #[must_use]
    pub fn is_bucket(&self) -> bool {
        matches!(self, WithdrawalStrategy::Bucket { .. })
    }
}

/// Mutable state a strategy operates on for one year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WithdrawalState {
    /// Growth-portfolio capital (excludes the cushion).
    pub capital: f64,
    /// Total capital at decumulation start, frozen for `Initial` references.
    pub initial_capital: f64,
    /// Completed decumulation years before this one (0 in the first year).
    pub years_elapsed: u32,
    /// Return applied in the prior year, for dynamic thresholds.
    pub prior_year_return: f64,
    /// Cash cushion balance (bucket strategies only, otherwise 0).
    pub cushion: f64,
    /// Growth-portfolio value at the last cushion refill.
    pub last_refill_capital: f64,
}

impl WithdrawalState {
    /// Total capital visible to the retiree: growth portfolio plus cushion.
    #[must_use]
    pub fn total_capital(&self) -> f64 {
        self.capital + self.cushion
    }
}

/// Result of one year's withdrawal computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WithdrawalOutcome {
    /// Amount the strategy wanted to withdraw before clamping.
    pub requested: f64,
    /// Amount actually withdrawn (clamped at available capital).
    pub amount: f64,
    pub from_cushion: f64,
    pub from_portfolio: f64,
    /// Amount moved from the growth portfolio into the cushion this year.
    pub refill: f64,
    pub state: WithdrawalState,
}

impl WithdrawalStrategy {
    /// Target amount before availability clamping.
    fn target_amount(&self, state: &WithdrawalState) -> f64 {
        match self {
            WithdrawalStrategy::FixedPercentage { rate, reference } => {
                let base = match reference {
                    ReferenceCapital::Initial => state.initial_capital,
                    ReferenceCapital::Current => state.total_capital(),
                };
                rate * base
            }
            WithdrawalStrategy::FixedMonthly {
                monthly_amount,
                inflation_rate,
            } => {
                let yearly = monthly_amount * 12.0;
                match inflation_rate {
                    Some(inflation) => {
                        yearly * (1.0 + inflation).powi(state.years_elapsed as i32)
                    }
                    None => yearly,
                }
            }
            WithdrawalStrategy::Dynamic {
                base_rate,
                upper_threshold_return,
                upper_adjustment,
                lower_threshold_return,
                lower_adjustment,
            } => {
                let rate = if state.prior_year_return > *upper_threshold_return {
                    base_rate + upper_adjustment
                } else if state.prior_year_return < *lower_threshold_return {
                    base_rate + lower_adjustment
                } else {
                    *base_rate
                };
                rate.max(0.0) * state.total_capital()
            }
            WithdrawalStrategy::Bucket { base, .. } => base.target_amount(state),
        }
    }

    /// Compute this year's withdrawal and the updated state.
    #[must_use]
    pub fn compute_withdrawal(&self, state: WithdrawalState) -> WithdrawalOutcome {
        let requested = self.target_amount(&state);
        let mut state = state;

        match self {
            WithdrawalStrategy::Bucket {
                refill_threshold,
                refill_fraction,
                ..
            } => {
                // Cushion-first draw.
                let from_cushion = requested.min(state.cushion);
                state.cushion -= from_cushion;
                let from_portfolio = (requested - from_cushion).min(state.capital);
                state.capital -= from_portfolio;

                // Opportunistic refill from gains since the last refill,
                // never driving the growth portfolio negative.
                let mut refill = 0.0;
                if state.cushion < *refill_threshold {
                    let gain = state.capital - state.last_refill_capital;
                    if gain > 0.0 {
                        refill = (refill_fraction * gain).min(state.capital);
                        state.capital -= refill;
                        state.cushion += refill;
                        state.last_refill_capital = state.capital;
                    }
                }

                WithdrawalOutcome {
                    requested,
                    amount: from_cushion + from_portfolio,
                    from_cushion,
                    from_portfolio,
                    refill,
                    state,
                }
            }
            _ => {
                let from_portfolio = requested.min(state.capital);
                state.capital -= from_portfolio;
                WithdrawalOutcome {
                    requested,
                    amount: from_portfolio,
                    from_cushion: 0.0,
                    from_portfolio,
                    refill: 0.0,
                    state,
                }
            }
        }
    }
}
