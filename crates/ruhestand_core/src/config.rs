//! Simulation configuration
//!
//! `SimulationConfig` is the single immutable value the engine consumes.
//! The caller (form layer, CLI, test) assembles it; `validate()` checks the
//! whole thing once, before any year is simulated, and reports every
//! problem it finds in one `ValidationError`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigIssue, ValidationError};
use crate::model::{
    CashFlowEvent, EventId, EventKind, ReturnConfig, Segment, SegmentSchedule,
    WithdrawalStrategy,
};
use crate::taxes::TaxConfig;

/// Withdrawal policy for the decumulation phase: one strategy throughout,
/// or a validated segment schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "plan")]
pub enum WithdrawalPlan {
    Single { strategy: WithdrawalStrategy },
    Segmented { segments: Vec<Segment> },
}

fn default_currency() -> String {
    "EUR".to_string()
}

/// Complete configuration for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Date the plan starts. Recurring contributions in the first calendar
    /// year are prorated to the months from this date onward.
    pub start_date: jiff::civil::Date,
    /// Last simulated year, inclusive.
    pub end_year: i32,
    /// First decumulation year. Years before it are accumulation; a value
    /// past `end_year` means the plan never decumulates.
    pub withdrawal_start_year: i32,
    pub initial_capital: f64,
    /// Contribution per month during accumulation.
    pub monthly_contribution: f64,
    /// Yearly step-up of the contribution, e.g. 0.02 for +2% per year.
    #[serde(default)]
    pub annual_contribution_increase: f64,
    /// Recurring fee on capital (TER / expense ratio).
    #[serde(default)]
    pub expense_ratio: f64,
    /// Fee on each contribution (transaction costs).
    #[serde(default)]
    pub transaction_cost_rate: f64,
    #[serde(default)]
    pub events: Vec<CashFlowEvent>,
    pub returns: ReturnConfig,
    #[serde(default)]
    pub tax: TaxConfig,
    pub withdrawal: WithdrawalPlan,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl SimulationConfig {
    /// First simulated calendar year.
    #[must_use]
    pub fn start_year(&self) -> i32 {
        i32::from(self.start_date.year())
    }

    /// Number of simulated years (inclusive range).
    #[must_use]
    pub fn num_years(&self) -> usize {
        (self.end_year - self.start_year() + 1).max(0) as usize
    }

    /// First and last decumulation year, if the horizon reaches that far.
    #[must_use]
    pub fn decumulation_range(&self) -> Option<(i32, i32)> {
        if self.withdrawal_start_year > self.end_year {
            None
        } else {
            Some((
                self.withdrawal_start_year.max(self.start_year()),
                self.end_year,
            ))
        }
    }

    /// Validate the whole configuration, collecting every violation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.end_year < self.start_year() {
            issues.push(ConfigIssue::InvertedYearRange {
                start_year: self.start_year(),
                end_year: self.end_year,
            });
        }
        if self.initial_capital < 0.0 {
            issues.push(ConfigIssue::NegativeInitialCapital(self.initial_capital));
        }
        if self.monthly_contribution < 0.0 {
            issues.push(ConfigIssue::NegativeContribution(self.monthly_contribution));
        }

        for (field, value) in [
            ("expense_ratio", self.expense_ratio),
            ("transaction_cost_rate", self.transaction_cost_rate),
            ("capital_gains_rate", self.tax.capital_gains_rate),
            ("partial_exemption", self.tax.partial_exemption),
            ("church_tax_rate", self.tax.church_tax_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                issues.push(ConfigIssue::RateOutOfRange { field, value });
            }
        }

        self.validate_returns(&self.returns, &mut issues);
        self.validate_events(&mut issues);
        self.validate_withdrawal(&mut issues);

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(issues))
        }
    }

    fn validate_returns(&self, returns: &ReturnConfig, issues: &mut Vec<ConfigIssue>) {
        match returns {
            ReturnConfig::Fixed { .. } => {}
            ReturnConfig::Random { std_dev, .. } => {
                if *std_dev < 0.0 || !std_dev.is_finite() {
                    issues.push(ConfigIssue::NegativeStdDev(*std_dev));
                }
            }
            ReturnConfig::Historical { index, .. } => {
                if index.data.is_empty() {
                    issues.push(ConfigIssue::EmptyHistoricalIndex {
                        index_id: index.id.clone(),
                    });
                }
            }
            ReturnConfig::BlackSwan { event, base, .. } => {
                if event.yearly_returns.is_empty() {
                    issues.push(ConfigIssue::BlackSwanEmptyOverrides {
                        event_id: event.id.clone(),
                    });
                }
                self.validate_returns(base, issues);
            }
        }
    }

    fn validate_events(&self, issues: &mut Vec<ConfigIssue>) {
        let mut seen = HashSet::new();
        for event in &self.events {
            if event.id == EventId::CONTRIBUTION || !seen.insert(event.id) {
                issues.push(ConfigIssue::DuplicateEventId(event.id));
            }
            match &event.kind {
                EventKind::Normal => {}
                EventKind::Inheritance { .. } => {
                    if event.amount <= 0.0 {
                        issues.push(ConfigIssue::InheritanceNotPositive {
                            event_id: event.id,
                            amount: event.amount,
                        });
                    }
                }
                EventKind::Expense { financing } => {
                    if event.amount >= 0.0 {
                        issues.push(ConfigIssue::ExpenseNotNegative {
                            event_id: event.id,
                            amount: event.amount,
                        });
                    }
                    if let Some(loan) = financing {
                        if loan.principal <= 0.0 {
                            issues.push(ConfigIssue::LoanPrincipalNotPositive {
                                event_id: event.id,
                                principal: loan.principal,
                            });
                        }
                        if loan.term_years == 0 {
                            issues.push(ConfigIssue::LoanTermZero { event_id: event.id });
                        }
                        if loan.annual_rate < 0.0 {
                            issues.push(ConfigIssue::LoanRateNegative {
                                event_id: event.id,
                                rate: loan.annual_rate,
                            });
                        }
                    }
                }
            }
        }
    }

    fn validate_withdrawal(&self, issues: &mut Vec<ConfigIssue>) {
        match &self.withdrawal {
            WithdrawalPlan::Single { strategy } => {
                validate_strategy(strategy, issues);
            }
            WithdrawalPlan::Segmented { segments } => {
                if let Some((range_start, range_end)) = self.decumulation_range() {
                    issues.extend(SegmentSchedule::validate(segments, range_start, range_end));
                }
                for segment in segments {
                    validate_strategy(&segment.strategy, issues);
                }
            }
        }
    }
}

fn validate_strategy(strategy: &WithdrawalStrategy, issues: &mut Vec<ConfigIssue>) {
    match strategy {
        WithdrawalStrategy::FixedPercentage { rate, .. } => {
            if !(0.0..=1.0).contains(rate) {
                issues.push(ConfigIssue::RateOutOfRange {
                    field: "withdrawal rate",
                    value: *rate,
                });
            }
        }
        WithdrawalStrategy::FixedMonthly { monthly_amount, .. } => {
            if *monthly_amount < 0.0 {
                issues.push(ConfigIssue::StrategyParameterOutOfDomain {
                    field: "monthly_amount",
                    value: *monthly_amount,
                });
            }
        }
        WithdrawalStrategy::Dynamic { base_rate, .. } => {
            if !(0.0..=1.0).contains(base_rate) {
                issues.push(ConfigIssue::RateOutOfRange {
                    field: "base_rate",
                    value: *base_rate,
                });
            }
        }
        WithdrawalStrategy::Bucket {
            initial_cushion,
            refill_threshold,
            refill_fraction,
            base,
        } => {
            if *initial_cushion < 0.0 {
                issues.push(ConfigIssue::StrategyParameterOutOfDomain {
                    field: "initial_cushion",
                    value: *initial_cushion,
                });
            }
            if *refill_threshold < 0.0 {
                issues.push(ConfigIssue::StrategyParameterOutOfDomain {
                    field: "refill_threshold",
                    value: *refill_threshold,
                });
            }
            if !(0.0..=1.0).contains(refill_fraction) {
                issues.push(ConfigIssue::RateOutOfRange {
                    field: "refill_fraction",
                    value: *refill_fraction,
                });
            }
            validate_strategy(base, issues);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReferenceCapital;

    fn base_config() -> SimulationConfig {
        SimulationConfig {
            start_date: jiff::civil::date(2025, 1, 1),
            end_year: 2060,
            withdrawal_start_year: 2050,
            initial_capital: 10_000.0,
            monthly_contribution: 500.0,
            annual_contribution_increase: 0.0,
            expense_ratio: 0.002,
            transaction_cost_rate: 0.0,
            events: Vec::new(),
            returns: ReturnConfig::Fixed { rate: 0.05 },
            tax: TaxConfig::default(),
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
    fn test_valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_all_problems_reported_at_once() {
        let mut config = base_config();
        config.end_year = 2020; // inverted range
        config.initial_capital = -5.0; // negative capital
        config.returns = ReturnConfig::Random {
            mean: 0.07,
            std_dev: -1.0, // bad std dev
            seed: None,
        };
        let error = config.validate().unwrap_err();
        assert!(error.issues.len() >= 3, "got {:?}", error.issues);
    }

    #[test]
    fn test_segment_issues_surface_in_validation() {
        let mut config = base_config();
        config.withdrawal = WithdrawalPlan::Segmented {
            segments: vec![
                Segment {
                    start_year: 2050,
                    end_year: 2054,
                    strategy: WithdrawalStrategy::FixedMonthly {
                        monthly_amount: 2_000.0,
                        inflation_rate: None,
                    },
                },
                // Gap: 2055 is uncovered.
                Segment {
                    start_year: 2056,
                    end_year: 2060,
                    strategy: WithdrawalStrategy::FixedPercentage {
                        rate: 0.04,
                        reference: ReferenceCapital::Current,
                    },
                },
            ],
        };
        let error = config.validate().unwrap_err();
        assert!(error
            .issues
            .iter()
            .any(|i| matches!(i, ConfigIssue::SegmentGap { .. })));
    }

    #[test]
    fn test_reserved_event_id_rejected() {
        let mut config = base_config();
        config.events.push(CashFlowEvent {
            id: EventId::CONTRIBUTION,
            name: "bad".to_string(),
            date: jiff::civil::date(2030, 6, 1),
            amount: 1_000.0,
            phase: crate::model::Phase::Accumulation,
            kind: EventKind::Normal,
        });
        let error = config.validate().unwrap_err();
        assert!(error
            .issues
            .iter()
            .any(|i| matches!(i, ConfigIssue::DuplicateEventId(_))));
    }
}
