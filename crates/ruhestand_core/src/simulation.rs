//! Year-by-year simulation engine
//!
//! `simulate` drives one portfolio through accumulation and decumulation:
//! validate once, resolve the return sequence, then advance year by year
//! (growth, fees, ledger events, withdrawal, capital gains tax) and emit one
//! immutable snapshot per year. The accumulation -> decumulation transition
//! happens exactly once, at the configured boundary year; depletion is a
//! terminal state, not an error.

use crate::config::{SimulationConfig, WithdrawalPlan};
use crate::error::{NoSegmentCoverage, SimulationError, ValidationError};
use crate::model::{
    CashFlowEvent, EventId, EventKind, Phase, RealizedCashFlow, ReturnProvider,
    SegmentSchedule, SimulationResult, SimulationYear, WithdrawalState, WithdrawalStrategy,
};
use crate::taxes::{capital_gains_tax, inheritance_tax};

/// One scheduled installment of a credit-financed expense.
#[derive(Debug, Clone)]
struct Installment {
    year: i32,
    event_id: EventId,
    name: String,
    payment: f64,
}

/// Debit an amount from the growth portfolio first, then the cushion.
/// Returns how much could actually be debited; balances never go negative.
fn debit(capital: &mut f64, cushion: &mut f64, amount: f64) -> f64 {
    let from_capital = amount.min(*capital).max(0.0);
    *capital -= from_capital;
    let from_cushion = (amount - from_capital).min(*cushion).max(0.0);
    *cushion -= from_cushion;
    from_capital + from_cushion
}

fn expand_installments(events: &[CashFlowEvent]) -> Vec<Installment> {
    let mut installments = Vec::new();
    for event in events {
        if let EventKind::Expense {
            financing: Some(loan),
        } = &event.kind
        {
            for loan_year in loan.amortization_schedule() {
                installments.push(Installment {
                    year: event.year() + loan_year.year_offset as i32,
                    event_id: event.id,
                    name: event.name.clone(),
                    payment: loan_year.payment,
                });
            }
        }
    }
    installments
}

/// Run one full simulation.
///
/// Configuration errors are reported up front as a single `ValidationError`
/// listing every violation; depletion and historical-coverage shortfalls are
/// encoded in the result, never raised.
pub fn simulate(config: &SimulationConfig) -> Result<SimulationResult, SimulationError> {
    config.validate()?;

    let start_year = config.start_year();
    let num_years = config.num_years();
    let provider = ReturnProvider::new(&config.returns, start_year, num_years)?;

    let schedule = match (&config.withdrawal, config.decumulation_range()) {
        (WithdrawalPlan::Segmented { segments }, Some((range_start, range_end))) => Some(
            SegmentSchedule::new(segments.clone(), range_start, range_end)
                .map_err(ValidationError::new)?,
        ),
        _ => None,
    };

    let installments = expand_installments(&config.events);

    let mut capital = config.initial_capital;
    let mut cushion = 0.0_f64;
    let mut bucket_active = false;
    let mut last_refill_capital = 0.0_f64;
    let mut decumulation_started = false;
    let mut decumulation_initial_capital = 0.0_f64;
    let mut decumulation_years_elapsed = 0_u32;
    let mut prior_return = 0.0_f64;
    let mut depleted = false;
    let mut depletion_year = None;

    let mut years = Vec::with_capacity(num_years);
    let mut total_contributions = 0.0;
    let mut total_growth = 0.0;
    let mut total_fees = 0.0;
    let mut total_taxes = 0.0;
    let mut total_withdrawn = 0.0;

    for (i, year) in (start_year..=config.end_year).enumerate() {
        let phase = if year < config.withdrawal_start_year {
            Phase::Accumulation
        } else {
            Phase::Decumulation
        };
        let rate = provider.rate_for(i);

        if depleted {
            years.push(SimulationYear {
                year,
                phase,
                start_capital: 0.0,
                return_rate: rate,
                gross_growth: 0.0,
                fees: 0.0,
                tax_paid: 0.0,
                cash_flows: Vec::new(),
                withdrawal: 0.0,
                end_capital: 0.0,
                depleted: true,
            });
            prior_return = rate;
            continue;
        }

        let start_capital = capital + cushion;
        let mut cash_flows = Vec::new();

        // Growth applies to the growth portfolio only; the cushion is cash.
        let gross_growth = capital * rate;
        capital += gross_growth;

        let mut fees = capital.max(0.0) * config.expense_ratio;

        // Recurring contribution, accumulation only. The first calendar
        // year is prorated to the months from the start date onward.
        if phase == Phase::Accumulation && config.monthly_contribution > 0.0 {
            let months = if i == 0 {
                13 - i32::from(config.start_date.month())
            } else {
                12
            };
            let monthly = config.monthly_contribution
                * (1.0 + config.annual_contribution_increase).powi(i as i32);
            let contribution = monthly * f64::from(months);
            fees += contribution * config.transaction_cost_rate;
            capital += contribution;
            total_contributions += contribution;
            cash_flows.push(RealizedCashFlow {
                event_id: EventId::CONTRIBUTION,
                name: "savings plan".to_string(),
                gross_amount: contribution,
                net_amount: contribution,
            });
        }

        let fees_paid = debit(&mut capital, &mut cushion, fees);
        fees = fees_paid;

        // Ledger events realized this year.
        for event in config.events.iter().filter(|e| e.year() == year) {
            match &event.kind {
                EventKind::Normal => {
                    if event.amount >= 0.0 {
                        capital += event.amount;
                        cash_flows.push(RealizedCashFlow {
                            event_id: event.id,
                            name: event.name.clone(),
                            gross_amount: event.amount,
                            net_amount: event.amount,
                        });
                    } else {
                        let paid = debit(&mut capital, &mut cushion, -event.amount);
                        cash_flows.push(RealizedCashFlow {
                            event_id: event.id,
                            name: event.name.clone(),
                            gross_amount: event.amount,
                            net_amount: -paid,
                        });
                    }
                }
                EventKind::Inheritance { relationship } => {
                    let result = inheritance_tax(event.amount, *relationship);
                    capital += result.net_amount;
                    cash_flows.push(RealizedCashFlow {
                        event_id: event.id,
                        name: event.name.clone(),
                        gross_amount: event.amount,
                        net_amount: result.net_amount,
                    });
                }
                EventKind::Expense { financing: None } => {
                    let paid = debit(&mut capital, &mut cushion, -event.amount);
                    cash_flows.push(RealizedCashFlow {
                        event_id: event.id,
                        name: event.name.clone(),
                        gross_amount: event.amount,
                        net_amount: -paid,
                    });
                }
                // Financed expenses are realized through their installments.
                EventKind::Expense { financing: Some(_) } => {}
            }
        }
        for installment in installments.iter().filter(|inst| inst.year == year) {
            let paid = debit(&mut capital, &mut cushion, installment.payment);
            cash_flows.push(RealizedCashFlow {
                event_id: installment.event_id,
                name: installment.name.clone(),
                gross_amount: -installment.payment,
                net_amount: -paid,
            });
        }

        // Withdrawal, decumulation only.
        let mut withdrawal = 0.0;
        if phase == Phase::Decumulation {
            if !decumulation_started {
                decumulation_started = true;
                decumulation_initial_capital = capital + cushion;
            }

            let strategy: &WithdrawalStrategy = match (&config.withdrawal, &schedule) {
                (WithdrawalPlan::Single { strategy }, _) => strategy,
                (WithdrawalPlan::Segmented { .. }, Some(schedule)) => {
                    &schedule.active_for(year)?.strategy
                }
                (WithdrawalPlan::Segmented { .. }, None) => {
                    return Err(NoSegmentCoverage { year }.into());
                }
            };

            // Carve the cash cushion out of the portfolio when a bucket
            // strategy becomes active; fold it back when it stops being one.
            if let WithdrawalStrategy::Bucket {
                initial_cushion, ..
            } = strategy
            {
                if !bucket_active {
                    let carve = initial_cushion.min(capital).max(0.0);
                    capital -= carve;
                    cushion += carve;
                    last_refill_capital = capital;
                    bucket_active = true;
                }
            } else if bucket_active {
                capital += cushion;
                cushion = 0.0;
                bucket_active = false;
            }

            let state = WithdrawalState {
                capital,
                initial_capital: decumulation_initial_capital,
                years_elapsed: decumulation_years_elapsed,
                prior_year_return: prior_return,
                cushion,
                last_refill_capital,
            };
            let outcome = strategy.compute_withdrawal(state);
            withdrawal = outcome.amount;
            capital = outcome.state.capital;
            cushion = outcome.state.cushion;
            last_refill_capital = outcome.state.last_refill_capital;
            decumulation_years_elapsed += 1;

            if outcome.requested > outcome.amount + 1e-9 {
                depleted = true;
                depletion_year = Some(year);
            }
        }

        // Capital gains tax on the year's positive growth, net of the
        // partial exemption and the yearly allowance (reset each year).
        let gains_tax = capital_gains_tax(gross_growth, config.tax.annual_allowance, &config.tax);
        let tax_paid = debit(&mut capital, &mut cushion, gains_tax.total());
        if phase == Phase::Decumulation
            && tax_paid + 1e-9 < gains_tax.total()
            && depletion_year.is_none()
        {
            depleted = true;
            depletion_year = Some(year);
        }

        let end_capital = capital + cushion;

        total_growth += gross_growth;
        total_fees += fees;
        total_taxes += tax_paid;
        total_withdrawn += withdrawal;
        prior_return = rate;

        years.push(SimulationYear {
            year,
            phase,
            start_capital,
            return_rate: rate,
            gross_growth,
            fees,
            tax_paid,
            cash_flows,
            withdrawal,
            end_capital,
            depleted,
        });
    }

    Ok(SimulationResult {
        years,
        total_contributions,
        total_growth,
        total_fees,
        total_taxes,
        total_withdrawn,
        depletion_year,
        full_return_coverage: provider.full_coverage(),
    })
}
