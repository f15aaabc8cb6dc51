//! Cash-flow event ledger
//!
//! Events are the one-off cash movements of a plan: extra payments,
//! inheritances and expenses (optionally financed through an amortizing
//! loan). Each event is anchored to a calendar date; the engine realizes
//! every event whose date falls inside the simulated year.

use serde::{Deserialize, Serialize};

/// Identifier for a ledger event, assigned by the caller.
///
/// `EventId(0)` is reserved for the synthetic recurring-contribution flow
/// the engine records in its snapshots.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EventId(pub u32);

impl EventId {
    /// Synthetic id for the recurring savings contribution.
    pub const CONTRIBUTION: EventId = EventId(0);
}

/// Simulation phase an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Accumulation,
    Decumulation,
}

/// Relationship of the heir to the deceased, for inheritance events.
///
/// Exemptions per §16 ErbStG: spouse 500k, child 400k, grandchild 200k,
/// parent (inheriting from a descendant) 100k, sibling and unrelated 20k.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relationship {
    Spouse,
    Child,
    Grandchild,
    Parent,
    Sibling,
    Other,
}

impl Relationship {
    /// Tax-free exemption for this relationship class.
    #[must_use]
    pub fn exemption(self) -> f64 {
        match self {
            Relationship::Spouse => 500_000.0,
            Relationship::Child => 400_000.0,
            Relationship::Grandchild => 200_000.0,
            Relationship::Parent => 100_000.0,
            Relationship::Sibling | Relationship::Other => 20_000.0,
        }
    }

    /// Inheritance tax class (§15 ErbStG).
    #[must_use]
    pub fn tax_class(self) -> crate::taxes::InheritanceTaxClass {
        use crate::taxes::InheritanceTaxClass;
        match self {
            Relationship::Spouse
            | Relationship::Child
            | Relationship::Grandchild
            | Relationship::Parent => InheritanceTaxClass::I,
            Relationship::Sibling => InheritanceTaxClass::II,
            Relationship::Other => InheritanceTaxClass::III,
        }
    }
}

/// Terms of an amortizing (annuity) loan used to finance an expense.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: f64,
    /// Nominal annual interest rate, e.g. 0.05.
    pub annual_rate: f64,
    pub term_years: u32,
}

/// One year of a constant-payment amortization schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanYear {
    /// Zero-based offset from the loan start year.
    pub year_offset: u32,
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    pub remaining_balance: f64,
}

impl LoanTerms {
    /// Constant yearly annuity payment.
    #[must_use]
    pub fn annual_payment(&self) -> f64 {
        if self.term_years == 0 {
            return 0.0;
        }
        let n = f64::from(self.term_years);
        if self.annual_rate == 0.0 {
            self.principal / n
        } else {
            let q = 1.0 + self.annual_rate;
            self.principal * self.annual_rate * q.powf(n) / (q.powf(n) - 1.0)
        }
    }

    /// Full constant-payment amortization schedule.
    #[must_use]
    pub fn amortization_schedule(&self) -> Vec<LoanYear> {
        let payment = self.annual_payment();
        let mut schedule = Vec::with_capacity(self.term_years as usize);
        let mut balance = self.principal;

        for offset in 0..self.term_years {
            let interest = balance * self.annual_rate;
            // Last installment clears rounding residue in the balance.
            let principal = if offset == self.term_years - 1 {
                balance
            } else {
                payment - interest
            };
            balance -= principal;
            schedule.push(LoanYear {
                year_offset: offset,
                payment: principal + interest,
                interest,
                principal,
                remaining_balance: balance,
            });
        }

        schedule
    }
}

/// What kind of cash flow an event represents.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventKind {
    /// Plain inflow or outflow, realized as-is.
    #[default]
    Normal,
    /// Inheritance inflow, credited net of inheritance tax.
    Inheritance { relationship: Relationship },
    /// Expense outflow. With financing, the amortized annual installment is
    /// debited over the loan term instead of the full amount in year one.
    Expense {
        #[serde(default)]
        financing: Option<LoanTerms>,
    },
}

/// A single entry of the cash-flow event ledger.
///
/// Immutable after creation; the engine only reads it. `amount` is signed:
/// positive for inflows, negative for outflows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowEvent {
    pub id: EventId,
    pub name: String,
    pub date: jiff::civil::Date,
    pub amount: f64,
    pub phase: Phase,
    #[serde(default)]
    pub kind: EventKind,
}

impl CashFlowEvent {
    /// Calendar year the event is realized in.
    #[must_use]
    pub fn year(&self) -> i32 {
        i32::from(self.date.year())
    }
}
