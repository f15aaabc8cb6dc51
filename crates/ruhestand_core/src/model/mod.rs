//! Core data model: events, return modes, strategies, segments, results.

pub mod events;
pub mod results;
pub mod returns;
pub mod segments;
pub mod strategy;

pub use events::{CashFlowEvent, EventId, EventKind, LoanTerms, LoanYear, Phase, Relationship};
pub use results::{
    RealizedCashFlow, SimulationResult, SimulationYear, StrategyComparisonResult,
};
pub use returns::{BlackSwanEvent, HistoricalIndex, ReturnConfig, ReturnProvider};
pub use segments::{Segment, SegmentSchedule};
pub use strategy::{
    ReferenceCapital, WithdrawalOutcome, WithdrawalState, WithdrawalStrategy,
};
