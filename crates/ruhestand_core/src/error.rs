use std::fmt;

use crate::model::EventId;

/// A single problem detected while validating a `SimulationConfig`.
///
/// Validation runs once, before any year is simulated, and collects every
/// violation it finds rather than stopping at the first.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigIssue {
    InvertedYearRange {
        start_year: i32,
        end_year: i32,
    },
    NegativeInitialCapital(f64),
    NegativeContribution(f64),
    /// A rate-like field that must lie in [0, 1].
    RateOutOfRange {
        field: &'static str,
        value: f64,
    },
    NegativeStdDev(f64),
    EmptyHistoricalIndex {
        index_id: String,
    },
    BlackSwanEmptyOverrides {
        event_id: String,
    },
    DuplicateEventId(EventId),
    LoanPrincipalNotPositive {
        event_id: EventId,
        principal: f64,
    },
    LoanTermZero {
        event_id: EventId,
    },
    LoanRateNegative {
        event_id: EventId,
        rate: f64,
    },
    /// An inheritance event must be a positive inflow.
    InheritanceNotPositive {
        event_id: EventId,
        amount: f64,
    },
    /// An expense event must be a negative outflow.
    ExpenseNotNegative {
        event_id: EventId,
        amount: f64,
    },
    NoSegments,
    SegmentRangeInverted {
        start_year: i32,
        end_year: i32,
    },
    SegmentGap {
        previous_end: i32,
        next_start: i32,
    },
    SegmentOverlap {
        previous_end: i32,
        next_start: i32,
    },
    /// Segments do not cover the decumulation range exactly.
    SegmentCoverageMismatch {
        expected_start: i32,
        expected_end: i32,
        actual_start: i32,
        actual_end: i32,
    },
    /// A strategy parameter outside its domain (e.g. negative cushion).
    StrategyParameterOutOfDomain {
        field: &'static str,
        value: f64,
    },
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigIssue::InvertedYearRange {
                start_year,
                end_year,
            } => write!(f, "end year {end_year} precedes start year {start_year}"),
            ConfigIssue::NegativeInitialCapital(v) => {
                write!(f, "initial capital must be non-negative, got {v}")
            }
            ConfigIssue::NegativeContribution(v) => {
                write!(f, "monthly contribution must be non-negative, got {v}")
            }
            ConfigIssue::RateOutOfRange { field, value } => {
                write!(f, "{field} must lie in [0, 1], got {value}")
            }
            ConfigIssue::NegativeStdDev(v) => {
                write!(f, "return standard deviation must be non-negative, got {v}")
            }
            ConfigIssue::EmptyHistoricalIndex { index_id } => {
                write!(f, "historical index '{index_id}' has no data")
            }
            ConfigIssue::BlackSwanEmptyOverrides { event_id } => {
                write!(f, "black swan event '{event_id}' has no yearly overrides")
            }
            ConfigIssue::DuplicateEventId(id) => write!(f, "duplicate event id {id:?}"),
            ConfigIssue::LoanPrincipalNotPositive {
                event_id,
                principal,
            } => write!(
                f,
                "loan principal for event {event_id:?} must be positive, got {principal}"
            ),
            ConfigIssue::LoanTermZero { event_id } => {
                write!(f, "loan term for event {event_id:?} must be at least one year")
            }
            ConfigIssue::LoanRateNegative { event_id, rate } => write!(
                f,
                "loan interest rate for event {event_id:?} must be non-negative, got {rate}"
            ),
            ConfigIssue::InheritanceNotPositive { event_id, amount } => write!(
                f,
                "inheritance event {event_id:?} must be a positive inflow, got {amount}"
            ),
            ConfigIssue::ExpenseNotNegative { event_id, amount } => write!(
                f,
                "expense event {event_id:?} must be a negative outflow, got {amount}"
            ),
            ConfigIssue::NoSegments => write!(f, "segmented withdrawal plan has no segments"),
            ConfigIssue::SegmentRangeInverted {
                start_year,
                end_year,
            } => write!(f, "segment range {start_year}..={end_year} is inverted"),
            ConfigIssue::SegmentGap {
                previous_end,
                next_start,
            } => write!(
                f,
                "gap between segment ending {previous_end} and segment starting {next_start}"
            ),
            ConfigIssue::SegmentOverlap {
                previous_end,
                next_start,
            } => write!(
                f,
                "segment starting {next_start} overlaps segment ending {previous_end}"
            ),
            ConfigIssue::SegmentCoverageMismatch {
                expected_start,
                expected_end,
                actual_start,
                actual_end,
            } => write!(
                f,
                "segments cover {actual_start}..={actual_end} but decumulation spans {expected_start}..={expected_end}"
            ),
            ConfigIssue::StrategyParameterOutOfDomain { field, value } => {
                write!(f, "strategy parameter {field} out of domain: {value}")
            }
        }
    }
}

/// Aggregate validation failure listing every problem found in a configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub issues: Vec<ConfigIssue>,
}

impl ValidationError {
    #[must_use]
    pub fn new(issues: Vec<ConfigIssue>) -> Self {
        Self { issues }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "invalid configuration ({} problem(s)):", self.issues.len())?;
        for issue in &self.issues {
            writeln!(f, "  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while building a per-run return sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnError {
    InvalidDistributionParameters {
        mean: f64,
        std_dev: f64,
        reason: &'static str,
    },
    /// Historical index carries no data at all.
    EmptyHistoricalData {
        index_id: String,
    },
}

impl fmt::Display for ReturnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnError::InvalidDistributionParameters {
                mean,
                std_dev,
                reason,
            } => write!(
                f,
                "invalid return distribution (mean={mean}, std_dev={std_dev}): {reason}"
            ),
            ReturnError::EmptyHistoricalData { index_id } => {
                write!(f, "historical index '{index_id}' has no data")
            }
        }
    }
}

impl std::error::Error for ReturnError {}

/// No segment covers the requested year. For a validated configuration this
/// is unreachable; it exists to keep the scheduler lookup total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoSegmentCoverage {
    pub year: i32,
}

impl fmt::Display for NoSegmentCoverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no withdrawal segment covers year {}", self.year)
    }
}

impl std::error::Error for NoSegmentCoverage {}

/// Top-level failure of a simulation or analysis call.
#[derive(Debug, Clone)]
pub enum SimulationError {
    Config(ValidationError),
    Returns(ReturnError),
    SegmentCoverage(NoSegmentCoverage),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::Config(e) => write!(f, "{e}"),
            SimulationError::Returns(e) => write!(f, "{e}"),
            SimulationError::SegmentCoverage(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Config(e) => Some(e),
            SimulationError::Returns(e) => Some(e),
            SimulationError::SegmentCoverage(e) => Some(e),
        }
    }
}

impl From<ValidationError> for SimulationError {
    fn from(e: ValidationError) -> Self {
        SimulationError::Config(e)
    }
}

impl From<ReturnError> for SimulationError {
    fn from(e: ReturnError) -> Self {
        SimulationError::Returns(e)
    }
}

impl From<NoSegmentCoverage> for SimulationError {
    fn from(e: NoSegmentCoverage) -> Self {
        SimulationError::SegmentCoverage(e)
    }
}
