//! Segment scheduler
//!
//! The decumulation phase can be partitioned into contiguous year ranges,
//! each bound to its own withdrawal strategy. Validation happens at
//! configuration-build time; the year lookup itself is a binary search.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigIssue, NoSegmentCoverage};
use crate::model::WithdrawalStrategy;

/// A contiguous year range bound to one withdrawal strategy instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// First covered year, inclusive.
    pub start_year: i32,
    /// Last covered year, inclusive.
    pub end_year: i32,
    pub strategy: WithdrawalStrategy,
}

/// Sorted, contiguous, gap-free list of segments covering the decumulation
/// range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSchedule {
    pub segments: Vec<Segment>,
}

impl SegmentSchedule {
    /// Validate the segment list against the decumulation range, collecting
    /// every violation found.
    #[must_use]
    pub fn validate(segments: &[Segment], range_start: i32, range_end: i32) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if segments.is_empty() {
            issues.push(ConfigIssue::NoSegments);
            return issues;
        }

        let mut sorted: Vec<&Segment> = segments.iter().collect();
        sorted.sort_by_key(|s| s.start_year);

        for segment in &sorted {
            if segment.end_year < segment.start_year {
                issues.push(ConfigIssue::SegmentRangeInverted {
                    start_year: segment.start_year,
                    end_year: segment.end_year,
                });
            }
        }

        for pair in sorted.windows(2) {
            let previous_end = pair[0].end_year;
            let next_start = pair[1].start_year;
            if next_start > previous_end + 1 {
                issues.push(ConfigIssue::SegmentGap {
                    previous_end,
                    next_start,
                });
            } else if next_start <= previous_end {
                issues.push(ConfigIssue::SegmentOverlap {
                    previous_end,
                    next_start,
                });
            }
        }

        let actual_start = sorted.first().map_or(range_start, |s| s.start_year);
        let actual_end = sorted.last().map_or(range_end, |s| s.end_year);
        if actual_start != range_start || actual_end != range_end {
            issues.push(ConfigIssue::SegmentCoverageMismatch {
                expected_start: range_start,
                expected_end: range_end,
                actual_start,
                actual_end,
            });
        }

        issues
    }

    /// Build a schedule from segments, sorting them and rejecting gaps,
    /// overlaps and coverage mismatches.
    pub fn new(
        mut segments: Vec<Segment>,
        range_start: i32,
        range_end: i32,
    ) -> Result<Self, Vec<ConfigIssue>> {
        let issues = Self::validate(&segments, range_start, range_end);
        if issues.is_empty() {
            segments.sort_by_key(|s| s.start_year);
            Ok(Self { segments })
        } else {
            Err(issues)
        }
    }

    /// The segment covering the given year.
    ///
    /// For a validated schedule this is defined for every year in the
    /// decumulation range.
    pub fn active_for(&self, year: i32) -> Result<&Segment, NoSegmentCoverage> {
        let idx = self
            .segments
            .partition_point(|s| s.start_year <= year)
            .checked_sub(1)
            .ok_or(NoSegmentCoverage { year })?;
        let segment = &self.segments[idx];
        if year <= segment.end_year {
            Ok(segment)
        } else {
            Err(NoSegmentCoverage { year })
        }
    }
}
