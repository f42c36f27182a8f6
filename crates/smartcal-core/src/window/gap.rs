//! Gap detection between committed calendar time.
//!
//! Finds the free stretches of a block once existing commitments are taken
//! out of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Time already committed on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl Commitment {
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    /// Check if this commitment overlaps with a time range
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && self.end_time > start
    }
}

/// A free stretch between commitments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeGap {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl TimeGap {
    /// Create a new time gap; `None` when the range is empty
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Option<Self> {
        if end_time <= start_time {
            return None;
        }
        Some(Self {
            start_time,
            end_time,
        })
    }

    /// Get duration in minutes
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

/// Detector for finding time gaps in a block
pub struct TimeGapDetector {
    /// Minimum gap duration to keep (in minutes)
    min_gap_minutes: i64,
}

impl TimeGapDetector {
    /// Create a detector that keeps every non-empty gap
    pub fn new() -> Self {
        Self { min_gap_minutes: 0 }
    }

    /// Set the minimum gap duration
    pub fn with_min_gap(mut self, minutes: i64) -> Self {
        self.min_gap_minutes = minutes;
        self
    }

    /// Find gaps between commitments inside `[block_start, block_end)`
    ///
    /// Commitments may be unsorted and may overlap each other or the block
    /// edges. Returns gaps sorted by start time.
    pub fn find_gaps(
        &self,
        commitments: &[Commitment],
        block_start: DateTime<Utc>,
        block_end: DateTime<Utc>,
    ) -> Vec<TimeGap> {
        let mut gaps = Vec::new();

        let mut sorted: Vec<_> = commitments
            .iter()
            .filter(|c| c.overlaps(block_start, block_end))
            .copied()
            .collect();
        sorted.sort_by_key(|c| c.start_time);

        let mut last_end = block_start;

        for commitment in &sorted {
            if commitment.end_time <= last_end {
                continue;
            }

            if commitment.start_time > last_end {
                self.push_gap(&mut gaps, last_end, commitment.start_time.min(block_end));
            }

            last_end = commitment.end_time.min(block_end);
            if last_end >= block_end {
                break;
            }
        }

        if last_end < block_end {
            self.push_gap(&mut gaps, last_end, block_end);
        }

        gaps
    }

    fn push_gap(&self, gaps: &mut Vec<TimeGap>, start: DateTime<Utc>, end: DateTime<Utc>) {
        if let Some(gap) = TimeGap::new(start, end) {
            if gap.duration_minutes() >= self.min_gap_minutes {
                gaps.push(gap);
            }
        }
    }
}

impl Default for TimeGapDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to find gaps with default settings
pub fn detect_time_gaps(
    commitments: &[Commitment],
    block_start: DateTime<Utc>,
    block_end: DateTime<Utc>,
) -> Vec<TimeGap> {
    TimeGapDetector::new().find_gaps(commitments, block_start, block_end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_time_gap_creation() {
        let start = at(9, 0);
        let gap = TimeGap::new(start, start + Duration::minutes(30));
        assert_eq!(gap.unwrap().duration_minutes(), 30);
        assert!(TimeGap::new(start, start).is_none());
    }

    #[test]
    fn test_find_gaps_between_commitments() {
        let commitments = vec![
            Commitment::new(at(11, 0), at(12, 0)),
            Commitment::new(at(9, 30), at(10, 0)),
        ];

        let gaps = detect_time_gaps(&commitments, at(9, 0), at(13, 0));
        let spans: Vec<_> = gaps.iter().map(|g| (g.start_time, g.end_time)).collect();
        assert_eq!(
            spans,
            vec![
                (at(9, 0), at(9, 30)),
                (at(10, 0), at(11, 0)),
                (at(12, 0), at(13, 0)),
            ]
        );
    }

    #[test]
    fn test_overlapping_commitments_and_edges() {
        let commitments = vec![
            Commitment::new(at(8, 0), at(9, 30)),
            Commitment::new(at(9, 15), at(10, 0)),
            Commitment::new(at(11, 30), at(14, 0)),
        ];
        let gaps = detect_time_gaps(&commitments, at(9, 0), at(12, 0));
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].start_time, at(10, 0));
        assert_eq!(gaps[0].end_time, at(11, 30));
    }

    #[test]
    fn test_min_gap_filter() {
        let commitments = vec![Commitment::new(at(9, 10), at(12, 0))];
        let gaps = TimeGapDetector::new()
            .with_min_gap(15)
            .find_gaps(&commitments, at(9, 0), at(12, 0));
        assert!(gaps.is_empty());
    }

    #[test]
    fn test_fully_committed_block() {
        let commitments = vec![Commitment::new(at(9, 0), at(12, 0))];
        assert!(detect_time_gaps(&commitments, at(9, 0), at(12, 0)).is_empty());
    }
}
