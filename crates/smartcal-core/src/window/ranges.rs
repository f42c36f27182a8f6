//! Minute-of-day range arithmetic used to turn configured hours into open time.

use serde::{Deserialize, Serialize};

/// Minutes in a day; `24:00` maps to this value.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// A half-open range `[start, end)` of minutes from local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MinuteRange {
    pub start: u32,
    pub end: u32,
}

impl MinuteRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Length in minutes (zero for empty or inverted ranges).
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `other` lies entirely inside this range.
    pub fn contains(&self, other: &MinuteRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

/// Merge overlapping or touching ranges. Empty ranges are dropped.
///
/// The result is sorted by start and pairwise disjoint.
pub fn merge_ranges(ranges: &[MinuteRange]) -> Vec<MinuteRange> {
    let mut sorted: Vec<_> = ranges.iter().copied().filter(|r| !r.is_empty()).collect();
    sorted.sort();

    let mut merged: Vec<MinuteRange> = Vec::with_capacity(sorted.len());
    for range in sorted {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => {
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// Remove every `holes` range from `base`.
///
/// Both inputs are merged first, so overlapping holes are handled once.
pub fn subtract_ranges(base: &[MinuteRange], holes: &[MinuteRange]) -> Vec<MinuteRange> {
    let holes = merge_ranges(holes);
    let mut out = Vec::new();

    for range in merge_ranges(base) {
        let mut cursor = range.start;
        for hole in &holes {
            if hole.end <= cursor {
                continue;
            }
            if hole.start >= range.end {
                break;
            }
            if hole.start > cursor {
                out.push(MinuteRange::new(cursor, hole.start));
            }
            cursor = cursor.max(hole.end);
        }
        if cursor < range.end {
            out.push(MinuteRange::new(cursor, range.end));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(start: u32, end: u32) -> MinuteRange {
        MinuteRange::new(start, end)
    }

    #[test]
    fn merge_joins_overlapping_and_touching() {
        let merged = merge_ranges(&[r(600, 660), r(540, 600), r(650, 700), r(800, 800)]);
        assert_eq!(merged, vec![r(540, 700)]);
    }

    #[test]
    fn subtract_handles_overlapping_holes() {
        // 09:00-12:00 minus 10:00-10:30 and 10:15-11:00
        let open = subtract_ranges(&[r(540, 720)], &[r(600, 630), r(615, 660)]);
        assert_eq!(open, vec![r(540, 600), r(660, 720)]);
    }

    #[test]
    fn subtract_hole_covering_everything_leaves_nothing() {
        assert!(subtract_ranges(&[r(540, 720)], &[r(500, 800)]).is_empty());
    }

    #[test]
    fn subtract_across_multiple_blocks() {
        let open = subtract_ranges(&[r(540, 720), r(780, 1020)], &[r(700, 800)]);
        assert_eq!(open, vec![r(540, 700), r(800, 1020)]);
    }

    #[test]
    fn contains_is_inclusive_of_edges() {
        assert!(r(540, 720).contains(&r(540, 720)));
        assert!(!r(540, 720).contains(&r(530, 600)));
    }
}
