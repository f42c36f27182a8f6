//! Open intervals still available during a simulation, per hour type.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::hours::HourType;
use crate::window::{DayWindows, OpenInterval};

/// Remaining open intervals of every hour type, each list sorted by start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalPool {
    pools: BTreeMap<HourType, Vec<OpenInterval>>,
}

impl IntervalPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the open intervals of one hour type.
    pub fn insert(&mut self, hour_type: HourType, days: Vec<DayWindows>) {
        let pool = self.pools.entry(hour_type).or_default();
        pool.extend(days.into_iter().flat_map(|day| day.intervals));
        pool.sort_by_key(|interval| (interval.start, interval.end));
    }

    pub fn intervals(&self, hour_type: HourType) -> &[OpenInterval] {
        self.pools.get(&hour_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self, hour_type: HourType) -> bool {
        self.intervals(hour_type).is_empty()
    }

    pub fn open_minutes(&self, hour_type: HourType) -> i64 {
        self.intervals(hour_type)
            .iter()
            .map(OpenInterval::duration_minutes)
            .sum()
    }

    /// Take `[start, end)` out of every pool.
    ///
    /// An interval consumed exactly disappears; one with capacity left over
    /// is split into its leading and trailing remainders.
    pub fn reserve(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) {
        for pool in self.pools.values_mut() {
            let mut kept = Vec::with_capacity(pool.len() + 1);
            for interval in pool.drain(..) {
                if interval.end <= start || interval.start >= end {
                    kept.push(interval);
                    continue;
                }
                if interval.start < start {
                    kept.push(OpenInterval {
                        end: start,
                        ..interval
                    });
                }
                if interval.end > end {
                    kept.push(OpenInterval {
                        start: end,
                        ..interval
                    });
                }
            }
            *pool = kept;
        }
    }
}
