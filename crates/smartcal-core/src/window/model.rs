//! Open intervals per local day.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::gap::{Commitment, TimeGapDetector};
use crate::error::ValidationError;
use crate::hours::{HourSettings, HourType};

/// The span a preview covers: `days` local days starting with the day of `start`.
///
/// Nothing is placed before `start` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRange {
    pub start: DateTime<Utc>,
    pub days: u32,
}

impl PreviewRange {
    pub fn new(start: DateTime<Utc>, days: u32) -> Self {
        Self { start, days }
    }

    /// Local dates covered by the range, in order.
    pub fn local_dates(&self, tz: Tz) -> Vec<NaiveDate> {
        let first = self.start.with_timezone(&tz).date_naive();
        first.iter_days().take(self.days as usize).collect()
    }

    /// Instant the last covered local day ends, or `start` for an empty range.
    pub fn end(&self, tz: Tz) -> DateTime<Utc> {
        self.local_dates(tz)
            .last()
            .and_then(|date| date.succ_opt())
            .and_then(|next| local_instant(tz, next, 0))
            .unwrap_or(self.start)
    }
}

/// A contiguous block of unallocated time within configured hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenInterval {
    pub hour_type: HourType,
    /// Local date the interval belongs to.
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl OpenInterval {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn can_fit(&self, minutes: i64) -> bool {
        self.duration_minutes() >= minutes
    }
}

/// Open intervals of one local day for one hour type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindows {
    pub date: NaiveDate,
    pub hour_type: HourType,
    pub intervals: Vec<OpenInterval>,
}

impl DayWindows {
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn open_minutes(&self) -> i64 {
        self.intervals.iter().map(OpenInterval::duration_minutes).sum()
    }
}

/// Computes open intervals from hour settings in a given time zone.
pub struct TimeWindowModel<'a> {
    hours: &'a HourSettings,
    tz: Tz,
    granularity_minutes: i64,
}

impl<'a> TimeWindowModel<'a> {
    pub fn new(hours: &'a HourSettings, tz: Tz) -> Self {
        Self {
            hours,
            tz,
            granularity_minutes: 1,
        }
    }

    /// Align the range start up to this many minutes past local midnight.
    pub fn with_granularity(mut self, minutes: i64) -> Self {
        self.granularity_minutes = minutes.max(1);
        self
    }

    /// Open intervals for every local day of `range`.
    ///
    /// Each day's configured blocks (minus merged exclusions) are converted to
    /// UTC, committed time is cut out, and everything before the aligned range
    /// start is dropped. A day with no open time yields an empty
    /// [`DayWindows`], never an error.
    pub fn open_intervals(
        &self,
        range: &PreviewRange,
        hour_type: HourType,
        committed: &[Commitment],
    ) -> Result<Vec<DayWindows>, ValidationError> {
        let not_before = align_up(self.tz, range.start, self.granularity_minutes);
        let detector = TimeGapDetector::new();
        let mut days = Vec::with_capacity(range.days as usize);

        for date in range.local_dates(self.tz) {
            let mut intervals = Vec::new();

            for block in self.hours.open_ranges(hour_type, date.weekday())? {
                let (Some(start), Some(end)) = (
                    local_instant(self.tz, date, block.start),
                    local_instant(self.tz, date, block.end),
                ) else {
                    continue;
                };
                let start = start.max(not_before);
                if end <= start {
                    continue;
                }

                intervals.extend(detector.find_gaps(committed, start, end).into_iter().map(
                    |gap| OpenInterval {
                        hour_type,
                        date,
                        start: gap.start_time,
                        end: gap.end_time,
                    },
                ));
            }

            days.push(DayWindows {
                date,
                hour_type,
                intervals,
            });
        }

        Ok(days)
    }
}

/// The UTC instant `minute` minutes into local `date`.
///
/// A local time that falls into a DST gap resolves to the same wall time one
/// hour later, the first valid instant after the gap.
pub fn local_instant(tz: Tz, date: NaiveDate, minute: u32) -> Option<DateTime<Utc>> {
    let naive = date.and_hms_opt(0, 0, 0)? + Duration::minutes(i64::from(minute));
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|t| t.with_timezone(&Utc))
}

/// Round `t` up to the next multiple of `granularity_minutes` after its local midnight.
pub fn align_up(tz: Tz, t: DateTime<Utc>, granularity_minutes: i64) -> DateTime<Utc> {
    let step_ms = granularity_minutes.max(1) * 60_000;
    let date = t.with_timezone(&tz).date_naive();
    let midnight = local_instant(tz, date, 0).unwrap_or(t);
    let offset_ms = (t - midnight).num_milliseconds().max(0);
    let steps = (offset_ms + step_ms - 1) / step_ms;
    midnight + Duration::milliseconds(steps * step_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hours::DaySettings;
    use chrono::TimeZone;

    fn monday(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
    }

    #[test]
    fn align_up_rounds_to_quarter_hours() {
        assert_eq!(align_up(Tz::UTC, monday(9, 0), 15), monday(9, 0));
        assert_eq!(align_up(Tz::UTC, monday(9, 1), 15), monday(9, 15));
        assert_eq!(align_up(Tz::UTC, monday(9, 14), 15), monday(9, 15));
        assert_eq!(
            align_up(Tz::UTC, monday(9, 0) + Duration::seconds(1), 15),
            monday(9, 15)
        );
    }

    #[test]
    fn align_up_respects_local_midnight() {
        // Kathmandu is UTC+05:45: local 09:00 is 03:15 UTC.
        let tz: Tz = "Asia/Kathmandu".parse().unwrap();
        assert_eq!(align_up(tz, monday(3, 1), 60), monday(3, 15));
        assert_eq!(align_up(tz, monday(3, 15), 60), monday(3, 15));
    }

    #[test]
    fn local_instant_skips_dst_gap() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        // 02:30 does not exist that day; resolves to 03:30 EDT = 07:30 UTC.
        let t = local_instant(tz, date, 150).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2026, 3, 8, 7, 30, 0).unwrap());
    }

    #[test]
    fn open_intervals_cut_out_commitments() {
        let hours = HourSettings::uniform("09:00", "12:00");
        let model = TimeWindowModel::new(&hours, Tz::UTC);
        let range = PreviewRange::new(monday(0, 0), 1);
        let committed = vec![Commitment::new(monday(10, 0), monday(10, 30))];

        let days = model
            .open_intervals(&range, HourType::PersonalHours, &committed)
            .unwrap();
        assert_eq!(days.len(), 1);
        let spans: Vec<_> = days[0].intervals.iter().map(|i| (i.start, i.end)).collect();
        assert_eq!(
            spans,
            vec![(monday(9, 0), monday(10, 0)), (monday(10, 30), monday(12, 0))]
        );
        assert_eq!(days[0].open_minutes(), 150);
    }

    #[test]
    fn closed_day_yields_empty_windows() {
        let mut hours = HourSettings::uniform("09:00", "12:00");
        hours.personal_hours.tuesday = DaySettings::closed();
        let model = TimeWindowModel::new(&hours, Tz::UTC);
        let range = PreviewRange::new(monday(0, 0), 2);

        let days = model
            .open_intervals(&range, HourType::PersonalHours, &[])
            .unwrap();
        assert_eq!(days.len(), 2);
        assert!(!days[0].is_empty());
        assert!(days[1].is_empty());
    }

    #[test]
    fn range_start_clips_today() {
        let hours = HourSettings::uniform("09:00", "12:00");
        let model = TimeWindowModel::new(&hours, Tz::UTC).with_granularity(15);
        let range = PreviewRange::new(monday(10, 7), 1);

        let days = model
            .open_intervals(&range, HourType::PersonalHours, &[])
            .unwrap();
        assert_eq!(days[0].intervals[0].start, monday(10, 15));
    }

    #[test]
    fn range_after_hours_leaves_day_empty() {
        let hours = HourSettings::uniform("09:00", "12:00");
        let model = TimeWindowModel::new(&hours, Tz::UTC);
        let range = PreviewRange::new(monday(13, 0), 1);
        let days = model
            .open_intervals(&range, HourType::PersonalHours, &[])
            .unwrap();
        assert!(days[0].is_empty());
    }

    #[test]
    fn blocks_follow_the_time_zone() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        let hours = HourSettings::uniform("09:00", "10:00");
        let model = TimeWindowModel::new(&hours, tz);
        let range = PreviewRange::new(monday(0, 0), 1);
        let days = model
            .open_intervals(&range, HourType::PersonalHours, &[])
            .unwrap();
        // CET is UTC+1 in early March.
        assert_eq!(days[0].intervals[0].start, monday(8, 0));
        assert_eq!(days[0].intervals[0].end, monday(9, 0));
    }

    #[test]
    fn range_end_is_midnight_after_last_day() {
        let range = PreviewRange::new(monday(10, 0), 2);
        assert_eq!(
            range.end(Tz::UTC),
            Utc.with_ymd_and_hms(2026, 3, 4, 0, 0, 0).unwrap()
        );
    }
}
