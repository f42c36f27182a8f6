//! Work items and calendar events submitted to a preview run.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::hours::{format_clock, parse_clock, HourType};
use crate::window::{MinuteRange, MINUTES_PER_DAY};

/// Priority of a work item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl Priority {
    /// Ordering weight; higher is scheduled first among equal deadlines.
    pub fn weight(&self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Normal => 1,
            Priority::High => 2,
            Priority::Critical => 3,
        }
    }
}

/// Named part of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl DayPeriod {
    /// Local minute range of the period.
    pub fn range(&self) -> MinuteRange {
        match self {
            DayPeriod::Morning => MinuteRange::new(5 * 60, 12 * 60),
            DayPeriod::Afternoon => MinuteRange::new(12 * 60, 17 * 60),
            DayPeriod::Evening => MinuteRange::new(17 * 60, 21 * 60),
            DayPeriod::Night => MinuteRange::new(21 * 60, MINUTES_PER_DAY),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayPeriod::Morning => "morning",
            DayPeriod::Afternoon => "afternoon",
            DayPeriod::Evening => "evening",
            DayPeriod::Night => "night",
        }
    }
}

/// Preferred time of day for a work item.
///
/// Serialized as a period name (`"morning"`) or an ideal clock time
/// (`"07:30"`). The preference is a hard placement constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimePreference {
    Period(DayPeriod),
    /// Minutes from local midnight.
    IdealTime(u32),
}

/// An ideal time tolerates starting this many durations early or late.
pub const IDEAL_TIME_TOLERANCE_FACTOR: i64 = 4;

impl TimePreference {
    /// Local minute range a placement of `duration_minutes` must lie within.
    pub fn window(&self, duration_minutes: i64) -> MinuteRange {
        match self {
            TimePreference::Period(period) => period.range(),
            TimePreference::IdealTime(ideal) => {
                let ideal = i64::from(*ideal);
                let duration = duration_minutes.max(0);
                let slack = duration.saturating_mul(IDEAL_TIME_TOLERANCE_FACTOR);
                let day = i64::from(MINUTES_PER_DAY);
                let start = ideal.saturating_sub(slack).clamp(0, day);
                let end = ideal
                    .saturating_add(slack)
                    .saturating_add(duration)
                    .clamp(0, day);
                MinuteRange::new(start as u32, end as u32)
            }
        }
    }
}

impl FromStr for TimePreference {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "morning" => Ok(TimePreference::Period(DayPeriod::Morning)),
            "afternoon" => Ok(TimePreference::Period(DayPeriod::Afternoon)),
            "evening" => Ok(TimePreference::Period(DayPeriod::Evening)),
            "night" => Ok(TimePreference::Period(DayPeriod::Night)),
            other => parse_clock("preference", other).map(TimePreference::IdealTime),
        }
    }
}

impl TryFrom<String> for TimePreference {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimePreference> for String {
    fn from(value: TimePreference) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TimePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimePreference::Period(period) => f.write_str(period.as_str()),
            TimePreference::IdealTime(minutes) => f.write_str(&format_clock(*minutes)),
        }
    }
}

/// A task awaiting placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewTask {
    pub id: String,
    pub title: String,
    /// Total time the task needs.
    pub duration_minutes: i64,
    /// Time already on the calendar for this task.
    #[serde(default)]
    pub scheduled_minutes: i64,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    /// Not placed before this instant.
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub preference: Option<TimePreference>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub hour_type: HourType,
}

impl PreviewTask {
    pub fn new(id: impl Into<String>, title: impl Into<String>, duration_minutes: i64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            duration_minutes,
            scheduled_minutes: 0,
            deadline: None,
            start_date: None,
            preference: None,
            priority: Priority::Normal,
            hour_type: HourType::PersonalHours,
        }
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_preference(mut self, preference: TimePreference) -> Self {
        self.preference = Some(preference);
        self
    }

    pub fn with_hour_type(mut self, hour_type: HourType) -> Self {
        self.hour_type = hour_type;
        self
    }

    pub fn with_scheduled_minutes(mut self, minutes: i64) -> Self {
        self.scheduled_minutes = minutes;
        self
    }

    /// Minutes still to place.
    pub fn remaining_minutes(&self) -> i64 {
        self.duration_minutes
            .saturating_sub(self.scheduled_minutes.max(0))
    }
}

/// How often a habit recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
}

/// Recurrence rule of a habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub frequency: Frequency,
    /// Every `interval` days or weeks.
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// Weekdays for weekly recurrence.
    #[serde(default)]
    pub days: Vec<Weekday>,
    /// Anchor of the recurrence; defaults to the first day of the preview.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

fn default_interval() -> u32 {
    1
}

impl Recurrence {
    pub fn daily() -> Self {
        Self {
            frequency: Frequency::Daily,
            interval: 1,
            days: Vec::new(),
            start_date: None,
            end_date: None,
        }
    }

    pub fn weekly(days: Vec<Weekday>) -> Self {
        Self {
            frequency: Frequency::Weekly,
            days,
            ..Self::daily()
        }
    }

    pub fn every(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    pub fn starting(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn until(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }
}

/// A recurring habit; each occurrence in the preview window is placed on its own day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewHabit {
    pub id: String,
    pub title: String,
    pub duration_minutes: i64,
    pub recurrence: Recurrence,
    #[serde(default)]
    pub preference: Option<TimePreference>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub hour_type: HourType,
}

impl PreviewHabit {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        duration_minutes: i64,
        recurrence: Recurrence,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            duration_minutes,
            recurrence,
            preference: None,
            priority: Priority::Normal,
            hour_type: HourType::PersonalHours,
        }
    }

    pub fn with_preference(mut self, preference: TimePreference) -> Self {
        self.preference = Some(preference);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_hour_type(mut self, hour_type: HourType) -> Self {
        self.hour_type = hour_type;
        self
    }
}

/// An event already on the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Locked events are never moved by the scheduler.
    #[serde(default)]
    pub locked: bool,
}

impl CalendarEvent {
    pub fn new(id: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            start,
            end,
            locked: false,
        }
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    /// Whether the event holds its time in a run starting at `now`.
    ///
    /// Locked events and events already under way are committed; future
    /// unlocked events only when `block_unlocked` is set.
    pub fn is_committed(&self, now: DateTime<Utc>, block_unlocked: bool) -> bool {
        self.locked || block_unlocked || self.start < now
    }
}
