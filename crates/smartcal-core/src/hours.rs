//! Workspace hour settings: which hours of which weekdays are open for
//! scheduling, per hour type.
//!
//! Clock times are stored as `HH:MM` strings (end times may be `24:00`) and
//! parsed into minute ranges on validation.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::window::{merge_ranges, subtract_ranges, MinuteRange, MINUTES_PER_DAY};

/// Calendar hour category a work item draws its time from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HourType {
    #[default]
    PersonalHours,
    WorkHours,
    MeetingHours,
}

impl HourType {
    pub const ALL: [HourType; 3] = [
        HourType::PersonalHours,
        HourType::WorkHours,
        HourType::MeetingHours,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HourType::PersonalHours => "personal_hours",
            HourType::WorkHours => "work_hours",
            HourType::MeetingHours => "meeting_hours",
        }
    }
}

impl std::fmt::Display for HourType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `HH:MM`-`HH:MM` block of local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBlock {
    pub start_time: String,
    pub end_time: String,
}

impl TimeBlock {
    pub fn new(start_time: impl Into<String>, end_time: impl Into<String>) -> Self {
        Self {
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }

    /// Parse into a minute range, rejecting malformed or inverted blocks.
    pub fn parse(&self, field: &str) -> Result<MinuteRange, ValidationError> {
        let start = parse_clock(field, &self.start_time)?;
        let end = parse_clock(field, &self.end_time)?;
        if end <= start {
            return Err(ValidationError::InvalidRange {
                field: field.to_string(),
                start: self.start_time.clone(),
                end: self.end_time.clone(),
            });
        }
        Ok(MinuteRange::new(start, end))
    }
}

/// Settings for one weekday.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub time_blocks: Vec<TimeBlock>,
    /// Sub-ranges carved out of the time blocks (lunch, school run, ...).
    #[serde(default)]
    pub excluded: Vec<TimeBlock>,
}

impl DaySettings {
    /// An enabled day with a single block.
    pub fn open(start: &str, end: &str) -> Self {
        Self {
            enabled: true,
            time_blocks: vec![TimeBlock::new(start, end)],
            excluded: Vec::new(),
        }
    }

    pub fn closed() -> Self {
        Self::default()
    }

    pub fn with_excluded(mut self, start: &str, end: &str) -> Self {
        self.excluded.push(TimeBlock::new(start, end));
        self
    }

    /// Validate and return the open minute ranges of this day.
    ///
    /// Blocks are merged, then the merged excluded ranges are subtracted.
    /// A disabled day is validated but yields no ranges.
    pub fn open_ranges(&self, field: &str) -> Result<Vec<MinuteRange>, ValidationError> {
        let blocks = self
            .time_blocks
            .iter()
            .enumerate()
            .map(|(i, b)| b.parse(&format!("{field}.time_blocks[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;

        let excluded = self
            .excluded
            .iter()
            .enumerate()
            .map(|(i, b)| b.parse(&format!("{field}.excluded[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;

        let bounds = blocks
            .iter()
            .map(|b| b.start)
            .min()
            .zip(blocks.iter().map(|b| b.end).max())
            .map(|(start, end)| MinuteRange::new(start, end));

        for (range, block) in excluded.iter().zip(&self.excluded) {
            if !bounds.is_some_and(|outer| outer.contains(range)) {
                return Err(ValidationError::ExcludedOutsideHours {
                    field: field.to_string(),
                    start: block.start_time.clone(),
                    end: block.end_time.clone(),
                });
            }
        }

        if !self.enabled {
            return Ok(Vec::new());
        }
        Ok(subtract_ranges(&merge_ranges(&blocks), &excluded))
    }
}

/// Per-weekday settings for one hour type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekSettings {
    #[serde(default)]
    pub monday: DaySettings,
    #[serde(default)]
    pub tuesday: DaySettings,
    #[serde(default)]
    pub wednesday: DaySettings,
    #[serde(default)]
    pub thursday: DaySettings,
    #[serde(default)]
    pub friday: DaySettings,
    #[serde(default)]
    pub saturday: DaySettings,
    #[serde(default)]
    pub sunday: DaySettings,
}

impl WeekSettings {
    /// The same settings on every day of the week.
    pub fn every_day(day: DaySettings) -> Self {
        Self {
            monday: day.clone(),
            tuesday: day.clone(),
            wednesday: day.clone(),
            thursday: day.clone(),
            friday: day.clone(),
            saturday: day.clone(),
            sunday: day,
        }
    }

    /// `day` Monday to Friday, closed on weekends.
    pub fn weekdays(day: DaySettings) -> Self {
        Self {
            saturday: DaySettings::closed(),
            sunday: DaySettings::closed(),
            ..Self::every_day(day)
        }
    }

    pub fn day(&self, weekday: Weekday) -> &DaySettings {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    pub fn day_mut(&mut self, weekday: Weekday) -> &mut DaySettings {
        match weekday {
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
            Weekday::Sun => &mut self.sunday,
        }
    }
}

/// Hour settings for all hour types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourSettings {
    #[serde(default)]
    pub personal_hours: WeekSettings,
    #[serde(default)]
    pub work_hours: WeekSettings,
    #[serde(default)]
    pub meeting_hours: WeekSettings,
}

impl Default for HourSettings {
    fn default() -> Self {
        Self {
            personal_hours: WeekSettings::every_day(DaySettings::open("07:00", "22:00")),
            work_hours: WeekSettings::weekdays(DaySettings::open("09:00", "17:00")),
            meeting_hours: WeekSettings::weekdays(DaySettings::open("09:00", "17:00")),
        }
    }
}

impl HourSettings {
    /// Every hour type open on every day with the same single block.
    pub fn uniform(start: &str, end: &str) -> Self {
        let week = WeekSettings::every_day(DaySettings::open(start, end));
        Self {
            personal_hours: week.clone(),
            work_hours: week.clone(),
            meeting_hours: week,
        }
    }

    /// Nothing open anywhere.
    pub fn closed() -> Self {
        Self {
            personal_hours: WeekSettings::default(),
            work_hours: WeekSettings::default(),
            meeting_hours: WeekSettings::default(),
        }
    }

    pub fn week(&self, hour_type: HourType) -> &WeekSettings {
        match hour_type {
            HourType::PersonalHours => &self.personal_hours,
            HourType::WorkHours => &self.work_hours,
            HourType::MeetingHours => &self.meeting_hours,
        }
    }

    pub fn week_mut(&mut self, hour_type: HourType) -> &mut WeekSettings {
        match hour_type {
            HourType::PersonalHours => &mut self.personal_hours,
            HourType::WorkHours => &mut self.work_hours,
            HourType::MeetingHours => &mut self.meeting_hours,
        }
    }

    /// Open minute ranges for a weekday of an hour type.
    pub fn open_ranges(
        &self,
        hour_type: HourType,
        weekday: Weekday,
    ) -> Result<Vec<MinuteRange>, ValidationError> {
        let field = format!("{}.{}", hour_type, weekday_name(weekday));
        self.week(hour_type).day(weekday).open_ranges(&field)
    }

    /// Check every block and excluded range of every day.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for hour_type in HourType::ALL {
            for weekday in WEEKDAYS {
                self.open_ranges(hour_type, weekday)?;
            }
        }
        Ok(())
    }
}

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Parse `HH:MM` into minutes from midnight. `24:00` is the end of day.
pub fn parse_clock(field: &str, value: &str) -> Result<u32, ValidationError> {
    let invalid = || ValidationError::InvalidTime {
        field: field.to_string(),
        value: value.to_string(),
    };

    let (hour, minute) = value.trim().split_once(':').ok_or_else(invalid)?;
    if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
        return Err(invalid());
    }
    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;

    if minute > 59 || hour > 24 || (hour == 24 && minute != 0) {
        return Err(invalid());
    }
    let total = hour * 60 + minute;
    debug_assert!(total <= MINUTES_PER_DAY);
    Ok(total)
}

/// Format minutes from midnight as `HH:MM`.
pub fn format_clock(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_clock_accepts_valid_times() {
        assert_eq!(parse_clock("t", "09:00").unwrap(), 540);
        assert_eq!(parse_clock("t", "9:30").unwrap(), 570);
        assert_eq!(parse_clock("t", "24:00").unwrap(), MINUTES_PER_DAY);
        assert_eq!(parse_clock("t", "00:00").unwrap(), 0);
    }

    #[test]
    fn parse_clock_rejects_malformed_times() {
        for bad in ["", "9", "09:0", "09:60", "25:00", "24:01", "ab:cd", "09-00"] {
            assert!(parse_clock("t", bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn format_clock_pads() {
        assert_eq!(format_clock(545), "09:05");
        assert_eq!(format_clock(MINUTES_PER_DAY), "24:00");
    }

    #[test]
    fn day_open_ranges_subtracts_merged_exclusions() {
        let day = DaySettings::open("09:00", "17:00")
            .with_excluded("12:00", "12:45")
            .with_excluded("12:30", "13:00");
        let ranges = day.open_ranges("d").unwrap();
        assert_eq!(
            ranges,
            vec![MinuteRange::new(540, 720), MinuteRange::new(780, 1020)]
        );
    }

    #[test]
    fn disabled_day_has_no_ranges() {
        let mut day = DaySettings::open("09:00", "17:00");
        day.enabled = false;
        assert!(day.open_ranges("d").unwrap().is_empty());
    }

    #[test]
    fn inverted_block_is_rejected() {
        let day = DaySettings::open("17:00", "09:00");
        assert!(matches!(
            day.open_ranges("d"),
            Err(ValidationError::InvalidRange { .. })
        ));
    }

    #[test]
    fn excluded_outside_hours_is_rejected() {
        let day = DaySettings::open("09:00", "12:00").with_excluded("11:30", "12:30");
        assert!(matches!(
            day.open_ranges("d"),
            Err(ValidationError::ExcludedOutsideHours { .. })
        ));
    }

    #[test]
    fn excluded_on_day_without_blocks_is_rejected() {
        let day = DaySettings::closed().with_excluded("10:00", "11:00");
        assert!(day.open_ranges("d").is_err());
    }

    #[test]
    fn default_settings_validate() {
        HourSettings::default().validate().unwrap();
        assert!(HourSettings::default()
            .open_ranges(HourType::WorkHours, Weekday::Sat)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn validation_error_names_the_field() {
        let mut settings = HourSettings::closed();
        settings.work_hours.tuesday = DaySettings::open("10:00", "bad");
        let err = settings.validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidTime {
                field: "work_hours.tuesday.time_blocks[0]".into(),
                value: "bad".into(),
            }
        );
    }

    #[test]
    fn hour_settings_toml_roundtrip() {
        let settings = HourSettings::default();
        let text = toml::to_string_pretty(&settings).unwrap();
        let parsed: HourSettings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }
}
