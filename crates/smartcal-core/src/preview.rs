//! Schedule preview API.
//!
//! [`generate_preview`] validates the input, builds the open-interval pools,
//! collects and orders candidates, runs the placement simulator and assembles
//! per-task and per-habit results, warnings and a summary. The run is pure:
//! `now` comes from the options and nothing is read from the environment.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::candidate::{
    validate_events, validate_habits, validate_tasks, CalendarEvent, CandidateCollector,
    CandidateKind, PreviewHabit, PreviewTask,
};
use crate::error::{Result, ValidationError};
use crate::hours::{HourSettings, HourType};
use crate::recorder::{events_at_step, AnimationSteps, PreviewEvent, SchedulingStep};
use crate::simulator::{IntervalPool, PlacementSimulator, SimulatorConfig, UnplacedItem};
use crate::storage::Config;
use crate::window::{Commitment, PreviewRange, TimeWindowModel};

/// Longest preview window, in local days.
pub const MAX_WINDOW_DAYS: u32 = 366;

/// Feature flags that change placement rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewFlags {
    /// Treat every existing event as busy, not only locked or started ones.
    #[serde(default)]
    pub block_unlocked_events: bool,
    /// A task may not end after its deadline.
    #[serde(default)]
    pub strict_deadlines: bool,
}

/// Work items and calendar events, as read from a JSON input file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewInput {
    #[serde(default)]
    pub tasks: Vec<PreviewTask>,
    #[serde(default)]
    pub habits: Vec<PreviewHabit>,
    #[serde(default)]
    pub events: Vec<CalendarEvent>,
}

impl PreviewInput {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Everything a preview run needs. No field is read from ambient state.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratePreviewOptions {
    pub tasks: Vec<PreviewTask>,
    pub habits: Vec<PreviewHabit>,
    pub existing_events: Vec<CalendarEvent>,
    pub hours: HourSettings,
    pub now: DateTime<Utc>,
    pub window_days: u32,
    pub timezone: Tz,
    pub granularity_minutes: i64,
    pub flags: PreviewFlags,
}

impl GeneratePreviewOptions {
    /// Empty input with default hours, a 30 day window, UTC and 15 minute slots.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            tasks: Vec::new(),
            habits: Vec::new(),
            existing_events: Vec::new(),
            hours: HourSettings::default(),
            now,
            window_days: 30,
            timezone: Tz::UTC,
            granularity_minutes: 15,
            flags: PreviewFlags::default(),
        }
    }

    /// Options from a loaded config plus work items.
    pub fn from_config(config: &Config, input: PreviewInput, now: DateTime<Utc>) -> Result<Self> {
        Ok(Self {
            tasks: input.tasks,
            habits: input.habits,
            existing_events: input.events,
            hours: config.hours.clone(),
            now,
            window_days: config.preview.window_days,
            timezone: config.timezone()?,
            granularity_minutes: config.preview.granularity_minutes,
            flags: config.flags,
        })
    }

    pub fn with_tasks(mut self, tasks: Vec<PreviewTask>) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn with_habits(mut self, habits: Vec<PreviewHabit>) -> Self {
        self.habits = habits;
        self
    }

    pub fn with_events(mut self, events: Vec<CalendarEvent>) -> Self {
        self.existing_events = events;
        self
    }

    pub fn with_hours(mut self, hours: HourSettings) -> Self {
        self.hours = hours;
        self
    }

    pub fn with_window_days(mut self, days: u32) -> Self {
        self.window_days = days;
        self
    }

    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.timezone = tz;
        self
    }

    pub fn with_granularity(mut self, minutes: i64) -> Self {
        self.granularity_minutes = minutes;
        self
    }

    pub fn with_flags(mut self, flags: PreviewFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn range(&self) -> PreviewRange {
        PreviewRange::new(self.now, self.window_days)
    }
}

/// Severity of a preview warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewWarning {
    pub level: WarningLevel,
    pub source_id: String,
    pub message: String,
}

/// Outcome for one submitted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewTaskResult {
    pub task: PreviewTask,
    pub events: Vec<PreviewEvent>,
    /// Minutes already on the calendar plus minutes placed by this preview.
    pub scheduled_minutes: i64,
    pub total_minutes_required: i64,
    pub remaining_minutes: i64,
    pub after_deadline: bool,
    pub warning: Option<String>,
    pub warning_level: Option<WarningLevel>,
}

/// Outcome for one submitted habit across all its occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewHabitResult {
    pub habit: PreviewHabit,
    pub events: Vec<PreviewEvent>,
    pub occurrences: usize,
    pub scheduled_minutes: i64,
    pub warning: Option<String>,
    pub warning_level: Option<WarningLevel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewSummary {
    pub candidates: usize,
    pub total_events: usize,
    pub unplaced: usize,
    pub steps: usize,
    pub tasks_scheduled: usize,
    pub tasks_already_scheduled: usize,
    pub tasks_after_deadline: usize,
    pub unscheduled_tasks: usize,
    pub habits_scheduled: usize,
    pub unscheduled_habit_occurrences: usize,
    pub scheduled_minutes: i64,
}

/// The full output of a preview run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewResult {
    pub events: Vec<PreviewEvent>,
    pub steps: Vec<SchedulingStep>,
    pub tasks: Vec<PreviewTaskResult>,
    pub habits: Vec<PreviewHabitResult>,
    pub unplaced: Vec<UnplacedItem>,
    pub warnings: Vec<PreviewWarning>,
    pub summary: PreviewSummary,
}

/// Run a full preview.
///
/// # Errors
///
/// Returns [`CoreError::Validation`](crate::CoreError::Validation) for
/// structurally invalid input. Candidates that cannot be placed are reported
/// in [`PreviewResult::unplaced`], never as errors.
#[tracing::instrument(
    skip(options),
    fields(
        tasks = options.tasks.len(),
        habits = options.habits.len(),
        events = options.existing_events.len(),
        tz = %options.timezone,
    )
)]
pub fn generate_preview(options: &GeneratePreviewOptions) -> Result<PreviewResult> {
    validate_tasks(&options.tasks)?;
    validate_habits(&options.habits)?;
    validate_events(&options.existing_events)?;
    options.hours.validate()?;
    if options.granularity_minutes <= 0 {
        return Err(ValidationError::InvalidValue {
            field: "granularity_minutes".to_string(),
            message: "must be positive".to_string(),
        }
        .into());
    }
    if !(1..=MAX_WINDOW_DAYS).contains(&options.window_days) {
        return Err(ValidationError::InvalidValue {
            field: "window_days".to_string(),
            message: format!("must be between 1 and {MAX_WINDOW_DAYS}"),
        }
        .into());
    }

    let tz = options.timezone;
    let range = options.range();

    let committed: Vec<Commitment> = options
        .existing_events
        .iter()
        .filter(|event| event.is_committed(options.now, options.flags.block_unlocked_events))
        .map(|event| Commitment::new(event.start, event.end))
        .collect();

    let model =
        TimeWindowModel::new(&options.hours, tz).with_granularity(options.granularity_minutes);
    let mut pool = IntervalPool::new();
    for hour_type in HourType::ALL {
        pool.insert(hour_type, model.open_intervals(&range, hour_type, &committed)?);
    }

    let collected = CandidateCollector::new(tz)
        .with_strict_deadlines(options.flags.strict_deadlines)
        .collect(&options.tasks, &options.habits, &range);

    let config = SimulatorConfig {
        granularity_minutes: options.granularity_minutes,
    };
    let simulation = PlacementSimulator::with_config(pool, tz, config).run(&collected.candidates);

    let mut placed: HashMap<(CandidateKind, &str), Vec<PreviewEvent>> = HashMap::new();
    for event in &simulation.events {
        placed
            .entry((event.kind, event.source_id.as_str()))
            .or_default()
            .push(event.clone());
    }
    let mut skipped: HashMap<(CandidateKind, &str), Vec<&UnplacedItem>> = HashMap::new();
    for item in &simulation.unplaced {
        skipped
            .entry((item.kind, item.source_id.as_str()))
            .or_default()
            .push(item);
    }

    let mut warnings = Vec::new();
    let mut summary = PreviewSummary {
        candidates: collected.candidates.len(),
        total_events: simulation.events.len(),
        unplaced: simulation.unplaced.len(),
        steps: simulation.steps.len(),
        ..PreviewSummary::default()
    };

    let tasks: Vec<PreviewTaskResult> = options
        .tasks
        .iter()
        .map(|task| {
            let events = placed
                .remove(&(CandidateKind::Task, task.id.as_str()))
                .unwrap_or_default();
            let unplaced = skipped
                .get(&(CandidateKind::Task, task.id.as_str()))
                .and_then(|items| items.first());
            task_result(task, events, unplaced.copied(), &mut summary, &mut warnings)
        })
        .collect();

    let habits: Vec<PreviewHabitResult> = options
        .habits
        .iter()
        .map(|habit| {
            let events = placed
                .remove(&(CandidateKind::Habit, habit.id.as_str()))
                .unwrap_or_default();
            let missed = skipped
                .get(&(CandidateKind::Habit, habit.id.as_str()))
                .map_or(0, Vec::len);
            habit_result(habit, events, missed, &mut summary, &mut warnings)
        })
        .collect();

    summary.scheduled_minutes = simulation.events.iter().map(|e| e.minutes).sum();

    tracing::info!(
        candidates = summary.candidates,
        placed = summary.total_events,
        unplaced = summary.unplaced,
        already_scheduled = collected.satisfied_tasks.len(),
        "preview generated"
    );

    Ok(PreviewResult {
        events: simulation.events,
        steps: simulation.steps,
        tasks,
        habits,
        unplaced: simulation.unplaced,
        warnings,
        summary,
    })
}

fn task_result(
    task: &PreviewTask,
    events: Vec<PreviewEvent>,
    unplaced: Option<&UnplacedItem>,
    summary: &mut PreviewSummary,
    warnings: &mut Vec<PreviewWarning>,
) -> PreviewTaskResult {
    let placed_minutes: i64 = events.iter().map(|e| e.minutes).sum();
    let scheduled_minutes = task.scheduled_minutes.max(0).saturating_add(placed_minutes);
    let total = task.duration_minutes;
    let after_deadline = task
        .deadline
        .is_some_and(|deadline| events.iter().any(|e| e.end > deadline));

    let warning = if let Some(item) = unplaced {
        summary.unscheduled_tasks += 1;
        Some((
            WarningLevel::Error,
            format!("Could not schedule task: {}", item.reason.description()),
        ))
    } else if events.is_empty() {
        summary.tasks_already_scheduled += 1;
        None
    } else {
        summary.tasks_scheduled += 1;
        after_deadline.then(|| {
            summary.tasks_after_deadline += 1;
            (
                WarningLevel::Info,
                "Scheduled after deadline".to_string(),
            )
        })
    };

    if let Some((level, message)) = &warning {
        warnings.push(PreviewWarning {
            level: *level,
            source_id: task.id.clone(),
            message: format!("Task \"{}\": {message}", task.title),
        });
    }

    PreviewTaskResult {
        task: task.clone(),
        events,
        scheduled_minutes,
        total_minutes_required: total,
        remaining_minutes: total.saturating_sub(scheduled_minutes).max(0),
        after_deadline,
        warning_level: warning.as_ref().map(|(level, _)| *level),
        warning: warning.map(|(_, message)| message),
    }
}

fn habit_result(
    habit: &PreviewHabit,
    events: Vec<PreviewEvent>,
    missed: usize,
    summary: &mut PreviewSummary,
    warnings: &mut Vec<PreviewWarning>,
) -> PreviewHabitResult {
    let occurrences = events.len() + missed;
    summary.habits_scheduled += events.len();
    summary.unscheduled_habit_occurrences += missed;

    let warning = match (missed, events.len()) {
        (0, _) => None,
        (_, 0) => Some((
            WarningLevel::Error,
            format!("Could not schedule any of {occurrences} occurrences"),
        )),
        (missed, _) => Some((
            WarningLevel::Warning,
            format!("{missed} of {occurrences} occurrences could not be scheduled"),
        )),
    };

    if let Some((level, message)) = &warning {
        warnings.push(PreviewWarning {
            level: *level,
            source_id: habit.id.clone(),
            message: format!("Habit \"{}\": {message}", habit.title),
        });
    }

    PreviewHabitResult {
        habit: habit.clone(),
        scheduled_minutes: events.iter().map(|e| e.minutes).sum(),
        events,
        occurrences,
        warning_level: warning.as_ref().map(|(level, _)| *level),
        warning: warning.map(|(_, message)| message),
    }
}

/// Restartable iterator over the recorded steps, for animated playback.
pub fn get_animation_steps(result: &PreviewResult) -> AnimationSteps<'_> {
    AnimationSteps::new(&result.steps)
}

/// Placed events as of step `step`; past the end this is the final snapshot.
pub fn get_events_at_step(result: &PreviewResult, step: usize) -> &[PreviewEvent] {
    events_at_step(&result.events, &result.steps, step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{Priority, Recurrence, TimePreference};
    use crate::recorder::UnplacedReason;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        // Monday
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
    }

    fn morning_only() -> GeneratePreviewOptions {
        GeneratePreviewOptions::new(now())
            .with_hours(HourSettings::uniform("09:00", "12:00"))
            .with_window_days(1)
    }

    #[test]
    fn deadline_first_then_back_to_back() {
        let options = morning_only().with_tasks(vec![
            PreviewTask::new("a", "Write report", 60),
            PreviewTask::new("b", "Send invoice", 30).with_deadline(at(23, 59)),
        ]);
        let result = generate_preview(&options).unwrap();

        assert!(result.unplaced.is_empty());
        assert_eq!(result.events[0].source_id, "b");
        assert_eq!((result.events[0].start, result.events[0].end), (at(9, 0), at(9, 30)));
        assert_eq!(result.events[1].source_id, "a");
        assert_eq!((result.events[1].start, result.events[1].end), (at(9, 30), at(10, 30)));
        assert_eq!(result.summary.tasks_scheduled, 2);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn committed_events_block_time() {
        let options = morning_only()
            .with_tasks(vec![PreviewTask::new("a", "Deep work", 60)])
            .with_events(vec![
                CalendarEvent::new("standup", at(9, 0), at(10, 0)).locked()
            ]);
        let result = generate_preview(&options).unwrap();
        assert_eq!(result.events[0].start, at(10, 0));
    }

    #[test]
    fn unlocked_future_events_only_block_with_flag() {
        let event = CalendarEvent::new("tentative", at(9, 0), at(10, 0));
        let base = morning_only()
            .with_tasks(vec![PreviewTask::new("a", "Deep work", 60)])
            .with_events(vec![event]);

        let open = generate_preview(&base).unwrap();
        assert_eq!(open.events[0].start, at(9, 0));

        let blocked = generate_preview(&base.with_flags(PreviewFlags {
            block_unlocked_events: true,
            ..PreviewFlags::default()
        }))
        .unwrap();
        assert_eq!(blocked.events[0].start, at(10, 0));
    }

    #[test]
    fn soft_deadline_flags_late_placement() {
        let options = morning_only().with_tasks(vec![
            PreviewTask::new("b", "Late", 60).with_deadline(at(9, 30)),
        ]);
        let result = generate_preview(&options).unwrap();
        let b = &result.tasks[0];
        assert!(b.after_deadline);
        assert_eq!(b.warning_level, Some(WarningLevel::Info));
        assert_eq!(result.summary.tasks_after_deadline, 1);
    }

    #[test]
    fn strict_deadline_leaves_task_unplaced() {
        let options = morning_only()
            .with_tasks(vec![PreviewTask::new("b", "Late", 60).with_deadline(at(9, 30))])
            .with_flags(PreviewFlags {
                strict_deadlines: true,
                ..PreviewFlags::default()
            });
        let result = generate_preview(&options).unwrap();
        assert_eq!(result.unplaced[0].reason, UnplacedReason::DeadlineUnreachable);
        assert_eq!(result.tasks[0].warning_level, Some(WarningLevel::Error));
        assert_eq!(result.summary.unscheduled_tasks, 1);
    }

    #[test]
    fn already_scheduled_tasks_are_not_candidates() {
        let options = morning_only().with_tasks(vec![
            PreviewTask::new("done", "Done", 60).with_scheduled_minutes(60)
        ]);
        let result = generate_preview(&options).unwrap();
        assert!(result.steps.is_empty());
        assert_eq!(result.summary.tasks_already_scheduled, 1);
        assert_eq!(result.tasks[0].remaining_minutes, 0);
    }

    #[test]
    fn partially_scheduled_task_places_remainder() {
        let options = morning_only().with_tasks(vec![
            PreviewTask::new("a", "Half done", 90).with_scheduled_minutes(30)
        ]);
        let result = generate_preview(&options).unwrap();
        assert_eq!(result.events[0].minutes, 60);
        assert_eq!(result.tasks[0].scheduled_minutes, 90);
        assert_eq!(result.tasks[0].remaining_minutes, 0);
    }

    #[test]
    fn habits_place_one_occurrence_per_day() {
        let options = morning_only()
            .with_window_days(3)
            .with_habits(vec![PreviewHabit::new("walk", "Walk", 30, Recurrence::daily())]);
        let result = generate_preview(&options).unwrap();
        assert_eq!(result.events.len(), 3);
        assert_eq!(result.habits[0].occurrences, 3);
        assert_eq!(result.summary.habits_scheduled, 3);
        for (day, event) in result.events.iter().enumerate() {
            assert_eq!(event.start, at(9, 0) + Duration::days(day as i64));
        }
    }

    #[test]
    fn habit_occurrence_does_not_spill_into_next_day() {
        let options = GeneratePreviewOptions::new(now())
            .with_hours(HourSettings::uniform("09:00", "09:30"))
            .with_window_days(1)
            .with_habits(vec![PreviewHabit::new("read", "Read", 60, Recurrence::daily())]);
        let result = generate_preview(&options).unwrap();
        assert_eq!(result.unplaced.len(), 1);
        assert_eq!(result.habits[0].warning_level, Some(WarningLevel::Error));
    }

    #[test]
    fn invalid_input_is_an_error() {
        let options = morning_only().with_tasks(vec![
            PreviewTask::new("a", "One", 30),
            PreviewTask::new("a", "Two", 30),
        ]);
        assert!(matches!(
            generate_preview(&options),
            Err(crate::CoreError::Validation(ValidationError::DuplicateId { .. }))
        ));

        let options = morning_only().with_granularity(0);
        assert!(generate_preview(&options).is_err());
    }

    #[test]
    fn oversized_durations_are_reported_unplaced() {
        let options = morning_only().with_tasks(vec![
            PreviewTask::new("huge", "Huge", 10_000_000_000_000),
            PreviewTask::new("max", "Max", i64::MAX),
            PreviewTask::new("ideal", "Ideal", i64::MAX)
                .with_preference(TimePreference::IdealTime(10 * 60)),
            PreviewTask::new("short", "Short", 30)
                .with_preference(TimePreference::IdealTime(10 * 60)),
        ]);
        let result = generate_preview(&options).unwrap();

        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].source_id, "short");
        assert_eq!(result.unplaced.len(), 3);
        assert!(result
            .unplaced
            .iter()
            .all(|item| item.reason == UnplacedReason::NoFittingInterval));
        let max = result.tasks.iter().find(|t| t.task.id == "max").unwrap();
        assert_eq!(max.remaining_minutes, i64::MAX);
    }

    #[test]
    fn window_days_must_be_within_bounds() {
        for days in [0, MAX_WINDOW_DAYS + 1, u32::MAX] {
            let options = morning_only().with_window_days(days);
            assert!(matches!(
                generate_preview(&options),
                Err(crate::CoreError::Validation(ValidationError::InvalidValue { .. }))
            ));
        }
        let options = morning_only().with_window_days(MAX_WINDOW_DAYS);
        assert!(generate_preview(&options).is_ok());
    }

    #[test]
    fn now_is_aligned_before_placement() {
        let options = GeneratePreviewOptions::new(at(9, 7))
            .with_hours(HourSettings::uniform("09:00", "12:00"))
            .with_window_days(1)
            .with_tasks(vec![PreviewTask::new("a", "A", 30)]);
        let result = generate_preview(&options).unwrap();
        assert_eq!(result.events[0].start, at(9, 15));
    }

    #[test]
    fn snapshot_helpers_follow_steps() {
        let options = GeneratePreviewOptions::new(now())
            .with_hours(HourSettings::uniform("09:00", "09:30"))
            .with_window_days(1)
            .with_tasks(vec![PreviewTask::new("a", "A", 30), PreviewTask::new("b", "B", 30)]);
        let result = generate_preview(&options).unwrap();

        assert_eq!(get_animation_steps(&result).count(), 2);
        assert_eq!(get_events_at_step(&result, 0).len(), 1);
        assert_eq!(get_events_at_step(&result, 1).len(), 1);
        assert_eq!(get_events_at_step(&result, 10).len(), 1);
    }

    #[test]
    fn from_config_uses_settings() {
        let mut config = Config::default();
        config.set("preview.timezone", "Europe/Berlin").unwrap();
        config.set("preview.window_days", "3").unwrap();
        let input = PreviewInput::from_json(r#"{"tasks": [{"id": "a", "title": "A", "duration_minutes": 30}]}"#)
            .unwrap();

        let options = GeneratePreviewOptions::from_config(&config, input, now()).unwrap();
        assert_eq!(options.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(options.window_days, 3);
        assert_eq!(options.tasks.len(), 1);
    }
}
