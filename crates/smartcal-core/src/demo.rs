//! Seeded demo scenarios for the animated preview.
//!
//! This module generates reproducible workloads and runs them through
//! [`generate_preview`]. It enables:
//! - Seed-based demo data (tasks, habits, calendar events)
//! - Scenario export and replay
//! - Parameter sweeps over seeds, counts and flags

use chrono::{DateTime, Duration, Utc, Weekday};
use chrono_tz::Tz;
use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::candidate::{
    CalendarEvent, DayPeriod, PreviewHabit, PreviewTask, Priority, Recurrence, TimePreference,
};
use crate::error::Result;
use crate::hours::{HourSettings, HourType};
use crate::preview::{generate_preview, GeneratePreviewOptions, PreviewFlags, PreviewResult};
use crate::window::local_instant;

const TASK_STREAM: u64 = 0x7461_736b;
const HABIT_STREAM: u64 = 0x6861_6269;
const EVENT_STREAM: u64 = 0x6576_656e;

/// Seed for deterministic demo data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DemoSeed(pub u64);

impl DemoSeed {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Seed derived from a scenario name (FNV-1a, stable across builds)
    pub fn from_string(s: &str) -> Self {
        let hash = s.bytes().fold(0xcbf2_9ce4_8422_2325u64, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
        });
        Self(hash)
    }

    fn rng(&self, stream: u64) -> Mcg128Xsl64 {
        Mcg128Xsl64::seed_from_u64(self.0 ^ stream)
    }
}

impl Default for DemoSeed {
    fn default() -> Self {
        Self(42)
    }
}

/// A demo workload plus the settings to preview it with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoScenario {
    pub name: String,
    pub seed: DemoSeed,
    pub now: DateTime<Utc>,
    pub window_days: u32,
    pub timezone: Tz,
    pub hours: HourSettings,
    pub flags: PreviewFlags,
    pub tasks: Vec<PreviewTask>,
    pub habits: Vec<PreviewHabit>,
    pub events: Vec<CalendarEvent>,
}

impl DemoScenario {
    /// Empty scenario over a one week window
    pub fn new(name: impl Into<String>, seed: DemoSeed, now: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            seed,
            now,
            window_days: 7,
            timezone: Tz::UTC,
            hours: HourSettings::default(),
            flags: PreviewFlags::default(),
            tasks: Vec::new(),
            habits: Vec::new(),
            events: Vec::new(),
        }
    }

    /// The default demo: a handful of tasks, habits and meetings.
    pub fn standard(seed: DemoSeed, now: DateTime<Utc>) -> Self {
        let mut scenario = Self::new("standard", seed, now);
        scenario.generate_random_tasks(8);
        scenario.generate_random_habits(3);
        scenario.generate_random_events(6);
        scenario
    }

    pub fn with_window_days(mut self, days: u32) -> Self {
        self.window_days = days;
        self
    }

    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.timezone = tz;
        self
    }

    pub fn with_hours(mut self, hours: HourSettings) -> Self {
        self.hours = hours;
        self
    }

    pub fn with_flags(mut self, flags: PreviewFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_tasks(mut self, tasks: Vec<PreviewTask>) -> Self {
        self.tasks = tasks;
        self
    }

    /// Generate random tasks using the seed
    pub fn generate_random_tasks(&mut self, count: usize) {
        let mut rng = self.seed.rng(TASK_STREAM);
        self.tasks = (0..count)
            .map(|i| random_task(&mut rng, self.now, self.window_days, i))
            .collect();
    }

    /// Generate random habits using the seed
    pub fn generate_random_habits(&mut self, count: usize) {
        let mut rng = self.seed.rng(HABIT_STREAM);
        self.habits = (0..count).map(|i| random_habit(&mut rng, i)).collect();
    }

    /// Generate random calendar events using the seed
    pub fn generate_random_events(&mut self, count: usize) {
        let mut rng = self.seed.rng(EVENT_STREAM);
        self.events = (0..count)
            .filter_map(|i| random_event(&mut rng, self, i))
            .collect();
    }

    pub fn options(&self) -> GeneratePreviewOptions {
        GeneratePreviewOptions::new(self.now)
            .with_tasks(self.tasks.clone())
            .with_habits(self.habits.clone())
            .with_events(self.events.clone())
            .with_hours(self.hours.clone())
            .with_window_days(self.window_days)
            .with_timezone(self.timezone)
            .with_flags(self.flags)
    }
}

/// Headline numbers of one demo run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemoMetrics {
    pub candidates: usize,
    pub placed: usize,
    pub unplaced: usize,
    pub minutes_placed: i64,
    pub minutes_requested: i64,
    /// Share of requested minutes that were placed (0.0-1.0)
    pub utilisation: f64,
}

impl DemoMetrics {
    fn from_result(result: &PreviewResult) -> Self {
        let minutes_placed: i64 = result.events.iter().map(|e| e.minutes).sum();
        let minutes_unplaced: i64 = result
            .unplaced
            .iter()
            .map(|item| item.duration_minutes.max(0))
            .fold(0i64, i64::saturating_add);
        let minutes_requested = minutes_placed.saturating_add(minutes_unplaced);

        Self {
            candidates: result.summary.candidates,
            placed: result.events.len(),
            unplaced: result.unplaced.len(),
            minutes_placed,
            minutes_requested,
            utilisation: if minutes_requested == 0 {
                0.0
            } else {
                minutes_placed as f64 / minutes_requested as f64
            },
        }
    }
}

/// One scenario together with its preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoRun {
    pub scenario: DemoScenario,
    pub result: PreviewResult,
    pub metrics: DemoMetrics,
}

/// Runs demo scenarios and keeps their history
#[derive(Debug, Default)]
pub struct DemoHarness {
    history: Vec<DemoRun>,
}

impl DemoHarness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a demo scenario
    pub fn run_scenario(&mut self, scenario: &DemoScenario) -> Result<DemoRun> {
        let result = generate_preview(&scenario.options())?;
        let metrics = DemoMetrics::from_result(&result);
        tracing::debug!(
            scenario = %scenario.name,
            seed = scenario.seed.0,
            placed = metrics.placed,
            unplaced = metrics.unplaced,
            "demo scenario finished"
        );

        let run = DemoRun {
            scenario: scenario.clone(),
            result,
            metrics,
        };
        self.history.push(run.clone());
        Ok(run)
    }

    /// Run multiple scenarios with systematic variation
    pub fn run_sweep(
        &mut self,
        base: &DemoScenario,
        variations: &[ScenarioVariation],
    ) -> Result<Vec<DemoRun>> {
        variations
            .iter()
            .map(|variation| self.run_scenario(&variation.apply(base.clone())))
            .collect()
    }

    pub fn history(&self) -> &[DemoRun] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Export scenario to a JSON file
    pub fn export_scenario(scenario: &DemoScenario, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(scenario)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Import scenario from a JSON file
    pub fn import_scenario(path: &Path) -> Result<DemoScenario> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Scenario variation for parameter sweeps
#[derive(Debug, Clone)]
pub enum ScenarioVariation {
    /// Vary the seed, regenerating whatever the base scenario had
    Seed(DemoSeed),
    TaskCount(usize),
    HabitCount(usize),
    EventCount(usize),
    WindowDays(u32),
    Flags(PreviewFlags),
}

impl ScenarioVariation {
    /// Apply the variation to a scenario
    pub fn apply(&self, mut scenario: DemoScenario) -> DemoScenario {
        match self {
            ScenarioVariation::Seed(seed) => {
                scenario.seed = *seed;
                let (tasks, habits, events) = (
                    scenario.tasks.len(),
                    scenario.habits.len(),
                    scenario.events.len(),
                );
                scenario.generate_random_tasks(tasks);
                scenario.generate_random_habits(habits);
                scenario.generate_random_events(events);
            }
            ScenarioVariation::TaskCount(count) => scenario.generate_random_tasks(*count),
            ScenarioVariation::HabitCount(count) => scenario.generate_random_habits(*count),
            ScenarioVariation::EventCount(count) => scenario.generate_random_events(*count),
            ScenarioVariation::WindowDays(days) => scenario.window_days = *days,
            ScenarioVariation::Flags(flags) => scenario.flags = *flags,
        }
        scenario
    }
}

const DURATIONS: [i64; 6] = [15, 30, 45, 60, 90, 120];
const PRIORITIES: [Priority; 4] = [
    Priority::Low,
    Priority::Normal,
    Priority::High,
    Priority::Critical,
];
const PERIODS: [DayPeriod; 4] = [
    DayPeriod::Morning,
    DayPeriod::Afternoon,
    DayPeriod::Evening,
    DayPeriod::Night,
];

fn random_task(
    rng: &mut Mcg128Xsl64,
    now: DateTime<Utc>,
    window_days: u32,
    index: usize,
) -> PreviewTask {
    let mut task = PreviewTask::new(
        format!("task-{index}"),
        format!("Task {index}"),
        DURATIONS[rng.gen_range(0..DURATIONS.len())],
    )
    .with_priority(PRIORITIES[rng.gen_range(0..PRIORITIES.len())]);

    if rng.gen_bool(0.5) {
        let days = rng.gen_range(0..=i64::from(window_days.max(1)));
        let hours = rng.gen_range(0..24);
        task = task.with_deadline(now + Duration::days(days) + Duration::hours(hours));
    }
    if rng.gen_bool(0.25) {
        task = task.with_preference(TimePreference::Period(PERIODS[rng.gen_range(0..2)]));
    }
    if rng.gen_bool(0.3) {
        task = task.with_hour_type(HourType::WorkHours);
    }
    task
}

fn random_habit(rng: &mut Mcg128Xsl64, index: usize) -> PreviewHabit {
    let recurrence = if rng.gen_bool(0.5) {
        Recurrence::daily()
    } else {
        let mut days: Vec<Weekday> = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .into_iter()
        .filter(|_| rng.gen_bool(0.4))
        .collect();
        if days.is_empty() {
            days.push(Weekday::Mon);
        }
        Recurrence::weekly(days)
    };

    let mut habit = PreviewHabit::new(
        format!("habit-{index}"),
        format!("Habit {index}"),
        DURATIONS[rng.gen_range(0..3)],
        recurrence,
    );
    if rng.gen_bool(0.5) {
        habit = habit.with_preference(TimePreference::Period(
            PERIODS[rng.gen_range(0..PERIODS.len() - 1)],
        ));
    }
    habit
}

fn random_event(
    rng: &mut Mcg128Xsl64,
    scenario: &DemoScenario,
    index: usize,
) -> Option<CalendarEvent> {
    let date = scenario.now.with_timezone(&scenario.timezone).date_naive()
        + Duration::days(rng.gen_range(0..i64::from(scenario.window_days.max(1))));
    let start_minute = rng.gen_range(9 * 4..17 * 4) * 15;
    let minutes = rng.gen_range(2..=8) * 15;

    let start = local_instant(scenario.timezone, date, start_minute)?;
    let mut event = CalendarEvent::new(
        format!("event-{index}"),
        start,
        start + Duration::minutes(minutes),
    );
    event.title = format!("Meeting {index}");
    if rng.gen_bool(0.5) {
        event = event.locked();
    }
    Some(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).unwrap()
    }

    #[test]
    fn same_seed_same_scenario() {
        let a = DemoScenario::standard(DemoSeed::new(7), now());
        let b = DemoScenario::standard(DemoSeed::new(7), now());
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_differ() {
        let a = DemoScenario::standard(DemoSeed::new(7), now());
        let b = DemoScenario::standard(DemoSeed::new(8), now());
        assert_ne!(a.tasks, b.tasks);
    }

    #[test]
    fn seed_from_string_is_stable() {
        assert_eq!(DemoSeed::from_string("demo"), DemoSeed::from_string("demo"));
        assert_ne!(DemoSeed::from_string("demo"), DemoSeed::from_string("demo2"));
    }

    #[test]
    fn harness_runs_are_reproducible() {
        let scenario = DemoScenario::standard(DemoSeed::default(), now());
        let mut harness = DemoHarness::new();
        let first = harness.run_scenario(&scenario).unwrap();
        let second = harness.run_scenario(&scenario).unwrap();

        assert_eq!(first.result, second.result);
        assert_eq!(harness.history().len(), 2);
        assert_eq!(
            first.metrics.placed + first.metrics.unplaced,
            first.metrics.candidates
        );
        assert!((0.0..=1.0).contains(&first.metrics.utilisation));

        harness.clear_history();
        assert!(harness.history().is_empty());
    }

    #[test]
    fn sweep_applies_each_variation() {
        let base = DemoScenario::new("base", DemoSeed::default(), now());
        let mut harness = DemoHarness::new();
        let runs = harness
            .run_sweep(
                &base,
                &[
                    ScenarioVariation::TaskCount(3),
                    ScenarioVariation::HabitCount(2),
                    ScenarioVariation::WindowDays(1),
                ],
            )
            .unwrap();

        assert_eq!(runs[0].scenario.tasks.len(), 3);
        assert_eq!(runs[1].scenario.habits.len(), 2);
        assert_eq!(runs[2].scenario.window_days, 1);
        assert_eq!(runs[2].metrics.candidates, 0);
    }

    #[test]
    fn seed_variation_keeps_counts() {
        let base = DemoScenario::standard(DemoSeed::new(1), now());
        let varied = ScenarioVariation::Seed(DemoSeed::new(2)).apply(base.clone());
        assert_eq!(varied.tasks.len(), base.tasks.len());
        assert_eq!(varied.habits.len(), base.habits.len());
        assert_eq!(varied.events.len(), base.events.len());
    }

    #[test]
    fn export_and_import_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.json");
        let scenario = DemoScenario::standard(DemoSeed::new(99), now())
            .with_timezone(chrono_tz::America::New_York);

        DemoHarness::export_scenario(&scenario, &path).unwrap();
        let imported = DemoHarness::import_scenario(&path).unwrap();
        assert_eq!(imported, scenario);
    }
}
