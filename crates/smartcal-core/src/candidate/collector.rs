//! Normalizes tasks and habit occurrences into one ordered candidate sequence.
//!
//! The ordering is the scheduling policy: deadline ascending (no deadline
//! last), then priority weight descending, then input order.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::input::{PreviewHabit, PreviewTask, Priority, TimePreference};
use super::recurrence::occurrences_on;
use crate::hours::HourType;
use crate::window::{local_instant, PreviewRange};

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    Task,
    Habit,
}

impl CandidateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateKind::Task => "task",
            CandidateKind::Habit => "habit",
        }
    }
}

/// A task or habit occurrence awaiting placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Unique within a run: the task id, or `habit-id@YYYY-MM-DD`.
    pub key: String,
    pub kind: CandidateKind,
    pub source_id: String,
    pub title: String,
    /// Local day of a habit occurrence.
    pub occurrence: Option<NaiveDate>,
    pub duration_minutes: i64,
    /// Ordering deadline. Habit occurrences use the end of their day.
    pub deadline: Option<DateTime<Utc>>,
    /// Hard lower bound on the start.
    pub earliest: Option<DateTime<Utc>>,
    /// Hard upper bound on the end.
    pub latest: Option<DateTime<Utc>>,
    pub preference: Option<TimePreference>,
    pub priority: Priority,
    pub hour_type: HourType,
    /// Position in the normalized input sequence (tasks, then habit occurrences).
    pub input_index: usize,
}

/// Output of a collection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedCandidates {
    /// Candidates in scheduling order.
    pub candidates: Vec<Candidate>,
    /// Ids of tasks whose time is already fully on the calendar.
    pub satisfied_tasks: Vec<String>,
}

/// Builds the candidate sequence for a preview run.
pub struct CandidateCollector {
    tz: Tz,
    strict_deadlines: bool,
}

impl CandidateCollector {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            strict_deadlines: false,
        }
    }

    /// Treat task deadlines as a hard bound on the placement end.
    pub fn with_strict_deadlines(mut self, strict: bool) -> Self {
        self.strict_deadlines = strict;
        self
    }

    pub fn collect(
        &self,
        tasks: &[PreviewTask],
        habits: &[PreviewHabit],
        range: &PreviewRange,
    ) -> CollectedCandidates {
        let mut collected = CollectedCandidates::default();
        let mut index = 0usize;

        for task in tasks {
            // A task whose own duration is non-positive still goes through as a
            // candidate so it is reported unplaced; only scheduled time can
            // satisfy a well-formed task.
            if task.duration_minutes > 0 && task.remaining_minutes() <= 0 {
                collected.satisfied_tasks.push(task.id.clone());
                continue;
            }

            collected.candidates.push(Candidate {
                key: task.id.clone(),
                kind: CandidateKind::Task,
                source_id: task.id.clone(),
                title: task.title.clone(),
                occurrence: None,
                duration_minutes: if task.duration_minutes > 0 {
                    task.remaining_minutes()
                } else {
                    task.duration_minutes
                },
                deadline: task.deadline,
                earliest: task.start_date,
                latest: if self.strict_deadlines {
                    task.deadline
                } else {
                    None
                },
                preference: task.preference,
                priority: task.priority,
                hour_type: task.hour_type,
                input_index: index,
            });
            index += 1;
        }

        let dates = range.local_dates(self.tz);
        let Some(first_day) = dates.first().copied() else {
            order_candidates(&mut collected.candidates);
            return collected;
        };

        for habit in habits {
            for date in occurrences_on(&habit.recurrence, &dates, first_day) {
                let day_start = local_instant(self.tz, date, 0);
                let day_end = date.succ_opt().and_then(|next| local_instant(self.tz, next, 0));

                collected.candidates.push(Candidate {
                    key: format!("{}@{}", habit.id, date),
                    kind: CandidateKind::Habit,
                    source_id: habit.id.clone(),
                    title: habit.title.clone(),
                    occurrence: Some(date),
                    duration_minutes: habit.duration_minutes,
                    deadline: day_end,
                    earliest: day_start,
                    latest: day_end,
                    preference: habit.preference,
                    priority: habit.priority,
                    hour_type: habit.hour_type,
                    input_index: index,
                });
                index += 1;
            }
        }

        order_candidates(&mut collected.candidates);
        collected
    }
}

/// Collect with default settings.
pub fn collect_candidates(
    tasks: &[PreviewTask],
    habits: &[PreviewHabit],
    range: &PreviewRange,
    tz: Tz,
) -> CollectedCandidates {
    CandidateCollector::new(tz).collect(tasks, habits, range)
}

/// Sort candidates into scheduling order. Stable.
pub fn order_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(compare_candidates);
}

/// The scheduling order between two candidates.
pub fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    let by_deadline = match (a.deadline, b.deadline) {
        (Some(da), Some(db)) => da.cmp(&db),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    by_deadline
        .then_with(|| b.priority.weight().cmp(&a.priority.weight()))
        .then_with(|| a.input_index.cmp(&b.input_index))
}
