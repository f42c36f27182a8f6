//! Candidate collection.
//!
//! Accepts raw tasks and habits, validates their structure, expands habit
//! recurrences over the preview window and produces the ordered candidate
//! sequence the placement simulator consumes.

mod collector;
mod input;
mod recurrence;
mod validate;

pub use collector::{
    collect_candidates, compare_candidates, order_candidates, Candidate, CandidateCollector,
    CandidateKind, CollectedCandidates,
};
pub use input::{
    CalendarEvent, DayPeriod, Frequency, PreviewHabit, PreviewTask, Priority, Recurrence,
    TimePreference, IDEAL_TIME_TOLERANCE_FACTOR,
};
pub use recurrence::occurrences_on;
pub use validate::{validate_events, validate_habits, validate_tasks};
