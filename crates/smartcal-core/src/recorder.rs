//! Step recorder for animated preview playback.
//!
//! Every placement decision, successful or not, becomes one
//! [`SchedulingStep`]. Placed events go into an append-only log; a step's
//! cumulative snapshot is the prefix of that log up to `placed_count`, so
//! snapshots are never copied.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::candidate::{Candidate, CandidateKind};
use crate::hours::HourType;
use crate::window::OpenInterval;

/// A placed instance of a candidate. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewEvent {
    /// Deterministic for a given candidate and step.
    pub id: String,
    pub source_id: String,
    pub kind: CandidateKind,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Step at which the event was placed.
    pub step: usize,
    pub occurrence_date: Option<NaiveDate>,
    pub minutes: i64,
    pub hour_type: HourType,
}

impl PreviewEvent {
    pub fn new(candidate: &Candidate, start: DateTime<Utc>, end: DateTime<Utc>, step: usize) -> Self {
        let name = format!("{}#{}", candidate.key, step);
        Self {
            id: format!("preview-{}", Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())),
            source_id: candidate.source_id.clone(),
            kind: candidate.kind,
            title: candidate.title.clone(),
            start,
            end,
            step,
            occurrence_date: candidate.occurrence,
            minutes: (end - start).num_minutes(),
            hour_type: candidate.hour_type,
        }
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && self.end > start
    }
}

/// What a step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    Schedule,
    Skip,
}

/// Why a candidate was left unplaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnplacedReason {
    /// Duration was zero or negative.
    InvalidDuration,
    /// The candidate's hour type had no open time at all.
    NoOpenHours,
    /// Open time existed but no interval fit the duration and constraints.
    NoFittingInterval,
    /// It would only fit after its deadline and deadlines are strict.
    DeadlineUnreachable,
}

impl UnplacedReason {
    pub fn description(&self) -> &'static str {
        match self {
            UnplacedReason::InvalidDuration => "duration must be positive",
            UnplacedReason::NoOpenHours => "no open hours in the preview window",
            UnplacedReason::NoFittingInterval => "no open interval fits",
            UnplacedReason::DeadlineUnreachable => "no open interval fits before the deadline",
        }
    }
}

/// An interval as shown in step debug output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalSummary {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub minutes: i64,
    pub weekday: String,
}

impl From<&OpenInterval> for IntervalSummary {
    fn from(interval: &OpenInterval) -> Self {
        Self {
            start: interval.start,
            end: interval.end,
            minutes: interval.duration_minutes(),
            weekday: interval.date.weekday().to_string(),
        }
    }
}

/// Context explaining a decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDebug {
    pub intervals_available: usize,
    pub intervals_considered: Vec<IntervalSummary>,
    pub interval_chosen: Option<IntervalSummary>,
    pub reason: String,
}

/// One recorded decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingStep {
    pub index: usize,
    pub kind: CandidateKind,
    pub action: StepAction,
    pub candidate_key: String,
    pub source_id: String,
    pub title: String,
    pub description: String,
    pub event: Option<PreviewEvent>,
    /// Length of the placed-event log after this step.
    pub placed_count: usize,
    pub skip_reason: Option<UnplacedReason>,
    pub debug: StepDebug,
}

/// Appends steps and placed events as the simulator decides.
#[derive(Debug, Default)]
pub struct StepRecorder {
    steps: Vec<SchedulingStep>,
    events: Vec<PreviewEvent>,
}

impl StepRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next recorded step will get.
    pub fn next_index(&self) -> usize {
        self.steps.len()
    }

    pub fn record_placement(
        &mut self,
        candidate: &Candidate,
        event: PreviewEvent,
        description: String,
        debug: StepDebug,
    ) {
        debug_assert_eq!(event.step, self.next_index());
        self.events.push(event.clone());
        self.steps.push(SchedulingStep {
            index: self.next_index(),
            kind: candidate.kind,
            action: StepAction::Schedule,
            candidate_key: candidate.key.clone(),
            source_id: candidate.source_id.clone(),
            title: candidate.title.clone(),
            description,
            event: Some(event),
            placed_count: self.events.len(),
            skip_reason: None,
            debug,
        });
    }

    pub fn record_skip(
        &mut self,
        candidate: &Candidate,
        reason: UnplacedReason,
        description: String,
        debug: StepDebug,
    ) {
        self.steps.push(SchedulingStep {
            index: self.next_index(),
            kind: candidate.kind,
            action: StepAction::Skip,
            candidate_key: candidate.key.clone(),
            source_id: candidate.source_id.clone(),
            title: candidate.title.clone(),
            description,
            event: None,
            placed_count: self.events.len(),
            skip_reason: Some(reason),
            debug,
        });
    }

    pub fn events(&self) -> &[PreviewEvent] {
        &self.events
    }

    pub fn steps(&self) -> &[SchedulingStep] {
        &self.steps
    }

    pub fn finish(self) -> (Vec<PreviewEvent>, Vec<SchedulingStep>) {
        (self.events, self.steps)
    }
}

/// Finite, restartable iterator over recorded steps.
#[derive(Debug, Clone)]
pub struct AnimationSteps<'a> {
    steps: &'a [SchedulingStep],
    cursor: usize,
}

impl<'a> AnimationSteps<'a> {
    pub fn new(steps: &'a [SchedulingStep]) -> Self {
        Self { steps, cursor: 0 }
    }

    /// Rewind to the first step.
    pub fn restart(&mut self) {
        self.cursor = 0;
    }

    /// Index of the step the next call to `next` yields.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn total(&self) -> usize {
        self.steps.len()
    }
}

impl<'a> Iterator for AnimationSteps<'a> {
    type Item = &'a SchedulingStep;

    fn next(&mut self) -> Option<Self::Item> {
        let step = self.steps.get(self.cursor)?;
        self.cursor += 1;
        Some(step)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.steps.len().saturating_sub(self.cursor);
        (left, Some(left))
    }
}

impl ExactSizeIterator for AnimationSteps<'_> {}

/// Placed events as of step `step`.
///
/// Past the last step this is the final snapshot; with no steps it is empty.
pub fn events_at_step<'a>(
    events: &'a [PreviewEvent],
    steps: &[SchedulingStep],
    step: usize,
) -> &'a [PreviewEvent] {
    let count = match steps.get(step).or_else(|| steps.last()) {
        Some(s) => s.placed_count,
        None => 0,
    };
    &events[..count.min(events.len())]
}
