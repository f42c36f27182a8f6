//! Placement simulator for schedule previews.
//!
//! One deterministic pass over the ordered candidates:
//! - Finds the earliest open interval of the candidate's hour type that fits
//! - Respects hard bounds (start date, strict deadline, habit day) and the
//!   time-of-day preference
//! - Reserves the placed range in every hour-type pool
//! - Records every decision, placed or skipped, as one step
//!
//! There is no backtracking. A candidate that fits nowhere is reported as
//! unplaced, never as an error.

mod pool;

pub use pool::IntervalPool;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::candidate::{Candidate, CandidateKind};
use crate::hours::HourType;
use crate::recorder::{
    IntervalSummary, PreviewEvent, SchedulingStep, StepDebug, StepRecorder, UnplacedReason,
};
use crate::window::{align_up, local_instant, OpenInterval, MINUTES_PER_DAY};

/// Intervals shown in a step's debug context.
const CONSIDERED_LIMIT: usize = 3;

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Placement starts are aligned to this many minutes past local midnight
    pub granularity_minutes: i64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            granularity_minutes: 15,
        }
    }
}

/// A candidate the simulator could not place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnplacedItem {
    pub candidate_key: String,
    pub kind: CandidateKind,
    pub source_id: String,
    pub title: String,
    pub occurrence_date: Option<NaiveDate>,
    pub duration_minutes: i64,
    pub reason: UnplacedReason,
    /// Step that recorded the skip.
    pub step: usize,
}

/// Everything one simulation pass produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Simulation {
    pub events: Vec<PreviewEvent>,
    pub steps: Vec<SchedulingStep>,
    pub unplaced: Vec<UnplacedItem>,
}

impl Simulation {
    pub fn placed_count(&self) -> usize {
        self.events.len()
    }
}

/// A start/end pair found inside an interval.
#[derive(Debug, Clone, Copy)]
struct Slot {
    interval: OpenInterval,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Places candidates into open intervals one at a time.
pub struct PlacementSimulator {
    pool: IntervalPool,
    tz: Tz,
    config: SimulatorConfig,
    /// Hour types that had any open time before the first placement.
    open_at_start: Vec<HourType>,
}

impl PlacementSimulator {
    /// Create a simulator over `pool` with default config
    pub fn new(pool: IntervalPool, tz: Tz) -> Self {
        Self::with_config(pool, tz, SimulatorConfig::default())
    }

    /// Create with custom config
    pub fn with_config(pool: IntervalPool, tz: Tz, config: SimulatorConfig) -> Self {
        let open_at_start = HourType::ALL
            .into_iter()
            .filter(|hour_type| !pool.is_empty(*hour_type))
            .collect();
        Self {
            pool,
            tz,
            config,
            open_at_start,
        }
    }

    /// Remaining open time after (or before) a run.
    pub fn pool(&self) -> &IntervalPool {
        &self.pool
    }

    /// Run the pass over candidates already in scheduling order.
    pub fn run(mut self, candidates: &[Candidate]) -> Simulation {
        let mut recorder = StepRecorder::new();
        let mut unplaced = Vec::new();

        for candidate in candidates {
            match self.place(candidate) {
                Ok((slot, considered)) => {
                    self.pool.reserve(slot.start, slot.end);
                    let step = recorder.next_index();
                    let event = PreviewEvent::new(candidate, slot.start, slot.end, step);
                    tracing::debug!(
                        step,
                        candidate = %candidate.key,
                        start = %slot.start,
                        end = %slot.end,
                        "placed candidate"
                    );
                    let debug = StepDebug {
                        intervals_available: considered.available,
                        intervals_considered: considered.intervals,
                        interval_chosen: Some(IntervalSummary::from(&slot.interval)),
                        reason: self.placement_reason(candidate),
                    };
                    let description = self.describe_placement(candidate, &event);
                    recorder.record_placement(candidate, event, description, debug);
                }
                Err((reason, considered)) => {
                    let step = recorder.next_index();
                    tracing::debug!(
                        step,
                        candidate = %candidate.key,
                        reason = reason.description(),
                        "skipped candidate"
                    );
                    unplaced.push(UnplacedItem {
                        candidate_key: candidate.key.clone(),
                        kind: candidate.kind,
                        source_id: candidate.source_id.clone(),
                        title: candidate.title.clone(),
                        occurrence_date: candidate.occurrence,
                        duration_minutes: candidate.duration_minutes,
                        reason,
                        step,
                    });
                    let debug = StepDebug {
                        intervals_available: considered.available,
                        intervals_considered: considered.intervals,
                        interval_chosen: None,
                        reason: reason.description().to_string(),
                    };
                    let description = format!(
                        "Skipped {} \"{}\": {}",
                        candidate.kind.as_str(),
                        candidate.title,
                        reason.description()
                    );
                    recorder.record_skip(candidate, reason, description, debug);
                }
            }
        }

        let (events, steps) = recorder.finish();
        Simulation {
            events,
            steps,
            unplaced,
        }
    }

    fn place(
        &self,
        candidate: &Candidate,
    ) -> Result<(Slot, Considered), (UnplacedReason, Considered)> {
        let intervals = self.pool.intervals(candidate.hour_type);
        let considered = Considered::collect(intervals, candidate);

        if candidate.duration_minutes <= 0 {
            return Err((UnplacedReason::InvalidDuration, considered));
        }
        if !self.open_at_start.contains(&candidate.hour_type) {
            return Err((UnplacedReason::NoOpenHours, considered));
        }
        // Open intervals never span more than one local day.
        if candidate.duration_minutes > i64::from(MINUTES_PER_DAY) {
            return Err((UnplacedReason::NoFittingInterval, considered));
        }

        if let Some(slot) = intervals
            .iter()
            .find_map(|interval| self.fit(candidate, interval, candidate.latest))
        {
            return Ok((slot, considered));
        }

        // Only a task's latest bound comes from its deadline; a habit's is
        // the end of its day.
        let deadline_bound = candidate.kind == CandidateKind::Task && candidate.latest.is_some();
        if deadline_bound
            && intervals
                .iter()
                .any(|interval| self.fit(candidate, interval, None).is_some())
        {
            return Err((UnplacedReason::DeadlineUnreachable, considered));
        }

        Err((UnplacedReason::NoFittingInterval, considered))
    }

    /// Earliest aligned slot for `candidate` inside `interval`.
    fn fit(
        &self,
        candidate: &Candidate,
        interval: &OpenInterval,
        latest: Option<DateTime<Utc>>,
    ) -> Option<Slot> {
        let mut lower = interval.start;
        let mut upper = interval.end;

        if let Some(earliest) = candidate.earliest {
            lower = lower.max(earliest);
        }
        if let Some(latest) = latest {
            upper = upper.min(latest);
        }
        if let Some(preference) = candidate.preference {
            let window = preference.window(candidate.duration_minutes);
            lower = lower.max(local_instant(self.tz, interval.date, window.start)?);
            upper = upper.min(local_instant(self.tz, interval.date, window.end)?);
        }

        let start = align_up(self.tz, lower, self.config.granularity_minutes);
        let end = start.checked_add_signed(Duration::try_minutes(candidate.duration_minutes)?)?;
        (end <= upper).then_some(Slot {
            interval: *interval,
            start,
            end,
        })
    }

    fn placement_reason(&self, candidate: &Candidate) -> String {
        match candidate.preference {
            Some(preference) => format!("Earliest slot within {preference} preference"),
            None => format!(
                "Earliest slot with {} min available",
                candidate.duration_minutes
            ),
        }
    }

    fn describe_placement(&self, candidate: &Candidate, event: &PreviewEvent) -> String {
        let start = event.start.with_timezone(&self.tz);
        let end = event.end.with_timezone(&self.tz);
        match candidate.kind {
            CandidateKind::Task => format!(
                "Scheduling {}min of \"{}\" on {} at {}-{}",
                event.minutes,
                candidate.title,
                start.format("%a %Y-%m-%d"),
                start.format("%H:%M"),
                end.format("%H:%M"),
            ),
            CandidateKind::Habit => format!(
                "Scheduling habit \"{}\" on {} at {}-{} ({}min)",
                candidate.title,
                start.format("%a %Y-%m-%d"),
                start.format("%H:%M"),
                end.format("%H:%M"),
                event.minutes,
            ),
        }
    }
}

/// Debug context gathered before a decision.
struct Considered {
    available: usize,
    intervals: Vec<IntervalSummary>,
}

impl Considered {
    fn collect(intervals: &[OpenInterval], candidate: &Candidate) -> Self {
        let relevant = intervals
            .iter()
            .filter(|interval| candidate.earliest.map_or(true, |e| interval.end > e))
            .filter(|interval| candidate.latest.map_or(true, |l| interval.start < l));
        Self {
            available: intervals.len(),
            intervals: relevant
                .take(CONSIDERED_LIMIT)
                .map(IntervalSummary::from)
                .collect(),
        }
    }
}
