//! # Smartcal Core Library
//!
//! This library provides the scheduling preview engine for the smartcal
//! calendar. It simulates how tasks and habits would be placed into open
//! time and records every decision so a UI can animate the result. All
//! operations are also available through the standalone `smartcal` CLI.
//!
//! ## Architecture
//!
//! - **Hours**: per hour type and weekday time blocks with excluded ranges
//! - **Window**: open intervals per local day, after committed events
//! - **Candidate**: task and habit-occurrence normalization and ordering
//! - **Simulator**: single-pass earliest-fit placement
//! - **Recorder**: scheduling steps and cumulative snapshots
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`generate_preview`]: Run a preview from [`GeneratePreviewOptions`]
//! - [`get_animation_steps`] / [`get_events_at_step`]: Playback helpers
//! - [`Config`]: Application configuration management
//! - [`DemoScenario`]: Seeded demo workloads

pub mod candidate;
pub mod demo;
pub mod error;
pub mod hours;
pub mod preview;
pub mod recorder;
pub mod simulator;
pub mod storage;
pub mod window;

pub use candidate::{
    CalendarEvent, Candidate, CandidateKind, DayPeriod, Frequency, PreviewHabit, PreviewTask,
    Priority, Recurrence, TimePreference,
};
pub use demo::{DemoHarness, DemoMetrics, DemoRun, DemoScenario, DemoSeed, ScenarioVariation};
pub use error::{ConfigError, CoreError, Result, ValidationError};
pub use hours::{DaySettings, HourSettings, HourType, TimeBlock, WeekSettings};
pub use preview::{
    generate_preview, get_animation_steps, get_events_at_step, GeneratePreviewOptions,
    PreviewFlags, PreviewHabitResult, PreviewInput, PreviewResult, PreviewSummary,
    PreviewTaskResult, PreviewWarning, WarningLevel, MAX_WINDOW_DAYS,
};
pub use recorder::{
    AnimationSteps, PreviewEvent, SchedulingStep, StepAction, StepDebug, UnplacedReason,
};
pub use simulator::{IntervalPool, PlacementSimulator, Simulation, SimulatorConfig, UnplacedItem};
pub use storage::{Config, PreviewSettings};
pub use window::{OpenInterval, PreviewRange, TimeWindowModel};
