//! Time window model.
//!
//! Turns hour settings, a preview range and committed calendar time into the
//! open intervals the placement simulator fills:
//! - minute-of-day range arithmetic for configured blocks and exclusions
//! - gap detection between committed events
//! - per-day, per-hour-type open intervals in UTC

mod gap;
mod model;
mod ranges;

pub use gap::{detect_time_gaps, Commitment, TimeGap, TimeGapDetector};
pub use model::{
    align_up, local_instant, DayWindows, OpenInterval, PreviewRange, TimeWindowModel,
};
pub use ranges::{merge_ranges, subtract_ranges, MinuteRange, MINUTES_PER_DAY};
