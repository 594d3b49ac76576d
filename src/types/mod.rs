//! Shared data structures for the thermal telemetry audit
//!
//! - SensorSeries / SeriesValues / IntervalStats: uniform telemetry returned by
//!   every source backend
//! - Resolution: sample granularity selector for a fetch
//! - SafetyLimits: caution/warning thresholds as stored in the limit tables

mod series;
mod limits;

pub use series::*;
pub use limits::*;
