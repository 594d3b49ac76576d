//! Time-Window Filter
//!
//! Removes samples contaminated by known spacecraft events before analysis:
//! - Exclusion intervals: a padded dead zone around a mode transition, or a
//!   padded window around a thermal-control-disabled period
//! - Quality gate: values at or above a ceiling are telemetry glitches
//!
//! Both feed one boolean retention mask aligned with the series times.
//! The padded window is closed: a sample exactly at `start - pad` or
//! `stop + pad` is removed.

use tracing::debug;

use crate::config::{AuditConfig, ConfigError};
use crate::mission_time::MissionSeconds;
use crate::types::SensorSeries;

// ============================================================================
// Exclusion Intervals
// ============================================================================

/// A named time window whose samples are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionInterval {
    pub name: String,
    pub start: MissionSeconds,
    pub stop: MissionSeconds,
    /// Seconds added on both sides
    pub pad: f64,
}

impl ExclusionInterval {
    /// Dead zone `[event - pad, event + pad]` around a single event.
    pub fn around(name: &str, event: MissionSeconds, pad: f64) -> Self {
        Self::spanning(name, event, event, pad)
    }

    /// Window `[start - pad, stop + pad]`.
    pub fn spanning(name: &str, start: MissionSeconds, stop: MissionSeconds, pad: f64) -> Self {
        Self {
            name: name.to_string(),
            start,
            stop,
            pad,
        }
    }

    pub fn lower(&self) -> MissionSeconds {
        self.start - self.pad
    }

    pub fn upper(&self) -> MissionSeconds {
        self.stop + self.pad
    }

    /// True when `t` lies strictly outside the padded window.
    pub fn retains(&self, t: MissionSeconds) -> bool {
        t < self.lower() || t > self.upper()
    }
}

/// Mask that is `true` where a sample survives every interval.
///
/// Same length as `times`; all `true` for an empty interval list.
pub fn build_retention_mask(times: &[MissionSeconds], intervals: &[ExclusionInterval]) -> Vec<bool> {
    times
        .iter()
        .map(|&t| intervals.iter().all(|i| i.retains(t)))
        .collect()
}

/// Copy the elements whose mask entry is `true`.
pub fn apply_mask<T: Clone>(items: &[T], mask: &[bool]) -> Vec<T> {
    items
        .iter()
        .zip(mask)
        .filter(|(_, &keep)| keep)
        .map(|(item, _)| item.clone())
        .collect()
}

// ============================================================================
// Quality Gate
// ============================================================================

/// Keeps values strictly below `ceiling`. Non-finite values never pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityGate {
    pub ceiling: f64,
}

impl QualityGate {
    pub fn new(ceiling: f64) -> Self {
        Self { ceiling }
    }

    pub fn passes(&self, value: f64) -> bool {
        value.is_finite() && value < self.ceiling
    }

    pub fn mask(&self, values: &[f64]) -> Vec<bool> {
        values.iter().map(|&v| self.passes(v)).collect()
    }
}

// ============================================================================
// Retention Filter
// ============================================================================

/// Retention mask with a per-cause removal breakdown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetentionMask {
    pub keep: Vec<bool>,
    /// Samples inside each named interval; a sample inside two intervals
    /// counts for both
    pub removed_by_interval: Vec<(String, usize)>,
    pub removed_by_quality: usize,
}

impl RetentionMask {
    pub fn retained(&self) -> usize {
        self.keep.iter().filter(|&&k| k).count()
    }

    pub fn removed(&self) -> usize {
        self.keep.len() - self.retained()
    }

    pub fn is_empty(&self) -> bool {
        self.retained() == 0
    }
}

/// Exclusion intervals plus an optional quality gate.
#[derive(Debug, Clone, Default)]
pub struct RetentionFilter {
    intervals: Vec<ExclusionInterval>,
    gate: Option<QualityGate>,
}

impl RetentionFilter {
    pub fn new(intervals: Vec<ExclusionInterval>, gate: Option<QualityGate>) -> Self {
        Self { intervals, gate }
    }

    pub fn from_config(config: &AuditConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.exclusion_intervals()?,
            config.filter.quality_ceiling.map(QualityGate::new),
        ))
    }

    pub fn intervals(&self) -> &[ExclusionInterval] {
        &self.intervals
    }

    /// Build the mask for a series.
    ///
    /// The gate tests the per-sample maximum track. For statistic series
    /// that is the interval max, not the mean, so a single glitch sample
    /// removes its whole bin even when the bin mean is under the ceiling.
    /// Categorical series are only time-filtered.
    pub fn apply(&self, series: &SensorSeries) -> RetentionMask {
        let mut keep = build_retention_mask(&series.times, &self.intervals);

        let removed_by_interval = self
            .intervals
            .iter()
            .map(|i| {
                let n = series.times.iter().filter(|&&t| !i.retains(t)).count();
                (i.name.clone(), n)
            })
            .collect();

        let mut removed_by_quality = 0;
        if let (Some(gate), Some(track)) = (self.gate, series.max_track()) {
            for (k, &v) in keep.iter_mut().zip(track) {
                if *k && !gate.passes(v) {
                    removed_by_quality += 1;
                    *k = false;
                }
            }
        }

        let mask = RetentionMask {
            keep,
            removed_by_interval,
            removed_by_quality,
        };
        debug!(
            msid = %series.msid,
            total = series.len(),
            retained = mask.retained(),
            quality_rejects = removed_by_quality,
            "Retention mask built"
        );
        mask
    }
}
