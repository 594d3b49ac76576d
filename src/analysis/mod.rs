//! Limit-Violation Analyzer
//!
//! Given a series, its retention mask and the sensor's resolved limits,
//! computes:
//! - Global maximum and minimum with their times (interval maxes/mins for
//!   statistic series)
//! - Violation spans above the warning-high and caution-high limits, and
//!   below the warning-low and caution-low limits
//! - A Normal / Caution / Warning classification
//! - The observed range across a sensor group (raw-count health check)
//!
//! A series with nothing left after filtering is `Analysis::NoData`, which is
//! not the same as a series that was analysed and never violated.

mod extrema;
mod group;
mod limits;
mod spans;

pub use extrema::*;
pub use group::*;
pub use limits::*;
pub use spans::*;

use serde::Serialize;

use crate::filter::apply_mask;
use crate::mission_time::MissionSeconds;
use crate::types::SensorSeries;

// ============================================================================
// Results
// ============================================================================

/// Worst limit state reached during the analysed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Classification {
    Normal,
    Caution,
    Warning,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Normal => write!(f, "NORMAL"),
            Classification::Caution => write!(f, "CAUTION"),
            Classification::Warning => write!(f, "WARNING"),
        }
    }
}

/// Everything computed for a sensor with at least one retained sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Findings {
    /// Samples retained by the mask
    pub samples: usize,
    pub max: Extremum,
    pub min: Extremum,
    pub warning_high: Vec<ViolationSpan>,
    pub caution_high: Vec<ViolationSpan>,
    pub warning_low: Vec<ViolationSpan>,
    pub caution_low: Vec<ViolationSpan>,
}

impl Findings {
    /// Hours above the warning-high limit.
    pub fn warning_hours(&self) -> f64 {
        total_hours(&self.warning_high)
    }

    /// Hours above the caution-high limit.
    pub fn caution_hours(&self) -> f64 {
        total_hours(&self.caution_high)
    }

    pub fn warning_low_hours(&self) -> f64 {
        total_hours(&self.warning_low)
    }

    pub fn caution_low_hours(&self) -> f64 {
        total_hours(&self.caution_low)
    }

    /// Belongs in the warning-violation report.
    pub fn has_warning_violation(&self) -> bool {
        self.warning_hours() != 0.0
    }

    /// Belongs in the caution-violation report.
    pub fn has_caution_violation(&self) -> bool {
        self.caution_hours() != 0.0
    }

    /// Worst state with a nonzero duration, high or low.
    pub fn classification(&self) -> Classification {
        if self.has_warning_violation() || self.warning_low_hours() != 0.0 {
            Classification::Warning
        } else if self.has_caution_violation() || self.caution_low_hours() != 0.0 {
            Classification::Caution
        } else {
            Classification::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Analysis {
    NoData { reason: String },
    Analyzed(Findings),
}

impl Analysis {
    pub fn findings(&self) -> Option<&Findings> {
        match self {
            Analysis::Analyzed(f) => Some(f),
            Analysis::NoData { .. } => None,
        }
    }
}

// ============================================================================
// Analysis
// ============================================================================

/// Analyse one series against its limits.
///
/// `mask` must be aligned with `series.times`. High violations are tested
/// against the maximum track and low violations against the minimum track,
/// both strictly (`>` / `<`).
pub fn analyze(series: &SensorSeries, mask: &[bool], limits: &ResolvedLimits) -> Analysis {
    let (Some(max_track), Some(min_track)) = (series.max_track(), series.min_track()) else {
        return Analysis::NoData {
            reason: "categorical values".to_string(),
        };
    };
    if series.is_empty() {
        return Analysis::NoData {
            reason: "no samples in range".to_string(),
        };
    }

    let times: Vec<MissionSeconds> = apply_mask(&series.times, mask);
    if times.is_empty() {
        return Analysis::NoData {
            reason: format!("all {} samples excluded by filters", series.len()),
        };
    }
    let maxes = apply_mask(max_track, mask);
    let mins = apply_mask(min_track, mask);

    let (Some(max), Some(min)) = (find_max(&times, &maxes), find_min(&times, &mins)) else {
        return Analysis::NoData {
            reason: "no finite values after filtering".to_string(),
        };
    };

    let spans_where = |track: &[f64], violates: &dyn Fn(f64) -> bool| {
        let flags: Vec<bool> = track.iter().map(|&v| violates(v)).collect();
        find_violation_spans(&times, &flags)
    };

    Analysis::Analyzed(Findings {
        samples: times.len(),
        max,
        min,
        warning_high: spans_where(&maxes, &|v: f64| v > limits.warning_high()),
        caution_high: spans_where(&maxes, &|v: f64| v > limits.caution_high()),
        warning_low: spans_where(&mins, &|v: f64| v < limits.warning_low()),
        caution_low: spans_where(&mins, &|v: f64| v < limits.caution_low()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SafetyLimits, SentinelBounds, SeriesValues};

    fn limits(warning_high: f64, caution_high: f64) -> ResolvedLimits {
        ResolvedLimits {
            resolution: LimitResolution::NotFound,
            record: SafetyLimits {
                warning_high: Some(warning_high),
                caution_high: Some(caution_high),
                ..Default::default()
            },
            sentinel: SentinelBounds::default(),
        }
    }

    #[test]
    fn test_single_sample_peak() {
        let series = SensorSeries::numeric("T", vec![0.0, 60.0, 120.0, 180.0], vec![10.0, 50.0, 80.0, 20.0]);
        let analysis = analyze(&series, &[true; 4], &limits(60.0, 45.0));
        let f = analysis.findings().unwrap();

        assert_eq!(f.warning_high.len(), 1);
        assert_eq!((f.warning_high[0].start, f.warning_high[0].end), (120.0, 120.0));
        assert_eq!(f.warning_hours(), 0.0);
        assert!(!f.has_warning_violation());
        assert_eq!((f.max.value, f.max.time), (80.0, 120.0));

        // Caution run covers 50 and 80: one minute
        assert!((f.caution_hours() - 60.0 / 3600.0).abs() < 1e-12);
        assert_eq!(f.classification(), Classification::Caution);
    }

    #[test]
    fn test_fully_masked_is_no_data() {
        let series = SensorSeries::numeric("T", vec![0.0, 1.0], vec![100.0, 100.0]);
        let analysis = analyze(&series, &[false, false], &limits(60.0, 50.0));
        assert!(matches!(analysis, Analysis::NoData { .. }));
        assert!(analysis.findings().is_none());
    }

    #[test]
    fn test_empty_and_categorical_are_no_data() {
        let empty = SensorSeries::numeric("T", Vec::new(), Vec::new());
        assert!(matches!(analyze(&empty, &[], &limits(1.0, 1.0)), Analysis::NoData { .. }));

        let states = SensorSeries {
            msid: "S".into(),
            times: vec![0.0],
            values: SeriesValues::Categorical(vec!["ON".into()]),
            ..Default::default()
        };
        assert!(matches!(analyze(&states, &[true], &limits(1.0, 1.0)), Analysis::NoData { .. }));
    }

    #[test]
    fn test_time_of_max_uses_filtered_times() {
        let series = SensorSeries::numeric("T", vec![0.0, 10.0, 20.0], vec![99.0, 5.0, 7.0]);
        let f = analyze(&series, &[false, true, true], &limits(100.0, 100.0))
            .findings()
            .cloned()
            .unwrap();
        assert_eq!((f.max.value, f.max.time), (7.0, 20.0));
        assert_eq!(f.samples, 2);
        assert_eq!(f.classification(), Classification::Normal);
    }

    #[test]
    fn test_low_violations_tracked() {
        let series = SensorSeries::numeric("T", vec![0.0, 3600.0, 7200.0], vec![-50.0, -50.0, 0.0]);
        let mut l = limits(100.0, 100.0);
        l.record.warning_low = Some(-40.0);
        let f = analyze(&series, &[true; 3], &l).findings().cloned().unwrap();
        assert_eq!(f.warning_low_hours(), 1.0);
        assert_eq!(f.classification(), Classification::Warning);
        assert!(f.warning_high.is_empty());
    }
}
