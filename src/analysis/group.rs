//! Observed value range across a sensor group
//!
//! Used as a health check on raw counts: a group of redundant thermistors
//! reading the same structure should span a narrow count range.

use serde::Serialize;

use crate::types::SensorSeries;

/// Observed min and max of one sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorRange {
    pub msid: String,
    pub min: f64,
    pub max: f64,
    pub samples: usize,
}

/// Per-sensor ranges and the envelope over the whole group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRange {
    pub sensors: Vec<SensorRange>,
    /// Smallest per-sensor minimum
    pub min: f64,
    /// Largest per-sensor maximum
    pub max: f64,
}

impl GroupRange {
    /// Observed range: group max minus group min.
    pub fn spread(&self) -> f64 {
        self.max - self.min
    }
}

/// Range of one numeric series, ignoring NaN. `None` when nothing is left.
pub fn sensor_range(series: &SensorSeries) -> Option<SensorRange> {
    let values = series.numeric_values()?;
    let valid: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    let (min, max) = valid
        .iter()
        .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;
    Some(SensorRange {
        msid: series.msid.clone(),
        min,
        max,
        samples: valid.len(),
    })
}

/// Group envelope over every series with numeric data.
///
/// Empty and categorical series are skipped. `None` when no series has data.
pub fn group_range(series: &[SensorSeries]) -> Option<GroupRange> {
    let sensors: Vec<SensorRange> = series.iter().filter_map(sensor_range).collect();
    let min = sensors.iter().map(|s| s.min).reduce(f64::min)?;
    let max = sensors.iter().map(|s| s.max).reduce(f64::max)?;
    Some(GroupRange { sensors, min, max })
}
