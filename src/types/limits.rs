//! Safety limit records

use serde::{Deserialize, Serialize};

use crate::config::defaults;

/// Caution/warning thresholds for one MSID as stored in a limit table.
///
/// Any field may be absent (blank cell); absent values are filled from the
/// configured sentinels when the limits are resolved for analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetyLimits {
    pub warning_low: Option<f64>,
    pub warning_high: Option<f64>,
    pub caution_low: Option<f64>,
    pub caution_high: Option<f64>,
}

impl SafetyLimits {
    pub fn new(warning_low: f64, warning_high: f64, caution_low: f64, caution_high: f64) -> Self {
        Self {
            warning_low: Some(warning_low),
            warning_high: Some(warning_high),
            caution_low: Some(caution_low),
            caution_high: Some(caution_high),
        }
    }

    /// True when the record carries no threshold at all.
    pub fn is_blank(&self) -> bool {
        self.warning_low.is_none()
            && self.warning_high.is_none()
            && self.caution_low.is_none()
            && self.caution_high.is_none()
    }
}

/// Permissive bounds used when no limit source knows a sensor.
///
/// Defaults to ±9999, which effectively disables violation detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelBounds {
    pub low: f64,
    pub high: f64,
}

impl Default for SentinelBounds {
    fn default() -> Self {
        Self {
            low: defaults::SENTINEL_LOW,
            high: defaults::SENTINEL_HIGH,
        }
    }
}
