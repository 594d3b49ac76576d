//! Telemetry series types: SensorSeries, SeriesValues, IntervalStats, Resolution

use serde::{Deserialize, Serialize};

use crate::mission_time::MissionSeconds;

// ============================================================================
// Resolution
// ============================================================================

/// Width of a 5-minute archive statistic window (seconds).
///
/// The archive's "5-minute" bins are ten 32.8 s major frames, not 300 s.
pub const FIVE_MINUTE_WINDOW_SECS: f64 = 328.0;

/// Width of a daily archive statistic window (seconds).
pub const DAILY_WINDOW_SECS: f64 = 86_400.0;

/// Sample granularity requested from a telemetry source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Every telemetered sample
    #[default]
    Full,
    /// Server-side reduced points (REST backend only)
    Reduced,
    /// 5-minute statistics with per-interval min/max/mean
    FiveMinute,
    /// Daily statistics with per-interval min/max/mean
    Daily,
}

impl Resolution {
    /// Statistic window width, or `None` for sample-level resolutions.
    pub fn window_secs(self) -> Option<f64> {
        match self {
            Resolution::FiveMinute => Some(FIVE_MINUTE_WINDOW_SECS),
            Resolution::Daily => Some(DAILY_WINDOW_SECS),
            Resolution::Full | Resolution::Reduced => None,
        }
    }

    pub fn is_statistic(self) -> bool {
        self.window_secs().is_some()
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolution::Full => write!(f, "full"),
            Resolution::Reduced => write!(f, "reduced"),
            Resolution::FiveMinute => write!(f, "5min"),
            Resolution::Daily => write!(f, "daily"),
        }
    }
}

impl std::str::FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" | "none" => Ok(Resolution::Full),
            "reduced" => Ok(Resolution::Reduced),
            "5min" | "five_minute" | "5-minute" => Ok(Resolution::FiveMinute),
            "daily" => Ok(Resolution::Daily),
            other => Err(format!(
                "unknown resolution '{other}' (expected full, reduced, 5min or daily)"
            )),
        }
    }
}

// ============================================================================
// Series
// ============================================================================

/// Sample values of one sensor. State-valued sensors are categorical and are
/// excluded from quantitative analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SeriesValues {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
}

impl SeriesValues {
    pub fn len(&self) -> usize {
        match self {
            SeriesValues::Numeric(v) => v.len(),
            SeriesValues::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SeriesValues {
    fn default() -> Self {
        SeriesValues::Numeric(Vec::new())
    }
}

/// Per-interval statistics, parallel to `SensorSeries::times`.
///
/// Extrema must come from these arrays when present: the interval values are
/// means and would understate the true peak.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntervalStats {
    pub mins: Vec<f64>,
    pub maxes: Vec<f64>,
    /// Raw samples contributing to each interval
    pub counts: Vec<usize>,
}

/// Ordered (time, value) telemetry for one MSID over a queried range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSeries {
    pub msid: String,
    /// Mission seconds, monotonically increasing
    pub times: Vec<MissionSeconds>,
    pub values: SeriesValues,
    /// Present only for statistic resolutions
    pub stats: Option<IntervalStats>,
    pub resolution: Resolution,
}

impl SensorSeries {
    /// A series with no samples ("no data for this range").
    pub fn empty(msid: &str, resolution: Resolution) -> Self {
        Self {
            msid: msid.to_string(),
            resolution,
            ..Default::default()
        }
    }

    pub fn numeric(msid: &str, times: Vec<MissionSeconds>, values: Vec<f64>) -> Self {
        Self {
            msid: msid.to_string(),
            times,
            values: SeriesValues::Numeric(values),
            stats: None,
            resolution: Resolution::Full,
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.values, SeriesValues::Numeric(_))
    }

    /// Numeric values, or `None` for a categorical series.
    pub fn numeric_values(&self) -> Option<&[f64]> {
        match &self.values {
            SeriesValues::Numeric(v) => Some(v),
            SeriesValues::Categorical(_) => None,
        }
    }

    /// Per-sample maxima: interval maxes for statistic series, values otherwise.
    pub fn max_track(&self) -> Option<&[f64]> {
        match &self.stats {
            Some(stats) => Some(&stats.maxes),
            None => self.numeric_values(),
        }
    }

    /// Per-sample minima: interval mins for statistic series, values otherwise.
    pub fn min_track(&self) -> Option<&[f64]> {
        match &self.stats {
            Some(stats) => Some(&stats.mins),
            None => self.numeric_values(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_parse() {
        assert_eq!("5min".parse::<Resolution>().unwrap(), Resolution::FiveMinute);
        assert_eq!("DAILY".parse::<Resolution>().unwrap(), Resolution::Daily);
        assert!("hourly".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_tracks_prefer_interval_stats() {
        let mut series = SensorSeries::numeric("TEST", vec![0.0, 1.0], vec![5.0, 6.0]);
        assert_eq!(series.max_track().unwrap(), &[5.0, 6.0]);

        series.stats = Some(IntervalStats {
            mins: vec![4.0, 5.0],
            maxes: vec![7.0, 9.0],
            counts: vec![3, 3],
        });
        assert_eq!(series.max_track().unwrap(), &[7.0, 9.0]);
        assert_eq!(series.min_track().unwrap(), &[4.0, 5.0]);
    }

    #[test]
    fn test_categorical_has_no_numeric_tracks() {
        let series = SensorSeries {
            msid: "STATE".into(),
            times: vec![0.0],
            values: SeriesValues::Categorical(vec!["ON".into()]),
            ..Default::default()
        };
        assert!(!series.is_numeric());
        assert!(series.max_track().is_none());
    }
}
