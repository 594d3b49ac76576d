//! Audit Configuration - all analysis parameters as analyst-tunable TOML values
//!
//! Each section implements `Default` with the values of the 2023:044 safe-mode
//! investigation, so running without a config file reproduces that analysis.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use crate::filter::ExclusionInterval;
use crate::mission_time::{self, TimeRange};
use crate::types::{Resolution, SentinelBounds};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one audit run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Local telemetry archive
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Live telemetry REST service
    #[serde(default)]
    pub rest: RestConfig,

    /// Reference table locations
    #[serde(default)]
    pub tables: TablesConfig,

    /// Anomaly and mission time windows
    #[serde(default)]
    pub anomaly: AnomalyConfig,

    /// Exclusion intervals and data-quality gate
    #[serde(default)]
    pub filter: FilterConfig,

    /// Limit fallbacks
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Report destinations
    #[serde(default)]
    pub output: OutputConfig,

    /// Raw-count range check over a sensor group
    #[serde(default)]
    pub health: HealthConfig,
}

impl AuditConfig {
    /// Load configuration using the standard search order:
    /// 1. `$THERMAL_AUDIT_CONFIG`
    /// 2. `./thermal_audit.toml`
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), anomaly = %config.anomaly.name, "Loaded audit config from {}", defaults::CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", defaults::CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(anomaly = %config.anomaly.name, "Loaded audit config from ./{}", defaults::LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", defaults::LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", defaults::LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate TOML text. Unknown keys only warn.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        for w in super::validation::check_plausibility(&config) {
            warn!("{}", w);
        }
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate times, windows and numeric settings for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        Self::check_range(&self.anomaly.start, &self.anomaly.stop, "anomaly", &mut errors);
        Self::check_range(
            &self.anomaly.mission_start,
            &self.anomaly.mission_stop,
            "anomaly.mission",
            &mut errors,
        );

        for (i, exclusion) in self.filter.exclusions.iter().enumerate() {
            if let Err(e) = exclusion.to_interval() {
                errors.push(format!("filter.exclusions[{i}] ({}): {e}", exclusion.name));
            }
        }

        if let Some(ceiling) = self.filter.quality_ceiling {
            if !ceiling.is_finite() {
                errors.push(format!("filter.quality_ceiling must be finite (got {ceiling})"));
            }
        }

        let s = &self.limits.sentinel;
        if !s.low.is_finite() || !s.high.is_finite() || s.low >= s.high {
            errors.push(format!(
                "limits.sentinel: low ({}) must be finite and below high ({})",
                s.low, s.high
            ));
        }

        if self.rest.base_url.trim().is_empty() {
            errors.push("rest.base_url must not be empty".to_string());
        }
        if self.rest.timeout_secs == 0 {
            errors.push("rest.timeout_secs must be > 0".to_string());
        }

        Self::check_range(&self.health.start, &self.health.stop, "health", &mut errors);
        if self.health.msids.iter().any(|m| m.trim().is_empty()) {
            errors.push("health.msids must not contain blank entries".to_string());
        }

        if self.anomaly.violation_resolution == Resolution::Reduced {
            errors.push(
                "anomaly.violation_resolution: 'reduced' is only served by the REST backend"
                    .to_string(),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_range(start: &str, stop: &str, name: &str, errors: &mut Vec<String>) {
        match TimeRange::parse(start, stop) {
            Ok(range) if range.stop <= range.start => {
                errors.push(format!("{name}: stop ({stop}) must be after start ({start})"));
            }
            Ok(_) => {}
            Err(e) => errors.push(format!("{name}: {e}")),
        }
    }

    /// Parsed exclusion intervals, in config order.
    pub fn exclusion_intervals(&self) -> Result<Vec<ExclusionInterval>, ConfigError> {
        self.filter
            .exclusions
            .iter()
            .map(|e| {
                e.to_interval()
                    .map_err(|msg| ConfigError::Validation(vec![format!("{}: {msg}", e.name)]))
            })
            .collect()
    }

    /// Anomaly window in mission seconds.
    pub fn anomaly_range(&self) -> Result<TimeRange, ConfigError> {
        TimeRange::parse(&self.anomaly.start, &self.anomaly.stop)
            .map_err(|e| ConfigError::Validation(vec![format!("anomaly: {e}")]))
    }

    /// Range of the numeric screen: the whole mission history, so a sensor
    /// with any numeric data since launch is kept.
    pub fn screen_range(&self) -> Result<TimeRange, ConfigError> {
        self.mission_range()
    }

    /// Window of the group health check.
    pub fn health_range(&self) -> Result<TimeRange, ConfigError> {
        TimeRange::parse(&self.health.start, &self.health.stop)
            .map_err(|e| ConfigError::Validation(vec![format!("health: {e}")]))
    }

    /// Mission history window in mission seconds.
    pub fn mission_range(&self) -> Result<TimeRange, ConfigError> {
        TimeRange::parse(&self.anomaly.mission_start, &self.anomaly.mission_stop)
            .map_err(|e| ConfigError::Validation(vec![format!("anomaly.mission: {e}")]))
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Archive
// ============================================================================

/// Local telemetry archive. Replaces the process-wide data-root variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Directory holding one `<MSID>.csv` (`TIME,VALUE`) per sensor
    pub data_root: PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("./ska_data"),
        }
    }
}

// ============================================================================
// REST
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RestConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub retries: u32,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::REST_BASE_URL.to_string(),
            timeout_secs: defaults::REST_TIMEOUT_SECS,
            retries: defaults::REST_RETRIES,
        }
    }
}

// ============================================================================
// Tables
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TablesConfig {
    /// Primary (TDB) safety limits
    pub limits: PathBuf,
    /// Secondary limit source consulted when the primary has no record
    pub secondary_limits: Option<PathBuf>,
    pub poly_cal: Option<PathBuf>,
    pub point_pair: Option<PathBuf>,
    /// `MSID, TECHNICAL_NAME, UNIT`
    pub msid_metadata: Option<PathBuf>,
    pub sensor_list: PathBuf,
    /// Sensor-list column holding MSIDs (default: `MSID`, else first column)
    pub sensor_column: Option<String>,
    pub calibration_set: u32,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            limits: PathBuf::from("TDB_LIMIT.csv"),
            secondary_limits: None,
            poly_cal: Some(PathBuf::from("TDB_POLY_CAL.csv")),
            point_pair: Some(PathBuf::from("TDB_POINT_PAIR.csv")),
            msid_metadata: None,
            sensor_list: PathBuf::from("thermlist.csv"),
            sensor_column: None,
            calibration_set: defaults::CALIBRATION_SET,
        }
    }
}

// ============================================================================
// Anomaly Windows
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    pub name: String,
    pub start: String,
    pub stop: String,
    /// Mission history searched for extrema
    pub mission_start: String,
    pub mission_stop: String,
    /// Granularity used to screen out categorical MSIDs
    pub screen_resolution: Resolution,
    /// Granularity of the mission-extrema query
    pub extrema_resolution: Resolution,
    /// Granularity of the anomaly-window violation query
    pub violation_resolution: Resolution,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            name: defaults::ANOMALY_NAME.to_string(),
            start: defaults::ANOMALY_START.to_string(),
            stop: defaults::ANOMALY_STOP.to_string(),
            mission_start: defaults::MISSION_START.to_string(),
            mission_stop: defaults::MISSION_STOP.to_string(),
            screen_resolution: Resolution::Daily,
            extrema_resolution: Resolution::FiveMinute,
            violation_resolution: Resolution::Full,
        }
    }
}

// ============================================================================
// Filter
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Data-quality gate: samples must be strictly below this value.
    /// `None` disables the gate.
    pub quality_ceiling: Option<f64>,
    pub exclusions: Vec<ExclusionConfig>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        let transitions = defaults::MODE_TRANSITIONS.iter().map(|(name, event)| ExclusionConfig {
            name: (*name).to_string(),
            event: Some((*event).to_string()),
            start: None,
            stop: None,
            pad_secs: defaults::MODE_TRANSITION_PAD_SECS,
        });
        let windows = defaults::THERMAL_CONTROL_WINDOWS
            .iter()
            .map(|(name, start, stop)| ExclusionConfig {
                name: (*name).to_string(),
                event: None,
                start: Some((*start).to_string()),
                stop: Some((*stop).to_string()),
                pad_secs: defaults::THERMAL_CONTROL_PAD_SECS,
            });

        Self {
            quality_ceiling: Some(defaults::QUALITY_CEILING),
            exclusions: transitions.chain(windows).collect(),
        }
    }
}

/// One `[[filter.exclusions]]` entry: either a single `event` time or a
/// `start`/`stop` window, padded by `pad_secs` on both sides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionConfig {
    pub name: String,
    pub event: Option<String>,
    pub start: Option<String>,
    pub stop: Option<String>,
    pub pad_secs: f64,
}

impl ExclusionConfig {
    pub fn to_interval(&self) -> Result<ExclusionInterval, String> {
        if !self.pad_secs.is_finite() || self.pad_secs < 0.0 {
            return Err(format!("pad_secs must be >= 0 (got {})", self.pad_secs));
        }
        let parse = |s: &str| mission_time::parse_time(s).map_err(|e| e.to_string());

        match (&self.event, &self.start, &self.stop) {
            (Some(event), None, None) => Ok(ExclusionInterval::around(
                &self.name,
                parse(event)?,
                self.pad_secs,
            )),
            (None, Some(start), Some(stop)) => {
                let (start, stop) = (parse(start)?, parse(stop)?);
                if stop < start {
                    return Err("stop must not precede start".to_string());
                }
                Ok(ExclusionInterval::spanning(&self.name, start, stop, self.pad_secs))
            }
            _ => Err("set either 'event' or both 'start' and 'stop'".to_string()),
        }
    }
}

// ============================================================================
// Limits
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Bounds used when no limit source has a value
    pub sentinel: SentinelBounds,
}

// ============================================================================
// Output
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub max_report: String,
    pub min_report: String,
    pub warning_report: String,
    pub caution_report: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(defaults::OUTPUT_DIR),
            max_report: defaults::MAX_REPORT_FILE.to_string(),
            min_report: defaults::MIN_REPORT_FILE.to_string(),
            warning_report: defaults::WARNING_REPORT_FILE.to_string(),
            caution_report: defaults::CAUTION_REPORT_FILE.to_string(),
        }
    }
}

impl OutputConfig {
    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }
}

// ============================================================================
// Group Health Check
// ============================================================================

/// Sensors whose raw counts are compared by `thermal-audit health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub name: String,
    pub msids: Vec<String>,
    pub start: String,
    pub stop: String,
    /// Raw counts are fetched as `<raw_prefix><MSID>`
    pub raw_prefix: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            name: defaults::HEALTH_GROUP_NAME.to_string(),
            msids: defaults::HEALTH_GROUP_MSIDS.iter().map(|m| (*m).to_string()).collect(),
            start: defaults::HEALTH_START.to_string(),
            stop: defaults::HEALTH_STOP.to_string(),
            raw_prefix: defaults::RAW_MSID_PREFIX.to_string(),
        }
    }
}

impl HealthConfig {
    /// Telemetry MSID carrying the raw counts of `msid`.
    pub fn raw_msid(&self, msid: &str) -> String {
        format!("{}{}", self.raw_prefix, msid.trim().to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = AuditConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.exclusion_intervals().unwrap().len(), 8);
    }

    #[test]
    fn test_default_windows_match_event_literals() {
        let intervals = AuditConfig::default().exclusion_intervals().unwrap();
        let safe_mode = &intervals[1];
        assert_eq!(safe_mode.name, "2023:044 Safe Mode transition");
        assert_eq!(safe_mode.start, safe_mode.stop);
        assert_eq!(safe_mode.pad, 300.0);

        let tc = intervals.last().unwrap();
        assert!(tc.stop > tc.start);
        assert_eq!(tc.pad, 70.0);
    }

    #[test]
    fn test_exclusion_requires_event_or_window() {
        let bad = ExclusionConfig {
            name: "both".into(),
            event: Some("2023:044".into()),
            start: Some("2023:044".into()),
            stop: None,
            pad_secs: 10.0,
        };
        assert!(bad.to_interval().is_err());
    }

    #[test]
    fn test_unrepresentable_anomaly_time_rejected() {
        let mut config = AuditConfig::default();
        config.anomaly.start = "1e300".into();
        config.anomaly.stop = "2e300".into();
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.starts_with("anomaly:")), "{errors:?}");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(config.anomaly_range().is_err());
    }

    #[test]
    fn test_screen_covers_mission_history() {
        let config = AuditConfig::default();
        assert_eq!(config.screen_range().unwrap(), config.mission_range().unwrap());
    }

    #[test]
    fn test_health_group_defaults() {
        let config = AuditConfig::default();
        assert_eq!(config.health.msids.len(), 6);
        assert_eq!(config.health.raw_msid("oobthr02"), "RAW_OOBTHR02");
        let range = config.health_range().unwrap();
        assert_eq!(range.stop - range.start, 2.0 * 86_400.0);
    }

    #[test]
    fn test_health_section_validated() {
        let mut config = AuditConfig::default();
        config.health.stop = "2022:290".into();
        config.health.msids.push("  ".into());
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.starts_with("health:")), "{errors:?}");
                assert!(errors.iter().any(|e| e.starts_with("health.msids")), "{errors:?}");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_inverted_anomaly_window_rejected() {
        let mut config = AuditConfig::default();
        config.anomaly.stop = "2023:001".into();
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.starts_with("anomaly:")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_toml_round_trip() {
        let toml = AuditConfig::default().to_toml().unwrap();
        let parsed = AuditConfig::from_toml_str(&toml).unwrap();
        assert_eq!(parsed.filter.exclusions.len(), 8);
        assert_eq!(parsed.anomaly.extrema_resolution, Resolution::FiveMinute);
    }
}
