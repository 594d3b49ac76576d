//! System-wide default constants.
//!
//! The event times and windows below are the 2023:044 safe-mode anomaly
//! investigation values; a config file replaces them for other events.

// ============================================================================
// Config File Search
// ============================================================================

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "THERMAL_AUDIT_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "thermal_audit.toml";

// ============================================================================
// Live Telemetry REST Service
// ============================================================================

/// MAUDE REST endpoint for flight telemetry.
pub const REST_BASE_URL: &str = "https://occweb.cfa.harvard.edu/maude/mrest/FLIGHT/msid.json";

/// Per-request timeout (seconds).
pub const REST_TIMEOUT_SECS: u64 = 30;

/// Retries after a failed request before degrading to an empty series.
pub const REST_RETRIES: u32 = 1;

// ============================================================================
// Analysis Windows
// ============================================================================

pub const ANOMALY_NAME: &str = "2023:044 Safe Mode Anomaly";
pub const ANOMALY_START: &str = "2023:044:17:41:00.000";
pub const ANOMALY_STOP: &str = "2023:055:00:00:00.000";

/// Mission history searched for extrema.
pub const MISSION_START: &str = "2000:200:00:00:00.000";
pub const MISSION_STOP: &str = "2023:051:00:00:00.000";

// ============================================================================
// Filtering
// ============================================================================

/// Values at or above this are telemetry glitches, not temperatures.
pub const QUALITY_CEILING: f64 = 250.0;

/// Pad around a spacecraft mode transition (seconds).
pub const MODE_TRANSITION_PAD_SECS: f64 = 300.0;

/// Pad around a thermal-control-disabled window (seconds).
pub const THERMAL_CONTROL_PAD_SECS: f64 = 70.0;

/// Mode transitions: (name, event time).
pub const MODE_TRANSITIONS: &[(&str, &str)] = &[
    ("2022:293 Safe Mode transition", "2022:293:16:27:49.000"),
    ("2023:044 Safe Mode transition", "2023:044:17:41:07.000"),
    ("2023:045 Swap to CTU-A", "2023:045:03:32:39.000"),
    ("2023:047 Safe Mode transition", "2023:047:07:33:47.000"),
    ("2023:048 Swap to CTU-A", "2023:048:03:17:11.000"),
];

/// Thermal control disabled windows: (name, start, stop).
pub const THERMAL_CONTROL_WINDOWS: &[(&str, &str, &str)] = &[
    (
        "2023:045 Thermal Control Disabled",
        "2023:045:03:29:49.010",
        "2023:045:04:48:37.150",
    ),
    (
        "2023:047 Thermal Control Disabled",
        "2023:047:07:33:33.163",
        "2023:047:07:34:48.125",
    ),
    (
        "2023:048 Thermal Control Disabled",
        "2023:048:03:14:30.531",
        "2023:048:03:56:31.086",
    ),
];

// ============================================================================
// Group Health Check
// ============================================================================

pub const HEALTH_GROUP_NAME: &str = "HRMA Strut";

/// Redundant HRMA strut thermistors compared on raw counts.
pub const HEALTH_GROUP_MSIDS: &[&str] = &["OOBTHR02", "OOBTHR03", "OOBTHR04", "OOBTHR05", "OOBTHR06", "OOBTHR07"];

pub const HEALTH_START: &str = "2022:296:00:00:00.000";
pub const HEALTH_STOP: &str = "2022:298:00:00:00.000";

/// Prefix of the telemetry MSID carrying a sensor's raw counts.
pub const RAW_MSID_PREFIX: &str = "RAW_";

// ============================================================================
// Limits
// ============================================================================

pub const SENTINEL_LOW: f64 = -9999.0;
pub const SENTINEL_HIGH: f64 = 9999.0;

// ============================================================================
// Reference Tables
// ============================================================================

/// TDB calibration set used for both calibration tables.
pub const CALIBRATION_SET: u32 = 1;

// ============================================================================
// Output
// ============================================================================

pub const OUTPUT_DIR: &str = "./output";
pub const MAX_REPORT_FILE: &str = "anomaly_mission_maxes.csv";
pub const MIN_REPORT_FILE: &str = "anomaly_mission_mins.csv";
pub const WARNING_REPORT_FILE: &str = "WARNING_LIMIT_VIOLATIONS.csv";
pub const CAUTION_REPORT_FILE: &str = "CAUTION_LIMIT_VIOLATIONS.csv";
