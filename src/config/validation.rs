//! Config validation: unknown-key detection with Levenshtein suggestions
//! and plausibility checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for AuditConfig.
///
/// Entries of `[[filter.exclusions]]` are walked under the array's own path.
/// Any new field added to AuditConfig must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [archive]
        "archive",
        "archive.data_root",
        // [rest]
        "rest",
        "rest.base_url",
        "rest.timeout_secs",
        "rest.retries",
        // [tables]
        "tables",
        "tables.limits",
        "tables.secondary_limits",
        "tables.poly_cal",
        "tables.point_pair",
        "tables.msid_metadata",
        "tables.sensor_list",
        "tables.sensor_column",
        "tables.calibration_set",
        // [anomaly]
        "anomaly",
        "anomaly.name",
        "anomaly.start",
        "anomaly.stop",
        "anomaly.mission_start",
        "anomaly.mission_stop",
        "anomaly.screen_resolution",
        "anomaly.extrema_resolution",
        "anomaly.violation_resolution",
        // [filter]
        "filter",
        "filter.quality_ceiling",
        "filter.exclusions",
        "filter.exclusions.name",
        "filter.exclusions.event",
        "filter.exclusions.start",
        "filter.exclusions.stop",
        "filter.exclusions.pad_secs",
        // [limits]
        "limits",
        "limits.sentinel",
        "limits.sentinel.low",
        "limits.sentinel.high",
        // [output]
        "output",
        "output.dir",
        "output.max_report",
        "output.min_report",
        "output.warning_report",
        "output.caution_report",
        // [health]
        "health",
        "health.name",
        "health.msids",
        "health.start",
        "health.stop",
        "health.raw_prefix",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`. Tables inside arrays contribute their keys under
/// the array's path.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            match v {
                toml::Value::Table(_) => keys.extend(walk_toml_keys(v, &path)),
                toml::Value::Array(items) => {
                    for item in items.iter().filter(|i| i.is_table()) {
                        for key in walk_toml_keys(item, &path) {
                            if !keys.contains(&key) {
                                keys.push(key);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (k, levenshtein(unknown, k)))
        .filter(|&(_, dist)| dist <= 3)
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// Never fails on unknown keys; parse errors are reported by serde later.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Plausibility Checks
// ============================================================================

/// Values that parse and validate but are unlikely to be intended.
pub fn check_plausibility(config: &super::AuditConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if let Some(ceiling) = config.filter.quality_ceiling {
        // Thermistor telemetry lives well inside this band in both °C and °F
        if !(-100.0..=1000.0).contains(&ceiling) {
            warnings.push(ValidationWarning {
                field: "filter.quality_ceiling".to_string(),
                message: format!(
                    "filter.quality_ceiling = {ceiling:.1} is outside the typical range (-100 to 1000)"
                ),
                suggestion: None,
            });
        }
    }

    for e in &config.filter.exclusions {
        if e.pad_secs > 86_400.0 {
            warnings.push(ValidationWarning {
                field: "filter.exclusions.pad_secs".to_string(),
                message: format!(
                    "exclusion '{}' pads by {:.0} s (more than a day)",
                    e.name, e.pad_secs
                ),
                suggestion: None,
            });
        }
    }

    if config.rest.retries > 5 {
        warnings.push(ValidationWarning {
            field: "rest.retries".to_string(),
            message: format!("rest.retries = {} multiplies every failed fetch", config.rest.retries),
            suggestion: None,
        });
    }

    warnings
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("hello", "hello"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("sensr_list", "sensor_list"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [limits]
            [limits.sentinel]
            low = -9999.0
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"limits".to_string()));
        assert!(keys.contains(&"limits.sentinel".to_string()));
        assert!(keys.contains(&"limits.sentinel.low".to_string()));
    }

    #[test]
    fn test_walk_toml_keys_array_of_tables() {
        let toml: toml::Value = r#"
            [[filter.exclusions]]
            name = "a"
            event = "2023:044"

            [[filter.exclusions]]
            name = "b"
            start = "2023:045"
            stop = "2023:046"
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"filter.exclusions.event".to_string()));
        assert!(keys.contains(&"filter.exclusions.stop".to_string()));
        assert_eq!(keys.iter().filter(|k| *k == "filter.exclusions.name").count(), 1);
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[tables]
sensr_list = "thermlist.csv"
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "tables.sensr_list");
        assert_eq!(warnings[0].suggestion.as_deref(), Some("tables.sensor_list"));
    }

    #[test]
    fn test_typo_inside_exclusion_entry() {
        let toml_str = r#"
[[filter.exclusions]]
name = "swap"
evnt = "2023:045:03:32:39"
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].suggestion.as_deref(), Some("filter.exclusions.event"));
    }

    #[test]
    fn test_all_valid_keys_produce_zero_warnings() {
        let toml_str = r#"
[archive]
data_root = "/data/ska"

[anomaly]
name = "Test"
start = "2023:044"
stop = "2023:045"

[filter]
quality_ceiling = 250.0

[[filter.exclusions]]
name = "x"
event = "2023:044:12:00:00"
pad_secs = 300.0
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert!(warnings.is_empty(), "Expected 0 warnings, got: {:?}", warnings);
    }

    #[test]
    fn test_suggest_correction_no_match_for_garbage() {
        let known = known_config_keys();
        assert!(suggest_correction("completely_unrelated_garbage_key_xyz", &known).is_none());
    }

    #[test]
    fn test_default_config_is_plausible() {
        let warnings = check_plausibility(&crate::config::AuditConfig::default());
        assert!(warnings.is_empty(), "{:?}", warnings);
    }

    #[test]
    fn test_huge_pad_is_flagged() {
        let mut config = crate::config::AuditConfig::default();
        config.filter.exclusions[0].pad_secs = 1.0e6;
        let warnings = check_plausibility(&config);
        assert!(warnings.iter().any(|w| w.field == "filter.exclusions.pad_secs"));
    }
}
