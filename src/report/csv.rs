//! Fixed-schema CSV result tables
//!
//! | Report | Columns |
//! |---|---|
//! | max | `MSID, Technical Name, Max Temp, Units, Caution High, Warning High, Time of Max` |
//! | min | `MSID, Technical Name, Min Temp, Units, Caution Low, Warning Low, Time of Min` |
//! | warning | `MSID, Technical Name, Max Temp, Units, Warning High, Time Spent Above Limit (Hours)` |
//! | caution | `MSID, Technical Name, Max Temp, Units, Caution High, Time Spent Above Limit (Hours)` |
//!
//! Temperatures are in engineering units, times are mission calendar strings.
//! There is no index column.

use std::path::Path;
use tracing::info;

use super::{write_file, ReportError};
use crate::mission_time::format_calendar;
use crate::pipeline::{ExtremaOutcome, SensorOutcome};
use crate::tables::csv::csv_join;
use crate::tables::NAME_NOT_IN_TDB;

pub const MAX_REPORT_COLUMNS: [&str; 7] = [
    "MSID",
    "Technical Name",
    "Max Temp",
    "Units",
    "Caution High",
    "Warning High",
    "Time of Max",
];

pub const MIN_REPORT_COLUMNS: [&str; 7] = [
    "MSID",
    "Technical Name",
    "Min Temp",
    "Units",
    "Caution Low",
    "Warning Low",
    "Time of Min",
];

pub const WARNING_REPORT_COLUMNS: [&str; 6] = [
    "MSID",
    "Technical Name",
    "Max Temp",
    "Units",
    "Warning High",
    "Time Spent Above Limit (Hours)",
];

pub const CAUTION_REPORT_COLUMNS: [&str; 6] = [
    "MSID",
    "Technical Name",
    "Max Temp",
    "Units",
    "Caution High",
    "Time Spent Above Limit (Hours)",
];

/// Render a number; whole values keep one decimal place.
pub fn format_number(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

/// Render a limit, or "Not in TDB" when the limit table had none.
pub fn format_limit(limit: Option<f64>) -> String {
    limit.map_or_else(|| NAME_NOT_IN_TDB.to_string(), format_number)
}

/// One result table ready for export.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub columns: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// CSV text: header row then one line per row.
    pub fn to_csv(&self) -> String {
        let mut out = csv_join(self.columns);
        out.push('\n');
        for row in &self.rows {
            out.push_str(&csv_join(row.as_slice()));
            out.push('\n');
        }
        out
    }

    /// Write the table to `path`, creating parent directories.
    pub fn export(&self, path: &Path) -> Result<(), ReportError> {
        write_file(path, self.to_csv().as_bytes())?;
        info!(path = %path.display(), rows = self.rows.len(), "Wrote report");
        Ok(())
    }
}

/// Sensors whose mission maximum fell inside the anomaly window.
pub fn max_report(outcomes: &[ExtremaOutcome]) -> ReportTable {
    let rows = outcomes
        .iter()
        .filter(|o| o.max_in_anomaly)
        .filter_map(|o| {
            let f = o.sensor.analysis.findings()?;
            let ctx = &o.sensor.context;
            Some(vec![
                ctx.msid.clone(),
                ctx.technical_name_or_default().to_string(),
                format_number(f.max.value),
                ctx.unit_or_default().to_string(),
                format_limit(ctx.limits.record.caution_high),
                format_limit(ctx.limits.record.warning_high),
                format_calendar(f.max.time),
            ])
        })
        .collect();
    ReportTable {
        columns: &MAX_REPORT_COLUMNS,
        rows,
    }
}

/// Sensors whose mission minimum fell inside the anomaly window.
pub fn min_report(outcomes: &[ExtremaOutcome]) -> ReportTable {
    let rows = outcomes
        .iter()
        .filter(|o| o.min_in_anomaly)
        .filter_map(|o| {
            let f = o.sensor.analysis.findings()?;
            let ctx = &o.sensor.context;
            Some(vec![
                ctx.msid.clone(),
                ctx.technical_name_or_default().to_string(),
                format_number(f.min.value),
                ctx.unit_or_default().to_string(),
                format_limit(ctx.limits.record.caution_low),
                format_limit(ctx.limits.record.warning_low),
                format_calendar(f.min.time),
            ])
        })
        .collect();
    ReportTable {
        columns: &MIN_REPORT_COLUMNS,
        rows,
    }
}

/// Sensors with a nonzero time above the warning-high limit.
pub fn warning_report(outcomes: &[SensorOutcome]) -> ReportTable {
    let rows = outcomes
        .iter()
        .filter_map(|o| {
            let f = o.analysis.findings().filter(|f| f.has_warning_violation())?;
            let ctx = &o.context;
            Some(vec![
                ctx.msid.clone(),
                ctx.technical_name_or_default().to_string(),
                format_number(f.max.value),
                ctx.unit_or_default().to_string(),
                format_limit(ctx.limits.record.warning_high),
                format_number(f.warning_hours()),
            ])
        })
        .collect();
    ReportTable {
        columns: &WARNING_REPORT_COLUMNS,
        rows,
    }
}

/// Sensors with a nonzero time above the caution-high limit.
pub fn caution_report(outcomes: &[SensorOutcome]) -> ReportTable {
    let rows = outcomes
        .iter()
        .filter_map(|o| {
            let f = o.analysis.findings().filter(|f| f.has_caution_violation())?;
            let ctx = &o.context;
            Some(vec![
                ctx.msid.clone(),
                ctx.technical_name_or_default().to_string(),
                format_number(f.max.value),
                ctx.unit_or_default().to_string(),
                format_limit(ctx.limits.record.caution_high),
                format_number(f.caution_hours()),
            ])
        })
        .collect();
    ReportTable {
        columns: &CAUTION_REPORT_COLUMNS,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze, ResolvedLimits};
    use crate::filter::RetentionMask;
    use crate::pipeline::SensorContext;
    use crate::types::{SafetyLimits, SensorSeries, SentinelBounds};

    fn outcome(msid: &str, name: Option<&str>, times: Vec<f64>, values: Vec<f64>, limits: SafetyLimits) -> SensorOutcome {
        let mut resolved = ResolvedLimits::sentinel_only(SentinelBounds::default());
        resolved.record = limits;
        let series = SensorSeries::numeric(msid, times, values);
        let keep = vec![true; series.len()];
        SensorOutcome {
            analysis: analyze(&series, &keep, &resolved),
            context: SensorContext {
                msid: msid.to_string(),
                technical_name: name.map(str::to_string),
                unit: None,
                limits: resolved,
            },
            mask: RetentionMask::default(),
            fallbacks: Vec::new(),
        }
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(80.0), "80.0");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_limit(None), "Not in TDB");
        assert_eq!(format_limit(Some(-9999.0)), "-9999.0");
    }

    #[test]
    fn test_warning_and_caution_reports_are_independent() {
        let limits = SafetyLimits {
            warning_high: Some(100.0),
            caution_high: Some(60.0),
            ..Default::default()
        };
        let outcomes = vec![outcome("HRMA", Some("HRMA STRUT, AFT"), vec![0.0, 3600.0], vec![70.0, 80.0], limits)];

        assert!(warning_report(&outcomes).is_empty());
        let caution = caution_report(&outcomes);
        assert_eq!(
            caution.to_csv(),
            "MSID,Technical Name,Max Temp,Units,Caution High,Time Spent Above Limit (Hours)\n\
             HRMA,\"HRMA STRUT, AFT\",80.0,None Found,60.0,1.0\n"
        );
    }

    #[test]
    fn test_zero_duration_violation_not_reported() {
        let limits = SafetyLimits {
            warning_high: Some(60.0),
            ..Default::default()
        };
        let outcomes = vec![outcome(
            "PEAK",
            None,
            vec![0.0, 1.0, 2.0, 3.0],
            vec![10.0, 50.0, 80.0, 20.0],
            limits,
        )];
        assert!(warning_report(&outcomes).is_empty());
    }

    #[test]
    fn test_max_report_schema() {
        let limits = SafetyLimits {
            warning_high: Some(60.0),
            ..Default::default()
        };
        let sensor = outcome("HOT", None, vec![0.0, 86_400.0], vec![10.0, 80.0], limits);
        let outcomes = vec![ExtremaOutcome {
            sensor,
            max_in_anomaly: true,
            min_in_anomaly: false,
        }];

        let max = max_report(&outcomes);
        assert_eq!(max.columns, &MAX_REPORT_COLUMNS);
        assert_eq!(
            max.rows[0],
            vec!["HOT", "Not in TDB", "80.0", "None Found", "Not in TDB", "60.0", "1998:002:00:00:00.000"]
        );
        assert!(min_report(&outcomes).is_empty());
        assert_eq!(min_report(&outcomes).columns[6], "Time of Min");
    }

    #[test]
    fn test_export_writes_header_only_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("WARNING_LIMIT_VIOLATIONS.csv");
        warning_report(&[]).export(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("MSID,Technical Name,Max Temp"));
    }
}
