//! Analysis Pipeline Integration Tests
//!
//! Runs the batch pipeline end to end against an on-disk archive and
//! reference tables written to a temp directory: screening, limit violations,
//! mission extrema and the CSV reports built from them.

use std::fs;
use std::path::Path;

use thermal_audit::config::{ArchiveConfig, TablesConfig};
use thermal_audit::filter::{ExclusionInterval, QualityGate, RetentionFilter};
use thermal_audit::pipeline::{AuditPipeline, Fallback, RunSummary};
use thermal_audit::report;
use thermal_audit::types::{Resolution, SentinelBounds};
use thermal_audit::{Analysis, ArchiveSource, ReferenceTables, TimeRange};

const LIMITS: &str = "\
MSID,WARNING_LOW,WARNING_HIGH,CAUTION_LOW,CAUTION_HIGH
PEAK,-20,60,-10,40
HOT,-20,60,-10,40
WARM,,,,
";

const SECONDARY: &str = "\
MSID,WARNING_LOW,WARNING_HIGH,CAUTION_LOW,CAUTION_HIGH
WARM,0,100,5,90
";

const METADATA: &str = "\
MSID,TECHNICAL_NAME,UNIT
PEAK,\"HRMA STRUT, AFT\",DEGF
HOT,OBA CONE,DEGF
";

/// A temp workspace with archive files and reference tables.
struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("archive")).unwrap();
        fs::write(dir.path().join("limits.csv"), LIMITS).unwrap();
        fs::write(dir.path().join("secondary.csv"), SECONDARY).unwrap();
        fs::write(dir.path().join("meta.csv"), METADATA).unwrap();
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn archive(&self, msid: &str, samples: &[(&str, &str)]) {
        let mut text = String::from("TIME,VALUE\n");
        for (t, v) in samples {
            text.push_str(&format!("{t},{v}\n"));
        }
        fs::write(self.root().join("archive").join(format!("{msid}.csv")), text).unwrap();
    }

    fn source(&self) -> ArchiveSource {
        ArchiveSource::new(ArchiveConfig {
            data_root: self.root().join("archive"),
        })
    }

    fn tables(&self) -> ReferenceTables {
        ReferenceTables::load(&TablesConfig {
            limits: self.root().join("limits.csv"),
            secondary_limits: Some(self.root().join("secondary.csv")),
            poly_cal: None,
            point_pair: None,
            msid_metadata: Some(self.root().join("meta.csv")),
            sensor_list: self.root().join("sensors.csv"),
            sensor_column: None,
            calibration_set: 1,
        })
        .unwrap()
    }
}

fn sensors(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn single_sample_peak_is_zero_duration_violation() {
    let fx = Fixture::new();
    fx.archive("PEAK", &[("100", "10"), ("200", "50"), ("300", "80"), ("400", "20")]);

    let source = fx.source();
    let tables = fx.tables();
    let filter = RetentionFilter::new(Vec::new(), None);
    let pipeline = AuditPipeline::new(&source, &tables, &filter, SentinelBounds::default());

    let outcomes = pipeline
        .run_limit_violations(&sensors(&["PEAK"]), TimeRange::new(0.0, 1000.0), Resolution::Full)
        .await;

    let findings = outcomes[0].analysis.findings().expect("analyzed");
    assert_eq!(findings.max.value, 80.0);
    assert_eq!(findings.max.time, 300.0);
    assert_eq!(findings.warning_high.len(), 1);
    assert_eq!(findings.warning_high[0].start, 300.0);
    assert_eq!(findings.warning_high[0].end, 300.0);
    assert_eq!(findings.warning_hours(), 0.0);
    assert!(report::warning_report(&outcomes).is_empty());

    // 50 and 80 exceed caution_high = 40 for 100 s
    let caution = report::caution_report(&outcomes);
    assert_eq!(caution.len(), 1);
    assert_eq!(caution.rows[0][1], "HRMA STRUT, AFT");
    assert_eq!(caution.rows[0][3], "DEGF");
}

#[tokio::test]
async fn exclusion_and_quality_gate_shape_the_violation_report() {
    let fx = Fixture::new();
    // One hour above warning high, then a glitch value the gate removes,
    // and a spike inside an excluded mode transition.
    fx.archive(
        "HOT",
        &[
            ("0", "20"),
            ("3600", "70"),
            ("7200", "75"),
            ("7300", "250"),
            ("9000", "65"),
            ("9100", "20"),
        ],
    );

    let source = fx.source();
    let tables = fx.tables();
    let filter = RetentionFilter::new(
        vec![ExclusionInterval::around("transition", 9000.0, 50.0)],
        Some(QualityGate::new(250.0)),
    );
    let pipeline = AuditPipeline::new(&source, &tables, &filter, SentinelBounds::default());

    let outcomes = pipeline
        .run_limit_violations(&sensors(&["HOT"]), TimeRange::new(0.0, 10_000.0), Resolution::Full)
        .await;

    let outcome = &outcomes[0];
    assert_eq!(outcome.mask.removed_by_quality, 1);
    assert_eq!(outcome.mask.retained(), 4);

    let warning = report::warning_report(&outcomes);
    assert_eq!(
        warning.to_csv(),
        "MSID,Technical Name,Max Temp,Units,Warning High,Time Spent Above Limit (Hours)\n\
         HOT,OBA CONE,75.0,DEGF,60.0,1.0\n"
    );
}

#[tokio::test]
async fn missing_data_and_metadata_fall_back_without_aborting() {
    let fx = Fixture::new();
    fx.archive("WARM", &[("10", "95"), ("20", "96"), ("30", "10")]);

    let source = fx.source();
    let tables = fx.tables();
    let filter = RetentionFilter::new(Vec::new(), None);
    let pipeline = AuditPipeline::new(&source, &tables, &filter, SentinelBounds::default());

    let outcomes = pipeline
        .run_limit_violations(&sensors(&["WARM", "ABSENT"]), TimeRange::new(0.0, 100.0), Resolution::Full)
        .await;
    assert_eq!(outcomes.len(), 2);

    // Blank primary record falls through to the secondary table
    let warm = &outcomes[0];
    assert_eq!(warm.context.limits.record.caution_high, Some(90.0));
    assert!(warm.fallbacks.contains(&Fallback::TechnicalName));
    assert!(warm.fallbacks.contains(&Fallback::Unit));

    let caution = report::caution_report(&outcomes);
    assert_eq!(caution.rows[0][..4], ["WARM", "Not in TDB", "96.0", "None Found"]);

    let absent = &outcomes[1];
    assert!(matches!(absent.analysis, Analysis::NoData { .. }));
    assert!(absent.fallbacks.contains(&Fallback::Limits));
    assert_eq!(absent.context.limits.warning_high(), 9999.0);

    let summary = RunSummary::from_outcomes(&outcomes);
    assert_eq!(summary.sensors, 2);
    assert_eq!(summary.analyzed, 1);
    assert_eq!(summary.no_data, 1);
}

#[tokio::test]
async fn screening_drops_categorical_and_empty_sensors() {
    let fx = Fixture::new();
    fx.archive("HOT", &[("10", "20"), ("20", "21")]);
    fx.archive("MODE", &[("10", "NPNT"), ("20", "NMAN")]);

    let source = fx.source();
    let tables = fx.tables();
    let filter = RetentionFilter::new(Vec::new(), None);
    let pipeline = AuditPipeline::new(&source, &tables, &filter, SentinelBounds::default());

    let kept = pipeline
        .screen_numeric(&sensors(&["HOT", "MODE", "ABSENT"]), TimeRange::new(0.0, 86_400.0), Resolution::Daily)
        .await;
    assert_eq!(kept, vec!["HOT".to_string()]);
}

#[tokio::test]
async fn mission_extrema_reports_only_anomaly_window_extremes() {
    let fx = Fixture::new();
    // Mission max falls inside the anomaly window, mission min before it.
    fx.archive(
        "PEAK",
        &[
            ("2023:040:00:00:00", "-15"),
            ("2023:044:18:00:00", "55"),
            ("2023:046:00:00:00", "30"),
        ],
    );

    let source = fx.source();
    let tables = fx.tables();
    let filter = RetentionFilter::new(Vec::new(), None);
    let pipeline = AuditPipeline::new(&source, &tables, &filter, SentinelBounds::default());

    let mission = TimeRange::parse("2023:001", "2023:100").unwrap();
    let anomaly = TimeRange::parse("2023:044:12:00:00", "2023:045:00:00:00").unwrap();
    let outcomes = pipeline
        .run_mission_extrema(&sensors(&["PEAK"]), mission, anomaly, Resolution::Full)
        .await;

    assert!(outcomes[0].max_in_anomaly);
    assert!(!outcomes[0].min_in_anomaly);

    let max = report::max_report(&outcomes);
    assert_eq!(
        max.rows[0],
        vec![
            "PEAK",
            "HRMA STRUT, AFT",
            "55.0",
            "DEGF",
            "40.0",
            "60.0",
            "2023:044:18:00:00.000"
        ]
    );
    assert!(report::min_report(&outcomes).is_empty());

    let out = fx.root().join("out");
    max.export(&out.join("max.csv")).unwrap();
    report::min_report(&outcomes).export(&out.join("min.csv")).unwrap();
    let min_text = fs::read_to_string(out.join("min.csv")).unwrap();
    assert_eq!(
        min_text,
        "MSID,Technical Name,Min Temp,Units,Caution Low,Warning Low,Time of Min\n"
    );
}

#[tokio::test]
async fn five_minute_statistics_drive_extrema() {
    let fx = Fixture::new();
    // Two samples in the first 328 s bin, one in the second
    fx.archive("HOT", &[("0", "10"), ("100", "50"), ("400", "20")]);

    let source = fx.source();
    let tables = fx.tables();
    let filter = RetentionFilter::new(Vec::new(), None);
    let pipeline = AuditPipeline::new(&source, &tables, &filter, SentinelBounds::default());

    let outcome = pipeline
        .process_sensor("HOT", TimeRange::new(0.0, 1000.0), Resolution::FiveMinute)
        .await;
    let findings = outcome.analysis.findings().expect("analyzed");
    assert_eq!(findings.samples, 2);
    // Maximum comes from the interval max track, labelled at the bin midpoint
    assert_eq!(findings.max.value, 50.0);
    assert_eq!(findings.max.time, 164.0);
    assert_eq!(findings.min.value, 10.0);
}

#[tokio::test]
async fn raw_count_group_range_from_archive() {
    let fx = Fixture::new();
    fx.archive("RAW_OOBTHR02", &[("2022:296:01:00:00", "512"), ("2022:297:01:00:00", "530")]);
    fx.archive("RAW_OOBTHR03", &[("2022:296:01:00:00", "498"), ("2022:299:00:00:00", "100")]);

    let source = fx.source();
    let tables = ReferenceTables::default();
    let filter = RetentionFilter::default();
    let pipeline = AuditPipeline::new(&source, &tables, &filter, SentinelBounds::default());

    let msids = sensors(&["RAW_OOBTHR02", "RAW_OOBTHR03", "RAW_OOBTHR04"]);
    let range = TimeRange::parse("2022:296", "2022:298").unwrap();
    let (series, group) = pipeline.group_range(&msids, range).await;

    // The 2022:299 sample falls outside the window
    assert_eq!(series.len(), 2);
    let group = group.expect("group has data");
    assert_eq!((group.min, group.max), (498.0, 530.0));
    assert_eq!(group.spread(), 32.0);
}
