//! thermal-audit - spacecraft thermal telemetry anomaly analysis
//!
//! # Usage
//!
//! ```bash
//! # Full anomaly analysis: screen sensors, mission extrema, limit violations
//! thermal-audit analyze
//!
//! # Limit violations only, from the live REST service
//! thermal-audit --source rest violations
//!
//! # Convert raw counts for one MSID
//! thermal-audit convert --msid 4HLL2BT --start 2022:296 --stop 2022:298
//!
//! # Raw-count range across the configured sensor group
//! thermal-audit --source rest health
//!
//! # Validate configuration and reference tables
//! thermal-audit --config ./thermal_audit.toml check
//! ```
//!
//! # Environment Variables
//!
//! - `THERMAL_AUDIT_CONFIG`: Path to the TOML config (default: ./thermal_audit.toml)
//! - `THERMAL_AUDIT_SOURCE`: Default telemetry backend (`archive` or `rest`)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use thermal_audit::calibration::{self, CalibrationMode};
use thermal_audit::config::{self, AuditConfig};
use thermal_audit::filter::RetentionFilter;
use thermal_audit::mission_time::{self, format_calendar, TimeRange};
use thermal_audit::pipeline::{AuditPipeline, RunSummary};
use thermal_audit::report::{self, PlotFigure};
use thermal_audit::tables::{self, csv::csv_join, ReferenceTables};
use thermal_audit::telemetry::{ArchiveSource, RestSource, SourceKind, TelemetrySource};
use thermal_audit::types::Resolution;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "thermal-audit")]
#[command(about = "Spacecraft thermal telemetry anomaly analysis")]
#[command(version)]
struct CliArgs {
    /// Path to the TOML configuration (errors here are fatal)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Telemetry backend
    #[arg(long, value_enum, global = true, env = "THERMAL_AUDIT_SOURCE", default_value_t = SourceKind::Archive)]
    source: SourceKind,

    /// Override the sensor list from the configuration
    #[arg(long, global = true)]
    sensor_list: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Screen sensors, then run mission extrema and limit violations
    Analyze {
        /// Analyse every listed sensor without the numeric screen
        #[arg(long)]
        no_screen: bool,
    },

    /// Warning and caution limit violations over the anomaly window
    Violations {
        #[arg(long)]
        no_screen: bool,
    },

    /// Mission maxima and minima that occurred during the anomaly
    Extrema {
        #[arg(long)]
        no_screen: bool,
    },

    /// Convert raw counts for one MSID to engineering values
    Convert {
        /// Calibrated MSID (its calibration record is looked up)
        #[arg(long)]
        msid: String,
        /// Telemetry MSID carrying raw counts (default: RAW_<MSID>)
        #[arg(long)]
        raw_msid: Option<String>,
        #[arg(long)]
        start: String,
        #[arg(long)]
        stop: String,
        #[arg(long, value_enum, default_value_t = CalibrationMode::Auto)]
        mode: CalibrationMode,
        /// Report results in °F (calibrations yield °C)
        #[arg(long)]
        fahrenheit: bool,
        /// Write `TIME,RAW_COUNT,VALUE` CSV here instead of printing a summary
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also write a plot of the converted series
        #[arg(long)]
        plot: Option<PathBuf>,
    },

    /// Plot filtered telemetry for one or more MSIDs with their limits
    Plot {
        #[arg(long, required = true, num_args = 1..)]
        msid: Vec<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        stop: Option<String>,
        #[arg(long, default_value_t = Resolution::Full)]
        resolution: Resolution,
        /// Output path (default: <output.dir>/<first MSID>.plot.json)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Observed raw-count range across a sensor group
    Health {
        /// Group MSIDs (default: health.msids)
        #[arg(long, num_args = 1..)]
        msid: Vec<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        stop: Option<String>,
        /// Also write a plot of the raw counts
        #[arg(long)]
        plot: Option<PathBuf>,
    },

    /// List the sensors that pass the numeric screen
    Screen,

    /// Validate configuration and reference tables, then exit
    Check,
}

// ============================================================================
// Setup
// ============================================================================

fn load_config(path: Option<&PathBuf>) -> Result<AuditConfig> {
    let config = match path {
        Some(p) => AuditConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config {}", p.display()))?,
        None => AuditConfig::load(),
    };
    info!(anomaly = %config.anomaly.name, "Configuration ready");
    Ok(config)
}

fn build_source(kind: SourceKind, config: &AuditConfig) -> Result<Box<dyn TelemetrySource>> {
    let source: Box<dyn TelemetrySource> = match kind {
        SourceKind::Archive => Box::new(ArchiveSource::new(config.archive.clone())),
        SourceKind::Rest => {
            Box::new(RestSource::new(&config.rest).context("Failed to build REST client")?)
        }
    };
    info!(source = source.source_name(), "Telemetry source selected");
    Ok(source)
}

fn load_sensors(config: &AuditConfig, override_path: Option<&PathBuf>) -> Result<Vec<String>> {
    let path = override_path.unwrap_or(&config.tables.sensor_list);
    let sensors = tables::load_sensor_list(path, config.tables.sensor_column.as_deref())
        .with_context(|| format!("Failed to load sensor list {}", path.display()))?;
    info!(path = %path.display(), sensors = sensors.len(), "Loaded sensor list");
    Ok(sensors)
}

/// Everything a batch run needs, loaded once.
struct RunInputs {
    config: AuditConfig,
    source: Box<dyn TelemetrySource>,
    tables: ReferenceTables,
    filter: RetentionFilter,
    sensors: Vec<String>,
}

impl RunInputs {
    fn load(args: &CliArgs) -> Result<Self> {
        let config = load_config(args.config.as_ref())?;
        let source = build_source(args.source, &config)?;
        let tables = ReferenceTables::load(&config.tables).context("Failed to load reference tables")?;
        let filter = RetentionFilter::from_config(&config).context("Invalid exclusion intervals")?;
        info!(
            intervals = filter.intervals().len(),
            quality_ceiling = ?config.filter.quality_ceiling,
            "Retention filter ready"
        );
        let sensors = load_sensors(&config, args.sensor_list.as_ref())?;
        Ok(Self {
            config,
            source,
            tables,
            filter,
            sensors,
        })
    }

    fn pipeline(&self) -> AuditPipeline<'_> {
        AuditPipeline::new(
            self.source.as_ref(),
            &self.tables,
            &self.filter,
            self.config.limits.sentinel,
        )
    }

    async fn screened(&self, no_screen: bool) -> Result<Vec<String>> {
        if no_screen {
            return Ok(self.sensors.clone());
        }
        let range = self.config.screen_range()?;
        Ok(self
            .pipeline()
            .screen_numeric(&self.sensors, range, self.config.anomaly.screen_resolution)
            .await)
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn run_extrema(inputs: &RunInputs, sensors: &[String]) -> Result<()> {
    let cfg = &inputs.config;
    let outcomes = inputs
        .pipeline()
        .run_mission_extrema(
            sensors,
            cfg.mission_range()?,
            cfg.anomaly_range()?,
            cfg.anomaly.extrema_resolution,
        )
        .await;

    let out = &cfg.output;
    let max = report::max_report(&outcomes);
    max.export(&out.path(&out.max_report))?;
    let min = report::min_report(&outcomes);
    min.export(&out.path(&out.min_report))?;

    let summary = RunSummary::from_outcomes(outcomes.iter().map(|o| &o.sensor));
    info!(
        analyzed = summary.analyzed,
        no_data = summary.no_data,
        maxes_in_anomaly = max.len(),
        mins_in_anomaly = min.len(),
        "Mission extrema complete"
    );
    Ok(())
}

async fn run_violations(inputs: &RunInputs, sensors: &[String]) -> Result<()> {
    let cfg = &inputs.config;
    let outcomes = inputs
        .pipeline()
        .run_limit_violations(sensors, cfg.anomaly_range()?, cfg.anomaly.violation_resolution)
        .await;

    let out = &cfg.output;
    let warning = report::warning_report(&outcomes);
    warning.export(&out.path(&out.warning_report))?;
    let caution = report::caution_report(&outcomes);
    caution.export(&out.path(&out.caution_report))?;

    let summary = RunSummary::from_outcomes(&outcomes);
    info!(
        analyzed = summary.analyzed,
        no_data = summary.no_data,
        with_fallbacks = summary.with_fallbacks,
        warning_violations = warning.len(),
        caution_violations = caution.len(),
        "Limit violations complete"
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_convert(
    args: &CliArgs,
    msid: &str,
    raw_msid: Option<&str>,
    start: &str,
    stop: &str,
    mode: CalibrationMode,
    fahrenheit: bool,
    output: Option<&PathBuf>,
    plot: Option<&PathBuf>,
) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    let tables = ReferenceTables::load(&config.tables).context("Failed to load reference tables")?;
    let record = calibration::lookup(&tables, msid, mode)?.require(msid)?;
    info!(msid, kind = record.kind(), "Using calibration");

    let range = TimeRange::parse(start, stop)?;
    let raw_msid = raw_msid.map_or_else(|| format!("RAW_{}", msid.to_uppercase()), str::to_string);
    let source = build_source(args.source, &config)?;
    let raw = source
        .fetch(&raw_msid, range.start, range.stop, Resolution::Full)
        .await
        .with_context(|| format!("Failed to fetch {raw_msid}"))?;
    let Some(counts) = raw.numeric_values() else {
        anyhow::bail!("{raw_msid} is not a numeric count series");
    };
    if counts.is_empty() {
        warn!(msid = %raw_msid, "No raw counts in range");
    }

    let mut values = calibration::convert(counts, &record);
    if fahrenheit {
        values.iter_mut().for_each(|v| *v = calibration::celsius_to_fahrenheit(*v));
    }

    match output {
        Some(path) => {
            let mut text = csv_join(&["TIME", "RAW_COUNT", "VALUE"]);
            text.push('\n');
            for ((t, c), v) in raw.times.iter().zip(counts).zip(&values) {
                text.push_str(&csv_join(&[format_calendar(*t), c.to_string(), v.to_string()]));
                text.push('\n');
            }
            std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), samples = values.len(), "Wrote converted series");
        }
        None => {
            let finite = values.iter().copied().filter(|v| v.is_finite());
            let (lo, hi) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
            println!("{msid}: {} samples converted ({})", values.len(), record.kind());
            if !values.is_empty() {
                println!("  range: {lo} .. {hi} {}", if fahrenheit { "DEGF" } else { "(engineering units)" });
            }
        }
    }

    if let Some(path) = plot {
        let converted = thermal_audit::SensorSeries::numeric(msid, raw.times.clone(), values);
        let unit = if fahrenheit { "DEGF" } else { tables.unit(msid).unwrap_or("Engineering units") };
        PlotFigure::new(&format!("{msid} from {raw_msid}"), unit)
            .add_series(&converted, None)
            .export(path)?;
    }
    Ok(())
}

async fn run_plot(
    args: &CliArgs,
    msids: &[String],
    start: Option<&str>,
    stop: Option<&str>,
    resolution: Resolution,
    output: Option<&PathBuf>,
) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    let tables = ReferenceTables::load(&config.tables).context("Failed to load reference tables")?;
    let filter = RetentionFilter::from_config(&config)?;
    let source = build_source(args.source, &config)?;

    let anomaly = config.anomaly_range()?;
    let range = TimeRange::new(
        start.map(mission_time::parse_time).transpose()?.unwrap_or(anomaly.start),
        stop.map(mission_time::parse_time).transpose()?.unwrap_or(anomaly.stop),
    );

    let first = msids.first().map(String::as_str).unwrap_or("plot");
    let unit = tables.unit(first).unwrap_or(tables::UNIT_NOT_FOUND);
    let mut figure = PlotFigure::new(&msids.join(", "), unit);
    for msid in msids {
        let series = source
            .fetch(msid, range.start, range.stop, resolution)
            .await
            .with_context(|| format!("Failed to fetch {msid}"))?;
        let mask = filter.apply(&series);
        figure.add_series(&series, Some(mask.keep.as_slice()));
        if msids.len() == 1 {
            figure.add_limits(&thermal_audit::analysis::resolve_limits(&tables, msid, config.limits.sentinel));
        }
    }

    let path = output
        .cloned()
        .unwrap_or_else(|| config.output.path(&format!("{first}.plot.json")));
    figure.export(&path)?;
    Ok(())
}

async fn run_health(
    args: &CliArgs,
    msids: &[String],
    start: Option<&str>,
    stop: Option<&str>,
    plot: Option<&PathBuf>,
) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    let health = &config.health;
    let msids = if msids.is_empty() { health.msids.as_slice() } else { msids };

    let window = config.health_range()?;
    let range = TimeRange::new(
        start.map(mission_time::parse_time).transpose()?.unwrap_or(window.start),
        stop.map(mission_time::parse_time).transpose()?.unwrap_or(window.stop),
    );
    let raw_msids: Vec<String> = msids.iter().map(|m| health.raw_msid(m)).collect();

    // Raw counts bypass the retention filter and limit tables
    let source = build_source(args.source, &config)?;
    let tables = ReferenceTables::default();
    let filter = RetentionFilter::default();
    let pipeline = AuditPipeline::new(source.as_ref(), &tables, &filter, config.limits.sentinel);
    let (series, group) = pipeline.group_range(&raw_msids, range).await;

    println!("{} [{} .. {}]", health.name, range.start_calendar(), range.stop_calendar());
    let Some(group) = group else {
        anyhow::bail!("No raw counts for any of {}", raw_msids.join(", "));
    };
    for s in &group.sensors {
        println!("  {:<16} min {:>8} max {:>8} ({} samples)", s.msid, s.min, s.max, s.samples);
    }
    println!("Observed count range is: {}", group.spread());

    if let Some(path) = plot {
        let mut figure = PlotFigure::new(&format!("{} Trends", health.name), "Counts");
        for s in &series {
            figure.add_series(s, None);
        }
        figure.export(path)?;
    }
    Ok(())
}

fn run_check(args: &CliArgs) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    config.validate()?;
    for w in config::validation::check_plausibility(&config) {
        warn!("{}", w);
    }

    let anomaly = config.anomaly_range()?;
    let mission = config.mission_range()?;
    println!("Anomaly: {} [{} .. {}]", config.anomaly.name, anomaly.start_calendar(), anomaly.stop_calendar());
    println!("Mission: [{} .. {}]", mission.start_calendar(), mission.stop_calendar());
    for interval in config.exclusion_intervals()? {
        println!(
            "  exclude {:<40} {} .. {}",
            interval.name,
            format_calendar(interval.lower()),
            format_calendar(interval.upper())
        );
    }

    let health = config.health_range()?;
    println!(
        "Health group: {} ({} MSIDs) [{} .. {}]",
        config.health.name,
        config.health.msids.len(),
        health.start_calendar(),
        health.stop_calendar()
    );

    let tables = ReferenceTables::load(&config.tables).context("Failed to load reference tables")?;
    println!("Primary limits:   {} MSIDs", tables.limits.len());
    if let Some(t) = &tables.secondary_limits {
        println!("Secondary limits: {} MSIDs", t.len());
    }
    if let Some(t) = &tables.poly_cal {
        println!("Polynomial cal:   {} MSIDs", t.len());
    }
    if let Some(t) = &tables.point_pair {
        println!("Point-pair cal:   {} MSIDs", t.len());
    }
    let sensors = load_sensors(&config, args.sensor_list.as_ref())?;
    println!("Sensors:          {}", sensors.len());
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    match &args.command {
        SubCommand::Analyze { no_screen } => {
            let inputs = RunInputs::load(&args)?;
            let sensors = inputs.screened(*no_screen).await?;
            run_extrema(&inputs, &sensors).await?;
            run_violations(&inputs, &sensors).await?;
        }
        SubCommand::Violations { no_screen } => {
            let inputs = RunInputs::load(&args)?;
            let sensors = inputs.screened(*no_screen).await?;
            run_violations(&inputs, &sensors).await?;
        }
        SubCommand::Extrema { no_screen } => {
            let inputs = RunInputs::load(&args)?;
            let sensors = inputs.screened(*no_screen).await?;
            run_extrema(&inputs, &sensors).await?;
        }
        SubCommand::Convert {
            msid,
            raw_msid,
            start,
            stop,
            mode,
            fahrenheit,
            output,
            plot,
        } => {
            run_convert(
                &args,
                msid,
                raw_msid.as_deref(),
                start,
                stop,
                *mode,
                *fahrenheit,
                output.as_ref(),
                plot.as_ref(),
            )
            .await?;
        }
        SubCommand::Plot {
            msid,
            start,
            stop,
            resolution,
            output,
        } => {
            run_plot(&args, msid, start.as_deref(), stop.as_deref(), *resolution, output.as_ref()).await?;
        }
        SubCommand::Health {
            msid,
            start,
            stop,
            plot,
        } => {
            run_health(&args, msid, start.as_deref(), stop.as_deref(), plot.as_ref()).await?;
        }
        SubCommand::Screen => {
            let inputs = RunInputs::load(&args)?;
            for msid in inputs.screened(false).await? {
                println!("{msid}");
            }
        }
        SubCommand::Check => run_check(&args)?,
    }

    Ok(())
}
