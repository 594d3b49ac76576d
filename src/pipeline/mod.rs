//! Batch Analysis Pipeline
//!
//! ```text
//! STEP 1: Screen     daily query per sensor, keep numeric non-empty series
//! STEP 2: Extrema    mission-range statistics → filter → max/min → anomaly test
//! STEP 3: Violations anomaly-window full resolution → filter → spans
//! ```
//!
//! `group_range` is a separate raw-count health check over a sensor group.
//!
//! Sensors are processed one at a time, each to completion. A sensor that
//! cannot be fetched or analysed is recorded with its fallbacks and the batch
//! continues.

mod outcome;

pub use outcome::*;

use tracing::{info, warn};

use crate::analysis::{analyze, group_range, resolve_limits, Analysis, GroupRange, LimitResolution};
use crate::filter::{RetentionFilter, RetentionMask};
use crate::mission_time::{format_calendar, TimeRange};
use crate::tables::ReferenceTables;
use crate::telemetry::TelemetrySource;
use crate::types::{Resolution, SensorSeries, SentinelBounds};

/// Shared inputs of every run.
pub struct AuditPipeline<'a> {
    source: &'a dyn TelemetrySource,
    tables: &'a ReferenceTables,
    filter: &'a RetentionFilter,
    sentinel: SentinelBounds,
}

impl<'a> AuditPipeline<'a> {
    pub fn new(
        source: &'a dyn TelemetrySource,
        tables: &'a ReferenceTables,
        filter: &'a RetentionFilter,
        sentinel: SentinelBounds,
    ) -> Self {
        Self {
            source,
            tables,
            filter,
            sentinel,
        }
    }

    /// Metadata and limits for a sensor, recording every substitution.
    pub fn sensor_context(&self, msid: &str, fallbacks: &mut Vec<Fallback>) -> SensorContext {
        let technical_name = self.tables.technical_name(msid).map(str::to_string);
        if technical_name.is_none() {
            fallbacks.push(Fallback::TechnicalName);
        }
        let unit = self.tables.unit(msid).map(str::to_string);
        if unit.is_none() {
            fallbacks.push(Fallback::Unit);
        }

        let limits = resolve_limits(self.tables, msid, self.sentinel);
        if limits.resolution == LimitResolution::NotFound {
            fallbacks.push(Fallback::Limits);
        } else if !limits.is_complete() {
            fallbacks.push(Fallback::PartialLimits);
        }

        SensorContext {
            msid: msid.to_string(),
            technical_name,
            unit,
            limits,
        }
    }

    async fn fetch(
        &self,
        msid: &str,
        range: TimeRange,
        resolution: Resolution,
        fallbacks: &mut Vec<Fallback>,
    ) -> SensorSeries {
        match self.source.fetch(msid, range.start, range.stop, resolution).await {
            Ok(series) => {
                if series.is_empty() {
                    fallbacks.push(Fallback::EmptySeries);
                }
                series
            }
            Err(e) => {
                fallbacks.push(Fallback::FetchFailed(e.to_string()));
                SensorSeries::empty(msid, resolution)
            }
        }
    }

    /// Fetch, filter and analyse one sensor.
    pub async fn process_sensor(&self, msid: &str, range: TimeRange, resolution: Resolution) -> SensorOutcome {
        let mut fallbacks = Vec::new();
        let context = self.sensor_context(msid, &mut fallbacks);
        let series = self.fetch(msid, range, resolution, &mut fallbacks).await;

        let mask = if series.is_empty() {
            RetentionMask::default()
        } else {
            self.filter.apply(&series)
        };
        let analysis = analyze(&series, &mask.keep, &context.limits);
        if let Analysis::NoData { reason } = &analysis {
            if !series.is_empty() {
                fallbacks.push(Fallback::NoAnalyzableData(reason.clone()));
            }
        }

        for fallback in &fallbacks {
            warn!(msid, source = self.source.source_name(), %fallback, "Sensor fallback");
        }

        SensorOutcome {
            context,
            analysis,
            mask,
            fallbacks,
        }
    }

    /// Sensors whose series over `range` is numeric and non-empty.
    pub async fn screen_numeric(&self, sensors: &[String], range: TimeRange, resolution: Resolution) -> Vec<String> {
        let mut numeric = Vec::new();
        for msid in sensors {
            match self.source.fetch(msid, range.start, range.stop, resolution).await {
                Ok(series) if series.is_numeric() && !series.is_empty() => numeric.push(msid.clone()),
                Ok(series) if series.is_empty() => {
                    info!(msid = %msid, "Screened out: no data");
                }
                Ok(_) => info!(msid = %msid, "Screened out: categorical"),
                Err(e) => warn!(msid = %msid, error = %e, "Screened out: fetch failed"),
            }
        }
        info!(total = sensors.len(), numeric = numeric.len(), "Numeric screening complete");
        numeric
    }

    /// Mission extrema, flagging sensors whose extreme fell inside the anomaly.
    ///
    /// The max and min tests are independent; a sensor can appear in both
    /// reports.
    pub async fn run_mission_extrema(
        &self,
        sensors: &[String],
        mission: TimeRange,
        anomaly: TimeRange,
        resolution: Resolution,
    ) -> Vec<ExtremaOutcome> {
        info!(
            sensors = sensors.len(),
            mission_start = %mission.start_calendar(),
            mission_stop = %mission.stop_calendar(),
            %resolution,
            "Running mission extrema"
        );

        let mut outcomes = Vec::with_capacity(sensors.len());
        for msid in sensors {
            let sensor = self.process_sensor(msid, mission, resolution).await;
            let (max_in_anomaly, min_in_anomaly) = match sensor.analysis.findings() {
                Some(f) => (
                    anomaly.contains_strict(f.max.time),
                    anomaly.contains_strict(f.min.time),
                ),
                None => (false, false),
            };
            if let Some(f) = sensor.analysis.findings() {
                info!(
                    msid = %msid,
                    max = f.max.value,
                    time_of_max = %format_calendar(f.max.time),
                    min = f.min.value,
                    time_of_min = %format_calendar(f.min.time),
                    max_in_anomaly,
                    min_in_anomaly,
                    "Mission extrema"
                );
            }
            outcomes.push(ExtremaOutcome {
                sensor,
                max_in_anomaly,
                min_in_anomaly,
            });
        }
        outcomes
    }

    /// Warning/caution violation durations over the anomaly window.
    pub async fn run_limit_violations(
        &self,
        sensors: &[String],
        anomaly: TimeRange,
        resolution: Resolution,
    ) -> Vec<SensorOutcome> {
        info!(
            sensors = sensors.len(),
            anomaly_start = %anomaly.start_calendar(),
            anomaly_stop = %anomaly.stop_calendar(),
            %resolution,
            "Running limit violations (caution report compares against caution-high)"
        );

        let mut outcomes = Vec::with_capacity(sensors.len());
        for msid in sensors {
            let outcome = self.process_sensor(msid, anomaly, resolution).await;
            if let Some(f) = outcome.analysis.findings() {
                info!(
                    msid = %msid,
                    warning_hours = f.warning_hours(),
                    caution_hours = f.caution_hours(),
                    classification = %f.classification(),
                    "Limit violations"
                );
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Raw series for a sensor group and their combined observed range.
    ///
    /// Raw counts are neither filtered nor calibrated. A sensor that fails
    /// to fetch is logged and left out of the range.
    pub async fn group_range(&self, raw_msids: &[String], range: TimeRange) -> (Vec<SensorSeries>, Option<GroupRange>) {
        let mut fetched = Vec::with_capacity(raw_msids.len());
        for msid in raw_msids {
            match self.source.fetch(msid, range.start, range.stop, Resolution::Full).await {
                Ok(series) if series.is_empty() => warn!(msid = %msid, "No raw counts in range"),
                Ok(series) => fetched.push(series),
                Err(e) => warn!(msid = %msid, error = %e, "Raw count fetch failed"),
            }
        }

        let group = group_range(&fetched);
        match &group {
            Some(g) => info!(
                sensors = g.sensors.len(),
                min = g.min,
                max = g.max,
                spread = g.spread(),
                "Group count range"
            ),
            None => warn!(requested = raw_msids.len(), "No numeric data for any group sensor"),
        }
        (fetched, group)
    }
}
