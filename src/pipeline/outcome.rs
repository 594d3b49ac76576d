//! Per-sensor outcomes of a batch run

use serde::Serialize;

use crate::analysis::{Analysis, ResolvedLimits};
use crate::filter::RetentionMask;
use crate::tables::{NAME_NOT_IN_TDB, UNIT_NOT_FOUND};

/// A documented substitute used in place of missing data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Fallback {
    /// No technical name; reported as "Not in TDB"
    TechnicalName,
    /// No engineering unit; reported as "None Found"
    Unit,
    /// No limit table knows the sensor; sentinels used
    Limits,
    /// Some limit fields blank; sentinels used for those
    PartialLimits,
    /// The source returned no samples
    EmptySeries,
    /// The fetch failed outright
    FetchFailed(String),
    /// Samples were fetched but nothing was left to analyse
    NoAnalyzableData(String),
}

impl std::fmt::Display for Fallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fallback::TechnicalName => write!(f, "technical name not in TDB"),
            Fallback::Unit => write!(f, "unit not found"),
            Fallback::Limits => write!(f, "no limits, sentinels used"),
            Fallback::PartialLimits => write!(f, "incomplete limits, sentinels used for blanks"),
            Fallback::EmptySeries => write!(f, "no telemetry in range"),
            Fallback::FetchFailed(e) => write!(f, "fetch failed: {e}"),
            Fallback::NoAnalyzableData(reason) => write!(f, "no analyzable data: {reason}"),
        }
    }
}

/// Descriptive data and limits for one sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorContext {
    pub msid: String,
    pub technical_name: Option<String>,
    pub unit: Option<String>,
    pub limits: ResolvedLimits,
}

impl SensorContext {
    pub fn technical_name_or_default(&self) -> &str {
        self.technical_name.as_deref().unwrap_or(NAME_NOT_IN_TDB)
    }

    pub fn unit_or_default(&self) -> &str {
        self.unit.as_deref().unwrap_or(UNIT_NOT_FOUND)
    }
}

/// Result of processing one sensor.
#[derive(Debug, Clone)]
pub struct SensorOutcome {
    pub context: SensorContext,
    pub analysis: Analysis,
    pub mask: RetentionMask,
    pub fallbacks: Vec<Fallback>,
}

impl SensorOutcome {
    pub fn msid(&self) -> &str {
        &self.context.msid
    }
}

/// A sensor processed by the mission-extrema run.
#[derive(Debug, Clone)]
pub struct ExtremaOutcome {
    pub sensor: SensorOutcome,
    /// Mission maximum fell strictly inside the anomaly window
    pub max_in_anomaly: bool,
    /// Mission minimum fell strictly inside the anomaly window
    pub min_in_anomaly: bool,
}

/// Aggregate counts for a run summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub sensors: usize,
    pub analyzed: usize,
    pub no_data: usize,
    pub with_fallbacks: usize,
}

impl RunSummary {
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a SensorOutcome>) -> Self {
        let mut summary = Self::default();
        for o in outcomes {
            summary.sensors += 1;
            match o.analysis {
                Analysis::Analyzed(_) => summary.analyzed += 1,
                Analysis::NoData { .. } => summary.no_data += 1,
            }
            if !o.fallbacks.is_empty() {
                summary.with_fallbacks += 1;
            }
        }
        summary
    }
}
