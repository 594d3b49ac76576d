//! thermal-audit: spacecraft thermal telemetry anomaly analysis
//!
//! Batch tooling for investigating thermal telemetry around a safe-mode
//! anomaly.
//!
//! ## Architecture
//!
//! - **Tables**: limit, calibration and metadata reference tables keyed by MSID
//! - **Telemetry**: one async source trait over the local archive and the live
//!   REST service
//! - **Calibration**: raw counts to engineering temperatures (polynomial or
//!   point-pair)
//! - **Filter**: exclusion intervals and a quality gate combined into a
//!   retention mask
//! - **Analysis**: extrema, limit-violation spans, limit resolution
//! - **Pipeline**: per-sensor batch runs with recorded fallbacks
//! - **Report**: fixed-schema CSV reports and plotly JSON figures

pub mod analysis;
pub mod calibration;
pub mod config;
pub mod filter;
pub mod mission_time;
pub mod pipeline;
pub mod report;
pub mod tables;
pub mod telemetry;
pub mod types;

pub use config::AuditConfig;

pub use types::{IntervalStats, Resolution, SafetyLimits, SensorSeries, SentinelBounds, SeriesValues};

pub use analysis::{analyze, Analysis, Classification, Findings, ResolvedLimits, ViolationSpan};
pub use calibration::{CalibrationError, CalibrationLookup, CalibrationMode, CalibrationRecord};
pub use filter::{ExclusionInterval, QualityGate, RetentionFilter, RetentionMask};
pub use mission_time::{MissionSeconds, TimeError, TimeRange};
pub use pipeline::{AuditPipeline, ExtremaOutcome, Fallback, SensorOutcome};
pub use report::{PlotFigure, ReportError, ReportTable};
pub use tables::{ReferenceTables, TableError};
pub use telemetry::{ArchiveSource, RestSource, SourceKind, TelemetryError, TelemetrySource};
