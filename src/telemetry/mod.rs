//! Telemetry source abstraction.
//!
//! Provides a unified trait for fetching sensor telemetry from different
//! backends: the local per-MSID archive and the live REST service. Both return
//! a [`SensorSeries`] with times in mission seconds.

pub mod archive;
pub mod rest;

pub use archive::ArchiveSource;
pub use rest::RestSource;

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::mission_time::{MissionSeconds, TimeError};
use crate::types::{Resolution, SensorSeries};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("No archive data for MSID {0}")]
    UnknownMsid(String),

    #[error("Resolution '{resolution}' is not served by the {backend} backend")]
    UnsupportedResolution {
        backend: &'static str,
        resolution: Resolution,
    },

    #[error("Failed to read archive file {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Archive file {file}, line {line}: {reason}")]
    Malformed {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("Invalid time: {0}")]
    Time(#[from] TimeError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned status {0}")]
    ServerError(reqwest::StatusCode),

    #[error("Malformed response body: {0}")]
    Body(String),
}

/// Which backend serves a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SourceKind {
    /// Local `<data_root>/<MSID>.csv` archive
    #[default]
    Archive,
    /// Live telemetry REST service
    Rest,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Archive => write!(f, "archive"),
            SourceKind::Rest => write!(f, "rest"),
        }
    }
}

/// Trait abstracting where sensor telemetry comes from.
///
/// An empty series means "no data for this range". Implementations never
/// return samples outside `[start, end]`.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    async fn fetch(
        &self,
        msid: &str,
        start: MissionSeconds,
        end: MissionSeconds,
        resolution: Resolution,
    ) -> Result<SensorSeries, TelemetryError>;

    /// Human-readable name for logging (e.g. "archive", "REST").
    fn source_name(&self) -> &str;
}
