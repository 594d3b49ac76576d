//! Report Exporter
//!
//! - `csv`: the four fixed-schema result tables (max, min, warning, caution)
//! - `plot`: plotly-format JSON figures of sensor series with limit lines

pub mod csv;
pub mod plot;

pub use self::csv::*;
pub use plot::*;

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to serialize plot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Write `contents` to `path`, creating parent directories.
pub(crate) fn write_file(path: &Path, contents: &[u8]) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ReportError::Io(parent.to_path_buf(), e))?;
    }
    std::fs::write(path, contents).map_err(|e| ReportError::Io(path.to_path_buf(), e))
}
