//! Reference Table Loader
//!
//! Loads the tabular reference data an analysis run depends on, keyed by MSID:
//!
//! | Table | Required columns |
//! |---|---|
//! | Safety limits (primary and secondary) | `MSID, WARNING_LOW, WARNING_HIGH, CAUTION_LOW, CAUTION_HIGH` |
//! | Polynomial calibration | `MSID, DEG, COEF0..COEFn` |
//! | Point-pair calibration | `MSID, CALIBRATION_SET_NUM, SEQUENCE_NUM, RAW_COUNT, ENG_UNIT_VALUE` |
//! | MSID metadata | `MSID, TECHNICAL_NAME, UNIT` |
//! | Sensor list | one identifier per row |
//!
//! A table missing a required column aborts the run: nothing downstream has a
//! meaningful fallback for a malformed reference table.

pub mod csv;
mod calibration;
mod limits;
mod metadata;

pub use calibration::*;
pub use limits::*;
pub use metadata::*;

use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::config::TablesConfig;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to read table {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Table {0} is empty (no header row)")]
    Empty(String),

    #[error("Table {table} is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("Table {table}, row {row}: invalid value '{value}' in column '{column}'")]
    InvalidValue {
        table: String,
        row: usize,
        column: String,
        value: String,
    },
}

/// Canonical lookup key for an MSID.
pub fn normalize_msid(msid: &str) -> String {
    msid.trim().to_uppercase()
}

// ============================================================================
// Reference Tables
// ============================================================================

/// All reference tables for one run. Read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    pub limits: LimitTable,
    pub secondary_limits: Option<LimitTable>,
    pub poly_cal: Option<PolyCalTable>,
    pub point_pair: Option<PointPairTable>,
    pub metadata: Option<MetadataTable>,
}

impl ReferenceTables {
    /// Load every table named in the configuration.
    ///
    /// The primary limit table is mandatory; the others are loaded only when
    /// configured.
    pub fn load(config: &TablesConfig) -> Result<Self, TableError> {
        let limits = LimitTable::load(&config.limits)?;
        info!(path = %config.limits.display(), records = limits.len(), "Loaded primary limit table");

        let secondary_limits = config
            .secondary_limits
            .as_deref()
            .map(LimitTable::load)
            .transpose()?;
        let poly_cal = config
            .poly_cal
            .as_deref()
            .map(|p| PolyCalTable::load(p, config.calibration_set))
            .transpose()?;
        let point_pair = config
            .point_pair
            .as_deref()
            .map(|p| PointPairTable::load(p, config.calibration_set))
            .transpose()?;
        let metadata = config
            .msid_metadata
            .as_deref()
            .map(MetadataTable::load)
            .transpose()?;

        Ok(Self {
            limits,
            secondary_limits,
            poly_cal,
            point_pair,
            metadata,
        })
    }

    /// Technical name, or `None` when the TDB has none.
    pub fn technical_name(&self, msid: &str) -> Option<&str> {
        self.metadata
            .as_ref()?
            .get(msid)?
            .technical_name
            .as_deref()
    }

    /// Engineering unit, or `None` when the TDB has none.
    pub fn unit(&self, msid: &str) -> Option<&str> {
        self.metadata.as_ref()?.get(msid)?.unit.as_deref()
    }
}
