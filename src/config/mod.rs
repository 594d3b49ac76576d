//! Audit Configuration Module
//!
//! Every data-root, table path, event time and threshold the analysis needs,
//! loaded from TOML and passed explicitly to the components that use them.
//!
//! ## Loading Order
//!
//! 1. `--config <path>` on the command line (errors are fatal)
//! 2. `THERMAL_AUDIT_CONFIG` environment variable (path to TOML file)
//! 3. `thermal_audit.toml` in the current working directory
//! 4. Built-in defaults (the 2023:044 safe-mode investigation values)
//!
//! ## Usage
//!
//! ```ignore
//! let config = AuditConfig::load();
//! let archive = ArchiveSource::new(config.archive.clone());
//! let intervals = config.exclusion_intervals()?;
//! ```

mod audit_config;
pub mod defaults;
pub mod validation;

pub use audit_config::*;
