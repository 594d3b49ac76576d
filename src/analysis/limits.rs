//! Limit resolution: primary TDB table, then secondary table, then sentinels

use serde::Serialize;
use tracing::debug;

use crate::tables::ReferenceTables;
use crate::types::{SafetyLimits, SentinelBounds};

/// Where a sensor's limits came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum LimitResolution {
    Primary(SafetyLimits),
    Secondary(SafetyLimits),
    NotFound,
}

impl LimitResolution {
    pub fn source_name(&self) -> &'static str {
        match self {
            LimitResolution::Primary(_) => "primary",
            LimitResolution::Secondary(_) => "secondary",
            LimitResolution::NotFound => "sentinel",
        }
    }
}

/// Limits for one sensor as used by the analyzer.
///
/// `record` keeps absent fields absent so reports can say so; the threshold
/// accessors fill them from the sentinels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedLimits {
    pub resolution: LimitResolution,
    pub record: SafetyLimits,
    pub sentinel: SentinelBounds,
}

impl ResolvedLimits {
    /// Limits that never trigger; used when no source knows the sensor.
    pub fn sentinel_only(sentinel: SentinelBounds) -> Self {
        Self {
            resolution: LimitResolution::NotFound,
            record: SafetyLimits::default(),
            sentinel,
        }
    }

    pub fn warning_high(&self) -> f64 {
        self.record.warning_high.unwrap_or(self.sentinel.high)
    }

    pub fn caution_high(&self) -> f64 {
        self.record.caution_high.unwrap_or(self.sentinel.high)
    }

    pub fn warning_low(&self) -> f64 {
        self.record.warning_low.unwrap_or(self.sentinel.low)
    }

    pub fn caution_low(&self) -> f64 {
        self.record.caution_low.unwrap_or(self.sentinel.low)
    }

    /// True when every threshold came from a limit table.
    pub fn is_complete(&self) -> bool {
        let r = &self.record;
        r.warning_high.is_some()
            && r.caution_high.is_some()
            && r.warning_low.is_some()
            && r.caution_low.is_some()
    }
}

/// Resolve limits in order: primary table, secondary table, sentinels.
///
/// A record with every field blank counts as absent.
pub fn resolve_limits(tables: &ReferenceTables, msid: &str, sentinel: SentinelBounds) -> ResolvedLimits {
    let usable = |l: &&SafetyLimits| !l.is_blank();

    let resolution = if let Some(primary) = tables.limits.get(msid).filter(usable) {
        LimitResolution::Primary(*primary)
    } else if let Some(secondary) = tables
        .secondary_limits
        .as_ref()
        .and_then(|t| t.get(msid))
        .filter(usable)
    {
        LimitResolution::Secondary(*secondary)
    } else {
        LimitResolution::NotFound
    };

    let record = match resolution {
        LimitResolution::Primary(l) | LimitResolution::Secondary(l) => l,
        LimitResolution::NotFound => SafetyLimits::default(),
    };
    debug!(msid, source = resolution.source_name(), "Resolved limits");

    ResolvedLimits {
        resolution,
        record,
        sentinel,
    }
}
