//! Safety limit tables (`MSID, WARNING_LOW, WARNING_HIGH, CAUTION_LOW, CAUTION_HIGH`)

use std::collections::HashMap;
use std::path::Path;

use super::csv::CsvTable;
use super::{normalize_msid, TableError};
use crate::types::SafetyLimits;

/// Limit records keyed by upper-case MSID.
///
/// When an MSID appears on several rows the last row wins: limit exports list
/// limit sets chronologically, and the current set is the latest.
#[derive(Debug, Clone, Default)]
pub struct LimitTable {
    records: HashMap<String, SafetyLimits>,
}

impl LimitTable {
    pub fn load(path: &Path) -> Result<Self, TableError> {
        Self::from_table(&CsvTable::load(path)?)
    }

    pub fn parse(name: &str, contents: &str) -> Result<Self, TableError> {
        Self::from_table(&CsvTable::parse(name, contents)?)
    }

    fn from_table(table: &CsvTable) -> Result<Self, TableError> {
        let msid = table.require("MSID")?;
        let warning_low = table.require("WARNING_LOW")?;
        let warning_high = table.require("WARNING_HIGH")?;
        let caution_low = table.require("CAUTION_LOW")?;
        let caution_high = table.require("CAUTION_HIGH")?;

        let mut records = HashMap::new();
        for (i, row) in table.rows().iter().enumerate() {
            let row_no = i + 2;
            let key = normalize_msid(CsvTable::cell(row, msid));
            if key.is_empty() {
                continue;
            }
            let limits = SafetyLimits {
                warning_low: table.optional_f64(row, row_no, warning_low)?,
                warning_high: table.optional_f64(row, row_no, warning_high)?,
                caution_low: table.optional_f64(row, row_no, caution_low)?,
                caution_high: table.optional_f64(row, row_no, caution_high)?,
            };
            records.insert(key, limits);
        }

        tracing::debug!(table = table.name(), records = records.len(), "Loaded limit table");
        Ok(Self { records })
    }

    pub fn get(&self, msid: &str) -> Option<&SafetyLimits> {
        self.records.get(&normalize_msid(msid))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
