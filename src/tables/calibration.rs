//! Calibration tables
//!
//! - Polynomial: `MSID, DEG, COEF0..COEFn` (optional `CALIBRATION_SET_NUM`)
//! - Point-pair: `MSID, CALIBRATION_SET_NUM, SEQUENCE_NUM, RAW_COUNT, ENG_UNIT_VALUE`
//!
//! Rows are stored as exported. Degree and knot validation happens when a
//! record is built for conversion, so one bad row only affects its own sensor.

use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::OnceLock;

use super::csv::CsvTable;
use super::{normalize_msid, TableError};

fn coef_column_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^COEF(\d+)$").expect("coefficient pattern is valid"))
}

// ============================================================================
// Polynomial Calibration
// ============================================================================

/// One polynomial calibration row as exported from the TDB.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyCalRow {
    /// `DEG` cell as written; may be non-integral in a corrupt export
    pub degree: f64,
    /// `COEFi` cells by power; `None` for blank cells or absent columns
    pub coefficients: Vec<Option<f64>>,
}

/// Polynomial calibration rows keyed by upper-case MSID.
#[derive(Debug, Clone, Default)]
pub struct PolyCalTable {
    rows: HashMap<String, PolyCalRow>,
    /// Highest `COEFn` column present in the file
    max_power: Option<usize>,
}

impl PolyCalTable {
    pub fn load(path: &Path, calibration_set: u32) -> Result<Self, TableError> {
        Self::from_table(&CsvTable::load(path)?, calibration_set)
    }

    pub fn parse(name: &str, contents: &str, calibration_set: u32) -> Result<Self, TableError> {
        Self::from_table(&CsvTable::parse(name, contents)?, calibration_set)
    }

    fn from_table(table: &CsvTable, calibration_set: u32) -> Result<Self, TableError> {
        let msid = table.require("MSID")?;
        let deg = table.require("DEG")?;
        // COEF0 is always needed; higher powers are discovered from the header
        table.require("COEF0")?;
        let set_col = table.column("CALIBRATION_SET_NUM");

        let coef_columns: BTreeMap<usize, usize> = table
            .headers()
            .iter()
            .enumerate()
            .filter_map(|(idx, h)| {
                coef_column_pattern()
                    .captures(h)
                    .and_then(|c| c[1].parse::<usize>().ok())
                    .map(|power| (power, idx))
            })
            .collect();
        let max_power = coef_columns.keys().next_back().copied();

        let mut rows = HashMap::new();
        for (i, row) in table.rows().iter().enumerate() {
            let row_no = i + 2;
            let key = normalize_msid(CsvTable::cell(row, msid));
            if key.is_empty() {
                continue;
            }
            if let Some(col) = set_col {
                let set = table.optional_f64(row, row_no, col)?;
                if set.is_some_and(|s| s as u32 != calibration_set) {
                    continue;
                }
            }

            let degree = table.required_f64(row, row_no, deg)?;
            let width = max_power.map_or(0, |p| p + 1);
            let mut coefficients = vec![None; width];
            for (&power, &idx) in &coef_columns {
                coefficients[power] = table.optional_f64(row, row_no, idx)?;
            }

            rows.insert(key, PolyCalRow { degree, coefficients });
        }

        tracing::debug!(table = table.name(), records = rows.len(), "Loaded polynomial calibration table");
        Ok(Self { rows, max_power })
    }

    pub fn get(&self, msid: &str) -> Option<&PolyCalRow> {
        self.rows.get(&normalize_msid(msid))
    }

    /// Highest degree the table's columns can express.
    pub fn max_supported_degree(&self) -> Option<usize> {
        self.max_power
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// Point-Pair Calibration
// ============================================================================

/// One (raw count, engineering value) knot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointPairRow {
    pub calibration_set: u32,
    pub sequence: i64,
    pub raw_count: f64,
    pub eng_value: f64,
}

/// Point-pair knots grouped by upper-case MSID, in file order.
#[derive(Debug, Clone, Default)]
pub struct PointPairTable {
    rows: HashMap<String, Vec<PointPairRow>>,
    calibration_set: u32,
}

impl PointPairTable {
    pub fn load(path: &Path, calibration_set: u32) -> Result<Self, TableError> {
        Self::from_table(&CsvTable::load(path)?, calibration_set)
    }

    pub fn parse(name: &str, contents: &str, calibration_set: u32) -> Result<Self, TableError> {
        Self::from_table(&CsvTable::parse(name, contents)?, calibration_set)
    }

    fn from_table(table: &CsvTable, calibration_set: u32) -> Result<Self, TableError> {
        let msid = table.require("MSID")?;
        let set = table.require("CALIBRATION_SET_NUM")?;
        let seq = table.require("SEQUENCE_NUM")?;
        let raw = table.require("RAW_COUNT")?;
        let eng = table.require("ENG_UNIT_VALUE")?;

        let mut rows: HashMap<String, Vec<PointPairRow>> = HashMap::new();
        for (i, row) in table.rows().iter().enumerate() {
            let row_no = i + 2;
            let key = normalize_msid(CsvTable::cell(row, msid));
            if key.is_empty() {
                continue;
            }
            rows.entry(key).or_default().push(PointPairRow {
                calibration_set: table.optional_f64(row, row_no, set)?.unwrap_or(1.0) as u32,
                sequence: table.required_f64(row, row_no, seq)? as i64,
                raw_count: table.required_f64(row, row_no, raw)?,
                eng_value: table.required_f64(row, row_no, eng)?,
            });
        }

        tracing::debug!(table = table.name(), msids = rows.len(), "Loaded point-pair table");
        Ok(Self {
            rows,
            calibration_set,
        })
    }

    /// Knots for one MSID in the configured calibration set.
    ///
    /// Falls back to the lowest set number present when the MSID has no knots
    /// in the configured set. Returned in file order; sorting is the
    /// converter's job.
    pub fn knots(&self, msid: &str) -> Option<Vec<PointPairRow>> {
        let all = self.rows.get(&normalize_msid(msid))?;
        let preferred: Vec<PointPairRow> = all
            .iter()
            .filter(|r| r.calibration_set == self.calibration_set)
            .copied()
            .collect();
        if !preferred.is_empty() {
            return Some(preferred);
        }

        let lowest = all.iter().map(|r| r.calibration_set).min()?;
        tracing::debug!(
            msid,
            configured = self.calibration_set,
            using = lowest,
            "No point-pair knots in configured calibration set"
        );
        Some(all.iter().filter(|r| r.calibration_set == lowest).copied().collect())
    }

    pub fn contains(&self, msid: &str) -> bool {
        self.rows.contains_key(&normalize_msid(msid))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
