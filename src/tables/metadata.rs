//! MSID metadata table (`MSID, TECHNICAL_NAME, UNIT`) and the sensor list

use std::collections::HashMap;
use std::path::Path;

use super::csv::{is_null_cell, CsvTable};
use super::{normalize_msid, TableError};

/// Report text when an MSID has no technical name in the TDB.
pub const NAME_NOT_IN_TDB: &str = "Not in TDB";

/// Report text when an MSID has no engineering unit.
pub const UNIT_NOT_FOUND: &str = "None Found";

/// Descriptive metadata for one MSID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MsidMeta {
    pub technical_name: Option<String>,
    pub unit: Option<String>,
}

/// Metadata keyed by upper-case MSID.
#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
    records: HashMap<String, MsidMeta>,
}

impl MetadataTable {
    pub fn load(path: &Path) -> Result<Self, TableError> {
        Self::from_table(&CsvTable::load(path)?)
    }

    pub fn parse(name: &str, contents: &str) -> Result<Self, TableError> {
        Self::from_table(&CsvTable::parse(name, contents)?)
    }

    fn from_table(table: &CsvTable) -> Result<Self, TableError> {
        let msid = table.require("MSID")?;
        let name = table.require("TECHNICAL_NAME")?;
        let unit = table.require("UNIT")?;

        let text = |row: &[String], idx: usize| {
            let cell = CsvTable::cell(row, idx);
            (!is_null_cell(cell)).then(|| cell.to_string())
        };

        let records = table
            .rows()
            .iter()
            .filter_map(|row| {
                let key = normalize_msid(CsvTable::cell(row, msid));
                (!key.is_empty()).then(|| {
                    (
                        key,
                        MsidMeta {
                            technical_name: text(row, name),
                            unit: text(row, unit),
                        },
                    )
                })
            })
            .collect();

        Ok(Self { records })
    }

    pub fn get(&self, msid: &str) -> Option<&MsidMeta> {
        self.records.get(&normalize_msid(msid))
    }
}

// ============================================================================
// Sensor List
// ============================================================================

/// Read the list of MSIDs to analyse.
///
/// Uses `column` when given, otherwise an `MSID` column, otherwise the first
/// column. Blank cells and cells containing `None` are skipped; identifiers
/// are trimmed but keep their case.
pub fn load_sensor_list(path: &Path, column: Option<&str>) -> Result<Vec<String>, TableError> {
    parse_sensor_list(&CsvTable::load(path)?, column)
}

pub fn parse_sensor_list(table: &CsvTable, column: Option<&str>) -> Result<Vec<String>, TableError> {
    let idx = match column {
        Some(name) => table.require(name)?,
        None => table.column("MSID").unwrap_or(0),
    };

    let sensors: Vec<String> = table
        .rows()
        .iter()
        .map(|row| CsvTable::cell(row, idx))
        .filter(|cell| !cell.is_empty() && !cell.contains("None"))
        .map(str::to_string)
        .collect();

    tracing::debug!(table = table.name(), sensors = sensors.len(), "Loaded sensor list");
    Ok(sensors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_blank_cells_are_absent() {
        let table = MetadataTable::parse(
            "TDB_MSID.csv",
            "MSID,TECHNICAL_NAME,UNIT\nOOBTHR02,HRMA STRUT TEMP,DEGF\nTSSMIN,,\n",
        )
        .unwrap();
        assert_eq!(
            table.get("oobthr02").unwrap().technical_name.as_deref(),
            Some("HRMA STRUT TEMP")
        );
        assert_eq!(table.get("TSSMIN").unwrap(), &MsidMeta::default());
    }

    #[test]
    fn test_sensor_list_skips_blank_and_none() {
        let table = CsvTable::parse(
            "thermlist.csv",
            "name,ska_msids\nHRMA,oobthr02 \nSIM,None\nEMPTY,\nSSM,tssmin\n",
        )
        .unwrap();
        let sensors = parse_sensor_list(&table, Some("ska_msids")).unwrap();
        assert_eq!(sensors, vec!["oobthr02", "tssmin"]);
    }

    #[test]
    fn test_sensor_list_defaults_to_first_column() {
        let table = CsvTable::parse("list.csv", "sensor\nA\nB\n").unwrap();
        assert_eq!(parse_sensor_list(&table, None).unwrap(), vec!["A", "B"]);
    }
}
