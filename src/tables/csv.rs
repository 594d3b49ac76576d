//! Minimal CSV reading/writing for reference tables and reports.
//!
//! Reference tables are exported from the TDB (Access / pandas) and are small,
//! so each file is read whole and split line by line, honouring quoted fields.

use std::collections::HashMap;
use std::path::Path;

use super::TableError;

// ============================================================================
// Quote-Aware Splitting
// ============================================================================

/// Split a CSV line respecting quoted fields (handles commas inside quotes).
/// Returns owned strings because quoted fields need unquoting.
pub fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    // Escaped quote ("")
                    if chars.peek() == Some(&'"') {
                        current.push('"');
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Quote a field for output if it contains a delimiter, quote or newline.
pub fn csv_escape(field: &str) -> String {
    if field.contains(|c| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Join fields into one CSV line (no trailing newline).
pub fn csv_join<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| csv_escape(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

// ============================================================================
// Cell Parsing
// ============================================================================

/// True for cells pandas/Access write for a missing value.
pub fn is_null_cell(cell: &str) -> bool {
    let c = cell.trim();
    c.is_empty()
        || c.eq_ignore_ascii_case("nan")
        || c.eq_ignore_ascii_case("none")
        || c.eq_ignore_ascii_case("null")
}

// ============================================================================
// Table
// ============================================================================

/// A parsed CSV file: header plus string rows, with case-insensitive column lookup.
#[derive(Debug, Clone)]
pub struct CsvTable {
    name: String,
    headers: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Parse CSV text. `name` identifies the table in error messages.
    pub fn parse(name: &str, contents: &str) -> Result<Self, TableError> {
        let mut lines = contents
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.trim().is_empty());

        let header_line = lines.next().ok_or_else(|| TableError::Empty(name.to_string()))?;
        let headers: Vec<String> = csv_split(header_line.trim_start_matches('\u{feff}'))
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();

        let index = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_empty())
            .map(|(i, h)| (h.to_uppercase(), i))
            .collect();

        let rows = lines.map(csv_split).collect();

        Ok(Self {
            name: name.to_string(),
            headers,
            index,
            rows,
        })
    }

    /// Read and parse a CSV file.
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TableError::Io(path.to_path_buf(), e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self::parse(&name, &contents)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Index of a column, if present (case-insensitive).
    pub fn column(&self, name: &str) -> Option<usize> {
        self.index.get(&name.to_uppercase()).copied()
    }

    /// Index of a required column; a missing column is fatal for the run.
    pub fn require(&self, name: &str) -> Result<usize, TableError> {
        self.column(name).ok_or_else(|| TableError::MissingColumn {
            table: self.name.clone(),
            column: name.to_string(),
        })
    }

    /// Trimmed cell text; short rows read as blank.
    pub fn cell<'a>(row: &'a [String], idx: usize) -> &'a str {
        row.get(idx).map(|s| s.trim()).unwrap_or("")
    }

    /// Parse an optional numeric cell. Null markers yield `None`; anything
    /// else that is not a number is a malformed table.
    pub fn optional_f64(
        &self,
        row: &[String],
        row_no: usize,
        idx: usize,
    ) -> Result<Option<f64>, TableError> {
        let cell = Self::cell(row, idx);
        if is_null_cell(cell) {
            return Ok(None);
        }
        cell.parse::<f64>()
            .map(Some)
            .map_err(|_| TableError::InvalidValue {
                table: self.name.clone(),
                row: row_no,
                column: self.headers.get(idx).cloned().unwrap_or_default(),
                value: cell.to_string(),
            })
    }

    /// Parse a numeric cell that must be present.
    pub fn required_f64(&self, row: &[String], row_no: usize, idx: usize) -> Result<f64, TableError> {
        self.optional_f64(row, row_no, idx)?
            .ok_or_else(|| TableError::InvalidValue {
                table: self.name.clone(),
                row: row_no,
                column: self.headers.get(idx).cloned().unwrap_or_default(),
                value: String::new(),
            })
    }
}
