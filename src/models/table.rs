//! Generic Row Table
//!
//! A header-ordered, string-typed table backing every dataset file. Fetch
//! responses arrive with heterogeneous scalar types depending on the
//! endpoint, so all cells are coerced to their string form on entry; date
//! and time key columns compare correctly in this representation because
//! the wire format is zero-padded (YYYYMMDD / HHMMSS).

use std::path::Path;

use crate::error::{Error, Result};

/// An ordered collection of rows with named columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Create an empty table with the given header
    pub fn new<S: Into<String>>(columns: Vec<S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Create an empty table with no header (first collection placeholder)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a named column, if present
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append a row, padding or truncating to the header width
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    /// Replace the row set wholesale (rows must already match the header)
    pub fn set_rows(&mut self, rows: Vec<Vec<String>>) {
        self.rows = rows;
    }

    /// Project another table's rows onto this table's header by column name.
    ///
    /// Columns absent from the source come back empty; extra source columns
    /// are dropped. Used when an incremental fetch returns a slightly
    /// different column set than the stored file.
    pub fn project_rows(&self, other: &DataTable) -> Vec<Vec<String>> {
        if self.columns == other.columns {
            return other.rows.clone();
        }

        let mapping: Vec<Option<usize>> = self
            .columns
            .iter()
            .map(|c| other.column_index(c))
            .collect();

        other
            .rows
            .iter()
            .map(|row| {
                mapping
                    .iter()
                    .map(|idx| {
                        idx.and_then(|i| row.get(i).cloned())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect()
    }

    /// All values of one column (empty when the column is absent)
    pub fn column_values(&self, name: &str) -> Vec<&str> {
        match self.column_index(name) {
            Some(idx) => self.rows.iter().map(|r| r[idx].as_str()).collect(),
            None => Vec::new(),
        }
    }

    /// Read a table from a CSV file with a header row
    pub fn from_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| Error::Io(format!("Failed to open {}: {}", path.display(), e)))?;

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| Error::Parse(format!("Failed to read CSV header: {}", e)))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut table = DataTable::new(columns);
        for result in reader.records() {
            let record =
                result.map_err(|e| Error::Parse(format!("Failed to parse CSV row: {}", e)))?;
            table.push_row(record.iter().map(str::to_string).collect());
        }

        Ok(table)
    }

    /// Write the table to a CSV file, header first
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Io(format!("Failed to create {}: {}", parent.display(), e)))?;
        }

        let mut writer = csv::Writer::from_path(path)
            .map_err(|e| Error::Io(format!("Failed to write {}: {}", path.display(), e)))?;

        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush().map_err(|e| Error::Io(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> DataTable {
        let mut t = DataTable::new(vec!["stck_bsop_date", "close"]);
        t.push_row(vec!["20240101".into(), "100".into()]);
        t.push_row(vec!["20240102".into(), "101".into()]);
        t
    }

    #[test]
    fn test_push_row_pads_to_header() {
        let mut t = DataTable::new(vec!["a", "b", "c"]);
        t.push_row(vec!["1".into()]);
        assert_eq!(t.rows()[0], vec!["1", "", ""]);
    }

    #[test]
    fn test_column_values() {
        let t = sample();
        assert_eq!(t.column_values("stck_bsop_date"), vec!["20240101", "20240102"]);
        assert!(t.column_values("missing").is_empty());
    }

    #[test]
    fn test_project_rows_realigns_by_name() {
        let target = DataTable::new(vec!["stck_bsop_date", "close"]);
        let mut source = DataTable::new(vec!["close", "stck_bsop_date", "extra"]);
        source.push_row(vec!["99".into(), "20240103".into(), "x".into()]);

        let projected = target.project_rows(&source);
        assert_eq!(projected, vec![vec!["20240103".to_string(), "99".to_string()]]);
    }

    #[test]
    fn test_csv_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.csv");

        let original = sample();
        original.write_csv(&path).unwrap();
        let loaded = DataTable::from_csv(&path).unwrap();

        assert_eq!(loaded, original);
    }

    #[test]
    fn test_from_csv_missing_file_is_error() {
        let dir = tempdir().unwrap();
        assert!(DataTable::from_csv(&dir.path().join("absent.csv")).is_err());
    }
}
