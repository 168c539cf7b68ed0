//! Whole-table normalization ahead of matching

use crate::normalize::{normalize_cell, ColumnRole, KeyValidity, MISSING_KEY_MARKER};
use crate::table::Table;
use serde::{Deserialize, Serialize};

/// Which of the two compared files a row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    File1,
    File2,
}

impl Source {
    /// Short label, e.g. `file1`
    pub fn label(self) -> &'static str {
        match self {
            Source::File1 => "file1",
            Source::File2 => "file2",
        }
    }

    /// Column suffix used after the join, e.g. `_file1`
    pub fn suffix(self) -> &'static str {
        match self {
            Source::File1 => "_file1",
            Source::File2 => "_file2",
        }
    }

    /// Name of the row-number column for this source
    pub fn row_number_column(self) -> String {
        format!("row_number_{}", self.label())
    }

    /// Suffix a column name with this source's tag
    pub fn tag(self, column: &str) -> String {
        format!("{}{}", column, self.suffix())
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A table whose cells have all been projected to canonical text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedTable {
    /// Which file this table was loaded from
    pub source: Source,
    /// Column names, in file order
    pub columns: Vec<String>,
    /// Rows, in file order
    pub rows: Vec<PreparedRow>,
}

/// A normalized row that keeps its original row number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedRow {
    /// 1-based row number from the loaded table
    pub number: usize,
    /// Normalized value for each column
    pub values: Vec<String>,
}

impl PreparedRow {
    /// Get a value by column index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }
}

impl PreparedTable {
    /// Column index by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Remove rows whose key carries [`MISSING_KEY_MARKER`], returning them.
    ///
    /// Remaining rows keep their order and row numbers.
    pub fn take_empty_key_rows(&mut self, key_index: usize) -> Vec<PreparedRow> {
        let (empty, valid): (Vec<_>, Vec<_>) = std::mem::take(&mut self.rows)
            .into_iter()
            .partition(|row| row.get(key_index) == Some(MISSING_KEY_MARKER));
        self.rows = valid;
        empty
    }
}

/// Normalize every cell of a loaded table.
///
/// `key_column` only affects which empty marker is used; it does not need
/// to exist in the table.
pub fn prepare_table(
    table: &Table,
    source: Source,
    key_column: &str,
    policy: KeyValidity,
) -> PreparedTable {
    let roles: Vec<ColumnRole> = table
        .columns
        .iter()
        .map(|c| {
            if c.name == key_column {
                ColumnRole::Key
            } else {
                ColumnRole::Value
            }
        })
        .collect();

    let rows = table
        .rows
        .iter()
        .map(|row| PreparedRow {
            number: row.number,
            values: row
                .cells
                .iter()
                .zip(&roles)
                .map(|(cell, role)| normalize_cell(cell, policy, *role))
                .collect(),
        })
        .collect();

    PreparedTable {
        source,
        columns: table.columns.iter().map(|c| c.name.clone()).collect(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_csv_str;
    use crate::table::CellValue;
    use std::path::PathBuf;

    #[test]
    fn test_prepare_numbers_rows_and_normalizes() {
        let csv = "id,name,age\n1,  Alice   Smith ,30.0\n,Bob,\n";
        let table = parse_csv_str(csv, "a.csv").unwrap();

        let prepared = prepare_table(&table, Source::File1, "id", KeyValidity::Off);

        assert_eq!(prepared.columns, vec!["id", "name", "age"]);
        assert_eq!(prepared.rows[0].number, 1);
        assert_eq!(prepared.rows[0].values, vec!["1", "Alice Smith", "30"]);
        assert_eq!(prepared.rows[1].number, 2);
        assert_eq!(prepared.rows[1].values, vec!["-", "Bob", "-"]);
    }

    #[test]
    fn test_prepare_marks_missing_keys() {
        let csv = "id,name\n1,a\n,b\n3,\n";
        let table = parse_csv_str(csv, "a.csv").unwrap();

        let mut prepared = prepare_table(&table, Source::File2, "id", KeyValidity::On);
        assert_eq!(prepared.rows[1].values[0], MISSING_KEY_MARKER);
        assert_eq!(prepared.rows[2].values[1], "-");

        let empty = prepared.take_empty_key_rows(0);
        assert_eq!(empty.len(), 1);
        assert_eq!(empty[0].number, 2);
        assert_eq!(prepared.rows.len(), 2);
        assert_eq!(prepared.rows[1].number, 3);
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let csv = "id,name,score\n1, x  y ,2.50\n,,7\n";
        let table = parse_csv_str(csv, "a.csv").unwrap();
        let once = prepare_table(&table, Source::File1, "id", KeyValidity::On);

        let reloaded = Table::from_records(
            PathBuf::from("a.csv"),
            once.columns.clone(),
            once.rows
                .iter()
                .map(|r| r.values.iter().map(|v| CellValue::parse(v)).collect())
                .collect(),
        );
        let twice = prepare_table(&reloaded, Source::File1, "id", KeyValidity::On);

        assert_eq!(once.rows, twice.rows);
    }

    #[test]
    fn test_source_tags() {
        assert_eq!(Source::File1.tag("age"), "age_file1");
        assert_eq!(Source::File2.row_number_column(), "row_number_file2");
    }
}
