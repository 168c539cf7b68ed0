//! Core table types for representing loaded data files

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tokens that a delimited file uses to spell "no value"
const NULL_TOKENS: &[&str] = &["NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A"];

/// A table loaded from a single data file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Column definitions
    pub columns: Vec<Column>,
    /// Row data, in file order
    pub rows: Vec<Row>,
    /// Source file path
    pub source_path: PathBuf,
}

impl Table {
    /// Build a table from header names and raw cell rows.
    ///
    /// Rows are numbered from 1 in the order given. Short rows are padded
    /// with [`CellValue::Missing`]; long rows are truncated.
    pub fn from_records(
        source_path: PathBuf,
        headers: Vec<String>,
        records: Vec<Vec<CellValue>>,
    ) -> Self {
        let columns: Vec<Column> = headers
            .into_iter()
            .enumerate()
            .map(|(i, name)| Column::new(name, i))
            .collect();

        let width = columns.len();
        let rows = records
            .into_iter()
            .enumerate()
            .map(|(i, mut cells)| {
                cells.resize(width, CellValue::Missing);
                Row::new(i + 1, cells)
            })
            .collect();

        Self {
            columns,
            rows,
            source_path,
        }
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check whether a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.find_column(name).is_some()
    }

    /// Column names in file order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Display label used in error messages
    pub fn label(&self) -> String {
        format!("'{}'", self.source_path.display())
    }
}

/// A column definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name as it appears in the header
    pub name: String,
    /// Column index (0-based)
    pub index: usize,
}

impl Column {
    /// Create a new column
    pub fn new(name: String, index: usize) -> Self {
        Self { name, index }
    }
}

/// A row of data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    /// 1-based position in the source file, assigned once at load time
    pub number: usize,
    /// Cell values for each column
    pub cells: Vec<CellValue>,
}

impl Row {
    /// Create a new row
    pub fn new(number: usize, cells: Vec<CellValue>) -> Self {
        Self { number, cells }
    }
}

/// A raw cell value as read from a file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// Absent or null at load time
    Missing,
    /// Present but empty after trimming
    Blank,
    /// Integer value, kept exact
    Integer(i64),
    /// Numeric value
    Numeric(f64),
    /// Text value, untrimmed
    Text(String),
}

impl CellValue {
    /// Parse a field from a delimited file, detecting the type
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return CellValue::Blank;
        }

        if NULL_TOKENS.contains(&trimmed) {
            return CellValue::Missing;
        }

        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Integer(i);
        }

        // Integers past i64 keep their digits rather than rounding through f64
        if is_integer_literal(trimmed) {
            return CellValue::Text(trimmed.to_string());
        }

        if looks_numeric(trimmed) {
            if let Ok(f) = trimmed.parse::<f64>() {
                return CellValue::Numeric(f);
            }
        }

        CellValue::Text(s.to_string())
    }

    /// Build a text cell, mapping whitespace-only text to [`CellValue::Blank`]
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            CellValue::Blank
        } else {
            CellValue::Text(s)
        }
    }

    /// Check if the cell is missing or blank
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Missing | CellValue::Blank)
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Missing | CellValue::Blank => write!(f, ""),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Numeric(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Optional sign followed by digits only
fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Decimal literal check: `[+-]? (digits [. digits?] | . digits) ([eE] [+-]? digits)?`
///
/// `str::parse::<f64>` also accepts `inf` and `NaN`, which must stay text.
fn looks_numeric(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }

    if digits == 0 {
        return false;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+') | Some(b'-')) {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_parse_numeric() {
        assert_eq!(CellValue::parse("42"), CellValue::Integer(42));
        assert_eq!(CellValue::parse("-123"), CellValue::Integer(-123));
        assert_eq!(CellValue::parse("2.75"), CellValue::Numeric(2.75));
        assert_eq!(CellValue::parse(" 30.0 "), CellValue::Numeric(30.0));
        assert_eq!(CellValue::parse(".5"), CellValue::Numeric(0.5));
        assert_eq!(CellValue::parse("1e3"), CellValue::Numeric(1000.0));
    }

    #[test]
    fn test_cell_value_parse_long_integers() {
        assert_eq!(
            CellValue::parse("12345678901234567"),
            CellValue::Integer(12345678901234567)
        );
        assert_eq!(
            CellValue::parse("1234567890123456789"),
            CellValue::Integer(1234567890123456789)
        );
        assert_eq!(
            CellValue::parse(" 92233720368547758070 "),
            CellValue::Text("92233720368547758070".to_string())
        );
    }

    #[test]
    fn test_cell_value_parse_text() {
        assert_eq!(
            CellValue::parse("hello "),
            CellValue::Text("hello ".to_string())
        );
        assert_eq!(
            CellValue::parse("0xABCD"),
            CellValue::Text("0xABCD".to_string())
        );
        assert_eq!(CellValue::parse("inf"), CellValue::Text("inf".to_string()));
        assert_eq!(CellValue::parse("1.2.3"), CellValue::Text("1.2.3".to_string()));
        assert_eq!(CellValue::parse("1e"), CellValue::Text("1e".to_string()));
    }

    #[test]
    fn test_cell_value_parse_blank_and_missing() {
        assert_eq!(CellValue::parse(""), CellValue::Blank);
        assert_eq!(CellValue::parse("   "), CellValue::Blank);
        assert_eq!(CellValue::parse("NaN"), CellValue::Missing);
        assert_eq!(CellValue::parse("#N/A"), CellValue::Missing);
    }

    #[test]
    fn test_cell_value_is_empty() {
        assert!(CellValue::Missing.is_empty());
        assert!(CellValue::Blank.is_empty());
        assert!(!CellValue::Numeric(0.0).is_empty());
        assert!(!CellValue::Integer(0).is_empty());
        assert!(CellValue::text("  ").is_empty());
    }

    #[test]
    fn test_from_records_numbers_and_pads_rows() {
        let table = Table::from_records(
            PathBuf::from("t.csv"),
            vec!["id".to_string(), "name".to_string()],
            vec![
                vec![CellValue::Integer(1)],
                vec![CellValue::Integer(2), CellValue::text("b")],
            ],
        );

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0].number, 1);
        assert_eq!(table.rows[1].number, 2);
        assert_eq!(table.rows[0].cells[1], CellValue::Missing);
        assert!(table.has_column("name"));
        assert_eq!(table.find_column("name").map(|c| c.index), Some(1));
    }
}
