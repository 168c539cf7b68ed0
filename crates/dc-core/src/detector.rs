//! Mismatch detection over joined rows

use crate::error::{Error, Result};
use crate::matcher::JoinedTable;
use crate::normalize::{collapse_whitespace, format_number, EMPTY_MARKER};
use crate::prepare::Source;
use serde::{Deserialize, Serialize};

/// Decimal places kept when comparing numeric values
pub const NUMERIC_PRECISION: usize = 8;

/// Decide whether two normalized values differ, using the dash empty marker
pub fn is_mismatch(a: &str, b: &str) -> bool {
    is_mismatch_with(a, b, EMPTY_MARKER)
}

/// Decide whether two normalized values differ.
///
/// Each side is whitespace-collapsed (empty becomes `empty_marker`), then
/// any side that parses as a float other than NaN is replaced by its value
/// rounded to [`NUMERIC_PRECISION`] decimals. Infinities compare equal to
/// each other however they are spelled. The resulting texts are compared exactly,
/// so text comparison stays case-sensitive.
pub fn is_mismatch_with(a: &str, b: &str, empty_marker: &str) -> bool {
    comparable(a, empty_marker) != comparable(b, empty_marker)
}

fn comparable(value: &str, empty_marker: &str) -> String {
    let cleaned = collapse_whitespace(value);
    if cleaned.is_empty() {
        return empty_marker.to_string();
    }

    match cleaned.parse::<f64>() {
        Ok(n) if !n.is_nan() => format_number(round_to_precision(n)),
        _ => cleaned,
    }
}

fn round_to_precision(n: f64) -> f64 {
    // Decimal formatting rounds the exact binary value, matching round-half-even
    // on what is actually stored.
    format!("{:.*}", NUMERIC_PRECISION, n).parse().unwrap_or(n)
}

/// Boolean matrix of matched row by comparison column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MismatchMask {
    /// Comparison column names, in selection order
    pub columns: Vec<String>,
    /// One entry per matched row, each with one flag per column
    pub rows: Vec<Vec<bool>>,
}

impl MismatchMask {
    /// Flag for a row and comparison column index
    pub fn get(&self, row: usize, column: usize) -> bool {
        self.rows
            .get(row)
            .and_then(|flags| flags.get(column))
            .copied()
            .unwrap_or(false)
    }

    /// True if any comparison column differs on this row
    pub fn row_has_mismatch(&self, row: usize) -> bool {
        self.rows.get(row).is_some_and(|flags| flags.iter().any(|&f| f))
    }

    /// Indices of rows with at least one mismatch
    pub fn mismatching_rows(&self) -> Vec<usize> {
        (0..self.rows.len())
            .filter(|&i| self.row_has_mismatch(i))
            .collect()
    }

    /// Number of mismatching cells per comparison column
    pub fn column_counts(&self) -> Vec<(String, usize)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(c, name)| {
                let count = self.rows.iter().filter(|flags| flags[c]).count();
                (name.clone(), count)
            })
            .collect()
    }
}

/// Evaluate the mismatch predicate for every matched row and comparison column
pub fn detect_mismatches(joined: &JoinedTable, columns: &[String]) -> Result<MismatchMask> {
    let pairs = columns
        .iter()
        .map(|column| {
            let left = tagged_index(joined, column, Source::File1)?;
            let right = tagged_index(joined, column, Source::File2)?;
            Ok((left, right))
        })
        .collect::<Result<Vec<_>>>()?;

    let rows = joined
        .rows
        .iter()
        .map(|row| {
            pairs
                .iter()
                .map(|&(left, right)| is_mismatch(&row.values[left], &row.values[right]))
                .collect()
        })
        .collect();

    Ok(MismatchMask {
        columns: columns.to_vec(),
        rows,
    })
}

fn tagged_index(joined: &JoinedTable, column: &str, source: Source) -> Result<usize> {
    joined
        .column_index(&source.tag(column))
        .ok_or_else(|| Error::MissingColumn {
            column: column.to_string(),
            table: source.label().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_csv_str;
    use crate::matcher::join_on_key;
    use crate::normalize::{KeyValidity, MISSING_KEY_MARKER};
    use crate::prepare::prepare_table;

    #[test]
    fn test_numeric_equivalence() {
        assert!(!is_mismatch("3", "3.0"));
        assert!(!is_mismatch("3", "3.00000000"));
        assert!(!is_mismatch("1.000000001", "1.000000002"));
        assert!(is_mismatch("1.00000001", "1.00000002"));
        assert!(!is_mismatch("1e3", "1000"));
        assert!(is_mismatch("3", "4"));
    }

    #[test]
    fn test_text_fallback() {
        assert!(!is_mismatch("abc", "abc "));
        assert!(is_mismatch("abc", "abd"));
        assert!(is_mismatch("Alice", "alice"));
        assert!(is_mismatch("3", "three"));
        assert!(is_mismatch("1.2.3", "1.2"));
        assert!(!is_mismatch("1.2.3", " 1.2.3"));
    }

    #[test]
    fn test_whitespace_collapse() {
        assert!(!is_mismatch("a   b", "a b"));
        assert!(!is_mismatch("\ta\nb ", "a b"));
    }

    #[test]
    fn test_empty_values_use_marker() {
        assert!(!is_mismatch("", "-"));
        assert!(!is_mismatch("   ", "-"));
        assert!(is_mismatch("", "0"));
        assert!(!is_mismatch_with("", MISSING_KEY_MARKER, MISSING_KEY_MARKER));
    }

    #[test]
    fn test_infinities_compare_numerically() {
        assert!(!is_mismatch("inf", "Infinity"));
        assert!(!is_mismatch("1e400", "inf"));
        assert!(!is_mismatch("-inf", "-1e400"));
        assert!(is_mismatch("inf", "-inf"));
        assert!(is_mismatch("inf", "1e300"));
    }

    #[test]
    fn test_nan_compares_as_text() {
        assert!(!is_mismatch("nan", "nan"));
        assert!(is_mismatch("nan", "NaN"));
    }

    #[test]
    fn test_detect_mismatches_mask() {
        let left = parse_csv_str("id,name,age\n1,Alice,30\n2,Bob,40\n", "a.csv").unwrap();
        let right = parse_csv_str("id,name,age\n1,Alice,31\n2,Bob,40.0\n", "b.csv").unwrap();
        let left = prepare_table(&left, Source::File1, "id", KeyValidity::Off);
        let right = prepare_table(&right, Source::File2, "id", KeyValidity::Off);
        let joined = join_on_key(&left, &right, "id").unwrap();

        let columns = vec!["name".to_string(), "age".to_string()];
        let mask = detect_mismatches(&joined, &columns).unwrap();

        assert_eq!(mask.rows, vec![vec![false, true], vec![false, false]]);
        assert!(mask.row_has_mismatch(0));
        assert!(!mask.row_has_mismatch(1));
        assert_eq!(mask.mismatching_rows(), vec![0]);
        assert_eq!(
            mask.column_counts(),
            vec![("name".to_string(), 0), ("age".to_string(), 1)]
        );
    }

    #[test]
    fn test_detect_unknown_column() {
        let left = parse_csv_str("id,name\n1,a\n", "a.csv").unwrap();
        let right = parse_csv_str("id,other\n1,a\n", "b.csv").unwrap();
        let left = prepare_table(&left, Source::File1, "id", KeyValidity::Off);
        let right = prepare_table(&right, Source::File2, "id", KeyValidity::Off);
        let joined = join_on_key(&left, &right, "id").unwrap();

        let err = detect_mismatches(&joined, &["name".to_string()]).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { .. }));
    }
}
