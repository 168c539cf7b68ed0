//! Cell value canonicalization
//!
//! Every cell is projected to text before matching, so the join and the
//! mismatch predicate only ever compare strings.

use crate::table::CellValue;
use serde::{Deserialize, Serialize};

/// Marker for empty or missing values
pub const EMPTY_MARKER: &str = "-";

/// Marker for an empty key cell when key-validity filtering is on
pub const MISSING_KEY_MARKER: &str = "<missing key>";

/// Whether rows with an empty key are segregated from the comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyValidity {
    /// Empty keys normalize to the dash marker and take part in the join
    #[default]
    Off,
    /// Empty keys normalize to [`MISSING_KEY_MARKER`] and are reported separately
    On,
}

/// Role of the column a cell belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Key,
    Value,
}

/// Canonical empty marker for a column under the given policy
pub fn empty_marker(policy: KeyValidity, role: ColumnRole) -> &'static str {
    match (policy, role) {
        (KeyValidity::On, ColumnRole::Key) => MISSING_KEY_MARKER,
        _ => EMPTY_MARKER,
    }
}

/// Trim and collapse every internal whitespace run to a single space
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render a number, dropping the fractional part of integral values
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

/// Normalize a single cell to its canonical text form
pub fn normalize_cell(value: &CellValue, policy: KeyValidity, role: ColumnRole) -> String {
    let text = match value {
        CellValue::Missing | CellValue::Blank => String::new(),
        CellValue::Integer(i) => i.to_string(),
        CellValue::Numeric(n) => format_number(*n),
        CellValue::Text(s) => collapse_whitespace(s),
    };

    if text.is_empty() {
        empty_marker(policy, role).to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a   b \t c  "), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
        assert_eq!(collapse_whitespace("abc"), "abc");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(3.5), "3.5");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(1e20), "100000000000000000000");
    }

    #[test]
    fn test_normalize_empty_values() {
        for value in [CellValue::Missing, CellValue::Blank, CellValue::Text("  ".into())] {
            assert_eq!(normalize_cell(&value, KeyValidity::Off, ColumnRole::Key), "-");
            assert_eq!(normalize_cell(&value, KeyValidity::On, ColumnRole::Value), "-");
            assert_eq!(
                normalize_cell(&value, KeyValidity::On, ColumnRole::Key),
                MISSING_KEY_MARKER
            );
        }
    }

    #[test]
    fn test_normalize_text_and_numbers() {
        let text = CellValue::Text(" alice   smith ".to_string());
        assert_eq!(
            normalize_cell(&text, KeyValidity::Off, ColumnRole::Value),
            "alice smith"
        );
        assert_eq!(
            normalize_cell(&CellValue::Numeric(30.0), KeyValidity::Off, ColumnRole::Value),
            "30"
        );
        assert_eq!(
            normalize_cell(&CellValue::Numeric(2.25), KeyValidity::Off, ColumnRole::Value),
            "2.25"
        );
        assert_eq!(
            normalize_cell(
                &CellValue::Integer(9007199254740993),
                KeyValidity::Off,
                ColumnRole::Key
            ),
            "9007199254740993"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let values = [
            CellValue::Text(" a  b ".to_string()),
            CellValue::Numeric(7.0),
            CellValue::Missing,
        ];

        for value in values {
            let once = normalize_cell(&value, KeyValidity::On, ColumnRole::Key);
            let twice = normalize_cell(&CellValue::Text(once.clone()), KeyValidity::On, ColumnRole::Key);
            assert_eq!(once, twice);
        }
    }
}
