//! End-to-end comparison of two loaded tables
//!
//! The pipeline runs in a fixed order: validate the selection, normalize
//! both tables, set aside empty-key rows (when enabled), join on the key,
//! build the mismatch mask, and assemble the report. A failed validation
//! returns an error before any matching, so no partial report exists.

use crate::detector::detect_mismatches;
use crate::error::{Error, Result};
use crate::matcher::join_on_key;
use crate::normalize::KeyValidity;
use crate::prepare::{prepare_table, PreparedRow, PreparedTable, Source};
use crate::report::{build_empty_key_report, build_report, EmptyKeyReport, MismatchStats, Report};
use crate::table::Table;
use serde::{Deserialize, Serialize};

/// What to compare and how
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareOptions {
    /// Column both tables are matched on
    pub key_column: String,
    /// Columns whose values are compared
    pub columns: Vec<String>,
    /// Whether empty-key rows are reported separately
    #[serde(default)]
    pub key_validity: KeyValidity,
}

impl CompareOptions {
    /// Create options with key-validity filtering off
    pub fn new(key_column: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            key_column: key_column.into(),
            columns,
            key_validity: KeyValidity::Off,
        }
    }

    /// Set the key-validity policy
    pub fn with_key_validity(mut self, key_validity: KeyValidity) -> Self {
        self.key_validity = key_validity;
        self
    }
}

/// Everything a comparison produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub report: Report,
    pub stats: MismatchStats,
    /// Present only when key-validity filtering is on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_keys: Option<EmptyKeyReport>,
}

/// Check that the key and comparison columns can be used with both tables
pub fn validate_selection(file1: &Table, file2: &Table, options: &CompareOptions) -> Result<()> {
    if options.key_column.is_empty() {
        return Err(Error::EmptyKeyColumn);
    }
    if options.columns.is_empty() {
        return Err(Error::NoComparisonColumns);
    }
    if options.columns.contains(&options.key_column) {
        return Err(Error::KeyInComparison(options.key_column.clone()));
    }

    for table in [file1, file2] {
        for column in std::iter::once(&options.key_column).chain(&options.columns) {
            if !table.has_column(column) {
                return Err(Error::MissingColumn {
                    column: column.clone(),
                    table: table.label(),
                });
            }
        }
    }

    Ok(())
}

/// Compare two tables and report rows whose selected values differ
pub fn compare(file1: &Table, file2: &Table, options: &CompareOptions) -> Result<Comparison> {
    validate_selection(file1, file2, options)?;

    let key = options.key_column.as_str();
    let mut prepared1 = prepare_table(file1, Source::File1, key, options.key_validity);
    let mut prepared2 = prepare_table(file2, Source::File2, key, options.key_validity);

    let empty_keys = match options.key_validity {
        KeyValidity::Off => None,
        KeyValidity::On => {
            let removed1 = take_empty_keys(&mut prepared1, key)?;
            let removed2 = take_empty_keys(&mut prepared2, key)?;
            let report = build_empty_key_report(
                &options.columns,
                (&prepared1, removed1),
                (&prepared2, removed2),
            );
            log::debug!("set aside {} rows with an empty key", report.row_count());
            Some(report)
        }
    };

    let joined = join_on_key(&prepared1, &prepared2, key)?;
    let mask = detect_mismatches(&joined, &options.columns)?;
    let (report, stats) = build_report(&joined, &mask, prepared1.row_count())?;

    log::info!(
        "compared {} rows on '{}': {} matched, {}",
        stats.compared_rows,
        key,
        stats.matched_rows,
        stats
    );

    Ok(Comparison {
        report,
        stats,
        empty_keys,
    })
}

fn take_empty_keys(table: &mut PreparedTable, key: &str) -> Result<Vec<PreparedRow>> {
    let index = table.column_index(key).ok_or_else(|| Error::MissingColumn {
        column: key.to_string(),
        table: table.source.label().to_string(),
    })?;
    Ok(table.take_empty_key_rows(index))
}
