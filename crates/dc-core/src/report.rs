//! Mismatch report assembly and statistics

use crate::detector::MismatchMask;
use crate::error::{Error, Result};
use crate::matcher::JoinedTable;
use crate::normalize::EMPTY_MARKER;
use crate::prepare::{PreparedRow, PreparedTable, Source};
use serde::{Deserialize, Serialize};

/// Rows whose compared values differ, with matching cells blanked out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Join column name
    pub key_column: String,
    /// Comparison columns, in selection order
    pub columns: Vec<String>,
    /// Mismatching rows sorted by file1 row number
    pub rows: Vec<ReportRow>,
}

/// A single mismatching matched row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Shared key value
    pub key: String,
    /// Row number in file2
    pub row_number_file2: usize,
    /// File2 values per comparison column, `-` where the column matched
    pub values_file2: Vec<String>,
    /// Row number in file1
    pub row_number_file1: usize,
    /// File1 values per comparison column, `-` where the column matched
    pub values_file1: Vec<String>,
}

impl ReportRow {
    /// Cells in [`Report::header`] order
    pub fn cells(&self) -> Vec<String> {
        let mut cells = Vec::with_capacity(3 + self.values_file1.len() * 2);
        cells.push(self.key.clone());
        cells.push(self.row_number_file2.to_string());
        cells.extend(self.values_file2.iter().cloned());
        cells.push(self.row_number_file1.to_string());
        cells.extend(self.values_file1.iter().cloned());
        cells
    }
}

impl Report {
    /// Output header: key, file2 row number and values, file1 row number and values
    pub fn header(&self) -> Vec<String> {
        let mut header = vec![self.key_column.clone(), Source::File2.row_number_column()];
        header.extend(self.columns.iter().map(|c| Source::File2.tag(c)));
        header.push(Source::File1.row_number_column());
        header.extend(self.columns.iter().map(|c| Source::File1.tag(c)));
        header
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if there are no mismatches
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Per-column mismatch tally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMismatch {
    pub column: String,
    pub count: usize,
}

/// Aggregate figures for a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MismatchStats {
    /// Matched rows with at least one mismatch
    pub mismatch_count: usize,
    /// File1 rows considered (after empty-key rows are set aside)
    pub compared_rows: usize,
    /// Rows produced by the join
    pub matched_rows: usize,
    /// `mismatch_count / compared_rows * 100`, or 0 with nothing to compare
    pub mismatch_percentage: f64,
    /// Mismatching cells per comparison column
    pub columns: Vec<ColumnMismatch>,
}

impl MismatchStats {
    /// Compute statistics from a mask
    pub fn new(mask: &MismatchMask, compared_rows: usize) -> Self {
        let mismatch_count = mask.mismatching_rows().len();

        Self {
            mismatch_count,
            compared_rows,
            matched_rows: mask.rows.len(),
            mismatch_percentage: mismatch_percentage(mismatch_count, compared_rows),
            columns: mask
                .column_counts()
                .into_iter()
                .map(|(column, count)| ColumnMismatch { column, count })
                .collect(),
        }
    }
}

impl std::fmt::Display for MismatchStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.2}% ({} rows mismatched)",
            self.mismatch_percentage, self.mismatch_count
        )
    }
}

/// Percentage of mismatching rows, 0 when there is nothing to compare
pub fn mismatch_percentage(mismatch_count: usize, compared_rows: usize) -> f64 {
    if compared_rows == 0 {
        0.0
    } else {
        mismatch_count as f64 / compared_rows as f64 * 100.0
    }
}

/// Build the mismatch report from joined rows and their mask.
///
/// `compared_rows` is the file1 row count used as the percentage denominator.
pub fn build_report(
    joined: &JoinedTable,
    mask: &MismatchMask,
    compared_rows: usize,
) -> Result<(Report, MismatchStats)> {
    let mut pairs = Vec::with_capacity(mask.columns.len());
    for column in &mask.columns {
        let left = joined.column_index(&Source::File1.tag(column));
        let right = joined.column_index(&Source::File2.tag(column));
        match (left, right) {
            (Some(left), Some(right)) => pairs.push((left, right)),
            _ => {
                return Err(Error::MissingColumn {
                    column: column.clone(),
                    table: "joined table".to_string(),
                })
            }
        }
    }

    let mut rows: Vec<ReportRow> = mask
        .mismatching_rows()
        .into_iter()
        .map(|i| {
            let matched = &joined.rows[i];
            let mut values_file1 = Vec::with_capacity(pairs.len());
            let mut values_file2 = Vec::with_capacity(pairs.len());

            for (c, &(left, right)) in pairs.iter().enumerate() {
                if mask.get(i, c) {
                    values_file1.push(matched.values[left].clone());
                    values_file2.push(matched.values[right].clone());
                } else {
                    values_file1.push(EMPTY_MARKER.to_string());
                    values_file2.push(EMPTY_MARKER.to_string());
                }
            }

            ReportRow {
                key: matched.key().to_string(),
                row_number_file2: matched.row_number_file2,
                values_file2,
                row_number_file1: matched.row_number_file1,
                values_file1,
            }
        })
        .collect();

    // Stable, so rows sharing a file1 row keep file2 order
    rows.sort_by_key(|row| row.row_number_file1);

    let report = Report {
        key_column: joined.key_column.clone(),
        columns: mask.columns.clone(),
        rows,
    };

    Ok((report, MismatchStats::new(mask, compared_rows)))
}

/// Rows set aside because their key cell was empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmptyKeyReport {
    /// Comparison columns, in selection order
    pub columns: Vec<String>,
    /// File1 rows first, then file2 rows, each in file order
    pub rows: Vec<EmptyKeyRow>,
}

/// A row whose key could not be matched on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmptyKeyRow {
    /// File the row came from
    pub source: Source,
    /// Row number within that file
    pub row_number: usize,
    /// Values per comparison column
    pub values: Vec<String>,
}

impl EmptyKeyReport {
    /// Output header: source, row number, then comparison columns
    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["source".to_string(), "row_number".to_string()];
        header.extend(self.columns.iter().cloned());
        header
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Rows from one file only
    pub fn rows_from(&self, source: Source) -> impl Iterator<Item = &EmptyKeyRow> {
        self.rows.iter().filter(move |r| r.source == source)
    }
}

impl EmptyKeyRow {
    /// Cells in [`EmptyKeyReport::header`] order
    pub fn cells(&self) -> Vec<String> {
        let mut cells = vec![self.source.label().to_string(), self.row_number.to_string()];
        cells.extend(self.values.iter().cloned());
        cells
    }
}

/// Collect set-aside rows from both files into one report
pub fn build_empty_key_report(
    columns: &[String],
    file1: (&PreparedTable, Vec<PreparedRow>),
    file2: (&PreparedTable, Vec<PreparedRow>),
) -> EmptyKeyReport {
    let mut rows = Vec::new();

    for (table, removed) in [file1, file2] {
        let indices: Vec<Option<usize>> = columns.iter().map(|c| table.column_index(c)).collect();
        rows.extend(removed.into_iter().map(|row| EmptyKeyRow {
            source: table.source,
            row_number: row.number,
            values: indices
                .iter()
                .map(|idx| {
                    idx.and_then(|i| row.get(i))
                        .unwrap_or(EMPTY_MARKER)
                        .to_string()
                })
                .collect(),
        }));
    }

    EmptyKeyReport {
        columns: columns.to_vec(),
        rows,
    }
}
