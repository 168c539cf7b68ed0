//! Error types for dc-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in dc-core
///
/// Loading errors carry the offending path. Schema errors are raised by the
/// comparison gates before any matching happens, so a caller never sees a
/// partial report.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or write an output file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse CSV
    #[error("failed to parse CSV '{path}': {message}")]
    CsvParse { path: PathBuf, message: String },

    /// CSV parsing error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Failed to write CSV output
    #[error("failed to write CSV: {0}")]
    CsvWrite(#[from] csv::Error),

    /// Workbook could not be opened or a worksheet could not be read
    #[error("failed to read spreadsheet '{path}': {message}")]
    Spreadsheet { path: PathBuf, message: String },

    /// Requested worksheet does not exist
    #[error("sheet '{sheet}' not found in '{path}'")]
    SheetNotFound { sheet: String, path: PathBuf },

    /// File extension is not one we know how to load
    #[error("unsupported file format '{extension}' for '{path}' (expected csv, tsv, xlsx, xlsm, xls or ods)")]
    UnsupportedFormat { extension: String, path: PathBuf },

    /// A selected column is absent from one of the tables
    #[error("column '{column}' not found in {table}")]
    MissingColumn { column: String, table: String },

    /// No key column was chosen
    #[error("no key column selected")]
    EmptyKeyColumn,

    /// No comparison columns were chosen
    #[error("no columns selected for comparison")]
    NoComparisonColumns,

    /// The key column was also listed as a comparison column
    #[error("key column '{0}' cannot also be a comparison column")]
    KeyInComparison(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for errors produced by the column-selection gates
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Error::MissingColumn { .. }
                | Error::EmptyKeyColumn
                | Error::NoComparisonColumns
                | Error::KeyInComparison(_)
        )
    }
}
