//! dc-core: Core library for checking one data file against another
//!
//! This library provides functionality to:
//! - Load CSV/TSV and spreadsheet files into tables of named columns
//! - Normalize cell values so equivalent spellings compare equal
//! - Inner-join two tables on a key column
//! - Flag per-column mismatches and build a report with a mismatch rate
//! - Save comparisons as job files and export results to CSV or JSON

pub mod detector;
pub mod error;
pub mod export;
pub mod job;
pub mod loader;
pub mod matcher;
pub mod normalize;
pub mod pipeline;
pub mod prepare;
pub mod report;
pub mod table;

pub use detector::{detect_mismatches, is_mismatch, MismatchMask};
pub use error::{Error, Result};
pub use export::{export_comparison, ExportFormat};
pub use job::{CompareJob, InputFile, JobResult, OutputTarget};
pub use loader::{load_table, parse_csv_str, LoadOptions};
pub use matcher::{join_on_key, JoinedTable, MatchedRow};
pub use normalize::{KeyValidity, EMPTY_MARKER, MISSING_KEY_MARKER};
pub use pipeline::{compare, validate_selection, CompareOptions, Comparison};
pub use prepare::{prepare_table, PreparedTable, Source};
pub use report::{EmptyKeyReport, EmptyKeyRow, MismatchStats, Report, ReportRow};
pub use table::{CellValue, Column, Row, Table};
