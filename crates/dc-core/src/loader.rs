//! Loaders for delimited and spreadsheet files

use crate::error::{Error, Result};
use crate::table::{CellValue, Table};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Options controlling how a file is turned into a [`Table`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Worksheet to read; the first sheet when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    /// Field delimiter for delimited files; inferred from the extension when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<u8>,
}

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Comma separated values
    Csv,
    /// Tab separated values
    Tsv,
    /// Any workbook format calamine can open
    Spreadsheet,
}

impl FileFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" | "txt" => Ok(FileFormat::Csv),
            "tsv" | "tab" => Ok(FileFormat::Tsv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(FileFormat::Spreadsheet),
            _ => Err(Error::UnsupportedFormat {
                extension,
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Load a data file into a Table, dispatching on its extension
pub fn load_table<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Table> {
    let path = path.as_ref();

    let table = match FileFormat::from_path(path)? {
        FileFormat::Csv => parse_delimited(path, options.delimiter.unwrap_or(b','))?,
        FileFormat::Tsv => parse_delimited(path, options.delimiter.unwrap_or(b'\t'))?,
        FileFormat::Spreadsheet => parse_spreadsheet(path, options.sheet.as_deref())?,
    };

    log::debug!(
        "loaded {} ({} columns, {} rows)",
        path.display(),
        table.column_count(),
        table.row_count()
    );

    Ok(table)
}

/// Parse CSV from a string (useful for testing)
pub fn parse_csv_str(content: &str, source_name: &str) -> Result<Table> {
    read_delimited(content.as_bytes(), PathBuf::from(source_name), b',')
}

fn parse_delimited(path: &Path, delimiter: u8) -> Result<Table> {
    let file = File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    read_delimited(BufReader::new(file), path.to_path_buf(), delimiter)
}

fn read_delimited<R: Read>(reader: R, path: PathBuf, delimiter: u8) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true) // Allow varying number of fields
        .from_reader(reader);

    let headers = csv_reader.headers().map_err(|e| Error::Csv {
        path: path.clone(),
        source: e,
    })?;

    let headers: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(Error::CsvParse {
            path,
            message: "no columns found in header row".to_string(),
        });
    }
    let headers = unique_headers(headers);

    let mut records = Vec::new();
    for (row_idx, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| Error::Csv {
            path: path.clone(),
            source: e,
        })?;

        if record.len() > headers.len() {
            log::warn!(
                "row {} in {} has more cells than columns, truncating",
                row_idx + 1,
                path.display()
            );
        }

        records.push(record.iter().map(CellValue::parse).collect());
    }

    Ok(Table::from_records(path, headers, records))
}

fn parse_spreadsheet(path: &Path, sheet: Option<&str>) -> Result<Table> {
    let mut workbook = open_workbook_auto(path).map_err(|e| Error::Spreadsheet {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let sheet_names = workbook.sheet_names().to_owned();
    let sheet_name = match sheet {
        Some(name) if sheet_names.iter().any(|s| s == name) => name.to_string(),
        Some(name) => {
            return Err(Error::SheetNotFound {
                sheet: name.to_string(),
                path: path.to_path_buf(),
            })
        }
        None => sheet_names.first().cloned().ok_or_else(|| Error::Spreadsheet {
            path: path.to_path_buf(),
            message: "workbook has no sheets".to_string(),
        })?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| Error::Spreadsheet {
            path: path.to_path_buf(),
            message: format!("sheet '{}': {}", sheet_name, e),
        })?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(header_text).collect(),
        None => Vec::new(),
    };

    if headers.iter().all(|h| h.is_empty()) {
        return Err(Error::Spreadsheet {
            path: path.to_path_buf(),
            message: format!("sheet '{}' has no header row", sheet_name),
        });
    }

    let records = rows
        .map(|row| row.iter().map(spreadsheet_cell).collect())
        .collect();

    Ok(Table::from_records(
        path.to_path_buf(),
        unique_headers(headers),
        records,
    ))
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{:.0}", f),
        other => other.to_string(),
    }
}

fn spreadsheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Missing,
        Data::String(s) => CellValue::text(s.as_str()),
        Data::Float(f) => CellValue::Numeric(*f),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Bool(b) => CellValue::Text(if *b { "True" } else { "False" }.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => CellValue::Text(format_datetime(value)),
            None => CellValue::Numeric(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::text(s.as_str()),
    }
}

/// Render a spreadsheet date the way a timestamp prints, e.g. `2024-01-31 00:00:00`
fn format_datetime(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Fill unnamed headers and suffix duplicates (`name`, `name.1`, `name.2`)
fn unique_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();

    headers
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let base = if name.is_empty() {
                format!("Unnamed: {}", i)
            } else {
                name
            };

            let mut candidate = base.clone();
            let mut n = 1;
            while seen.contains(&candidate) {
                candidate = format!("{}.{}", base, n);
                n += 1;
            }
            seen.insert(candidate.clone());
            candidate
        })
        .collect()
}
