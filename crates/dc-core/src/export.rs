//! Writing comparison results to CSV or JSON

use crate::error::{Error, Result};
use crate::pipeline::Comparison;
use crate::report::{EmptyKeyReport, Report};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output format for an exported comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!(
                "unknown format '{}', supported formats: csv, json",
                other
            )),
        }
    }
}

/// Write the mismatch report as CSV
pub fn write_report_csv<W: Write>(report: &Report, writer: W) -> Result<()> {
    write_csv(
        writer,
        report.header(),
        report.rows.iter().map(|row| row.cells()),
    )
}

/// Write the empty-key rows as CSV
pub fn write_empty_keys_csv<W: Write>(empty_keys: &EmptyKeyReport, writer: W) -> Result<()> {
    write_csv(
        writer,
        empty_keys.header(),
        empty_keys.rows.iter().map(|row| row.cells()),
    )
}

fn write_csv<W, I>(writer: W, header: Vec<String>, rows: I) -> Result<()>
where
    W: Write,
    I: Iterator<Item = Vec<String>>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&header)?;
    for row in rows {
        csv_writer.write_record(&row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Export a comparison to `path`, returning every file written.
///
/// JSON output holds the whole comparison. CSV output holds the report;
/// empty-key rows, if any, go to a sibling `<stem>_empty_keys.csv`.
pub fn export_comparison(
    comparison: &Comparison,
    path: &Path,
    format: ExportFormat,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    match format {
        ExportFormat::Json => {
            let mut writer = BufWriter::new(create(path)?);
            serde_json::to_writer_pretty(&mut writer, comparison)?;
            writeln!(writer)?;
            writer.flush()?;
            written.push(path.to_path_buf());
        }
        ExportFormat::Csv => {
            write_report_csv(&comparison.report, BufWriter::new(create(path)?))?;
            written.push(path.to_path_buf());

            if let Some(empty_keys) = comparison.empty_keys.as_ref().filter(|e| e.row_count() > 0) {
                let sibling = empty_keys_path(path);
                write_empty_keys_csv(empty_keys, BufWriter::new(create(&sibling)?))?;
                written.push(sibling);
            }
        }
    }

    log::debug!("exported comparison to {:?}", written);
    Ok(written)
}

fn create(path: &Path) -> Result<File> {
    File::create(path).map_err(|e| Error::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// `out/report.csv` -> `out/report_empty_keys.csv`
fn empty_keys_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("report");
    path.with_file_name(format!("{}_empty_keys.csv", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_csv_str;
    use crate::normalize::KeyValidity;
    use crate::pipeline::{compare, CompareOptions};

    fn comparison(key_validity: KeyValidity) -> Comparison {
        let file1 = parse_csv_str("id,name,city\n1,Ann,\"Paris, FR\"\n,Zed,Rome\n", "a.csv").unwrap();
        let file2 = parse_csv_str("id,name,city\n1,Ann,Lyon\n", "b.csv").unwrap();
        let options = CompareOptions::new("id", vec!["name".to_string(), "city".to_string()])
            .with_key_validity(key_validity);
        compare(&file1, &file2, &options).unwrap()
    }

    #[test]
    fn test_write_report_csv_quotes_fields() {
        let mut out = Vec::new();
        write_report_csv(&comparison(KeyValidity::Off).report, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "id,row_number_file2,name_file2,city_file2,row_number_file1,name_file1,city_file1\n\
             1,1,-,Lyon,1,-,\"Paris, FR\"\n"
        );
    }

    #[test]
    fn test_export_csv_with_empty_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");

        let written = export_comparison(&comparison(KeyValidity::On), &path, ExportFormat::Csv).unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(written[1], dir.path().join("report_empty_keys.csv"));
        let empty = std::fs::read_to_string(&written[1]).unwrap();
        assert_eq!(empty, "source,row_number,name,city\nfile1,2,Zed,Rome\n");
    }

    #[test]
    fn test_export_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        export_comparison(&comparison(KeyValidity::Off), &path, ExportFormat::Json).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Comparison = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.stats.mismatch_count, 1);
        assert!(parsed.empty_keys.is_none());
    }

    #[test]
    fn test_export_to_missing_directory_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("report.csv");

        let err = export_comparison(&comparison(KeyValidity::Off), &path, ExportFormat::Csv)
            .unwrap_err();

        assert!(matches!(err, Error::FileWrite { .. }));
        assert!(err.to_string().starts_with("failed to write file"));
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
