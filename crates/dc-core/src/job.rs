//! Comparison job files (JSON)
//!
//! A job file captures everything needed to rerun a comparison: the two
//! input files, how to read them, which columns to use, and where to write
//! the result.

use crate::error::{Error, Result};
use crate::export::{export_comparison, ExportFormat};
use crate::loader::{load_table, LoadOptions};
use crate::normalize::KeyValidity;
use crate::pipeline::{compare, CompareOptions, Comparison};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One input file and how to read it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFile {
    /// Path to a CSV, TSV or spreadsheet file
    pub path: PathBuf,
    #[serde(flatten)]
    pub options: LoadOptions,
}

impl InputFile {
    /// Create an input with default load options
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: LoadOptions::default(),
        }
    }
}

/// Where to write the comparison result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTarget {
    pub path: PathBuf,
    #[serde(default)]
    pub format: ExportFormat,
}

/// A saved comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareJob {
    /// Reference data
    pub file1: InputFile,
    /// Data being checked
    pub file2: InputFile,
    #[serde(flatten)]
    pub compare: CompareOptions,
    /// Optional export target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputTarget>,
}

/// Result of running a job
#[derive(Debug, Clone)]
pub struct JobResult {
    pub comparison: Comparison,
    /// Files written by the export step, if any
    pub files_written: Vec<PathBuf>,
}

impl CompareJob {
    /// A job with placeholder values, for writing a template
    pub fn template(key_column: &str, columns: Vec<String>) -> Self {
        Self {
            file1: InputFile::new("file1.csv"),
            file2: InputFile::new("file2.xlsx"),
            compare: CompareOptions::new(key_column, columns).with_key_validity(KeyValidity::Off),
            output: Some(OutputTarget {
                path: PathBuf::from("mismatches.csv"),
                format: ExportFormat::Csv,
            }),
        }
    }

    /// Load a job file from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the job file to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), content).map_err(|e| Error::FileWrite {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Load both inputs, compare them, and export if an output is set
    pub fn run(&self) -> Result<JobResult> {
        let table1 = load_table(&self.file1.path, &self.file1.options)?;
        let table2 = load_table(&self.file2.path, &self.file2.options)?;

        let comparison = compare(&table1, &table2, &self.compare)?;

        let files_written = match &self.output {
            Some(target) => export_comparison(&comparison, &target.path, target.format)?,
            None => Vec::new(),
        };

        Ok(JobResult {
            comparison,
            files_written,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_json_layout() {
        let json = r#"{
            "file1": { "path": "a.csv" },
            "file2": { "path": "b.xlsx", "sheet": "Data" },
            "key_column": "id",
            "columns": ["name"],
            "key_validity": "on",
            "output": { "path": "out.json", "format": "json" }
        }"#;

        let job: CompareJob = serde_json::from_str(json).unwrap();

        assert_eq!(job.file1.path, PathBuf::from("a.csv"));
        assert_eq!(job.file2.options.sheet.as_deref(), Some("Data"));
        assert_eq!(job.compare.key_column, "id");
        assert_eq!(job.compare.key_validity, KeyValidity::On);
        assert_eq!(job.output.unwrap().format, ExportFormat::Json);
    }

    #[test]
    fn test_job_defaults() {
        let json = r#"{
            "file1": { "path": "a.csv" },
            "file2": { "path": "b.csv" },
            "key_column": "id",
            "columns": ["name"]
        }"#;

        let job: CompareJob = serde_json::from_str(json).unwrap();

        assert_eq!(job.compare.key_validity, KeyValidity::Off);
        assert!(job.output.is_none());
    }

    #[test]
    fn test_job_save_load_and_run() {
        let dir = tempfile::tempdir().unwrap();
        let file1 = dir.path().join("a.csv");
        let file2 = dir.path().join("b.csv");
        fs::write(&file1, "id,name\n1,Ann\n2,Bob\n").unwrap();
        fs::write(&file2, "id,name\n2,Rob\n1,Ann\n").unwrap();

        let mut job = CompareJob::template("id", vec!["name".to_string()]);
        job.file1 = InputFile::new(&file1);
        job.file2 = InputFile::new(&file2);
        job.output = Some(OutputTarget {
            path: dir.path().join("out.csv"),
            format: ExportFormat::Csv,
        });

        let job_path = dir.path().join("job.json");
        job.save(&job_path).unwrap();
        let loaded = CompareJob::load(&job_path).unwrap();
        assert_eq!(loaded, job);

        let result = loaded.run().unwrap();
        assert_eq!(result.comparison.stats.mismatch_count, 1);
        assert_eq!(result.comparison.stats.mismatch_percentage, 50.0);
        assert_eq!(result.files_written, vec![dir.path().join("out.csv")]);
    }
}
