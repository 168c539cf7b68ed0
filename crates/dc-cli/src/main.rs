//! Data Checker CLI
//!
//! Command-line tool for comparing a data file against a reference file by key column.

use clap::{Parser, Subcommand};
use dc_core::{
    load_table, CompareJob, CompareOptions, Comparison, ExportFormat, InputFile, KeyValidity,
    LoadOptions, OutputTarget, Source,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dc-cli")]
#[command(about = "Data Checker: report mismatched values between two data files", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the columns of a data file
    Columns {
        /// Path to a CSV, TSV or spreadsheet file
        #[arg(short, long)]
        file: PathBuf,

        /// Worksheet to read (defaults to the first sheet)
        #[arg(short, long)]
        sheet: Option<String>,
    },

    /// Compare two data files on a key column
    Compare {
        /// Reference data file
        #[arg(long)]
        file1: PathBuf,

        /// Data file to check
        #[arg(long)]
        file2: PathBuf,

        /// Worksheet to read from file1
        #[arg(long)]
        sheet1: Option<String>,

        /// Worksheet to read from file2
        #[arg(long)]
        sheet2: Option<String>,

        /// Column used to match rows
        #[arg(short, long)]
        key: String,

        /// Columns to compare (comma-separated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        columns: Vec<String>,

        /// Report rows with an empty key separately instead of matching them
        #[arg(long)]
        filter_empty_keys: bool,

        /// Maximum number of rows to display
        #[arg(short, long)]
        limit: Option<usize>,

        /// Write the result to a file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (csv or json)
        #[arg(long, default_value = "csv")]
        format: ExportFormat,
    },

    /// Run a comparison job file (JSON)
    Run {
        /// Path to job file
        #[arg(short, long)]
        job: PathBuf,

        /// Maximum number of rows to display
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Create a comparison job template
    CreateJob {
        /// Output path for the job file
        #[arg(short, long)]
        output: PathBuf,

        /// Key column to put in the template
        #[arg(short, long, default_value = "id")]
        key: String,

        /// Comparison columns to put in the template (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        columns: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    // RUST_LOG, when set, overrides the level chosen here
    env_logger::Builder::new()
        .filter_level(log_level(cli.verbose))
        .parse_default_env()
        .init();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        if e.is_schema_error() {
            eprintln!("Check the key and comparison columns against `dc-cli columns --file <FILE>`.");
        }
        std::process::exit(1);
    }
}

fn log_level(verbose: bool) -> log::LevelFilter {
    if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    }
}

fn run(command: Commands) -> dc_core::Result<()> {
    match command {
        Commands::Columns { file, sheet } => cmd_columns(&file, sheet),
        Commands::Compare {
            file1,
            file2,
            sheet1,
            sheet2,
            key,
            columns,
            filter_empty_keys,
            limit,
            output,
            format,
        } => {
            let key_validity = if filter_empty_keys {
                KeyValidity::On
            } else {
                KeyValidity::Off
            };
            let job = CompareJob {
                file1: input(file1, sheet1),
                file2: input(file2, sheet2),
                compare: CompareOptions::new(key, columns).with_key_validity(key_validity),
                output: output.map(|path| OutputTarget { path, format }),
            };
            cmd_compare(&job, limit)
        }
        Commands::Run { job, limit } => cmd_compare(&CompareJob::load(&job)?, limit),
        Commands::CreateJob {
            output,
            key,
            columns,
        } => cmd_create_job(&output, &key, columns),
    }
}

fn input(path: PathBuf, sheet: Option<String>) -> InputFile {
    InputFile {
        path,
        options: LoadOptions {
            sheet,
            delimiter: None,
        },
    }
}

fn cmd_columns(file: &PathBuf, sheet: Option<String>) -> dc_core::Result<()> {
    let table = load_table(file, &LoadOptions { sheet, delimiter: None })?;

    println!("File: {}", file.display());
    println!("Rows: {}", table.row_count());
    println!("Columns ({}):", table.column_count());
    for column in &table.columns {
        println!("  {}", column.name);
    }

    Ok(())
}

fn cmd_compare(job: &CompareJob, limit: Option<usize>) -> dc_core::Result<()> {
    let result = job.run()?;

    print_comparison(&result.comparison, limit);

    if !result.files_written.is_empty() {
        println!();
        for path in &result.files_written {
            println!("Exported to {}", path.display());
        }
    }

    Ok(())
}

fn print_comparison(comparison: &Comparison, limit: Option<usize>) {
    let report = &comparison.report;
    let stats = &comparison.stats;

    println!("Mismatched Data");
    println!();

    if report.is_empty() {
        println!("No mismatched data found.");
    } else {
        let header = report.header();
        println!("{}", header.join("\t"));
        println!("{}", "-".repeat(header.len() * 12));

        let row_limit = limit.unwrap_or(report.row_count());
        for row in report.rows.iter().take(row_limit) {
            println!("{}", row.cells().join("\t"));
        }

        if report.row_count() > row_limit {
            println!("... ({} more rows)", report.row_count() - row_limit);
        }
    }

    if let Some(empty_keys) = &comparison.empty_keys {
        println!();
        println!(
            "Rows With Empty Key ({}: {}, {}: {})",
            Source::File1.label(),
            empty_keys.rows_from(Source::File1).count(),
            Source::File2.label(),
            empty_keys.rows_from(Source::File2).count()
        );
        if empty_keys.row_count() > 0 {
            println!();
            println!("{}", empty_keys.header().join("\t"));
            for row in &empty_keys.rows {
                println!("{}", row.cells().join("\t"));
            }
        }
    }

    println!();
    println!("Mismatch Analysis");
    println!();
    println!("Mismatch Percentage: {:.2}%", stats.mismatch_percentage);
    println!("{} rows mismatched", stats.mismatch_count);
    println!(
        "{} of {} rows matched by key",
        stats.matched_rows, stats.compared_rows
    );
    for column in &stats.columns {
        println!("  {}: {} mismatched", column.column, column.count);
    }
}

fn cmd_create_job(output: &PathBuf, key: &str, columns: Vec<String>) -> dc_core::Result<()> {
    let columns = if columns.is_empty() {
        vec!["ColumnName".to_string()]
    } else {
        columns
    };

    let job = CompareJob::template(key, columns);
    job.save(output)?;

    println!("Created job file: {}", output.display());
    println!();
    println!("Edit the file to point at your data, then run:");
    println!("  dc-cli run --job {}", output.display());

    Ok(())
}
