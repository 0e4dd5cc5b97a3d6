//! Output module for exporting crawl results and extracted fragments
//!
//! This module handles:
//! - Writing ordered string lists as plain lines, JSON or CSV
//! - Writing a single keyed record as a CSV file
//!
//! Every writer creates (or truncates) the target file.

mod export;

pub use export::{write_column_csv, write_csv_record, write_json, write_lines};

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to format output: {0}")]
    Format(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// File format for string lists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// One item per line
    #[default]
    Lines,
    /// A JSON array of strings
    Json,
    /// A single-column CSV file with a header naming the column
    Csv,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Lines => "lines",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        };
        f.write_str(name)
    }
}

/// Writes `items` to `path` in the chosen format
///
/// `column` names what the items are (`url`, `fragment`, ...). Only the CSV
/// format records it, as the header row.
pub fn write_list<S: AsRef<str>>(
    path: &Path,
    column: &str,
    items: &[S],
    format: ExportFormat,
) -> OutputResult<()> {
    tracing::debug!("Writing {} {} items to {} as {}", items.len(), column, path.display(), format);
    match format {
        ExportFormat::Lines => write_lines(path, items),
        ExportFormat::Json => write_json(path, items),
        ExportFormat::Csv => write_column_csv(path, column, items),
    }
}
