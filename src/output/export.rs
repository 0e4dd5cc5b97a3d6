//! File writers for string lists and keyed records

use super::{OutputError, OutputResult};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes one item per line
pub fn write_lines<S: AsRef<str>>(path: &Path, items: &[S]) -> OutputResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        writeln!(writer, "{}", item.as_ref())?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the items as a pretty-printed JSON array of strings
pub fn write_json<S: AsRef<str>>(path: &Path, items: &[S]) -> OutputResult<()> {
    let items: Vec<&str> = items.iter().map(|s| s.as_ref()).collect();
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &items)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Opens a CSV writer with RFC 4180 line endings
fn csv_writer(path: &Path) -> OutputResult<csv::Writer<File>> {
    let writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_path(path)?;
    Ok(writer)
}

/// Writes a single-column CSV: a `column` header row, then one row per item
pub fn write_column_csv<S: AsRef<str>>(path: &Path, column: &str, items: &[S]) -> OutputResult<()> {
    let mut writer = csv_writer(path)?;
    writer.write_record([column])?;
    for item in items {
        writer.write_record([item.as_ref()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes a header row of `fields` followed by one row taken from `record`
///
/// With no `fields`, the record's keys (sorted) are the header. A field
/// missing from the record is written as an empty value.
///
/// # Example
///
/// ```no_run
/// use std::collections::BTreeMap;
/// use std::path::Path;
/// use sumi_sieve::output::write_csv_record;
///
/// let record = BTreeMap::from([
///     ("title".to_string(), "Hello, world".to_string()),
///     ("url".to_string(), "https://example.com".to_string()),
/// ]);
/// write_csv_record(Path::new("page.csv"), &["url", "title"], &record).unwrap();
/// // url,title
/// // https://example.com,"Hello, world"
/// ```
pub fn write_csv_record(
    path: &Path,
    fields: &[&str],
    record: &BTreeMap<String, String>,
) -> OutputResult<()> {
    let header: Vec<&str> = if fields.is_empty() {
        record.keys().map(String::as_str).collect()
    } else {
        fields.to_vec()
    };
    if header.is_empty() {
        return Err(OutputError::Format(
            "CSV record has no fields to write".to_string(),
        ));
    }

    let row: Vec<&str> = header
        .iter()
        .map(|field| record.get(*field).map(String::as_str).unwrap_or(""))
        .collect();

    let mut writer = csv_writer(path)?;
    writer.write_record(&header)?;
    writer.write_record(&row)?;
    writer.flush()?;
    Ok(())
}
