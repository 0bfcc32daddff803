//! Normalization of raw schema exports into [`SchemaRecord`]s.
//!
//! Both CSV rows and JSON table nodes end up as the same flat record shape,
//! tagged with where they came from, so the builder never needs to know
//! which export format produced them.

mod csv;
mod json;

pub use self::csv::parse_csv;
pub use self::json::{parse_json, table_name_from_path};

use crate::error::{Diagnostic, Diagnostics};
use crate::input::{InputFile, InputFormat};
use crate::schema::ColumnMode;
use std::io::Read;

/// Where a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOrigin {
    /// One row of a flat CSV export
    CsvRow { line: u64 },
    /// A column nested in a JSON table node
    JsonTable { index: usize },
    /// An entry of a bare JSON column array (table named after the file)
    JsonColumnArray { index: usize },
}

/// One normalized `(table, column)` fact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRecord {
    pub origin: RecordOrigin,
    /// Display name of the source document
    pub source: String,
    /// Qualified table name (dotted or bare)
    pub table: String,
    pub table_description: Option<String>,
    pub column: String,
    pub data_type: String,
    pub mode: ColumnMode,
    pub description: Option<String>,
}

/// Trimmed, non-empty text or `None`
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Read one input file into records. Files that cannot be opened or parsed
/// are reported as diagnostics and yield no records.
pub fn read_input(input: &InputFile, diags: &mut Diagnostics) -> Vec<SchemaRecord> {
    let source = input.display_name();
    let Some(format) = input.format else {
        diags.push(Diagnostic::InvalidInputDocument {
            source,
            reason: "cannot detect input format (expected .csv or .json)".to_string(),
        });
        return Vec::new();
    };

    let mut content = Vec::new();
    let read = input
        .open()
        .and_then(|mut reader| reader.read_to_end(&mut content).map_err(Into::into));
    if let Err(e) = read {
        diags.push(Diagnostic::InvalidInputDocument {
            source,
            reason: e.to_string(),
        });
        return Vec::new();
    }

    tracing::debug!(
        "reading {} ({} bytes, format {}, compression {})",
        source,
        content.len(),
        format,
        input.compression
    );

    let records = match format {
        InputFormat::Csv => parse_csv(content.as_slice(), &source, diags),
        InputFormat::Json => {
            let fallback = table_name_from_path(&input.path);
            parse_json(&content, &source, &fallback, diags)
        }
    };

    tracing::debug!("{}: {} records", source, records.len());
    records
}
