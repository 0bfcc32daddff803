//! Flat CSV export: one row per column, then the relationships as a second
//! section separated by a blank line.

use super::{OutputFormat, Renderer};
use crate::error::{Error, Result};
use crate::schema::SchemaModel;
use std::io;

const COLUMN_HEADER: [&str; 10] = [
    "table_name",
    "short_name",
    "table_description",
    "column_name",
    "data_type",
    "mode",
    "column_description",
    "is_foreign_key",
    "references_table",
    "references_column",
];

const RELATIONSHIP_HEADER: [&str; 5] = [
    "from_table",
    "from_column",
    "to_table",
    "to_column",
    "confidence",
];

pub struct CsvRenderer;

impl Renderer for CsvRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Csv
    }

    fn render(&self, model: &SchemaModel) -> Result<String> {
        to_csv(model)
    }
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer.into_inner().map_err(|e| Error::Io(e.into_error()))
}

/// Generate the CSV export for a model
pub fn to_csv(model: &SchemaModel) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMN_HEADER)?;

    for table in model.tables() {
        for column in &table.columns {
            let reference = model.relationship_for(&table.qualified_name, &column.name);
            writer.write_record([
                table.qualified_name.as_str(),
                table.short_name.as_str(),
                table.description.as_deref().unwrap_or(""),
                column.name.as_str(),
                column.data_type.as_str(),
                column.mode.as_str(),
                column.description.as_deref().unwrap_or(""),
                if reference.is_some() { "true" } else { "false" },
                reference.map(|r| r.target_table.as_str()).unwrap_or(""),
                reference.map(|r| r.target_column.as_str()).unwrap_or(""),
            ])?;
        }
    }

    let mut bytes = finish(writer)?;

    if !model.relationships().is_empty() {
        bytes.push(b'\n');
        let mut writer = csv::Writer::from_writer(bytes);
        writer.write_record(RELATIONSHIP_HEADER)?;
        for rel in model.relationships() {
            writer.write_record([
                rel.source_table.as_str(),
                rel.source_column.as_str(),
                rel.target_table.as_str(),
                rel.target_column.as_str(),
                rel.confidence.as_str(),
            ])?;
        }
        bytes = finish(writer)?;
    }

    String::from_utf8(bytes).map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}
