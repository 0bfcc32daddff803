//! Flat CSV exports: one row per column.

use super::{non_empty, RecordOrigin, SchemaRecord};
use crate::error::{Diagnostic, Diagnostics, Location};
use crate::schema::ColumnMode;
use std::io::Read;

/// Role of a CSV header column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Catalog,
    Dataset,
    Table,
    Column,
    DataType,
    Mode,
    IsNullable,
    Description,
    TableDescription,
}

fn classify_header(header: &str) -> Option<Field> {
    let h = header.trim().trim_start_matches('\u{feff}').to_lowercase();
    match h.as_str() {
        "table_catalog" | "project_id" | "project" | "catalog" => return Some(Field::Catalog),
        "table_schema" | "dataset_id" | "dataset" | "schema" => return Some(Field::Dataset),
        "table_name" | "table_id" | "table" | "full_table_name" | "table_full_name" => {
            return Some(Field::Table)
        }
        "column_name" | "column" | "field_name" | "field_path" | "name" => {
            return Some(Field::Column)
        }
        "data_type" | "type" | "field_type" | "column_type" => return Some(Field::DataType),
        "mode" | "column_mode" => return Some(Field::Mode),
        "is_nullable" => return Some(Field::IsNullable),
        "description" | "column_description" | "field_description" => {
            return Some(Field::Description)
        }
        "table_description" => return Some(Field::TableDescription),
        "table_type" => return None,
        _ => {}
    }

    // Looser matching for exports with decorated header names
    if h.contains("description") {
        if h.contains("table") {
            Some(Field::TableDescription)
        } else {
            Some(Field::Description)
        }
    } else if h.contains("table") && (h.contains("name") || h.contains("id")) {
        Some(Field::Table)
    } else if h.contains("column") && h.contains("name") {
        Some(Field::Column)
    } else if h.contains("type") {
        Some(Field::DataType)
    } else {
        None
    }
}

/// Header positions for each recognized field (first occurrence wins)
#[derive(Debug, Default)]
struct HeaderMap {
    catalog: Option<usize>,
    dataset: Option<usize>,
    table: Option<usize>,
    column: Option<usize>,
    data_type: Option<usize>,
    mode: Option<usize>,
    is_nullable: Option<usize>,
    description: Option<usize>,
    table_description: Option<usize>,
}

impl HeaderMap {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut map = HeaderMap::default();
        for (i, header) in headers.iter().enumerate() {
            let slot = match classify_header(header) {
                Some(Field::Catalog) => &mut map.catalog,
                Some(Field::Dataset) => &mut map.dataset,
                Some(Field::Table) => &mut map.table,
                Some(Field::Column) => &mut map.column,
                Some(Field::DataType) => &mut map.data_type,
                Some(Field::Mode) => &mut map.mode,
                Some(Field::IsNullable) => &mut map.is_nullable,
                Some(Field::Description) => &mut map.description,
                Some(Field::TableDescription) => &mut map.table_description,
                None => continue,
            };
            slot.get_or_insert(i);
        }
        map
    }

    fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.table.is_none() {
            missing.push("table_name");
        }
        if self.column.is_none() {
            missing.push("column_name");
        }
        if self.data_type.is_none() {
            missing.push("data_type");
        }
        missing
    }
}

fn cell(row: &csv::StringRecord, idx: Option<usize>) -> Option<String> {
    non_empty(idx.and_then(|i| row.get(i)))
}

/// Build the qualified table name, prefixing catalog/dataset columns when
/// the table value is not already dotted.
fn qualified_table(table: String, catalog: Option<String>, dataset: Option<String>) -> String {
    if table.contains('.') {
        return table;
    }
    let mut parts: Vec<String> = Vec::with_capacity(3);
    parts.extend(catalog);
    parts.extend(dataset);
    parts.push(table);
    parts.join(".")
}

/// Parse a CSV export. Rows missing a table, column or data type are skipped
/// and reported; a header without those columns invalidates the whole file.
pub fn parse_csv<R: Read>(reader: R, source: &str, diags: &mut Diagnostics) -> Vec<SchemaRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = match reader.headers() {
        Ok(h) => h.clone(),
        Err(e) => {
            diags.push(Diagnostic::InvalidInputDocument {
                source: source.to_string(),
                reason: format!("cannot read CSV header: {}", e),
            });
            return Vec::new();
        }
    };

    let map = HeaderMap::from_headers(&headers);
    let missing = map.missing_required();
    if !missing.is_empty() {
        diags.push(Diagnostic::InvalidInputDocument {
            source: source.to_string(),
            reason: format!("missing required columns: {}", missing.join(", ")),
        });
        return Vec::new();
    }

    let mut records = Vec::new();
    let mut row = csv::StringRecord::new();
    loop {
        match reader.read_record(&mut row) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                // A broken row (e.g. invalid UTF-8) only costs that row
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                diags.push(Diagnostic::MalformedRecord {
                    source: source.to_string(),
                    location: Location::Line(line),
                    reason: e.to_string(),
                });
                if matches!(e.kind(), csv::ErrorKind::Io(_)) {
                    break;
                }
                continue;
            }
        }

        let line = row.position().map(|p| p.line()).unwrap_or(0);

        if row.iter().all(|f| f.trim().is_empty()) {
            diags.push(Diagnostic::MalformedRecord {
                source: source.to_string(),
                location: Location::Line(line),
                reason: "empty row".to_string(),
            });
            continue;
        }

        let table = cell(&row, map.table);
        let column = cell(&row, map.column);
        let data_type = cell(&row, map.data_type);

        let (table, column, data_type) = match (table, column, data_type) {
            (Some(t), Some(c), Some(d)) => (t, c, d),
            (t, c, _) => {
                let field = if t.is_none() {
                    "table_name"
                } else if c.is_none() {
                    "column_name"
                } else {
                    "data_type"
                };
                diags.push(Diagnostic::MalformedRecord {
                    source: source.to_string(),
                    location: Location::Line(line),
                    reason: format!("missing {}", field),
                });
                continue;
            }
        };

        let mode = match (cell(&row, map.mode), cell(&row, map.is_nullable)) {
            (Some(mode), _) => ColumnMode::parse(&mode),
            (None, Some(nullable)) => ColumnMode::from_is_nullable(&nullable),
            (None, None) => ColumnMode::Nullable,
        };

        records.push(SchemaRecord {
            origin: RecordOrigin::CsvRow { line },
            source: source.to_string(),
            table: qualified_table(table, cell(&row, map.catalog), cell(&row, map.dataset)),
            table_description: cell(&row, map.table_description),
            column,
            data_type,
            mode,
            description: cell(&row, map.description),
        });
    }

    records
}
