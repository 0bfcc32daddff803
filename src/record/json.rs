//! JSON exports: table arrays, single tables, `{"tables": [...]}` documents
//! (the shape written by the JSON emitter), `bq show` table resources, and
//! bare BigQuery column arrays.

use super::{non_empty, RecordOrigin, SchemaRecord};
use crate::error::{Diagnostic, Diagnostics, Location};
use crate::input::Compression;
use crate::schema::ColumnMode;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::path::Path;

static EXPORT_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)_(schema|export)$").expect("valid regex"));

/// Derive a table name from a file path for exports that carry none:
/// `exports/orders_schema.json.gz` -> `orders`.
pub fn table_name_from_path(path: &Path) -> String {
    let mut path = path.to_path_buf();
    if Compression::from_path(&path) != Compression::None {
        path.set_extension("");
    }
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("table");
    let name = EXPORT_SUFFIX_RE.replace(stem, "");
    if name.is_empty() {
        stem.to_string()
    } else {
        name.into_owned()
    }
}

fn str_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| non_empty(obj.get(*k).and_then(Value::as_str)))
}

struct JsonParser<'a> {
    source: &'a str,
    fallback_table: &'a str,
    diags: &'a mut Diagnostics,
    records: Vec<SchemaRecord>,
}

impl<'a> JsonParser<'a> {
    fn malformed(&mut self, table: usize, column: Option<usize>, reason: impl Into<String>) {
        self.diags.push(Diagnostic::MalformedRecord {
            source: self.source.to_string(),
            location: Location::Entry { table, column },
            reason: reason.into(),
        });
    }

    fn invalid(&mut self, reason: impl Into<String>) {
        self.diags.push(Diagnostic::InvalidInputDocument {
            source: self.source.to_string(),
            reason: reason.into(),
        });
    }

    fn parse_document(&mut self, doc: &Value) {
        match doc {
            Value::Array(items) => {
                if items.is_empty() {
                    self.invalid("document contains no tables or columns");
                }
                for (i, item) in items.iter().enumerate() {
                    match item {
                        Value::Object(obj) if obj.contains_key("columns") => {
                            self.parse_table(i, obj)
                        }
                        Value::Object(obj) if obj.contains_key("schema") => {
                            self.parse_table_resource(i, obj)
                        }
                        Value::Object(obj) => self.parse_column_entry(
                            i,
                            None,
                            obj,
                            "",
                            self.fallback_table.to_string(),
                            None,
                            RecordOrigin::JsonColumnArray { index: i },
                        ),
                        _ => self.malformed(i, None, "entry is not an object"),
                    }
                }
            }
            Value::Object(obj) => {
                if let Some(tables) = obj.get("tables") {
                    match tables.as_array() {
                        Some(tables) => {
                            for (i, table) in tables.iter().enumerate() {
                                match table.as_object() {
                                    Some(t) => self.parse_table(i, t),
                                    None => self.malformed(i, None, "table entry is not an object"),
                                }
                            }
                        }
                        None => self.invalid("\"tables\" is not an array"),
                    }
                } else if obj.contains_key("columns") {
                    self.parse_table(0, obj);
                } else if obj.contains_key("schema") {
                    self.parse_table_resource(0, obj);
                } else {
                    self.invalid("expected a table array, a column array, or an object with \"tables\" or \"columns\"");
                }
            }
            _ => self.invalid("expected a JSON array or object"),
        }
    }

    /// `{ "table_name": ..., "table_description": ..., "columns": [...] }`
    fn parse_table(&mut self, index: usize, obj: &Map<String, Value>) {
        let Some(table) = str_field(obj, &["table_name", "name", "table_id", "table"]) else {
            self.malformed(index, None, "table entry has no table_name");
            return;
        };
        let description = str_field(obj, &["table_description", "description"]);

        let columns = match obj.get("columns").and_then(Value::as_array) {
            Some(columns) if !columns.is_empty() => columns,
            Some(_) => {
                self.malformed(index, None, format!("table {} has no columns", table));
                return;
            }
            None => {
                self.malformed(index, None, format!("columns of {} is not an array", table));
                return;
            }
        };

        self.parse_columns(index, columns, table, description);
    }

    /// A `bq show --format=json` table resource with `schema.fields`
    fn parse_table_resource(&mut self, index: usize, obj: &Map<String, Value>) {
        let reference = obj.get("tableReference").and_then(Value::as_object);
        let table = reference
            .and_then(|r| {
                let parts: Option<Vec<String>> = ["projectId", "datasetId", "tableId"]
                    .iter()
                    .map(|k| non_empty(r.get(*k).and_then(Value::as_str)))
                    .collect();
                parts.map(|p| p.join("."))
            })
            .or_else(|| str_field(obj, &["id"]).map(|id| id.replace(':', ".")))
            .or_else(|| str_field(obj, &["table_name", "name"]))
            .unwrap_or_else(|| self.fallback_table.to_string());
        let description = str_field(obj, &["description"]);

        match obj
            .get("schema")
            .and_then(|s| s.get("fields"))
            .and_then(Value::as_array)
        {
            Some(fields) if !fields.is_empty() => {
                self.parse_columns(index, fields, table, description)
            }
            _ => self.malformed(index, None, format!("table {} has no schema fields", table)),
        }
    }

    fn parse_columns(
        &mut self,
        index: usize,
        columns: &[Value],
        table: String,
        description: Option<String>,
    ) {
        for (j, column) in columns.iter().enumerate() {
            match column.as_object() {
                Some(col) => self.parse_column_entry(
                    index,
                    Some(j),
                    col,
                    "",
                    table.clone(),
                    description.clone(),
                    RecordOrigin::JsonTable { index },
                ),
                None => self.malformed(index, Some(j), "column entry is not an object"),
            }
        }
    }

    /// One column object; nested `fields` are flattened as `parent.child`
    #[allow(clippy::too_many_arguments)]
    fn parse_column_entry(
        &mut self,
        index: usize,
        column_index: Option<usize>,
        obj: &Map<String, Value>,
        prefix: &str,
        table: String,
        table_description: Option<String>,
        origin: RecordOrigin,
    ) {
        let Some(name) = str_field(obj, &["name", "column_name"]) else {
            self.malformed(index, column_index, "column entry has no name");
            return;
        };
        let name = format!("{}{}", prefix, name);
        let data_type = str_field(obj, &["type", "data_type", "field_type"])
            .unwrap_or_else(|| "STRING".to_string());
        let mode = obj
            .get("mode")
            .and_then(Value::as_str)
            .map(ColumnMode::parse)
            .unwrap_or_default();

        self.records.push(SchemaRecord {
            origin,
            source: self.source.to_string(),
            table: table.clone(),
            table_description: table_description.clone(),
            column: name.clone(),
            data_type,
            mode,
            description: str_field(obj, &["description"]),
        });

        if let Some(fields) = obj.get("fields").and_then(Value::as_array) {
            let child_prefix = format!("{}.", name);
            for field in fields {
                if let Some(field) = field.as_object() {
                    self.parse_column_entry(
                        index,
                        column_index,
                        field,
                        &child_prefix,
                        table.clone(),
                        table_description.clone(),
                        origin,
                    );
                }
            }
        }
    }
}

/// Parse a JSON export. `fallback_table` names the implicit table of a bare
/// column array.
pub fn parse_json(
    content: &[u8],
    source: &str,
    fallback_table: &str,
    diags: &mut Diagnostics,
) -> Vec<SchemaRecord> {
    let doc: Value = match serde_json::from_slice(content) {
        Ok(doc) => doc,
        Err(e) => {
            diags.push(Diagnostic::InvalidInputDocument {
                source: source.to_string(),
                reason: format!("invalid JSON: {}", e),
            });
            return Vec::new();
        }
    };

    let mut parser = JsonParser {
        source,
        fallback_table,
        diags,
        records: Vec::new(),
    };
    parser.parse_document(&doc);
    parser.records
}
