//! Mermaid erDiagram format output.

use super::{diagram_ids, OutputFormat, Renderer};
use crate::error::Result;
use crate::schema::SchemaModel;
use std::fmt::Write;

pub struct MermaidRenderer;

impl Renderer for MermaidRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Mermaid
    }

    fn render(&self, model: &SchemaModel) -> Result<String> {
        Ok(to_mermaid(model))
    }
}

/// Generate a Mermaid erDiagram from a model
pub fn to_mermaid(model: &SchemaModel) -> String {
    let ids = diagram_ids(model);
    let mut output = String::new();

    let _ = writeln!(
        output,
        "---\ntitle: {} Schema Diagram\n---",
        model.title().replace('\n', " ")
    );
    output.push_str("erDiagram\n");

    for table in model.tables() {
        let _ = writeln!(output, "    {} {{", ids[table.qualified_name.as_str()]);

        for col in &table.columns {
            let is_pk = model.is_referenced(&table.qualified_name, &col.name);
            let is_fk = model
                .relationship_for(&table.qualified_name, &col.name)
                .is_some();
            let key_marker = match (is_pk, is_fk) {
                (true, true) => " PK, FK",
                (true, false) => " PK",
                (false, true) => " FK",
                (false, false) => "",
            };
            let comment = if col.mode.is_default() {
                String::new()
            } else {
                format!(" \"{}\"", col.mode)
            };

            let _ = writeln!(
                output,
                "        {} {}{}{}",
                escape_mermaid_type(&col.data_type),
                escape_mermaid_id(&col.name),
                key_marker,
                comment
            );
        }

        output.push_str("    }\n");
    }

    if !model.relationships().is_empty() {
        output.push('\n');
    }

    for rel in model.relationships() {
        let (Some(from), Some(to)) = (
            ids.get(rel.source_table.as_str()),
            ids.get(rel.target_table.as_str()),
        ) else {
            continue;
        };
        let _ = writeln!(
            output,
            "    {} {} {} : \"{}\"",
            from,
            rel.cardinality.as_mermaid(),
            to,
            rel.source_column
        );
    }

    output
}

/// Escape a string for use as a Mermaid attribute name
fn escape_mermaid_id(s: &str) -> String {
    // Mermaid names should be alphanumeric with underscores
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Escape a type string for Mermaid (no spaces, special chars).
/// Parameters and element types are dropped: `ARRAY<STRUCT<..>>` -> `ARRAY`
fn escape_mermaid_type(s: &str) -> String {
    let base = match s.find(['(', '<']) {
        Some(pos) => &s[..pos],
        None => s,
    };
    let escaped: String = base
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if escaped.is_empty() {
        "UNKNOWN".to_string()
    } else {
        escaped
    }
}
