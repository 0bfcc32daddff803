//! PlantUML class diagram output.

use super::{diagram_ids, OutputFormat, Renderer};
use crate::error::Result;
use crate::schema::{ColumnMode, Confidence, SchemaModel};
use std::fmt::Write;

pub struct PlantUmlRenderer;

impl Renderer for PlantUmlRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::PlantUml
    }

    fn render(&self, model: &SchemaModel) -> Result<String> {
        Ok(to_plantuml(model))
    }
}

/// Note and label text must stay on one line
fn single_line(s: &str) -> String {
    s.replace("\r\n", "\\n").replace('\n', "\\n").replace('"', "'")
}

/// Generate a PlantUML class diagram, one class per table
pub fn to_plantuml(model: &SchemaModel) -> String {
    let ids = diagram_ids(model);
    let mut out = String::new();

    out.push_str("@startuml\n");
    let _ = writeln!(out, "title {} Schema Diagram", single_line(model.title()));
    out.push_str("hide methods\n");
    out.push_str("hide circle\n\n");

    for table in model.tables() {
        let id = &ids[table.qualified_name.as_str()];
        let _ = writeln!(
            out,
            "class \"{}\" as {} <<table>> {{",
            table.qualified_name, id
        );
        for column in &table.columns {
            let marker = match column.mode {
                ColumnMode::Required => " [required]",
                ColumnMode::Repeated => " [repeated]",
                ColumnMode::Nullable => "",
            };
            let _ = writeln!(out, "  +{} : {}{}", column.name, column.data_type, marker);
        }
        out.push_str("}\n");

        if let Some(desc) = &table.description {
            let _ = writeln!(out, "note top of {} : {}", id, single_line(desc));
        }
        out.push('\n');
    }

    if !model.relationships().is_empty() {
        out.push_str("' Relationships\n");
    }
    for rel in model.relationships() {
        let (Some(from), Some(to)) = (
            ids.get(rel.source_table.as_str()),
            ids.get(rel.target_table.as_str()),
        ) else {
            continue;
        };
        match rel.confidence {
            Confidence::Exact => {
                let _ = writeln!(out, "{} --> {} : {}", from, to, rel.source_column);
            }
            Confidence::Suffix => {
                let _ = writeln!(out, "{} ..> {} : {} (suffix)", from, to, rel.source_column);
            }
        }
    }

    out.push_str("@enduml\n");
    out
}
