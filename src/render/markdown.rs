//! Markdown documentation output.

use super::{OutputFormat, Renderer};
use crate::error::Result;
use crate::schema::{SchemaModel, Table};
use std::collections::BTreeMap;
use std::fmt::Write;

pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }

    fn render(&self, model: &SchemaModel) -> Result<String> {
        Ok(to_markdown(model))
    }
}

/// Escape text for a Markdown table cell
fn cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\r', '\n'], " ")
}

/// GitHub-style heading anchor
fn anchor(heading: &str) -> String {
    heading
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}

/// Generate Markdown documentation for a model
pub fn to_markdown(model: &SchemaModel) -> String {
    let mut out = String::new();
    let has_relationships = model.relationship_count() > 0;

    // `write!` into a String cannot fail
    let _ = writeln!(out, "# {} Schema Documentation\n", model.title());

    out.push_str("## Overview\n\n");
    let _ = write!(
        out,
        "This dataset contains **{}** tables with **{}** columns.",
        model.table_count(),
        model.column_count()
    );
    if has_relationships {
        let _ = write!(
            out,
            " **{}** relationships were inferred from column naming.",
            model.relationship_count()
        );
    }
    out.push_str("\n\n");

    out.push_str("## Table of Contents\n\n");
    out.push_str("- [Overview](#overview)\n");
    out.push_str("- [Index](#index)\n");
    if has_relationships {
        out.push_str("- [Relationships](#relationships)\n");
    }
    out.push_str("- [Tables](#tables)\n");
    for table in model.tables() {
        let _ = writeln!(
            out,
            "  - [{}](#{})",
            table.qualified_name,
            anchor(&table.qualified_name)
        );
    }
    out.push('\n');

    write_index(&mut out, model);

    if has_relationships {
        write_relationships(&mut out, model);
    }

    out.push_str("## Tables\n\n");
    for table in model.tables() {
        write_table(&mut out, model, table);
    }

    out
}

fn write_index(out: &mut String, model: &SchemaModel) {
    out.push_str("## Index\n\n");
    out.push_str("### Table Index\n\n");
    for table in model.tables() {
        let desc = table
            .description
            .as_deref()
            .map(|d| format!(" - {}", d.replace(['\r', '\n'], " ")))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "- [**{}**](#{}) ({} columns){}",
            table.qualified_name,
            anchor(&table.qualified_name),
            table.columns.len(),
            desc
        );
    }
    out.push('\n');

    // Alphabetical column index; tables listed in model order
    let mut columns: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for table in model.tables() {
        for column in &table.columns {
            columns
                .entry(column.name.as_str())
                .or_default()
                .push(table.qualified_name.as_str());
        }
    }

    out.push_str("### Column Index\n\n");
    out.push_str("| Column | Tables |\n");
    out.push_str("|--------|--------|\n");
    for (column, tables) in &columns {
        let _ = writeln!(out, "| {} | {} |", cell(column), cell(&tables.join(", ")));
    }
    out.push('\n');
}

fn write_relationships(out: &mut String, model: &SchemaModel) {
    out.push_str("## Relationships\n\n");
    out.push_str("The following relationships were inferred from column names:\n\n");
    out.push_str("| From Table | From Column | To Table | To Column | Confidence |\n");
    out.push_str("|------------|-------------|----------|-----------|------------|\n");
    for rel in model.relationships() {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            cell(&rel.source_table),
            cell(&rel.source_column),
            cell(&rel.target_table),
            cell(&rel.target_column),
            rel.confidence
        );
    }
    out.push('\n');
}

fn write_table(out: &mut String, model: &SchemaModel, table: &Table) {
    let _ = writeln!(out, "### {}\n", table.qualified_name);

    if let Some(desc) = &table.description {
        let _ = writeln!(out, "{}\n", desc);
    }

    let _ = writeln!(out, "**Columns:** {}\n", table.columns.len());

    out.push_str("| Column | Type | Mode | Description |\n");
    out.push_str("|--------|------|------|-------------|\n");
    for column in &table.columns {
        let name = match model.relationship_for(&table.qualified_name, &column.name) {
            Some(rel) => format!("{} → {}", column.name, rel.target_table),
            None => column.name.clone(),
        };
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            cell(&name),
            cell(&column.data_type),
            column.mode,
            cell(column.description.as_deref().unwrap_or(""))
        );
    }
    out.push('\n');

    let outgoing: Vec<_> = model
        .relationships()
        .iter()
        .filter(|r| r.source_table == table.qualified_name)
        .collect();
    if !outgoing.is_empty() {
        out.push_str("#### References\n\n");
        for rel in outgoing {
            let _ = writeln!(
                out,
                "- `{}` references `{}.{}`",
                rel.source_column, rel.target_table, rel.target_column
            );
        }
        out.push('\n');
    }
}
