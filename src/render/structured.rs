//! JSON and YAML document output.
//!
//! Both formats serialize the same [`SchemaDocument`]. Field names are part
//! of the output contract; the JSON document can be fed back in as input.

use super::{OutputFormat, Renderer};
use crate::error::Result;
use crate::schema::{Cardinality, ColumnMode, Confidence, SchemaModel, SchemaStats};
use schemars::JsonSchema;
use serde::Serialize;

/// Complete schema document
#[derive(Debug, Serialize, JsonSchema)]
pub struct SchemaDocument {
    pub dataset_name: Option<String>,
    pub metadata: SchemaStats,
    pub tables: Vec<TableDocument>,
    pub relationships: Vec<RelationshipDocument>,
}

/// A table with its columns in source order
#[derive(Debug, Serialize, JsonSchema)]
pub struct TableDocument {
    /// Qualified name
    pub table_name: String,
    pub short_name: String,
    pub table_description: Option<String>,
    pub columns: Vec<ColumnDocument>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ColumnDocument {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub mode: ColumnMode,
    pub description: Option<String>,
    /// Set when an inferred relationship starts at this column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<ColumnReference>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ColumnReference {
    pub table: String,
    pub column: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct RelationshipDocument {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    pub confidence: Confidence,
    pub cardinality: Cardinality,
}

/// Build the serializable document for a model
pub fn build_document(model: &SchemaModel) -> SchemaDocument {
    let tables = model
        .tables()
        .iter()
        .map(|table| TableDocument {
            table_name: table.qualified_name.clone(),
            short_name: table.short_name.clone(),
            table_description: table.description.clone(),
            columns: table
                .columns
                .iter()
                .map(|col| ColumnDocument {
                    name: col.name.clone(),
                    data_type: col.data_type.clone(),
                    mode: col.mode,
                    description: col.description.clone(),
                    references: model
                        .relationship_for(&table.qualified_name, &col.name)
                        .map(|rel| ColumnReference {
                            table: rel.target_table.clone(),
                            column: rel.target_column.clone(),
                        }),
                })
                .collect(),
        })
        .collect();

    let relationships = model
        .relationships()
        .iter()
        .map(|rel| RelationshipDocument {
            from_table: rel.source_table.clone(),
            from_column: rel.source_column.clone(),
            to_table: rel.target_table.clone(),
            to_column: rel.target_column.clone(),
            confidence: rel.confidence,
            cardinality: rel.cardinality,
        })
        .collect();

    SchemaDocument {
        dataset_name: model.name.clone(),
        metadata: model.stats(),
        tables,
        relationships,
    }
}

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Json
    }

    fn render(&self, model: &SchemaModel) -> Result<String> {
        let mut json = serde_json::to_string_pretty(&build_document(model))?;
        json.push('\n');
        Ok(json)
    }
}

pub struct YamlRenderer;

impl Renderer for YamlRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Yaml
    }

    fn render(&self, model: &SchemaModel) -> Result<String> {
        Ok(serde_yaml_ng::to_string(&build_document(model))?)
    }
}
