//! Schema model for exported warehouse metadata.
//!
//! This module provides:
//! - Data models for tables, columns and inferred relationships
//! - A builder that merges normalized records into one model
//! - Naming-convention based relationship inference

mod builder;
mod infer;

pub use builder::*;
pub use infer::*;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// BigQuery-style column nullability/repetition marker
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, schemars::JsonSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnMode {
    #[default]
    Nullable,
    Required,
    Repeated,
}

impl ColumnMode {
    /// Parse a mode string leniently; anything unrecognized is `NULLABLE`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "REQUIRED" => ColumnMode::Required,
            "REPEATED" => ColumnMode::Repeated,
            _ => ColumnMode::Nullable,
        }
    }

    /// Map an INFORMATION_SCHEMA `is_nullable` value (YES/NO)
    pub fn from_is_nullable(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "NO" | "FALSE" => ColumnMode::Required,
            _ => ColumnMode::Nullable,
        }
    }

    pub fn is_default(self) -> bool {
        self == ColumnMode::Nullable
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnMode::Nullable => "NULLABLE",
            ColumnMode::Required => "REQUIRED",
            ColumnMode::Repeated => "REPEATED",
        }
    }
}

impl fmt::Display for ColumnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column definition within a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name (unique within its table)
    pub name: String,
    /// Type string, kept verbatim (e.g. `ARRAY<STRUCT<a INT64>>`)
    pub data_type: String,
    pub mode: ColumnMode,
    pub description: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            mode: ColumnMode::Nullable,
            description: None,
        }
    }
}

/// Table definition with columns in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Unique key: dotted `catalog.dataset.table` or a bare name
    pub qualified_name: String,
    /// Final dot-segment of the qualified name
    pub short_name: String,
    pub description: Option<String>,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        let qualified_name = qualified_name.into();
        let short_name = short_name(&qualified_name).to_string();
        Self {
            qualified_name,
            short_name,
            description: None,
            columns: Vec::new(),
        }
    }

    /// Get a column by exact name
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

/// Final dot-segment of a table identifier (`proj.ds.orders` -> `orders`)
pub fn short_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

/// How a relationship was inferred
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Column stem names the target table and the target has a matching id column
    Exact,
    /// Looser `_id` suffix match, singular/plural tolerant
    Suffix,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::Exact => "exact",
            Confidence::Suffix => "suffix",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship cardinality for ERD output
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, schemars::JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    #[default]
    ManyToOne, // Inferred links are always child -> parent
    OneToOne,
    OneToMany,
    ManyToMany,
}

impl Cardinality {
    /// Mermaid ERD notation
    pub fn as_mermaid(self) -> &'static str {
        match self {
            Cardinality::ManyToOne => "}o--||",
            Cardinality::OneToOne => "||--||",
            Cardinality::OneToMany => "||--o{",
            Cardinality::ManyToMany => "}o--o{",
        }
    }
}

/// Directional link: the source column references the target column
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relationship {
    /// Qualified name of the referencing table
    pub source_table: String,
    pub source_column: String,
    /// Qualified name of the referenced table
    pub target_table: String,
    pub target_column: String,
    pub confidence: Confidence,
    pub cardinality: Cardinality,
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.source_table, self.source_column, self.target_table, self.target_column
        )
    }
}

/// Summary counts for a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct SchemaStats {
    pub table_count: usize,
    pub column_count: usize,
    pub relationship_count: usize,
}

/// Complete schema: ordered unique tables plus derived relationships
#[derive(Debug, Clone, Default)]
pub struct SchemaModel {
    /// Optional dataset name used in titles
    pub name: Option<String>,
    tables: Vec<Table>,
    index: AHashMap<String, usize>,
    relationships: Vec<Relationship>,
}

impl SchemaModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    /// Tables in insertion order
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, qualified_name: &str) -> Option<&Table> {
        self.index.get(qualified_name).map(|&i| &self.tables[i])
    }

    pub fn contains_table(&self, qualified_name: &str) -> bool {
        self.index.contains_key(qualified_name)
    }

    /// Look up a table by qualified name, falling back to a unique short name
    pub fn resolve_table(&self, name: &str) -> Option<&Table> {
        if let Some(table) = self.table(name) {
            return Some(table);
        }
        let mut matches = self
            .tables
            .iter()
            .filter(|t| t.short_name.eq_ignore_ascii_case(name));
        match (matches.next(), matches.next()) {
            (Some(table), None) => Some(table),
            _ => None,
        }
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn set_relationships(&mut self, relationships: Vec<Relationship>) {
        self.relationships = relationships;
    }

    /// The relationship originating at a given column, if any
    pub fn relationship_for(&self, table: &str, column: &str) -> Option<&Relationship> {
        self.relationships
            .iter()
            .find(|r| r.source_table == table && r.source_column == column)
    }

    /// Whether some relationship points at this column
    pub fn is_referenced(&self, table: &str, column: &str) -> bool {
        self.relationships
            .iter()
            .any(|r| r.target_table == table && r.target_column == column)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn stats(&self) -> SchemaStats {
        SchemaStats {
            table_count: self.table_count(),
            column_count: self.column_count(),
            relationship_count: self.relationship_count(),
        }
    }

    /// Dataset title for rendered output
    pub fn title(&self) -> &str {
        self.name.as_deref().unwrap_or("Dataset")
    }

    /// Get the table for a qualified name, creating it at the end if new.
    /// Returns the table and whether it was created.
    pub(crate) fn table_entry(&mut self, qualified_name: &str) -> (&mut Table, bool) {
        if let Some(&i) = self.index.get(qualified_name) {
            return (&mut self.tables[i], false);
        }
        let i = self.tables.len();
        self.index.insert(qualified_name.to_string(), i);
        self.tables.push(Table::new(qualified_name));
        (&mut self.tables[i], true)
    }

    /// Append a fully built table, replacing nothing. Used for derived
    /// models such as simplified views; duplicates are ignored.
    pub fn push_table(&mut self, table: Table) {
        if self.index.contains_key(&table.qualified_name) {
            return;
        }
        self.index
            .insert(table.qualified_name.clone(), self.tables.len());
        self.tables.push(table);
    }
}
