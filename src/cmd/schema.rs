//! JSON Schema for the machine-readable outputs.
//!
//! `document` describes the `schema.json` artifact, `generate` and `stats`
//! the `--json` output of those commands.

use anyhow::{bail, Result};
use schemars::{schema_for, Schema};
use std::collections::BTreeMap;

/// All schemas by name, in deterministic order
pub(crate) fn all_schemas() -> BTreeMap<&'static str, Schema> {
    let mut schemas = BTreeMap::new();

    schemas.insert(
        "document",
        schema_for!(schema_docgen::render::SchemaDocument),
    );
    schemas.insert(
        "generate",
        schema_for!(super::generate::GenerateJsonOutput),
    );
    schemas.insert(
        "stats",
        schema_for!(schema_docgen::graph::TableStatistics),
    );

    schemas
}

pub(crate) fn get_schema(name: &str) -> Option<Schema> {
    all_schemas().remove(name)
}

pub(crate) fn schema_names() -> Vec<&'static str> {
    all_schemas().keys().copied().collect()
}

pub(crate) fn run(name: Option<String>) -> Result<()> {
    match name {
        Some(name) => {
            let Some(schema) = get_schema(&name) else {
                bail!(
                    "Unknown schema: {}. Valid options: {}",
                    name,
                    schema_names().join(", ")
                );
            };
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        None => {
            println!("{}", serde_json::to_string_pretty(&all_schemas())?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_names() {
        assert_eq!(schema_names(), vec!["document", "generate", "stats"]);
    }

    #[test]
    fn test_document_schema_describes_tables() {
        let schema = serde_json::to_value(get_schema("document").unwrap()).unwrap();
        let properties = &schema["properties"];
        assert!(properties.get("dataset_name").is_some());
        assert!(properties.get("tables").is_some());
        assert!(properties.get("relationships").is_some());
    }

    #[test]
    fn test_unknown_schema() {
        assert!(get_schema("graph").is_none());
        assert!(run(Some("graph".to_string())).is_err());
    }
}
