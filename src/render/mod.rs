//! Output emitters for a schema model.
//!
//! Every emitter is a pure function of the model returning the full text of
//! one artifact; writing it to disk is left to the caller so one failed
//! output never affects another.

mod csv;
mod markdown;
mod mermaid;
mod plantuml;
pub(crate) mod structured;

pub use self::csv::CsvRenderer;
pub use markdown::MarkdownRenderer;
pub use mermaid::MermaidRenderer;
pub use plantuml::PlantUmlRenderer;
pub use structured::{
    build_document, ColumnDocument, ColumnReference, JsonRenderer, RelationshipDocument,
    SchemaDocument, TableDocument, YamlRenderer,
};

use crate::error::Result;
use crate::schema::SchemaModel;
use ahash::{AHashMap, AHashSet};
use std::fmt;
use std::str::FromStr;

/// Output artifact kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Markdown documentation
    Markdown,
    /// PlantUML class diagram
    PlantUml,
    /// Mermaid erDiagram
    Mermaid,
    /// JSON document (re-ingestible)
    Json,
    /// YAML document, same shape as JSON
    Yaml,
    /// Flat CSV export
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "markdown" | "md" | "text" => Ok(OutputFormat::Markdown),
            "plantuml" | "puml" => Ok(OutputFormat::PlantUml),
            "mermaid" | "mmd" => Ok(OutputFormat::Mermaid),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!(
                "Unknown format: {}. Valid options: markdown, plantuml, mermaid, json, yaml, csv, uml, all",
                s
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::PlantUml => write!(f, "plantuml"),
            OutputFormat::Mermaid => write!(f, "mermaid"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 6] = [
        OutputFormat::Markdown,
        OutputFormat::PlantUml,
        OutputFormat::Mermaid,
        OutputFormat::Json,
        OutputFormat::Yaml,
        OutputFormat::Csv,
    ];

    /// Formats written when none are requested
    pub fn defaults() -> Vec<OutputFormat> {
        vec![
            OutputFormat::Markdown,
            OutputFormat::PlantUml,
            OutputFormat::Mermaid,
            OutputFormat::Json,
            OutputFormat::Yaml,
        ]
    }

    /// Parse a comma-separated list. `uml` expands to PlantUML and Mermaid,
    /// `all` to every format. Duplicates are dropped, first mention wins.
    pub fn parse_list(list: &str) -> std::result::Result<Vec<OutputFormat>, String> {
        let mut formats = Vec::new();
        for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let expanded: Vec<OutputFormat> = match item.to_lowercase().as_str() {
                "uml" => vec![OutputFormat::PlantUml, OutputFormat::Mermaid],
                "all" => Self::ALL.to_vec(),
                _ => vec![item.parse()?],
            };
            for format in expanded {
                if !formats.contains(&format) {
                    formats.push(format);
                }
            }
        }
        if formats.is_empty() {
            return Err("No output formats given".to_string());
        }
        Ok(formats)
    }

    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::PlantUml => "puml",
            OutputFormat::Mermaid => "mmd",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Csv => "csv",
        }
    }

    fn file_stem(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "schema_documentation",
            OutputFormat::PlantUml | OutputFormat::Mermaid => "schema_diagram",
            OutputFormat::Json | OutputFormat::Yaml => "schema",
            OutputFormat::Csv => "schema_export",
        }
    }

    /// Output file name, e.g. `schema_diagram.puml` or
    /// `schema_diagram_simplified.puml`
    pub fn file_name(&self, simplified: bool) -> String {
        let suffix = if simplified { "_simplified" } else { "" };
        format!("{}{}.{}", self.file_stem(), suffix, self.extension())
    }
}

/// Turns a schema model into the text of one artifact
pub trait Renderer {
    fn format(&self) -> OutputFormat;

    fn render(&self, model: &SchemaModel) -> Result<String>;
}

/// Get the renderer for a format
pub fn renderer_for(format: OutputFormat) -> Box<dyn Renderer> {
    match format {
        OutputFormat::Markdown => Box::new(MarkdownRenderer),
        OutputFormat::PlantUml => Box::new(PlantUmlRenderer),
        OutputFormat::Mermaid => Box::new(MermaidRenderer),
        OutputFormat::Json => Box::new(JsonRenderer),
        OutputFormat::Yaml => Box::new(YamlRenderer),
        OutputFormat::Csv => Box::new(CsvRenderer),
    }
}

/// Render a model in one format
pub fn render(model: &SchemaModel, format: OutputFormat) -> Result<String> {
    renderer_for(format).render(model)
}

/// Replace everything but ASCII alphanumerics and `_` so a name can be used
/// as a diagram identifier
pub(crate) fn diagram_id(s: &str) -> String {
    let id: String = s
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if id.starts_with(|c: char| c.is_ascii_digit()) {
        format!("t_{}", id)
    } else {
        id
    }
}

/// Diagram identifiers for every table, unique even when two qualified
/// names sanitize to the same text (`a.b` and `a_b`)
pub(crate) fn diagram_ids(model: &SchemaModel) -> AHashMap<&str, String> {
    let mut ids = AHashMap::new();
    let mut used = AHashSet::new();

    for table in model.tables() {
        let base = diagram_id(&table.qualified_name);
        let mut id = base.clone();
        let mut n = 2;
        while !used.insert(id.clone()) {
            id = format!("{}_{}", base, n);
            n += 1;
        }
        ids.insert(table.qualified_name.as_str(), id);
    }

    ids
}
