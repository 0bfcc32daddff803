//! Schema documentation generator for exported warehouse metadata.
//!
//! Column-level exports (CSV or JSON, optionally compressed) are parsed into
//! [`record::SchemaRecord`]s, merged into a [`schema::SchemaModel`], linked by
//! naming-convention relationship inference, and rendered as Markdown,
//! PlantUML, Mermaid, JSON, YAML or CSV.

pub mod config;
pub mod error;
pub mod graph;
pub mod input;
pub mod pipeline;
pub mod record;
pub mod render;
pub mod schema;

pub use error::{Diagnostic, Diagnostics, Error, Result};
pub use pipeline::{build_schema, BuildOutput, PipelineOptions};
pub use render::{render, OutputFormat};
pub use schema::SchemaModel;
