//! End-to-end model construction: discover inputs, parse them into records,
//! build the model, and infer relationships.

use crate::error::{Diagnostics, Result};
use crate::input::{expand_inputs, InputFile, InputFormat};
use crate::record::read_input;
use crate::schema::{infer_relationships, BuildStats, SchemaBuilder, SchemaModel};
use std::path::Path;

/// Options for [`build_schema`]
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Force a format instead of detecting it from file extensions
    pub input_format: Option<InputFormat>,
    /// Title for the model; derived from the tables when unset
    pub dataset_name: Option<String>,
}

/// A built model and what went into it
#[derive(Debug)]
pub struct BuildOutput {
    pub model: SchemaModel,
    pub stats: BuildStats,
    pub input_files: usize,
}

/// The dataset segment shared by every table (`proj.sales.orders` and
/// `proj.sales.users` -> `sales`), if there is one
pub fn common_dataset(model: &SchemaModel) -> Option<String> {
    let mut datasets = model.tables().iter().map(|t| {
        let mut parts = t.qualified_name.rsplit('.');
        parts.next();
        parts.next()
    });
    let first = datasets.next()??;
    datasets
        .all(|d| d == Some(first))
        .then(|| first.to_string())
}

/// Build a model from already discovered input files. Problems with
/// individual files or rows are recorded in `diags`.
pub fn build_from_files(
    files: &[InputFile],
    options: &PipelineOptions,
    diags: &mut Diagnostics,
) -> Result<BuildOutput> {
    let mut builder = SchemaBuilder::new();
    for file in files {
        let records = read_input(file, diags);
        builder.add_records(&records);
    }
    let stats = builder.stats();

    let mut model = builder.build()?;
    let name = options
        .dataset_name
        .clone()
        .or_else(|| common_dataset(&model));
    model.name = name;

    let inference = infer_relationships(&model);
    for ambiguity in &inference.ambiguities {
        diags.push(ambiguity.to_diagnostic());
    }
    model.set_relationships(inference.relationships);

    tracing::info!(
        "schema model: {} tables, {} columns, {} relationships ({} records, {} merged)",
        model.table_count(),
        model.column_count(),
        model.relationship_count(),
        stats.records,
        stats.merged_columns
    );

    Ok(BuildOutput {
        model,
        stats,
        input_files: files.len(),
    })
}

/// Build a model from a file, directory, or glob pattern
pub fn build_schema(
    input: &Path,
    options: &PipelineOptions,
    diags: &mut Diagnostics,
) -> Result<BuildOutput> {
    let files = expand_inputs(input, options.input_format)?;
    tracing::info!("found {} input file(s) at {}", files.len(), input.display());
    build_from_files(&files, options, diags)
}
