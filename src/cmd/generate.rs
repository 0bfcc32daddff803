//! Generate command: build the model once and write every requested artifact.

use anyhow::{anyhow, bail, Result};
use schema_docgen::config::DocgenConfig;
use schema_docgen::error::{Diagnostics, Error};
use schema_docgen::graph::{simplify, FilterConfig};
use schema_docgen::input::InputFormat;
use schema_docgen::pipeline::{build_schema, PipelineOptions};
use schema_docgen::render::{render, OutputFormat};
use schema_docgen::schema::SchemaModel;
use schemars::JsonSchema;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_OUTPUT_DIR: &str = "schema-docs";

/// Command-line values for `generate`, before merging with the config file
pub(crate) struct GenerateArgs {
    pub input: PathBuf,
    pub input_format: Option<String>,
    pub output: Option<PathBuf>,
    pub formats: Option<String>,
    pub name: Option<String>,
    pub config: Option<PathBuf>,
    pub simplified: bool,
    pub min_relationships: Option<usize>,
    pub include_tables: Vec<String>,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub top_n: Option<usize>,
    pub include_connected: bool,
    pub strict: bool,
    pub json: bool,
}

/// JSON output for the generate command
#[derive(Serialize, JsonSchema)]
pub(crate) struct GenerateJsonOutput {
    input: String,
    output_dir: String,
    dataset_name: String,
    input_files: usize,
    statistics: GenerateStatistics,
    outputs: Vec<OutputResult>,
    warnings: Vec<String>,
}

#[derive(Serialize, JsonSchema)]
pub(crate) struct GenerateStatistics {
    records: usize,
    tables: usize,
    columns: usize,
    relationships: usize,
    merged_columns: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    simplified_tables: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    simplified_relationships: Option<usize>,
}

#[derive(Serialize, JsonSchema)]
pub(crate) struct OutputResult {
    file: String,
    format: String,
    simplified: bool,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl OutputResult {
    fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Settings after applying command-line overrides to the config file
struct Settings {
    input_format: Option<InputFormat>,
    output_dir: PathBuf,
    formats: Vec<OutputFormat>,
    dataset_name: Option<String>,
    simplified: bool,
    filter: FilterConfig,
}

fn resolve_settings(args: &GenerateArgs) -> Result<Settings> {
    let config = match &args.config {
        Some(path) => DocgenConfig::load(path)?,
        None => DocgenConfig::default(),
    };

    let input_format = match &args.input_format {
        Some(f) => Some(f.parse::<InputFormat>().map_err(|e| anyhow!("{}", e))?),
        None => config.input_format()?,
    };

    let formats = match &args.formats {
        Some(list) => OutputFormat::parse_list(list).map_err(|e| anyhow!("{}", e))?,
        None => config
            .output_formats()?
            .unwrap_or_else(OutputFormat::defaults),
    };

    let mut filter = config.simplified.filter_config();
    if let Some(min) = args.min_relationships {
        filter.min_relationships = min;
    }
    if !args.include_tables.is_empty() {
        filter.include_tables = args.include_tables.clone();
    }
    if !args.include_patterns.is_empty() {
        filter.include_patterns = args.include_patterns.clone();
    }
    if !args.exclude_patterns.is_empty() {
        filter.exclude_patterns = args.exclude_patterns.clone();
    }
    if args.top_n.is_some() {
        filter.top_n = args.top_n;
    }
    if args.include_connected {
        filter.include_connected = true;
    }

    Ok(Settings {
        input_format,
        output_dir: args
            .output
            .clone()
            .or(config.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        formats,
        dataset_name: args.name.clone().or(config.dataset_name.clone()),
        simplified: args.simplified || config.simplified.enabled,
        filter,
    })
}

fn write_artifact(path: &Path, content: &str) -> schema_docgen::Result<()> {
    fs::write(path, content).map_err(|source| Error::UnwritableOutput {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("wrote {}", path.display());
    Ok(())
}

/// Render and write each format independently; a failure is recorded in
/// its result and does not stop the remaining outputs
fn write_outputs(
    model: &SchemaModel,
    formats: &[OutputFormat],
    output_dir: &Path,
    simplified: bool,
) -> Vec<OutputResult> {
    formats
        .iter()
        .map(|&format| {
            let path = output_dir.join(format.file_name(simplified));
            let written = render(model, format).and_then(|content| write_artifact(&path, &content));
            OutputResult {
                file: path.display().to_string(),
                format: format.to_string(),
                simplified,
                status: if written.is_ok() { "ok" } else { "error" }.to_string(),
                error: written.err().map(|e| e.to_string()),
            }
        })
        .collect()
}

pub(crate) fn run(args: GenerateArgs) -> Result<()> {
    let settings = resolve_settings(&args)?;

    if !args.json {
        eprintln!(
            "Generating schema documentation: {}{}",
            args.input.display(),
            settings
                .input_format
                .map(|f| format!(" [format: {}]", f))
                .unwrap_or_default()
        );
    }

    let options = PipelineOptions {
        input_format: settings.input_format,
        dataset_name: settings.dataset_name.clone(),
    };
    let mut diags = Diagnostics::new();
    let built = match build_schema(&args.input, &options, &mut diags) {
        Ok(built) => built,
        Err(e) => {
            diags.print_summary();
            return Err(e.into());
        }
    };
    let model = &built.model;

    fs::create_dir_all(&settings.output_dir).map_err(|source| Error::UnwritableOutput {
        path: settings.output_dir.clone(),
        source,
    })?;

    let mut outputs = write_outputs(model, &settings.formats, &settings.output_dir, false);

    let mut simplified_counts = None;
    if settings.simplified {
        let view = simplify(model, &settings.filter)?;
        for diagnostic in view.diagnostics() {
            diags.push(diagnostic);
        }
        simplified_counts = Some((view.model.table_count(), view.model.relationship_count()));
        outputs.extend(write_outputs(
            &view.model,
            &settings.formats,
            &settings.output_dir,
            true,
        ));
    }

    let total = outputs.len();
    let failed = outputs.iter().filter(|o| !o.succeeded()).count();

    if args.json {
        let output_json = GenerateJsonOutput {
            input: args.input.display().to_string(),
            output_dir: settings.output_dir.display().to_string(),
            dataset_name: model.title().to_string(),
            input_files: built.input_files,
            statistics: GenerateStatistics {
                records: built.stats.records,
                tables: model.table_count(),
                columns: model.column_count(),
                relationships: model.relationship_count(),
                merged_columns: built.stats.merged_columns,
                simplified_tables: simplified_counts.map(|(t, _)| t),
                simplified_relationships: simplified_counts.map(|(_, r)| r),
            },
            outputs,
            warnings: diags.items().iter().map(|d| d.to_string()).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output_json)?);
    } else {
        println!("\nSchema: {}", model.title());
        println!("  Input files: {}", built.input_files);
        println!("  Records: {}", built.stats.records);
        println!("  Tables: {}", model.table_count());
        println!("  Columns: {}", model.column_count());
        println!("  Relationships: {}", model.relationship_count());
        if let Some((tables, relationships)) = simplified_counts {
            println!(
                "  Simplified view: {} tables, {} relationships",
                tables, relationships
            );
        }

        println!("\nOutputs:");
        for output in &outputs {
            match &output.error {
                None => println!("  ✓ {}", output.file),
                Some(e) => println!("  ✗ {}: {}", output.file, e),
            }
        }

        diags.print_summary();

        if failed == 0 {
            println!(
                "\n✓ Documentation written to: {}",
                settings.output_dir.display()
            );
        }
    }

    if failed > 0 {
        bail!("{} of {} outputs could not be written", failed, total);
    }
    if args.strict && !diags.is_empty() {
        bail!("{} warning(s) raised and --strict is set", diags.count());
    }

    Ok(())
}
