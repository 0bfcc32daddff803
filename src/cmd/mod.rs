mod generate;
mod schema;
mod stats;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "schema-docgen")]
#[command(version)]
#[command(
    about = "Generate schema documentation and ER diagrams from exported warehouse metadata",
    long_about = None
)]
pub struct Cli {
    /// Verbose logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the schema model and write documentation artifacts
    Generate {
        /// Schema export file, directory, or glob pattern (e.g., exports/*.csv)
        /// Supports .gz, .bz2, .xz, .zst compression
        input: PathBuf,

        /// Input format: csv or json (detected from file extensions if not specified)
        #[arg(short = 'f', long = "format")]
        input_format: Option<String>,

        /// Output directory [default: schema-docs]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output formats (comma-separated): markdown, plantuml, mermaid, json, yaml, csv, uml, all
        #[arg(long)]
        formats: Option<String>,

        /// Dataset name used in titles (derived from table names if not specified)
        #[arg(long)]
        name: Option<String>,

        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Also write simplified outputs with only the core tables
        #[arg(long)]
        simplified: bool,

        /// Minimum relationship count for a core table in the simplified view
        #[arg(long)]
        min_relationships: Option<usize>,

        /// Tables always kept in the simplified view (comma-separated)
        #[arg(long)]
        include_tables: Option<String>,

        /// Glob patterns a simplified table must match (comma-separated)
        #[arg(long)]
        include_patterns: Option<String>,

        /// Glob patterns removed from the simplified view (comma-separated)
        #[arg(long)]
        exclude_patterns: Option<String>,

        /// Add the N most connected tables to the simplified view
        #[arg(long)]
        top_n: Option<usize>,

        /// Add every table connected to --include-tables
        #[arg(long)]
        include_connected: bool,

        /// Fail if any warning was raised
        #[arg(long)]
        strict: bool,

        /// Output a JSON summary instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show relationship statistics for a schema export
    Stats {
        /// Schema export file, directory, or glob pattern
        input: PathBuf,

        /// Input format: csv or json (detected from file extensions if not specified)
        #[arg(short = 'f', long = "format")]
        input_format: Option<String>,

        /// Number of most connected tables to list
        #[arg(long, default_value = "20")]
        top: usize,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the JSON Schema of the JSON outputs
    Schema {
        /// Schema name: document, generate, or stats (all if omitted)
        name: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub(crate) fn split_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            input,
            input_format,
            output,
            formats,
            name,
            config,
            simplified,
            min_relationships,
            include_tables,
            include_patterns,
            exclude_patterns,
            top_n,
            include_connected,
            strict,
            json,
        } => generate::run(generate::GenerateArgs {
            input,
            input_format,
            output,
            formats,
            name,
            config,
            simplified,
            min_relationships,
            include_tables: split_list(include_tables),
            include_patterns: split_list(include_patterns),
            exclude_patterns: split_list(exclude_patterns),
            top_n,
            include_connected,
            strict,
            json,
        }),
        Commands::Stats {
            input,
            input_format,
            top,
            json,
        } => stats::run(input, input_format, top, json),
        Commands::Schema { name } => schema::run(name),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "schema-docgen",
                &mut io::stdout(),
            );
            Ok(())
        }
    }
}
