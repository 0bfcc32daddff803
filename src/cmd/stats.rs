use anyhow::{anyhow, Result};
use schema_docgen::error::Diagnostics;
use schema_docgen::graph::table_statistics;
use schema_docgen::input::InputFormat;
use schema_docgen::pipeline::{build_schema, PipelineOptions};
use std::path::PathBuf;

pub(crate) fn run(
    input: PathBuf,
    input_format: Option<String>,
    top: usize,
    json: bool,
) -> Result<()> {
    let options = PipelineOptions {
        input_format: input_format
            .map(|f| f.parse::<InputFormat>().map_err(|e| anyhow!("{}", e)))
            .transpose()?,
        dataset_name: None,
    };

    let mut diags = Diagnostics::new();
    let built = match build_schema(&input, &options, &mut diags) {
        Ok(built) => built,
        Err(e) => {
            diags.print_summary();
            return Err(e.into());
        }
    };
    let stats = table_statistics(&built.model, top);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Schema: {}", built.model.title());
    println!("  Tables: {}", stats.total_tables);
    println!("  Relationships: {}", stats.total_relationships);
    println!(
        "  Tables with relationships: {}",
        stats.tables_with_relationships
    );
    println!(
        "  Tables without relationships: {}",
        stats.tables_without_relationships
    );
    println!(
        "  Average relationships per table: {:.2}",
        stats.average_relationships
    );

    if !stats.relationship_distribution.is_empty() {
        println!("\nRelationship distribution:");
        for bucket in &stats.relationship_distribution {
            println!(
                "  {:>4} relationships: {} tables",
                bucket.relationships, bucket.tables
            );
        }
    }

    if !stats.top_tables.is_empty() {
        println!("\nMost connected tables:");
        let width = stats
            .top_tables
            .iter()
            .map(|t| t.name.len())
            .max()
            .unwrap_or(0);
        for rank in &stats.top_tables {
            println!(
                "  {:<width$}  {:>3} total ({} in, {} out)  centrality {:.3}",
                rank.name,
                rank.total,
                rank.incoming,
                rank.outgoing,
                rank.centrality,
                width = width
            );
        }
    }

    diags.print_summary();
    Ok(())
}
