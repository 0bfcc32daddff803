//! Integration tests for the generate command.

use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn schema_docgen_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_schema-docgen"))
}

const THREE_ROWS: &str = "table_name,column_name,data_type\n\
orders,order_id,STRING\n\
orders,customer_id,STRING\n\
customers,id,STRING\n";

const SHOP: &str = "table_name,column_name,data_type,mode,description\n\
proj.shop.customers,id,STRING,REQUIRED,Customer key\n\
proj.shop.customers,name,STRING,NULLABLE,\n\
proj.shop.orders,id,STRING,REQUIRED,\n\
proj.shop.orders,customer_id,STRING,NULLABLE,Buyer\n\
proj.shop.order_items,id,STRING,REQUIRED,\n\
proj.shop.order_items,order_id,STRING,NULLABLE,\n\
proj.shop.order_items,product_id,STRING,NULLABLE,\n\
proj.shop.products,id,STRING,REQUIRED,\n\
proj.shop.events,payload,JSON,NULLABLE,\n";

fn write_input(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn generate(input: &Path, out: &Path, extra: &[&str]) -> Output {
    schema_docgen_bin()
        .arg("generate")
        .arg(input)
        .arg("-o")
        .arg(out)
        .args(extra)
        .output()
        .expect("Failed to execute command")
}

fn parse_json(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout)
        .unwrap_or_else(|e| panic!("Invalid JSON output: {}\nOutput: {}", e, stdout))
}

/// Text of a `## ` section up to the next top-level heading
fn markdown_section<'a>(doc: &'a str, heading: &str) -> &'a str {
    let start = doc
        .find(&format!("## {}\n", heading))
        .unwrap_or_else(|| panic!("missing section {}", heading));
    let rest = &doc[start + 3..];
    match rest.find("\n## ") {
        Some(end) => &rest[..end],
        None => rest,
    }
}

#[test]
fn test_three_row_csv() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "schema.csv", THREE_ROWS);
    let out = dir.path().join("docs");

    let output = generate(&input, &out, &["--formats", "all", "--json"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json = parse_json(&output);
    assert_eq!(json["statistics"]["tables"], 2);
    assert_eq!(json["statistics"]["columns"], 3);
    assert_eq!(json["statistics"]["relationships"], 1);
    assert_eq!(json["outputs"].as_array().unwrap().len(), 6);
    assert!(json["warnings"].as_array().unwrap().is_empty());

    let markdown = fs::read_to_string(out.join("schema_documentation.md")).unwrap();
    let relationships = markdown_section(&markdown, "Relationships");
    assert!(relationships.contains("orders"));
    assert!(relationships.contains("customers"));
    assert!(relationships.contains("customer_id"));

    let csv = fs::read_to_string(out.join("schema_export.csv")).unwrap();
    let columns = csv.split("\n\n").next().unwrap();
    let mut reader = csv::Reader::from_reader(columns.as_bytes());
    assert_eq!(reader.records().count(), 3);

    for name in [
        "schema_diagram.puml",
        "schema_diagram.mmd",
        "schema.json",
        "schema.yaml",
    ] {
        assert!(out.join(name).exists(), "missing {}", name);
    }
}

#[test]
fn test_default_formats() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "schema.csv", THREE_ROWS);
    let out = dir.path().join("docs");

    let output = generate(&input, &out, &[]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Tables: 2"));
    assert!(stdout.contains("Relationships: 1"));

    assert!(out.join("schema_documentation.md").exists());
    assert!(out.join("schema_diagram.puml").exists());
    assert!(out.join("schema_diagram.mmd").exists());
    assert!(out.join("schema.json").exists());
    assert!(out.join("schema.yaml").exists());
    assert!(!out.join("schema_export.csv").exists());
}

#[test]
fn test_missing_data_type_row_skipped() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "schema.csv",
        "table_name,column_name,data_type\n\
         orders,order_id,STRING\n\
         orders,customer_id,\n\
         customers,id,STRING\n",
    );
    let out = dir.path().join("docs");

    let output = generate(&input, &out, &["--json"]);
    assert!(output.status.success());

    let json = parse_json(&output);
    assert_eq!(json["statistics"]["columns"], 2);
    assert_eq!(json["statistics"]["relationships"], 0);
    let warnings = json["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].as_str().unwrap().contains("data_type"));
}

#[test]
fn test_all_malformed_input_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "schema.csv",
        "table_name,column_name,data_type\norders,id,\n,name,STRING\n",
    );
    let out = dir.path().join("docs");

    let output = generate(&input, &out, &[]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no tables found"));
    assert!(!out.exists());
}

#[test]
fn test_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    let output = generate(
        &dir.path().join("nope.csv"),
        &dir.path().join("docs"),
        &[],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no input files found"));
}

#[test]
fn test_unwritable_output_does_not_block_others() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "schema.csv", THREE_ROWS);
    let out = dir.path().join("docs");
    // A directory where the PlantUML file should go
    fs::create_dir_all(out.join("schema_diagram.puml")).unwrap();

    let output = generate(&input, &out, &["--formats", "md,puml,json"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 of 3 outputs could not be written"));
    assert!(out.join("schema_documentation.md").is_file());
    assert!(out.join("schema.json").is_file());
}

#[test]
fn test_simplified_outputs() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "shop.csv", SHOP);
    let out = dir.path().join("docs");

    let output = generate(
        &input,
        &out,
        &["--formats", "md,mermaid", "--simplified", "--json"],
    );
    assert!(output.status.success());

    let json = parse_json(&output);
    assert_eq!(json["dataset_name"], "shop");
    assert_eq!(json["statistics"]["tables"], 5);
    assert_eq!(json["statistics"]["relationships"], 3);
    assert_eq!(json["statistics"]["simplified_tables"], 2);
    assert_eq!(json["statistics"]["simplified_relationships"], 1);

    let simplified = fs::read_to_string(out.join("schema_diagram_simplified.mmd")).unwrap();
    assert!(simplified.contains("orders"));
    assert!(simplified.contains("order_items"));
    assert!(!simplified.contains("events"));
    assert!(out.join("schema_documentation_simplified.md").exists());
    assert!(out.join("schema_diagram.mmd").exists());
}

#[test]
fn test_simplified_missing_table_is_warning() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "shop.csv", SHOP);
    let out = dir.path().join("docs");

    let output = generate(
        &input,
        &out,
        &[
            "--formats",
            "md",
            "--simplified",
            "--include-tables",
            "events,ghosts",
            "--json",
        ],
    );
    assert!(output.status.success());

    let json = parse_json(&output);
    let warnings = json["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].as_str().unwrap().contains("ghosts"));

    let doc = fs::read_to_string(out.join("schema_documentation_simplified.md")).unwrap();
    assert!(doc.contains("proj.shop.events"));
}

#[test]
fn test_strict_fails_on_warning() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "schema.csv",
        "table_name,column_name,data_type\norders,id,STRING\norders,x,\n",
    );
    let out = dir.path().join("docs");

    let output = generate(&input, &out, &["--formats", "md", "--strict"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--strict"));
    // Outputs are still written before failing
    assert!(out.join("schema_documentation.md").exists());
}

#[test]
fn test_gzip_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("schema.csv.gz");
    let mut encoder = flate2::write::GzEncoder::new(
        fs::File::create(&input).unwrap(),
        flate2::Compression::default(),
    );
    encoder.write_all(THREE_ROWS.as_bytes()).unwrap();
    encoder.finish().unwrap();
    let out = dir.path().join("docs");

    let output = generate(&input, &out, &["--formats", "json", "--json"]);
    assert!(output.status.success());

    let json = parse_json(&output);
    assert_eq!(json["statistics"]["tables"], 2);
    assert_eq!(json["statistics"]["relationships"], 1);
}

#[test]
fn test_directory_of_mixed_exports() {
    let dir = TempDir::new().unwrap();
    let exports = dir.path().join("exports");
    fs::create_dir_all(&exports).unwrap();
    fs::write(
        exports.join("orders.csv"),
        "table_name,column_name,data_type\nsales.orders,id,STRING\nsales.orders,customer_id,STRING\n",
    )
    .unwrap();
    fs::write(
        exports.join("customers.json"),
        r#"[{"table_name": "sales.customers", "columns": [{"name": "id", "type": "STRING"}]}]"#,
    )
    .unwrap();
    fs::write(exports.join("README.txt"), "not a schema").unwrap();
    let out = dir.path().join("docs");

    let output = generate(&exports, &out, &["--formats", "json", "--json"]);
    assert!(output.status.success());

    let json = parse_json(&output);
    assert_eq!(json["input_files"], 2);
    assert_eq!(json["statistics"]["tables"], 2);
    assert_eq!(json["statistics"]["relationships"], 1);
}

#[test]
fn test_config_file() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "schema.csv", THREE_ROWS);
    let out = dir.path().join("from-config");
    let config = write_input(
        &dir,
        "docgen.yaml",
        &format!(
            "dataset_name: Warehouse\noutput_dir: {}\nformats: [csv, markdown]\n",
            out.display()
        ),
    );

    let output = schema_docgen_bin()
        .arg("generate")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    assert!(out.join("schema_export.csv").exists());
    assert!(!out.join("schema.json").exists());
    let markdown = fs::read_to_string(out.join("schema_documentation.md")).unwrap();
    assert!(markdown.starts_with("# Warehouse Schema Documentation"));
}

#[test]
fn test_name_flag_overrides_config() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "schema.csv", THREE_ROWS);
    let config = write_input(&dir, "docgen.yaml", "dataset_name: FromFile\n");
    let out = dir.path().join("docs");

    let output = generate(
        &input,
        &out,
        &[
            "--config",
            config.to_str().unwrap(),
            "--name",
            "FromFlag",
            "--formats",
            "md",
        ],
    );
    assert!(output.status.success());

    let markdown = fs::read_to_string(out.join("schema_documentation.md")).unwrap();
    assert!(markdown.starts_with("# FromFlag Schema Documentation"));
}

#[test]
fn test_invalid_config_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "schema.csv", THREE_ROWS);
    let config = write_input(&dir, "docgen.yaml", "formats: [pdf]\n");

    let output = generate(
        &input,
        &dir.path().join("docs"),
        &["--config", config.to_str().unwrap()],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid configuration"));
}

#[test]
fn test_unknown_format_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "schema.csv", THREE_ROWS);

    let output = generate(&input, &dir.path().join("docs"), &["--formats", "pdf"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown format"));
}

#[test]
fn test_stats_json() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "shop.csv", SHOP);

    let output = schema_docgen_bin()
        .args(["stats", input.to_str().unwrap(), "--top", "2", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = parse_json(&output);
    assert_eq!(json["total_tables"], 5);
    assert_eq!(json["total_relationships"], 3);
    assert_eq!(json["tables_without_relationships"], 1);
    let top = json["top_tables"].as_array().unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0]["name"], "proj.shop.orders");
}

#[test]
fn test_stats_text() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "shop.csv", SHOP);

    let output = schema_docgen_bin()
        .args(["stats", input.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Tables: 5"));
    assert!(stdout.contains("Most connected tables:"));
}

#[test]
fn test_completions() {
    let output = schema_docgen_bin()
        .args(["completions", "bash"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("schema-docgen"));
}
