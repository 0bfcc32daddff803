//! Simplified schema views: a filtered subset of tables keeping only the
//! relationships between them.

use crate::error::{Diagnostic, Error, Result};
use crate::graph::analysis::{connected_tables, core_entities, top_tables};
use crate::schema::{SchemaModel, Table};
use ahash::AHashSet;
use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Selection rules for a simplified view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    /// Tables with at least this many relationships are core entities
    pub min_relationships: usize,
    /// Always included (qualified or unambiguous short names)
    pub include_tables: Vec<String>,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub top_n: Option<usize>,
    /// Also pull in everything connected to `include_tables`
    pub include_connected: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_relationships: 2,
            include_tables: Vec::new(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            top_n: None,
            include_connected: false,
        }
    }
}

/// Result of [`simplify`]
#[derive(Debug)]
pub struct SimplifiedSchema {
    pub model: SchemaModel,
    /// Requested tables that do not exist in the source model
    pub missing_tables: Vec<String>,
}

impl SimplifiedSchema {
    pub fn diagnostics(&self) -> impl Iterator<Item = Diagnostic> + '_ {
        self.missing_tables
            .iter()
            .map(|table| Diagnostic::MissingIncludedTable {
                table: table.clone(),
            })
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| Error::InvalidPattern {
                pattern: p.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

fn matches_any(patterns: &[Pattern], table: &Table) -> bool {
    patterns.iter().any(|p| {
        p.matches_with(&table.short_name, MATCH_OPTIONS)
            || p.matches_with(&table.qualified_name, MATCH_OPTIONS)
    })
}

/// Tables passing the include/exclude patterns. With no include patterns
/// every table starts selected.
fn pattern_selection<'a>(
    model: &'a SchemaModel,
    include: &[Pattern],
    exclude: &[Pattern],
) -> AHashSet<&'a str> {
    model
        .tables()
        .iter()
        .filter(|t| include.is_empty() || matches_any(include, t))
        .filter(|t| !matches_any(exclude, t))
        .map(|t| t.qualified_name.as_str())
        .collect()
}

/// Build a simplified view of `model`.
///
/// Selection order: explicit tables, core entities, connected tables of the
/// explicit ones; then the pattern filter (when any pattern is given); then
/// the top-N tables. An empty selection falls back to the core entities.
pub fn simplify(model: &SchemaModel, config: &FilterConfig) -> Result<SimplifiedSchema> {
    let include = compile_patterns(&config.include_patterns)?;
    let exclude = compile_patterns(&config.exclude_patterns)?;

    let mut selected: AHashSet<&str> = AHashSet::new();
    let mut missing_tables = Vec::new();

    let mut explicit: Vec<&str> = Vec::new();
    for name in &config.include_tables {
        match model.resolve_table(name) {
            Some(table) => explicit.push(table.qualified_name.as_str()),
            None => missing_tables.push(name.clone()),
        }
    }
    selected.extend(explicit.iter().copied());

    if config.min_relationships > 0 {
        selected.extend(core_entities(model, config.min_relationships));
    }

    if config.include_connected && !explicit.is_empty() {
        selected.extend(connected_tables(model, &explicit));
    }

    if !include.is_empty() || !exclude.is_empty() {
        let by_pattern = pattern_selection(model, &include, &exclude);
        tracing::debug!("{} tables match patterns", by_pattern.len());
        selected.retain(|name| by_pattern.contains(name));
    }

    if let Some(n) = config.top_n {
        selected.extend(top_tables(model, n).into_iter().map(|(name, _)| name));
    }

    if selected.is_empty() && config.min_relationships > 0 {
        selected.extend(core_entities(model, config.min_relationships));
    }

    let mut simplified = SchemaModel::new().with_name(model.name.clone());
    for table in model.tables() {
        if selected.contains(table.qualified_name.as_str()) {
            simplified.push_table(table.clone());
        }
    }
    simplified.set_relationships(
        model
            .relationships()
            .iter()
            .filter(|r| {
                selected.contains(r.source_table.as_str())
                    && selected.contains(r.target_table.as_str())
            })
            .cloned()
            .collect(),
    );

    tracing::info!(
        "simplified view: {} of {} tables, {} of {} relationships",
        simplified.table_count(),
        model.table_count(),
        simplified.relationship_count(),
        model.relationship_count()
    );

    Ok(SimplifiedSchema {
        model: simplified,
        missing_tables,
    })
}
