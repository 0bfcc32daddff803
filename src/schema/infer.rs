//! Naming-convention relationship inference.
//!
//! A column such as `customer_id` is read as a reference to a table named
//! `customer`/`customers`. Only naming is used; no data is sampled.

use super::{Cardinality, Confidence, Relationship, SchemaModel, Table};
use crate::error::Diagnostic;

/// Column suffixes that mark a foreign key, checked in order
const FK_SUFFIXES: &[&str] = &["_id", "_uuid", "_key"];

/// A column that matched more than one candidate table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity {
    pub table: String,
    pub column: String,
    /// Qualified name of the table the relationship was linked to
    pub chosen: String,
    /// Every candidate, in model order (includes `chosen`)
    pub candidates: Vec<String>,
}

impl Ambiguity {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::AmbiguousRelationship {
            table: self.table.clone(),
            column: self.column.clone(),
            chosen: self.chosen.clone(),
            candidates: self.candidates.clone(),
        }
    }
}

/// Result of relationship inference
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inference {
    pub relationships: Vec<Relationship>,
    pub ambiguities: Vec<Ambiguity>,
}

/// Split a lower-cased column name into its stem if it carries a foreign key
/// suffix (`customer_id` -> `customer`).
fn fk_stem(column: &str) -> Option<&str> {
    FK_SUFFIXES.iter().find_map(|suffix| {
        column
            .strip_suffix(suffix)
            .filter(|stem| !stem.is_empty())
    })
}

fn strip_plural(name: &str) -> &str {
    name.strip_suffix('s').unwrap_or(name)
}

/// Stem and short name agree exactly or as singular/plural of each other,
/// in either direction (`user_id` -> `users`, `users_id` -> `user`)
fn exact_name_match(stem: &str, short: &str) -> bool {
    fn plural_of(plural: &str, singular: &str) -> bool {
        plural.strip_suffix('s') == Some(singular) || plural.strip_suffix("es") == Some(singular)
    }
    short == stem || plural_of(short, stem) || plural_of(stem, short)
}

/// Column a relationship to `target` should point at: `id` when present,
/// then a column named like the source column. Names compare
/// case-insensitively; the stored spelling is returned.
fn key_column<'a>(target: &'a Table, source_column: &str) -> Option<&'a str> {
    let find = |name: &str| {
        target
            .columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    };
    find("id")
        .or_else(|| find(source_column))
        .map(|c| c.name.as_str())
}

/// Tables other than `source` accepted by `pred`, in model order
fn candidates<'a>(
    tables: &'a [Table],
    shorts: &[String],
    source: &Table,
    pred: impl Fn(&Table, &str) -> bool,
) -> Vec<&'a Table> {
    tables
        .iter()
        .zip(shorts)
        .filter(|(t, short)| t.qualified_name != source.qualified_name && pred(*t, short.as_str()))
        .map(|(t, _)| t)
        .collect()
}

/// Infer relationships from column naming conventions.
///
/// Rules, per source column carrying a foreign key suffix:
/// - exact: the target short name is the stem, or its singular or plural
///   form, and the target has an `id` column or one named like the source
///   column
/// - suffix: stem and short name agree once a trailing `s` is dropped from
///   both; links to the target's `id`
///
/// The source table is never a candidate. When several tables match the
/// winning rule, the first in model order is used and an [`Ambiguity`] is
/// recorded.
pub fn infer_relationships(model: &SchemaModel) -> Inference {
    let mut inference = Inference::default();
    let tables = model.tables();

    // Lower-cased short names, computed once
    let shorts: Vec<String> = tables.iter().map(|t| t.short_name.to_lowercase()).collect();

    for source in tables {
        for column in &source.columns {
            let lower = column.name.to_lowercase();
            let Some(stem) = fk_stem(&lower) else {
                continue;
            };

            let exact = candidates(tables, &shorts, source, |t, short| {
                exact_name_match(stem, short) && key_column(t, &column.name).is_some()
            });

            let (matches, confidence) = if !exact.is_empty() {
                (exact, Confidence::Exact)
            } else {
                let loose = candidates(tables, &shorts, source, |_, short| {
                    strip_plural(stem) == strip_plural(short)
                });
                if loose.is_empty() {
                    continue;
                }
                (loose, Confidence::Suffix)
            };

            let target = matches[0];
            let target_column = key_column(target, &column.name).unwrap_or("id");

            if matches.len() > 1 {
                inference.ambiguities.push(Ambiguity {
                    table: source.qualified_name.clone(),
                    column: column.name.clone(),
                    chosen: target.qualified_name.clone(),
                    candidates: matches.iter().map(|t| t.qualified_name.clone()).collect(),
                });
            }

            tracing::debug!(
                "{}.{} -> {}.{} ({})",
                source.qualified_name,
                column.name,
                target.qualified_name,
                target_column,
                confidence
            );

            inference.relationships.push(Relationship {
                source_table: source.qualified_name.clone(),
                source_column: column.name.clone(),
                target_table: target.qualified_name.clone(),
                target_column: target_column.to_string(),
                confidence,
                cardinality: Cardinality::ManyToOne,
            });
        }
    }

    inference
}
