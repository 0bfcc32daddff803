//! Relationship metrics over a schema model: per-table degree counts,
//! centrality, core entities, and connectivity.

use crate::schema::SchemaModel;
use ahash::{AHashMap, AHashSet};
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};

/// Degree of a table in the relationship graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct RelationshipCounts {
    pub incoming: usize,
    pub outgoing: usize,
    pub total: usize,
}

/// Relationship counts for every table, in model order. Tables without any
/// relationship get a zero row.
pub fn relationship_counts(model: &SchemaModel) -> Vec<(&str, RelationshipCounts)> {
    let mut by_table: AHashMap<&str, RelationshipCounts> = AHashMap::new();

    for rel in model.relationships() {
        let from = by_table.entry(rel.source_table.as_str()).or_default();
        from.outgoing += 1;
        from.total += 1;

        let to = by_table.entry(rel.target_table.as_str()).or_default();
        to.incoming += 1;
        to.total += 1;
    }

    model
        .tables()
        .iter()
        .map(|t| {
            let name = t.qualified_name.as_str();
            (name, by_table.get(name).copied().unwrap_or_default())
        })
        .collect()
}

/// Degree centrality normalized to `0.0..=1.0` against the busiest table
pub fn centrality_scores(model: &SchemaModel) -> Vec<(&str, f64)> {
    let counts = relationship_counts(model);
    let max = counts.iter().map(|(_, c)| c.total).max().unwrap_or(0);

    counts
        .into_iter()
        .map(|(name, c)| {
            let score = if max > 0 {
                c.total as f64 / max as f64
            } else {
                0.0
            };
            (name, score)
        })
        .collect()
}

/// Tables with at least `min_relationships` relationships, in model order
pub fn core_entities(model: &SchemaModel, min_relationships: usize) -> Vec<&str> {
    let core: Vec<&str> = relationship_counts(model)
        .into_iter()
        .filter(|(_, c)| c.total >= min_relationships)
        .map(|(name, _)| name)
        .collect();

    tracing::debug!(
        "{} core entities (>= {} relationships) out of {} tables",
        core.len(),
        min_relationships,
        model.table_count()
    );
    core
}

/// Every table reachable from `seeds` when relationships are followed in
/// either direction. Seeds are included. Result is in model order.
pub fn connected_tables<'a>(model: &'a SchemaModel, seeds: &[&str]) -> Vec<&'a str> {
    let mut adjacency: AHashMap<&str, Vec<&str>> = AHashMap::new();
    for rel in model.relationships() {
        adjacency
            .entry(rel.source_table.as_str())
            .or_default()
            .push(rel.target_table.as_str());
        adjacency
            .entry(rel.target_table.as_str())
            .or_default()
            .push(rel.source_table.as_str());
    }

    let mut visited: AHashSet<&str> = AHashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();

    for seed in seeds {
        if let Some(table) = model.table(seed) {
            let name = table.qualified_name.as_str();
            if visited.insert(name) {
                queue.push_back(name);
            }
        }
    }

    while let Some(current) = queue.pop_front() {
        if let Some(neighbors) = adjacency.get(current) {
            for &neighbor in neighbors {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
    }

    model
        .tables()
        .iter()
        .map(|t| t.qualified_name.as_str())
        .filter(|name| visited.contains(name))
        .collect()
}

/// Top `n` tables by total relationships, ties in model order
pub fn top_tables(model: &SchemaModel, n: usize) -> Vec<(&str, RelationshipCounts)> {
    let mut counts = relationship_counts(model);
    // Stable sort keeps model order among equal totals
    counts.sort_by(|a, b| b.1.total.cmp(&a.1.total));
    counts.truncate(n);
    counts
}

/// A ranked table in [`TableStatistics`]
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TableRank {
    pub name: String,
    pub total: usize,
    pub incoming: usize,
    pub outgoing: usize,
    pub centrality: f64,
}

/// Number of tables that have exactly `relationships` relationships
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub struct DistributionBucket {
    pub relationships: usize,
    pub tables: usize,
}

/// Relationship statistics for a whole model
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TableStatistics {
    pub total_tables: usize,
    pub total_relationships: usize,
    pub tables_with_relationships: usize,
    pub tables_without_relationships: usize,
    /// Ascending by relationship count
    pub relationship_distribution: Vec<DistributionBucket>,
    pub top_tables: Vec<TableRank>,
    pub average_relationships: f64,
}

/// Compute statistics, listing the `top` busiest tables
pub fn table_statistics(model: &SchemaModel, top: usize) -> TableStatistics {
    let counts = relationship_counts(model);
    let centrality: AHashMap<&str, f64> = centrality_scores(model).into_iter().collect();

    let mut distribution: BTreeMap<usize, usize> = BTreeMap::new();
    for (_, c) in &counts {
        *distribution.entry(c.total).or_default() += 1;
    }

    let with = counts.iter().filter(|(_, c)| c.total > 0).count();
    let sum: usize = counts.iter().map(|(_, c)| c.total).sum();
    let average = if counts.is_empty() {
        0.0
    } else {
        sum as f64 / counts.len() as f64
    };

    let top_tables = top_tables(model, top)
        .into_iter()
        .map(|(name, c)| TableRank {
            name: name.to_string(),
            total: c.total,
            incoming: c.incoming,
            outgoing: c.outgoing,
            centrality: centrality.get(name).copied().unwrap_or(0.0),
        })
        .collect();

    TableStatistics {
        total_tables: counts.len(),
        total_relationships: model.relationship_count(),
        tables_with_relationships: with,
        tables_without_relationships: counts.len() - with,
        relationship_distribution: distribution
            .into_iter()
            .map(|(relationships, tables)| DistributionBucket {
                relationships,
                tables,
            })
            .collect(),
        top_tables,
        average_relationships: average,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{infer_relationships, Column, Table};

    /// hub <- a, hub <- b, a <- c, plus an isolated table
    fn create_test_model() -> SchemaModel {
        let mut model = SchemaModel::new();
        let tables = [
            ("hubs", "id"),
            ("a", "id hub_id"),
            ("b", "id hub_id"),
            ("c", "id a_id"),
            ("lonely", "id"),
        ];
        for (name, columns) in tables {
            let mut table = Table::new(name);
            table.columns = columns
                .split_whitespace()
                .map(|c| Column::new(c, "INT64"))
                .collect();
            model.push_table(table);
        }
        let inference = infer_relationships(&model);
        model.set_relationships(inference.relationships);
        model
    }

    #[test]
    fn test_relationship_counts() {
        let model = create_test_model();
        let counts: AHashMap<_, _> = relationship_counts(&model).into_iter().collect();

        assert_eq!(counts["hubs"].incoming, 2);
        assert_eq!(counts["hubs"].outgoing, 0);
        assert_eq!(counts["a"].total, 2);
        assert_eq!(counts["lonely"], RelationshipCounts::default());
    }

    #[test]
    fn test_centrality() {
        let model = create_test_model();
        let scores: AHashMap<_, _> = centrality_scores(&model).into_iter().collect();

        assert_eq!(scores["hubs"], 1.0);
        assert_eq!(scores["c"], 0.5);
        assert_eq!(scores["lonely"], 0.0);
    }

    #[test]
    fn test_core_entities() {
        let model = create_test_model();
        assert_eq!(core_entities(&model, 2), vec!["hubs", "a"]);
        assert_eq!(core_entities(&model, 0).len(), 5);
    }

    #[test]
    fn test_connected_tables_undirected() {
        let model = create_test_model();
        assert_eq!(connected_tables(&model, &["c"]), vec!["hubs", "a", "b", "c"]);
        assert_eq!(connected_tables(&model, &["lonely"]), vec!["lonely"]);
        assert!(connected_tables(&model, &["missing"]).is_empty());
    }

    #[test]
    fn test_top_tables_ties_in_model_order() {
        let model = create_test_model();
        let top: Vec<_> = top_tables(&model, 2).into_iter().map(|(n, _)| n).collect();
        assert_eq!(top, vec!["hubs", "a"]);
    }

    #[test]
    fn test_table_statistics() {
        let model = create_test_model();
        let stats = table_statistics(&model, 3);

        assert_eq!(stats.total_tables, 5);
        assert_eq!(stats.total_relationships, 3);
        assert_eq!(stats.tables_with_relationships, 4);
        assert_eq!(stats.tables_without_relationships, 1);
        assert_eq!(stats.top_tables.len(), 3);
        assert_eq!(
            stats.relationship_distribution[0],
            DistributionBucket {
                relationships: 0,
                tables: 1
            }
        );
        assert!((stats.average_relationships - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_empty_relationships() {
        let mut model = SchemaModel::new();
        model.push_table(Table::new("t"));
        let scores = centrality_scores(&model);
        assert_eq!(scores, vec![("t", 0.0)]);
    }
}
