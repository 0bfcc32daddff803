//! Relationship graph analysis.
//!
//! This module provides:
//! - Per-table relationship counts and degree centrality
//! - Core entity detection and connectivity (undirected BFS)
//! - Simplified views filtered by importance and name patterns

pub mod analysis;
pub mod view;

pub use analysis::{
    centrality_scores, connected_tables, core_entities, relationship_counts, table_statistics,
    top_tables, DistributionBucket, RelationshipCounts, TableRank, TableStatistics,
};
pub use view::{simplify, FilterConfig, SimplifiedSchema};
