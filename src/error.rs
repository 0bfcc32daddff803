//! Error and diagnostic types shared by the ingestion and rendering phases.
//!
//! Hard failures are [`Error`] values. Everything the pipeline can recover
//! from (a skipped row, an unreadable file, an ambiguous link) is a
//! [`Diagnostic`] collected into [`Diagnostics`] and handed back alongside
//! the model.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no tables found in the provided input")]
    EmptySchema,

    #[error("no input files found at: {}", .0.display())]
    NoInputFiles(PathBuf),

    #[error("cannot write {}: {source}", path.display())]
    UnwritableOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid input document {source_name}: {reason}")]
    InvalidInputDocument { source_name: String, reason: String },

    #[error("invalid configuration {}: {reason}", path.display())]
    InvalidConfig { path: PathBuf, reason: String },

    #[error("invalid table pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Where inside an input document a diagnostic was raised
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// 1-based line of a CSV row
    Line(u64),
    /// Index of a JSON table node, and of the column entry inside it
    Entry { table: usize, column: Option<usize> },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Line(line) => write!(f, "line {}", line),
            Location::Entry {
                table,
                column: Some(column),
            } => write!(f, "entry {}, column {}", table, column),
            Location::Entry {
                table,
                column: None,
            } => write!(f, "entry {}", table),
        }
    }
}

/// Recoverable issue found while ingesting or analyzing a schema
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A row or entry lacked required fields and was skipped
    MalformedRecord {
        source: String,
        location: Location,
        reason: String,
    },
    /// A whole input file could not be parsed and was skipped
    InvalidInputDocument { source: String, reason: String },
    /// A column matched several candidate tables; the first one was used
    AmbiguousRelationship {
        table: String,
        column: String,
        chosen: String,
        candidates: Vec<String>,
    },
    /// A table explicitly requested for a simplified view does not exist
    MissingIncludedTable { table: String },
}

impl Diagnostic {
    pub fn is_malformed_record(&self) -> bool {
        matches!(self, Diagnostic::MalformedRecord { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MalformedRecord {
                source,
                location,
                reason,
            } => write!(f, "Skipped record in {} ({}): {}", source, location, reason),
            Diagnostic::InvalidInputDocument { source, reason } => {
                write!(f, "Skipped file {}: {}", source, reason)
            }
            Diagnostic::AmbiguousRelationship {
                table,
                column,
                chosen,
                candidates,
            } => write!(
                f,
                "Ambiguous relationship for {}.{}: linked to {} (candidates: {})",
                table,
                column,
                chosen,
                candidates.join(", ")
            ),
            Diagnostic::MissingIncludedTable { table } => {
                write!(f, "Requested table not found in schema: {}", table)
            }
        }
    }
}

/// Collects diagnostics for the whole run
#[derive(Debug)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    max_items: usize,
    dropped: usize,
    dropped_malformed: usize,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::with_limit(1000)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            items: Vec::new(),
            max_items: limit,
            dropped: 0,
            dropped_malformed: 0,
        }
    }

    /// Add a diagnostic. Exact duplicates are kept once; past the limit
    /// diagnostics are only counted.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("{}", diagnostic);
        if self.items.contains(&diagnostic) {
            return;
        }
        if self.items.len() < self.max_items {
            self.items.push(diagnostic);
        } else {
            self.dropped += 1;
            if diagnostic.is_malformed_record() {
                self.dropped_malformed += 1;
            }
        }
    }

    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.dropped == 0
    }

    /// Total number of diagnostics, including the ones past the limit
    pub fn count(&self) -> usize {
        self.items.len() + self.dropped
    }

    /// Skipped records, including the ones past the limit
    pub fn malformed_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_malformed_record()).count() + self.dropped_malformed
    }

    /// Print summary of diagnostics to stderr
    pub fn print_summary(&self) {
        if self.is_empty() {
            return;
        }

        eprintln!("\nWarnings ({}):", self.count());
        for diagnostic in &self.items {
            eprintln!("  ⚠ {}", diagnostic);
        }

        if self.dropped > 0 {
            eprintln!("  ... ({} additional warnings truncated)", self.dropped);
        }
    }
}
