//! YAML configuration for the generate command.
//!
//! Every setting can also be given on the command line; flags take
//! precedence over file values.
//!
//! ```yaml
//! dataset_name: sales
//! output_dir: ./schema-docs
//! formats: [markdown, uml, csv]
//! input_format: csv
//! simplified:
//!   enabled: true
//!   min_relationships: 3
//!   include_tables: [orders]
//!   exclude_patterns: ["*_backup", "tmp_*"]
//! ```

use crate::error::{Error, Result};
use crate::graph::FilterConfig;
use crate::input::InputFormat;
use crate::render::OutputFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Simplified view section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimplifiedConfig {
    /// Also write `_simplified` outputs
    pub enabled: bool,
    pub min_relationships: Option<usize>,
    pub include_tables: Vec<String>,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub top_n: Option<usize>,
    pub include_connected: Option<bool>,
}

impl SimplifiedConfig {
    /// Filter rules from this section, defaults for anything unset
    pub fn filter_config(&self) -> FilterConfig {
        let defaults = FilterConfig::default();
        FilterConfig {
            min_relationships: self
                .min_relationships
                .unwrap_or(defaults.min_relationships),
            include_tables: self.include_tables.clone(),
            include_patterns: self.include_patterns.clone(),
            exclude_patterns: self.exclude_patterns.clone(),
            top_n: self.top_n,
            include_connected: self
                .include_connected
                .unwrap_or(defaults.include_connected),
        }
    }
}

/// Complete YAML configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocgenConfig {
    /// Title used in generated documents
    pub dataset_name: Option<String>,
    pub output_dir: Option<PathBuf>,
    /// Format names as accepted by `--formats` (empty = defaults)
    pub formats: Vec<String>,
    pub input_format: Option<String>,
    pub simplified: SimplifiedConfig,
    #[serde(skip)]
    source: Option<PathBuf>,
}

impl DocgenConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: DocgenConfig =
            serde_yaml_ng::from_str(&content).map_err(|e| Error::InvalidConfig {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        config.source = Some(path.to_path_buf());
        tracing::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    fn invalid(&self, reason: String) -> Error {
        Error::InvalidConfig {
            path: self.source.clone().unwrap_or_default(),
            reason,
        }
    }

    /// Parsed `formats`, or `None` when the file does not set any
    pub fn output_formats(&self) -> Result<Option<Vec<OutputFormat>>> {
        if self.formats.is_empty() {
            return Ok(None);
        }
        OutputFormat::parse_list(&self.formats.join(","))
            .map(Some)
            .map_err(|e| self.invalid(e))
    }

    /// Parsed `input_format`
    pub fn input_format(&self) -> Result<Option<InputFormat>> {
        self.input_format
            .as_deref()
            .map(|f| f.parse().map_err(|e| self.invalid(e)))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_full_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docgen.yaml");
        fs::write(
            &path,
            r#"
dataset_name: sales
output_dir: out
formats: [md, uml]
input_format: json
simplified:
  enabled: true
  min_relationships: 3
  include_tables: [orders]
  exclude_patterns: ["*_backup"]
  include_connected: true
"#,
        )
        .unwrap();

        let config = DocgenConfig::load(&path).unwrap();
        assert_eq!(config.dataset_name.as_deref(), Some("sales"));
        assert_eq!(config.output_dir, Some(PathBuf::from("out")));
        assert_eq!(
            config.output_formats().unwrap(),
            Some(vec![
                OutputFormat::Markdown,
                OutputFormat::PlantUml,
                OutputFormat::Mermaid
            ])
        );
        assert_eq!(config.input_format().unwrap(), Some(InputFormat::Json));

        let filter = config.simplified.filter_config();
        assert!(config.simplified.enabled);
        assert_eq!(filter.min_relationships, 3);
        assert_eq!(filter.include_tables, vec!["orders"]);
        assert!(filter.include_connected);
        assert_eq!(filter.top_n, None);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: DocgenConfig = serde_yaml_ng::from_str("{}").unwrap();
        assert_eq!(config.output_formats().unwrap(), None);
        assert_eq!(config.input_format().unwrap(), None);
        assert_eq!(config.simplified.filter_config(), FilterConfig::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docgen.yaml");
        fs::write(&path, "dataset: typo\n").unwrap();

        assert!(matches!(
            DocgenConfig::load(&path),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_bad_format_reported() {
        let config = DocgenConfig {
            formats: vec!["pdf".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            config.output_formats(),
            Err(Error::InvalidConfig { .. })
        ));
    }
}
