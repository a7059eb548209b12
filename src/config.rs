//! Analysis configuration.
//!
//! Read from a YAML file (`callscope.yaml` by default). Every field is
//! optional; command-line flags override file values.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file names to search for.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["callscope.yaml", ".callscope.yaml"];

pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_MERMAID_MAX_EDGES: usize = 50;

/// Config loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid excluded_paths pattern {pattern:?}: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// How calls made outside any declaration are treated in the orchestrator table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModuleCallPolicy {
    /// Count them under the `<module>` caller.
    #[default]
    Sentinel,
    /// Leave them out of the orchestrator table.
    Omit,
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Glob patterns for paths to exclude, matched against root-relative paths.
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Whether to analyze test files (default: true)
    #[serde(default)]
    pub include_test_files: Option<bool>,
    /// Analyze files whose syntax tree contains errors (default: false)
    #[serde(default)]
    pub allow_partial_parse: Option<bool>,
    #[serde(default)]
    pub module_calls: Option<ModuleCallPolicy>,
    /// Rows in the most-called and orchestrator tables (default: 10)
    #[serde(default)]
    pub top_n: Option<usize>,
    /// Edge cap for the Mermaid diagram (default: 50)
    #[serde(default)]
    pub mermaid_max_edges: Option<usize>,
    /// Analyze files in parallel (default: true)
    #[serde(default)]
    pub parallel: Option<bool>,
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn parse_str(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes to unit, not a map.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Find a config file in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    pub fn should_include_test_files(&self) -> bool {
        self.include_test_files.unwrap_or(true)
    }

    pub fn allows_partial_parse(&self) -> bool {
        self.allow_partial_parse.unwrap_or(false)
    }

    pub fn module_call_policy(&self) -> ModuleCallPolicy {
        self.module_calls.unwrap_or_default()
    }

    pub fn top_n(&self) -> usize {
        self.top_n.unwrap_or(DEFAULT_TOP_N)
    }

    pub fn mermaid_max_edges(&self) -> usize {
        self.mermaid_max_edges.unwrap_or(DEFAULT_MERMAID_MAX_EDGES)
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel.unwrap_or(true)
    }

    /// Compile `excluded_paths` into a single matcher.
    pub fn exclusion_matcher(&self) -> Result<globset::GlobSet, ConfigError> {
        let mut builder = globset::GlobSetBuilder::new();
        for pattern in &self.excluded_paths {
            let glob = globset::Glob::new(pattern).map_err(|source| ConfigError::Glob {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|source| ConfigError::Glob {
            pattern: self.excluded_paths.join(", "),
            source,
        })
    }

    /// Validate a config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_n == Some(0) {
            return Err(ConfigError::Zero { field: "top_n" });
        }
        if self.mermaid_max_edges == Some(0) {
            return Err(ConfigError::Zero {
                field: "mermaid_max_edges",
            });
        }
        self.exclusion_matcher()?;
        Ok(())
    }
}

/// Commented default config written by `callscope init`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# callscope configuration

# Glob patterns (relative to the analyzed directory) to skip.
excluded_paths:
  - "**/migrations/**"

# Analyze test_*.py, *_test.py, conftest.py and files under tests/.
include_test_files: true

# Analyze files that contain syntax errors instead of skipping them.
allow_partial_parse: false

# Module-level calls in the orchestrator table: "sentinel" counts them
# under <module>, "omit" leaves them out.
module_calls: sentinel

# Rows in the most-called and orchestrator tables.
top_n: 10

# Maximum number of edges drawn in diagram.mermaid.
mermaid_max_edges: 50

# Analyze files in parallel.
parallel: true
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
excluded_paths:
  - "**/generated/**"
include_test_files: false
module_calls: omit
top_n: 5
"#;
        let config = Config::parse_str(yaml).unwrap();
        assert_eq!(config.excluded_paths, vec!["**/generated/**"]);
        assert!(!config.should_include_test_files());
        assert_eq!(config.module_call_policy(), ModuleCallPolicy::Omit);
        assert_eq!(config.top_n(), 5);
        assert_eq!(config.mermaid_max_edges(), DEFAULT_MERMAID_MAX_EDGES);
        assert!(config.is_parallel());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = Config::parse_str("").unwrap();
        assert!(config.should_include_test_files());
        assert!(!config.allows_partial_parse());
        assert_eq!(config.module_call_policy(), ModuleCallPolicy::Sentinel);
        assert_eq!(config.top_n(), DEFAULT_TOP_N);
    }

    #[test]
    fn test_template_is_valid() {
        let config = Config::parse_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.excluded_paths.len(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config {
            top_n: Some(0),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Zero { field: "top_n" })));

        let config = Config {
            excluded_paths: vec!["[unclosed".to_string()],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Glob { .. })));
    }

    #[test]
    fn test_unknown_policy_rejected() {
        assert!(Config::parse_str("module_calls: drop\n").is_err());
    }

    #[test]
    fn test_path_exclusion() {
        let config = Config {
            excluded_paths: vec!["**/migrations/**".to_string(), "setup.py".to_string()],
            ..Default::default()
        };
        let matcher = config.exclusion_matcher().unwrap();
        assert!(matcher.is_match(Path::new("app/migrations/0001_initial.py")));
        assert!(matcher.is_match(Path::new("setup.py")));
        assert!(!matcher.is_match(Path::new("app/models.py")));
    }

    #[test]
    fn test_discover() {
        let temp = TempDir::new().unwrap();
        assert!(Config::discover(temp.path()).is_none());

        fs::write(temp.path().join(".callscope.yaml"), "top_n: 3\n").unwrap();
        let found = Config::discover(temp.path()).unwrap();
        assert_eq!(Config::parse_file(found).unwrap().top_n(), 3);
    }
}
