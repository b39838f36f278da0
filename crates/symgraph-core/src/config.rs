use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::graph::GraphType;
use crate::types::Language;

/// File name looked up in the project directory and its ancestors.
pub const CONFIG_FILE: &str = ".symgraph.toml";

/// Top-level configuration from `.symgraph.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Languages to analyze; empty means every supported language.
    #[serde(default)]
    pub languages: Vec<Language>,
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,
}

fn default_exclude_patterns() -> Vec<String> {
    [
        "**/node_modules/**",
        "**/target/**",
        "**/.git/**",
        "**/dist/**",
        "**/build/**",
        "**/__pycache__/**",
        "**/*.d.ts",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            languages: Vec::new(),
            exclude_patterns: default_exclude_patterns(),
        }
    }
}

impl ProjectConfig {
    /// Whether files of `language` should be analyzed.
    pub fn includes(&self, language: Language) -> bool {
        self.languages.is_empty() || self.languages.contains(&language)
    }
}

/// Defaults for `symgraph graph`; command-line flags take precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub graph_type: GraphType,
    #[serde(default = "default_format")]
    pub format: String,
    /// Depth limit applied after building; 0 keeps the whole graph.
    #[serde(default)]
    pub max_depth: usize,
}

fn default_format() -> String {
    "json".to_string()
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            graph_type: GraphType::default(),
            format: default_format(),
            max_depth: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Reuse symbols of unchanged files from `.symgraph/cache.json`.
    #[serde(default)]
    pub enabled: bool,
}

impl Config {
    /// Load configuration from a `.symgraph.toml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "failed to parse '{}'. Run `symgraph init` to create a valid config file",
                path.display()
            )
        })?;
        Ok(config)
    }

    /// Load from `.symgraph.toml` in the given directory or any ancestor, or return defaults.
    pub fn load_or_default(dir: &Path) -> Self {
        let start = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let mut current = start.as_path();
        loop {
            let config_path = current.join(CONFIG_FILE);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => {
                        tracing::debug!(path = %config_path.display(), "loaded config");
                        config
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %config_path.display(),
                            "failed to load config: {e:#}. Using defaults"
                        );
                        Self::default()
                    }
                };
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        Self::default()
    }

    /// Generate default TOML content for `symgraph init`.
    pub fn default_toml() -> String {
        r#"# symgraph - symbol extraction and dependency graph configuration

[project]
# Languages to analyze: python, java, kotlin, typescript, javascript.
# Leave empty to analyze every supported language.
languages = []
exclude_patterns = [
    "**/node_modules/**",
    "**/target/**",
    "**/.git/**",
    "**/dist/**",
    "**/build/**",
    "**/__pycache__/**",
    "**/*.d.ts",
]

[graph]
# file | module | class | function | symbol
graph_type = "file"
# json | dot | graphml
format = "json"
# Keep only nodes within this many hops of a root; 0 keeps everything
max_depth = 0

[cache]
# Reuse extraction results for unchanged files (.symgraph/cache.json)
enabled = false
"#
        .to_string()
    }
}
