use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::{DependencyRecord, Symbol};

/// Cached extraction results for a single file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedFile {
    pub hash: String,
    pub symbols: Vec<Symbol>,
    pub dependencies: Vec<DependencyRecord>,
}

/// Symbol cache stored in `.symgraph/cache.json`, keyed by relative path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolCache {
    /// Version that wrote the cache; entries from another version are discarded.
    #[serde(default)]
    pub version: String,
    pub files: HashMap<String, CachedFile>,
}

pub const CACHE_DIR: &str = ".symgraph";
const CACHE_FILE: &str = "cache.json";

impl SymbolCache {
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            files: HashMap::new(),
        }
    }

    /// Load the cache for a project root; a missing cache is empty.
    pub fn load(project_root: &Path) -> Result<Self> {
        let cache_path = project_root.join(CACHE_DIR).join(CACHE_FILE);
        if !cache_path.exists() {
            return Ok(Self::new());
        }
        let content =
            std::fs::read_to_string(&cache_path).context("failed to read symbol cache")?;
        let cache: Self = serde_json::from_str(&content).context("failed to parse symbol cache")?;
        if cache.version != env!("CARGO_PKG_VERSION") {
            tracing::debug!(cached = %cache.version, "discarding cache from another version");
            return Ok(Self::new());
        }
        Ok(cache)
    }

    pub fn save(&self, project_root: &Path) -> Result<()> {
        let cache_dir = project_root.join(CACHE_DIR);
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("failed to create {CACHE_DIR} directory"))?;
        let content =
            serde_json::to_string_pretty(self).context("failed to serialize symbol cache")?;
        std::fs::write(cache_dir.join(CACHE_FILE), content)
            .context("failed to write symbol cache")?;
        Ok(())
    }

    /// Cached entry for a file if its content is unchanged.
    pub fn get(&self, rel_path: &str, content: &str) -> Option<&CachedFile> {
        let cached = self.files.get(rel_path)?;
        (cached.hash == compute_hash(content)).then_some(cached)
    }

    /// Insert or replace a file's entry.
    pub fn insert(
        &mut self,
        rel_path: String,
        content: &str,
        symbols: Vec<Symbol>,
        dependencies: Vec<DependencyRecord>,
    ) {
        self.files.insert(
            rel_path,
            CachedFile {
                hash: compute_hash(content),
                symbols,
                dependencies,
            },
        );
    }

    /// Remove entries for files that no longer exist.
    pub fn prune(&mut self, existing_files: &[String]) {
        let existing: std::collections::HashSet<&str> =
            existing_files.iter().map(String::as_str).collect();
        self.files.retain(|path, _| existing.contains(path.as_str()));
    }
}

/// SHA-256 of file content, hex encoded.
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
