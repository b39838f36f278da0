use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::ProjectConfig;
use crate::types::Language;

/// Compile glob patterns, skipping any that fail to parse.
fn build_globset(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => tracing::warn!(pattern = %pattern, "ignoring invalid exclude pattern: {e}"),
        }
    }
    builder.build().unwrap_or_else(|e| {
        tracing::warn!("failed to compile exclude patterns: {e}");
        GlobSet::empty()
    })
}

/// Decides which project files are analyzed.
pub struct PathFilter {
    excludes: GlobSet,
    languages: Vec<Language>,
}

impl PathFilter {
    pub fn new(config: &ProjectConfig) -> Self {
        Self {
            excludes: build_globset(&config.exclude_patterns),
            languages: config.languages.clone(),
        }
    }

    /// Whether a path relative to the project root matches an exclude pattern.
    pub fn is_excluded(&self, rel_path: &str) -> bool {
        self.excludes.is_match(rel_path) || self.excludes.is_match(format!("/{rel_path}"))
    }

    /// Language to analyze `rel_path` with, or `None` when it is skipped.
    pub fn language_for(&self, rel_path: &str) -> Option<Language> {
        if self.is_excluded(rel_path) {
            return None;
        }
        let language = Language::from_path(Path::new(rel_path))?;
        (self.languages.is_empty() || self.languages.contains(&language)).then_some(language)
    }
}
