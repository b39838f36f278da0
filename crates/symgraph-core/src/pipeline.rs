use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Result};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::cache::{SymbolCache, CACHE_DIR};
use crate::code_analyzer::{self, CodeAnalyzer, FileAnalysis, SymbolStatistics};
use crate::config::Config;
use crate::filter::PathFilter;
use crate::types::{DependencyRecord, Symbol};

/// Result of analyzing a project directory.
pub struct ProjectAnalysis {
    pub root: PathBuf,
    /// Per-file results, ordered by relative path.
    pub files: Vec<FileAnalysis>,
    pub symbols: Vec<Symbol>,
    pub dependencies: Vec<DependencyRecord>,
    /// Files whose results came from the cache.
    pub cached_files: usize,
}

impl ProjectAnalysis {
    pub fn statistics(&self) -> SymbolStatistics {
        code_analyzer::statistics(&self.symbols)
    }
}

/// Walks a project, extracts every supported file and aggregates the results.
pub struct AnalysisPipeline {
    analyzer: CodeAnalyzer,
    config: Config,
    filter: PathFilter,
}

impl AnalysisPipeline {
    pub fn new(analyzer: CodeAnalyzer, config: Config) -> Self {
        let filter = PathFilter::new(&config.project);
        Self {
            analyzer,
            config,
            filter,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn analyzer(&self) -> &CodeAnalyzer {
        &self.analyzer
    }

    /// Analyze every file under `project_path`.
    pub fn analyze(&self, project_path: &Path) -> Result<ProjectAnalysis> {
        self.analyze_inner(project_path, false)
    }

    /// Like [`analyze`](Self::analyze), reusing cached results for unchanged files.
    pub fn analyze_incremental(&self, project_path: &Path) -> Result<ProjectAnalysis> {
        self.analyze_inner(project_path, true)
    }

    /// Supported, non-excluded files as `(absolute, relative)` pairs sorted by
    /// relative path. A file path analyzes just that file.
    fn source_files(&self, project_path: &Path) -> Result<Vec<(PathBuf, String)>> {
        if project_path.is_file() {
            let rel = project_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            return Ok(if self.accepts(&rel) {
                vec![(project_path.to_path_buf(), rel)]
            } else {
                Vec::new()
            });
        }
        if !project_path.is_dir() {
            bail!("path '{}' does not exist", project_path.display());
        }

        let mut files: Vec<(PathBuf, String)> = WalkDir::new(project_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || e.file_name() != CACHE_DIR)
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!("skipping unreadable entry: {err}");
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let rel = relative_path(e.path(), project_path);
                self.accepts(&rel).then(|| (e.into_path(), rel))
            })
            .collect();
        files.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(files)
    }

    fn accepts(&self, rel_path: &str) -> bool {
        self.filter.language_for(rel_path).is_some() && self.analyzer.supports(rel_path)
    }

    fn analyze_inner(&self, project_path: &Path, incremental: bool) -> Result<ProjectAnalysis> {
        let source_files = self.source_files(project_path)?;
        let cache_root = if project_path.is_file() {
            project_path.parent().unwrap_or(project_path)
        } else {
            project_path
        };

        let mut cache = if incremental {
            SymbolCache::load(cache_root).unwrap_or_else(|e| {
                tracing::warn!("ignoring unusable symbol cache: {e:#}");
                SymbolCache::new()
            })
        } else {
            SymbolCache::new()
        };

        // `Some(content)` marks a freshly extracted file that the cache should learn.
        let results: Vec<(FileAnalysis, Option<String>)> = source_files
            .par_iter()
            .filter_map(|(abs_path, rel_path)| {
                let content = match std::fs::read_to_string(abs_path) {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::warn!(path = %abs_path.display(), "failed to read file: {e}");
                        return None;
                    }
                };
                if incremental {
                    if let Some(cached) = cache.get(rel_path, &content) {
                        let language = CodeAnalyzer::detect_language(rel_path)?;
                        let analysis = FileAnalysis {
                            path: rel_path.clone(),
                            language,
                            symbols: cached.symbols.clone(),
                            dependencies: cached.dependencies.clone(),
                        };
                        return Some((analysis, None));
                    }
                }
                let analysis = self.analyzer.analyze_file(rel_path, &content)?;
                Some((analysis, Some(content)))
            })
            .collect();

        let mut files = Vec::with_capacity(results.len());
        let mut cached_files = 0usize;
        for (analysis, content) in results {
            match content {
                Some(content) if incremental => cache.insert(
                    analysis.path.clone(),
                    &content,
                    analysis.symbols.clone(),
                    analysis.dependencies.clone(),
                ),
                Some(_) => {}
                None => cached_files += 1,
            }
            files.push(analysis);
        }

        if incremental {
            let present: Vec<String> = source_files.iter().map(|(_, rel)| rel.clone()).collect();
            cache.prune(&present);
            if let Err(e) = cache.save(cache_root) {
                tracing::warn!("failed to save symbol cache: {e:#}");
            }
        }

        let symbols = code_analyzer::aggregate(&files);
        let dependencies = code_analyzer::aggregate_dependencies(&files);
        tracing::info!(
            files = files.len(),
            cached = cached_files,
            symbols = symbols.len(),
            dependencies = dependencies.len(),
            "analysis complete"
        );

        Ok(ProjectAnalysis {
            root: project_path.to_path_buf(),
            files,
            symbols,
            dependencies,
            cached_files,
        })
    }
}

/// Path of `path` relative to `root` with `/` separators.
fn relative_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_uses_forward_slashes() {
        let root = Path::new("/project");
        let path = Path::new("/project/src/pkg/mod.py");
        assert_eq!(relative_path(path, root), "src/pkg/mod.py");
        assert_eq!(relative_path(Path::new("/elsewhere/a.py"), root), "elsewhere/a.py");
    }

    #[test]
    fn test_missing_project_is_an_error() {
        let pipeline = AnalysisPipeline::new(CodeAnalyzer::new(Vec::new()), Config::default());
        let result = pipeline.analyze(Path::new("/definitely/not/here"));
        assert!(result.is_err());
    }

    #[test]
    fn test_no_extractors_yields_empty_analysis() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.py"), "def main():\n    pass\n").unwrap();
        let pipeline = AnalysisPipeline::new(CodeAnalyzer::new(Vec::new()), Config::default());
        let analysis = pipeline.analyze(dir.path()).unwrap();
        assert!(analysis.files.is_empty());
        assert_eq!(analysis.statistics().total, 0);
    }
}
