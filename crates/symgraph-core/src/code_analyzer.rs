use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analyzer::{link_call_sites, LanguageExtractor};
use crate::types::{DependencyRecord, Language, Symbol, SymbolKind, Visibility};

/// Symbols and dependency records extracted from one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub path: String,
    pub language: Language,
    pub symbols: Vec<Symbol>,
    pub dependencies: Vec<DependencyRecord>,
}

/// Counts over a symbol list. Maps are keyed by the lowercase tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolStatistics {
    pub total: usize,
    pub exported: usize,
    pub files: usize,
    pub by_kind: BTreeMap<String, usize>,
    pub by_visibility: BTreeMap<String, usize>,
    pub by_language: BTreeMap<String, usize>,
}

/// Dispatches files to the extractor registered for their language.
pub struct CodeAnalyzer {
    extractors: HashMap<Language, Box<dyn LanguageExtractor>>,
}

impl CodeAnalyzer {
    /// Register extractors; a later extractor for the same language replaces an earlier one.
    pub fn new(extractors: Vec<Box<dyn LanguageExtractor>>) -> Self {
        let extractors = extractors
            .into_iter()
            .map(|e| (e.language(), e))
            .collect();
        Self { extractors }
    }

    /// Language of a path by extension, whether or not an extractor is registered.
    pub fn detect_language(path: &str) -> Option<Language> {
        Language::from_path(Path::new(path))
    }

    /// Whether some registered extractor handles this path.
    pub fn supports(&self, path: &str) -> bool {
        Self::detect_language(path).is_some_and(|lang| self.extractors.contains_key(&lang))
    }

    pub fn languages(&self) -> Vec<Language> {
        let mut languages: Vec<Language> = self.extractors.keys().copied().collect();
        languages.sort();
        languages
    }

    pub fn extractor(&self, language: Language) -> Option<&dyn LanguageExtractor> {
        self.extractors.get(&language).map(|e| e.as_ref())
    }

    /// Extract symbols and dependencies from one file, parsing it once.
    ///
    /// Returns `None` for unsupported paths. A file that fails to parse
    /// yields an empty analysis.
    pub fn analyze_file(&self, path: &str, content: &str) -> Option<FileAnalysis> {
        let language = Self::detect_language(path)?;
        let Some(extractor) = self.extractors.get(&language) else {
            tracing::debug!(path, %language, "no extractor registered");
            return None;
        };

        let (symbols, dependencies) = match extractor.parse_file(path, content) {
            Ok(parsed) => {
                let symbols = extractor.symbols(&parsed);
                let mut dependencies = extractor.imports(&parsed);
                dependencies.extend(link_call_sites(path, extractor.call_sites(&parsed), &symbols));
                (symbols, dependencies)
            }
            Err(e) => {
                tracing::warn!(path, error = %e, "failed to parse file");
                (Vec::new(), Vec::new())
            }
        };

        Some(FileAnalysis {
            path: path.to_string(),
            language,
            symbols,
            dependencies,
        })
    }

    /// Analyze `(path, content)` pairs in parallel. Unsupported files are
    /// dropped; the rest keep their input order.
    pub fn analyze_files(&self, files: &[(String, String)]) -> Vec<FileAnalysis> {
        files
            .par_iter()
            .filter_map(|(path, content)| self.analyze_file(path, content))
            .collect()
    }
}

/// Concatenate the symbols of every file, file by file.
pub fn aggregate(results: &[FileAnalysis]) -> Vec<Symbol> {
    results.iter().flat_map(|r| r.symbols.iter().cloned()).collect()
}

/// Concatenate the dependency records of every file, file by file.
pub fn aggregate_dependencies(results: &[FileAnalysis]) -> Vec<DependencyRecord> {
    results
        .iter()
        .flat_map(|r| r.dependencies.iter().cloned())
        .collect()
}

pub fn filter_by_kind<'a>(
    symbols: impl IntoIterator<Item = &'a Symbol>,
    kind: SymbolKind,
) -> Vec<&'a Symbol> {
    symbols.into_iter().filter(|s| s.kind == kind).collect()
}

pub fn filter_by_visibility<'a>(
    symbols: impl IntoIterator<Item = &'a Symbol>,
    visibility: Visibility,
) -> Vec<&'a Symbol> {
    symbols
        .into_iter()
        .filter(|s| s.visibility == visibility)
        .collect()
}

pub fn filter_by_language<'a>(
    symbols: impl IntoIterator<Item = &'a Symbol>,
    language: Language,
) -> Vec<&'a Symbol> {
    symbols
        .into_iter()
        .filter(|s| s.language == language)
        .collect()
}

pub fn exported_only<'a>(symbols: impl IntoIterator<Item = &'a Symbol>) -> Vec<&'a Symbol> {
    symbols.into_iter().filter(|s| s.is_exported).collect()
}

/// Case-insensitive substring match on name or qualified name.
pub fn search<'a>(symbols: impl IntoIterator<Item = &'a Symbol>, query: &str) -> Vec<&'a Symbol> {
    let query = query.to_lowercase();
    symbols
        .into_iter()
        .filter(|s| {
            s.name.to_lowercase().contains(&query)
                || s.qualified_name.to_lowercase().contains(&query)
        })
        .collect()
}

pub fn statistics<'a>(symbols: impl IntoIterator<Item = &'a Symbol>) -> SymbolStatistics {
    let mut stats = SymbolStatistics::default();
    let mut files = BTreeSet::new();
    for symbol in symbols {
        stats.total += 1;
        if symbol.is_exported {
            stats.exported += 1;
        }
        files.insert(symbol.file_path.as_str());
        *stats.by_kind.entry(symbol.kind.as_str().to_string()).or_insert(0) += 1;
        *stats
            .by_visibility
            .entry(symbol.visibility.as_str().to_string())
            .or_insert(0) += 1;
        *stats
            .by_language
            .entry(symbol.language.as_str().to_string())
            .or_insert(0) += 1;
    }
    stats.files = files.len();
    stats
}
