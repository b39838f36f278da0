use std::collections::HashSet;

use anyhow::Result;
use tree_sitter::{Language as Grammar, Parser, Tree};

use crate::error::SymgraphError;
use crate::syntax::CallSite;
use crate::types::{DependencyRecord, Language, Symbol};

/// A parsed source file with its tree-sitter tree and original content.
pub struct ParsedFile {
    pub path: String,
    pub tree: Tree,
    pub content: String,
}

/// Check that `grammar` loads into the linked tree-sitter runtime.
pub fn check_grammar(grammar: &Grammar, name: &str) -> Result<(), SymgraphError> {
    Parser::new()
        .set_language(grammar)
        .map_err(|e| SymgraphError::Grammar {
            language: name.to_string(),
            message: e.to_string(),
        })
}

/// Parse `content` with `grammar`.
pub fn parse_with(grammar: &Grammar, name: &str, path: &str, content: &str) -> Result<ParsedFile> {
    let mut parser = Parser::new();
    parser
        .set_language(grammar)
        .map_err(|e| SymgraphError::Grammar {
            language: name.to_string(),
            message: e.to_string(),
        })?;
    let tree = parser
        .parse(content, None)
        .ok_or_else(|| SymgraphError::Parse {
            path: path.to_string(),
        })?;
    Ok(ParsedFile {
        path: path.to_string(),
        tree,
        content: content.to_string(),
    })
}

/// Trait that each language extractor must implement.
///
/// Implementations hold no per-file state: everything a walk needs is passed
/// through its arguments, so one instance can serve many threads.
pub trait LanguageExtractor: Send + Sync {
    /// Language tag stamped on every produced symbol.
    fn language(&self) -> Language;

    /// File extensions this extractor handles (e.g., &["py"])
    fn file_extensions(&self) -> &[&str];

    /// Parse a source file into a ParsedFile.
    fn parse_file(&self, path: &str, content: &str) -> Result<ParsedFile>;

    /// Extract declarations from a parsed file as one flat list.
    fn symbols(&self, parsed: &ParsedFile) -> Vec<Symbol>;

    /// Extract import records from the file's top-level statements.
    fn imports(&self, parsed: &ParsedFile) -> Vec<DependencyRecord>;

    /// Walk the file and collect the call sites inside each function body.
    fn call_sites(&self, parsed: &ParsedFile) -> Vec<CallSite>;

    /// Extract symbols from source text. Never fails: a file that cannot be
    /// parsed yields an empty list.
    fn extract_symbols(&self, content: &str, path: &str) -> Vec<Symbol> {
        match self.parse_file(path, content) {
            Ok(parsed) => self.symbols(&parsed),
            Err(e) => {
                tracing::warn!(path, error = %e, "failed to parse file, no symbols extracted");
                Vec::new()
            }
        }
    }

    /// Extract import and call records from source text.
    ///
    /// `known_symbols` are the symbols of this file when the caller already has
    /// them; otherwise they are extracted here.
    fn extract_dependencies(
        &self,
        content: &str,
        path: &str,
        known_symbols: Option<&[Symbol]>,
    ) -> Vec<DependencyRecord> {
        let parsed = match self.parse_file(path, content) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(path, error = %e, "failed to parse file, no dependencies extracted");
                return Vec::new();
            }
        };
        let owned;
        let known = match known_symbols {
            Some(symbols) => symbols,
            None => {
                owned = self.symbols(&parsed);
                &owned
            }
        };
        let mut deps = self.imports(&parsed);
        deps.extend(link_call_sites(path, self.call_sites(&parsed), known));
        deps
    }
}

/// Pair call sites with the symbols of their file.
///
/// A call survives only when its caller key names a known function or method.
/// The callee is internal when some symbol of the file carries that name.
/// Repeated `(caller, callee)` pairs keep their first occurrence.
pub fn link_call_sites(
    path: &str,
    sites: Vec<CallSite>,
    known_symbols: &[Symbol],
) -> Vec<DependencyRecord> {
    let callers: HashSet<String> = known_symbols
        .iter()
        .filter(|s| s.kind.is_callable())
        .map(Symbol::call_key)
        .collect();
    let local_names: HashSet<&str> = known_symbols.iter().map(|s| s.name.as_str()).collect();

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut records = Vec::new();
    for site in sites {
        if !callers.contains(&site.caller) || site.callee.is_empty() {
            continue;
        }
        let key = (site.caller.clone(), site.callee.clone());
        if !seen.insert(key) {
            continue;
        }
        let is_external = !local_names.contains(site.callee.as_str());
        records.push(DependencyRecord::call(
            path,
            site.caller,
            site.callee,
            site.line,
            is_external,
        ));
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{keys, DependencyKind, Metadata, SymbolKind, Visibility};

    fn func(name: &str, parent: Option<&str>) -> Symbol {
        let mut metadata = Metadata::new();
        let mut kind = SymbolKind::Function;
        if let Some(p) = parent {
            metadata.insert(keys::PARENT_CLASS.to_string(), p.into());
            kind = SymbolKind::Method;
        }
        Symbol::new(name, kind, Language::Python, "a.py", 1, name, Visibility::Public)
            .with_metadata(metadata)
    }

    fn site(caller: &str, callee: &str, line: usize) -> CallSite {
        CallSite {
            caller: caller.to_string(),
            callee: callee.to_string(),
            line,
        }
    }

    #[test]
    fn test_link_call_sites_pairs_known_callers() {
        let known = vec![func("helper", None), func("main", None), func("run", Some("App"))];
        let sites = vec![
            site("main", "helper", 3),
            site("App.run", "print", 7),
            site("ghost", "helper", 9),
        ];
        let records = link_call_sites("a.py", sites, &known);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, DependencyKind::Call);
        assert_eq!(records[0].caller.as_deref(), Some("main"));
        assert_eq!(records[0].callee.as_deref(), Some("helper"));
        assert!(!records[0].is_external);
        assert_eq!(records[1].caller.as_deref(), Some("App.run"));
        assert!(records[1].is_external);
    }

    #[test]
    fn test_link_call_sites_collapses_duplicates() {
        let known = vec![func("helper", None), func("main", None)];
        let sites = vec![site("main", "helper", 3), site("main", "helper", 4)];
        let records = link_call_sites("a.py", sites, &known);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].line, Some(3));
    }
}
