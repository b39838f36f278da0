//! Helpers over tree-sitter nodes shared by every language extractor.
//!
//! Extractors walk the concrete syntax tree themselves; this module only
//! provides the small navigation, text and documentation utilities they all
//! need, plus the [`Scope`] value threaded through each recursive walk.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tree_sitter::Node;

use crate::types::{Metadata, SymbolKind};

/// Node kinds accepted as a fallback when a declaration has no `name` field.
pub const IDENTIFIER_KINDS: &[&str] = &[
    "identifier",
    "type_identifier",
    "simple_identifier",
    "property_identifier",
    "private_property_identifier",
];

/// Where a walk currently is inside a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Namespace,
    Class,
    Function,
}

/// Lexical context threaded explicitly through an extractor's recursive walk.
///
/// Nothing here is stored on the extractor, so walks over different files never
/// share state.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub kind: ScopeKind,
    /// Qualified name of the enclosing declaration.
    pub qualified_name: Option<&'a str>,
    /// Simple name of the innermost enclosing class.
    pub class_name: Option<&'a str>,
    /// Call key of the innermost enclosing function or method.
    pub caller: Option<&'a str>,
}

impl<'a> Scope<'a> {
    pub fn root() -> Self {
        Self {
            kind: ScopeKind::Module,
            qualified_name: None,
            class_name: None,
            caller: None,
        }
    }

    /// Qualified name for a declaration named `name` in this scope.
    pub fn qualify(&self, name: &str) -> String {
        match self.qualified_name {
            Some(parent) => format!("{parent}.{name}"),
            None => name.to_string(),
        }
    }

    pub fn enter_class(qualified_name: &'a str, class_name: &'a str) -> Self {
        Self {
            kind: ScopeKind::Class,
            qualified_name: Some(qualified_name),
            class_name: Some(class_name),
            caller: None,
        }
    }

    pub fn enter_namespace(qualified_name: &'a str) -> Self {
        Self {
            kind: ScopeKind::Namespace,
            qualified_name: Some(qualified_name),
            class_name: None,
            caller: None,
        }
    }

    pub fn enter_function(qualified_name: &'a str, caller: &'a str) -> Self {
        Self {
            kind: ScopeKind::Function,
            qualified_name: Some(qualified_name),
            class_name: None,
            caller: Some(caller),
        }
    }

    pub fn in_class(&self) -> bool {
        self.kind == ScopeKind::Class
    }

    /// Module or namespace level, where plain assignments become symbols.
    pub fn is_top_level(&self) -> bool {
        matches!(self.kind, ScopeKind::Module | ScopeKind::Namespace)
    }

    /// Kind for a function-shaped declaration found in this scope.
    pub fn callable_kind(&self) -> SymbolKind {
        if self.in_class() {
            SymbolKind::Method
        } else {
            SymbolKind::Function
        }
    }

    /// Call key for a callable named `name` declared in this scope.
    pub fn call_key(&self, name: &str) -> String {
        match self.class_name.filter(|_| self.in_class()) {
            Some(class) => format!("{class}.{name}"),
            None => name.to_string(),
        }
    }
}

/// A call expression observed inside a function or method body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub caller: String,
    pub callee: String,
    pub line: usize,
}

/// Extract text from a tree-sitter node.
pub fn node_text(node: Node, source: &str) -> String {
    source.get(node.byte_range()).unwrap_or_default().to_string()
}

/// Text of a named field child, if present.
pub fn field_text(node: Node, field: &str, source: &str) -> Option<String> {
    node.child_by_field_name(field)
        .map(|n| node_text(n, source))
        .filter(|t| !t.is_empty())
}

/// All children (named and anonymous) of a node.
pub fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Named children of a node.
pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// All children attached to a repeated named field.
pub fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

/// First direct child of the given kind.
pub fn child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    children(node).into_iter().find(|c| c.kind() == kind)
}

/// Whether a node has a direct (usually anonymous keyword) child of the given kind.
pub fn has_child_kind(node: Node, kind: &str) -> bool {
    children(node).iter().any(|c| c.kind() == kind)
}

/// Resolve a declaration's name: the `name` field first, then the first
/// identifier-shaped direct child.
pub fn declaration_name(node: Node, source: &str) -> Option<String> {
    if let Some(name) = field_text(node, "name", source) {
        return Some(name);
    }
    named_children(node)
        .into_iter()
        .find(|c| IDENTIFIER_KINDS.contains(&c.kind()))
        .map(|c| node_text(c, source))
        .filter(|t| !t.is_empty())
}

/// 1-based start line.
pub fn start_line(node: Node) -> usize {
    node.start_position().row + 1
}

/// 1-based end line.
pub fn end_line(node: Node) -> usize {
    node.end_position().row + 1
}

/// 1-based start column.
pub fn start_column(node: Node) -> usize {
    node.start_position().column + 1
}

/// Collapse runs of whitespace (including newlines) to single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reduce a type reference to the simple name used for graph matching.
///
/// `com.example.Base<T>` -> `Base`, `Base()` -> `Base`, `Base?` -> `Base`.
pub fn simple_type_name(text: &str) -> String {
    let cut = text
        .find(['<', '(', '['])
        .map(|i| &text[..i])
        .unwrap_or(text);
    let cut = cut.trim().trim_end_matches('?');
    cut.rsplit('.').next().unwrap_or(cut).trim().to_string()
}

/// Whether a name follows the UPPER_SNAKE_CASE constant convention.
pub fn is_constant_name(name: &str) -> bool {
    static CONSTANT: OnceLock<Regex> = OnceLock::new();
    CONSTANT
        .get_or_init(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("valid constant regex"))
        .is_match(name)
}

/// Strip one level of matching quotes from a string literal.
pub fn unquote(text: &str) -> String {
    let t = text.trim();
    for q in ['"', '\'', '`'] {
        if t.len() >= 2 && t.starts_with(q) && t.ends_with(q) {
            return t[1..t.len() - 1].to_string();
        }
    }
    t.to_string()
}

/// Find the doc comment attached to a declaration.
///
/// Walks backward through previous siblings, stepping over kinds listed in
/// `transparent` (decorators, annotations), until a comment node is reached.
/// The comment is accepted only when its raw text starts with `marker`.
pub fn preceding_doc_comment(
    node: Node,
    source: &str,
    marker: &str,
    transparent: &[&str],
) -> Option<String> {
    let mut current = node.prev_sibling();
    while let Some(sibling) = current {
        let kind = sibling.kind();
        if kind.contains("comment") {
            let raw = node_text(sibling, source);
            if raw.starts_with(marker) {
                return clean_doc_comment(&raw);
            }
            return None;
        }
        if !transparent.contains(&kind) {
            return None;
        }
        current = sibling.prev_sibling();
    }
    None
}

/// Clean a Javadoc/KDoc/JSDoc block (`/** ... */`) or a run of `///` or `#`
/// line comments: strip the delimiters and per-line `*`, `///` or `#` markers,
/// and drop `@tag` lines. Returns `None` when nothing remains.
///
/// Python docstrings are string literals, not comments, and are cleaned by
/// the Python extractor instead.
pub fn clean_doc_comment(raw: &str) -> Option<String> {
    static LEADING_MARKER: OnceLock<Regex> = OnceLock::new();
    let leading = LEADING_MARKER.get_or_init(|| {
        Regex::new(r"^\s*(?:\*+|///?|#+)\s?").expect("valid doc marker regex")
    });

    let mut body = raw.trim();
    for open in ["/**", "/*!", "/*"] {
        if let Some(rest) = body.strip_prefix(open) {
            body = rest;
            break;
        }
    }
    if let Some(rest) = body.strip_suffix("*/") {
        body = rest;
    }

    let lines: Vec<String> = body
        .lines()
        .map(|line| leading.replace(line, "").trim_end().to_string())
        .filter(|line| !line.trim_start().starts_with('@'))
        .collect();

    let start = lines.iter().position(|l| !l.trim().is_empty())?;
    let end = lines.iter().rposition(|l| !l.trim().is_empty())?;
    let text = lines[start..=end]
        .iter()
        .map(|l| l.trim())
        .collect::<Vec<_>>()
        .join("\n");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Insert a string entry, skipping empty values.
pub fn put_str(metadata: &mut Metadata, key: &str, value: impl Into<String>) {
    let value = value.into();
    if !value.is_empty() {
        metadata.insert(key.to_string(), Value::String(value));
    }
}

/// Insert a string list entry, skipping empty lists.
pub fn put_list(metadata: &mut Metadata, key: &str, values: &[String]) {
    if !values.is_empty() {
        metadata.insert(
            key.to_string(),
            Value::Array(values.iter().cloned().map(Value::String).collect()),
        );
    }
}

/// Insert a boolean flag only when it is set.
pub fn put_flag(metadata: &mut Metadata, key: &str, set: bool) {
    if set {
        metadata.insert(key.to_string(), Value::Bool(true));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_qualify_nesting() {
        let root = Scope::root();
        assert_eq!(root.qualify("Outer"), "Outer");
        let class = Scope::enter_class("Outer", "Outer");
        assert_eq!(class.qualify("Inner"), "Outer.Inner");
        assert_eq!(class.callable_kind(), SymbolKind::Method);
        assert_eq!(class.call_key("run"), "Outer.run");
        let func = Scope::enter_function("Outer.run", "Outer.run");
        assert_eq!(func.qualify("helper"), "Outer.run.helper");
        assert_eq!(func.callable_kind(), SymbolKind::Function);
        assert_eq!(func.call_key("helper"), "helper");
    }

    #[test]
    fn test_clean_javadoc() {
        let raw = "/**\n * Saves the user.\n *\n * More detail here.\n * @param user the user\n * @return nothing\n */";
        assert_eq!(
            clean_doc_comment(raw).as_deref(),
            Some("Saves the user.\n\nMore detail here.")
        );
    }

    #[test]
    fn test_clean_single_line_and_empty() {
        assert_eq!(clean_doc_comment("/** Short. */").as_deref(), Some("Short."));
        assert_eq!(clean_doc_comment("/** @deprecated */"), None);
        assert_eq!(
            clean_doc_comment("/// Returns the answer.\n/// @since 2.0").as_deref(),
            Some("Returns the answer.")
        );
    }

    #[test]
    fn test_simple_type_name() {
        assert_eq!(simple_type_name("com.example.Base<T>"), "Base");
        assert_eq!(simple_type_name("Base()"), "Base");
        assert_eq!(simple_type_name("Repo?"), "Repo");
        assert_eq!(simple_type_name("abc.ABC"), "ABC");
        assert_eq!(simple_type_name("Plain"), "Plain");
    }

    #[test]
    fn test_constant_name() {
        assert!(is_constant_name("MAX_SIZE"));
        assert!(is_constant_name("PI"));
        assert!(!is_constant_name("maxSize"));
        assert!(!is_constant_name("_HIDDEN"));
    }

    #[test]
    fn test_unquote_and_collapse() {
        assert_eq!(unquote("'./util'"), "./util");
        assert_eq!(unquote("\"react\""), "react");
        assert_eq!(collapse_whitespace("fn  a(\n  x,\n  y)"), "fn a( x, y)");
    }
}
