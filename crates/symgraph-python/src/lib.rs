use anyhow::Result;
use tree_sitter::{Language as Grammar, Node};

use symgraph_core::analyzer::{check_grammar, parse_with, LanguageExtractor, ParsedFile};
use symgraph_core::syntax::*;
use symgraph_core::types::*;

/// Base classes that turn a Python class into an enum.
const ENUM_BASES: &[&str] = &["Enum", "IntEnum", "StrEnum", "Flag", "IntFlag"];

/// Python language extractor using tree-sitter.
pub struct PythonExtractor {
    grammar: Grammar,
}

impl PythonExtractor {
    pub fn new() -> Result<Self> {
        let grammar: Grammar = tree_sitter_python::LANGUAGE.into();
        check_grammar(&grammar, "Python")?;
        Ok(Self { grammar })
    }
}

impl LanguageExtractor for PythonExtractor {
    fn language(&self) -> Language {
        Language::Python
    }

    fn file_extensions(&self) -> &[&str] {
        &["py", "pyi"]
    }

    fn parse_file(&self, path: &str, content: &str) -> Result<ParsedFile> {
        parse_with(&self.grammar, "Python", path, content)
    }

    fn symbols(&self, parsed: &ParsedFile) -> Vec<Symbol> {
        let mut walker = Walker::new(parsed, false);
        walker.walk(parsed.tree.root_node(), Scope::root());
        walker.symbols
    }

    fn imports(&self, parsed: &ParsedFile) -> Vec<DependencyRecord> {
        let root = parsed.tree.root_node();
        let mut deps = Vec::new();
        for stmt in named_children(root) {
            match stmt.kind() {
                "import_statement" => extract_plain_imports(stmt, parsed, &mut deps),
                "import_from_statement" => extract_from_import(stmt, parsed, &mut deps),
                _ => {}
            }
        }
        deps
    }

    fn call_sites(&self, parsed: &ParsedFile) -> Vec<CallSite> {
        let mut walker = Walker::new(parsed, true);
        walker.walk(parsed.tree.root_node(), Scope::root());
        walker.calls
    }
}

/// One pass over a Python syntax tree.
struct Walker<'a> {
    source: &'a str,
    path: &'a str,
    collect_calls: bool,
    symbols: Vec<Symbol>,
    calls: Vec<CallSite>,
}

impl<'a> Walker<'a> {
    fn new(parsed: &'a ParsedFile, collect_calls: bool) -> Self {
        Self {
            source: &parsed.content,
            path: &parsed.path,
            collect_calls,
            symbols: Vec::new(),
            calls: Vec::new(),
        }
    }

    fn walk_children(&mut self, node: Node, scope: Scope) {
        for child in named_children(node) {
            self.walk(child, scope);
        }
    }

    fn walk(&mut self, node: Node, scope: Scope) {
        if node.is_error() {
            return;
        }
        match node.kind() {
            "class_definition" => self.visit_class(node, &[], scope),
            "function_definition" => self.visit_function(node, &[], scope),
            "decorated_definition" => {
                let decorators: Vec<String> = named_children(node)
                    .into_iter()
                    .filter(|c| c.kind() == "decorator")
                    .map(|c| decorator_name(c, self.source))
                    .collect();
                match node.child_by_field_name("definition") {
                    Some(def) if def.kind() == "class_definition" => {
                        self.visit_class(def, &decorators, scope)
                    }
                    Some(def) if def.kind() == "function_definition" => {
                        self.visit_function(def, &decorators, scope)
                    }
                    Some(def) => self.walk(def, scope),
                    None => {}
                }
            }
            "expression_statement" => {
                if scope.is_top_level() {
                    self.visit_assignment(node, scope);
                }
                self.walk_children(node, scope);
            }
            "call" => {
                self.record_call(node, scope);
                self.walk_children(node, scope);
            }
            _ => self.walk_children(node, scope),
        }
    }

    fn visit_class(&mut self, node: Node, decorators: &[String], scope: Scope) {
        let Some(name) = declaration_name(node, self.source) else {
            tracing::debug!(path = self.path, line = start_line(node), "skipping unnamed class");
            return;
        };
        let qualified = scope.qualify(&name);

        let mut bases = Vec::new();
        let mut metaclass = None;
        if let Some(args) = node.child_by_field_name("superclasses") {
            for arg in named_children(args) {
                match arg.kind() {
                    "keyword_argument" => {
                        if field_text(arg, "name", self.source).as_deref() == Some("metaclass") {
                            metaclass = field_text(arg, "value", self.source);
                        }
                    }
                    "identifier" | "attribute" | "subscript" => {
                        bases.push(node_text(arg, self.source))
                    }
                    _ => {}
                }
            }
        }
        let base_names: Vec<String> = bases.iter().map(|b| simple_type_name(b)).collect();
        let is_enum = base_names.iter().any(|b| ENUM_BASES.contains(&b.as_str()));
        let is_abstract = base_names.iter().any(|b| b == "ABC")
            || metaclass.as_deref().is_some_and(|m| m.ends_with("ABCMeta"));

        let mut metadata = Metadata::new();
        if let Some(first) = bases.first() {
            put_str(&mut metadata, keys::BASE_CLASS, first.clone());
        }
        put_list(&mut metadata, keys::BASE_CLASSES, &bases);
        put_list(&mut metadata, keys::DECORATORS, decorators);
        put_flag(&mut metadata, keys::IS_ABSTRACT, is_abstract);
        put_flag(
            &mut metadata,
            keys::IS_PROTOCOL,
            base_names.iter().any(|b| b == "Protocol"),
        );
        let type_params = field_text(node, "type_parameters", self.source).unwrap_or_default();
        put_str(&mut metadata, keys::TYPE_PARAMETERS, type_params.clone());

        let signature = if bases.is_empty() {
            format!("class {name}{type_params}")
        } else {
            format!("class {name}{type_params}({})", bases.join(", "))
        };
        let body = node.child_by_field_name("body");
        let kind = if is_enum {
            SymbolKind::Enum
        } else {
            SymbolKind::Class
        };

        self.symbols.push(
            Symbol::new(
                &name,
                kind,
                Language::Python,
                self.path,
                start_line(node),
                &qualified,
                Visibility::from_name_convention(&name),
            )
            .with_span(end_line(node), start_column(node))
            .with_signature(Some(collapse_whitespace(&signature)))
            .with_documentation(docstring(body, self.source))
            .with_metadata(metadata),
        );

        if let Some(body) = body {
            self.walk_children(body, Scope::enter_class(&qualified, &name));
        }
    }

    fn visit_function(&mut self, node: Node, decorators: &[String], scope: Scope) {
        let Some(name) = declaration_name(node, self.source) else {
            tracing::debug!(path = self.path, line = start_line(node), "skipping unnamed function");
            return;
        };
        let qualified = scope.qualify(&name);
        let kind = scope.callable_kind();
        let is_async = has_child_kind(node, "async");
        let params = field_text(node, "parameters", self.source).unwrap_or_default();
        let return_type = field_text(node, "return_type", self.source);
        let type_params = field_text(node, "type_parameters", self.source).unwrap_or_default();

        let has_decorator = |wanted: &str| {
            decorators
                .iter()
                .any(|d| d == wanted || d.ends_with(&format!(".{wanted}")))
        };
        let is_property = has_decorator("property")
            || decorators
                .iter()
                .any(|d| d.ends_with(".setter") || d.ends_with(".getter"));

        let mut metadata = Metadata::new();
        if kind == SymbolKind::Method {
            if let Some(class) = scope.class_name {
                put_str(&mut metadata, keys::PARENT_CLASS, class);
            }
            put_flag(&mut metadata, keys::IS_CONSTRUCTOR, name == "__init__");
        }
        put_flag(&mut metadata, keys::IS_ASYNC, is_async);
        put_flag(&mut metadata, keys::IS_STATIC, has_decorator("staticmethod"));
        put_flag(&mut metadata, keys::IS_CLASSMETHOD, has_decorator("classmethod"));
        put_flag(&mut metadata, keys::IS_PROPERTY, is_property);
        put_flag(&mut metadata, keys::IS_ABSTRACT, has_decorator("abstractmethod"));
        put_list(&mut metadata, keys::DECORATORS, decorators);
        put_str(&mut metadata, keys::TYPE_PARAMETERS, type_params.clone());
        put_str(&mut metadata, keys::PARAMETERS, collapse_whitespace(&params));
        if let Some(ret) = &return_type {
            put_str(&mut metadata, keys::RETURN_TYPE, ret.clone());
        }

        let mut signature = String::new();
        if is_async {
            signature.push_str("async ");
        }
        signature.push_str(&format!("def {name}{type_params}{params}"));
        if let Some(ret) = &return_type {
            signature.push_str(&format!(" -> {ret}"));
        }
        let body = node.child_by_field_name("body");

        self.symbols.push(
            Symbol::new(
                &name,
                kind,
                Language::Python,
                self.path,
                start_line(node),
                &qualified,
                Visibility::from_name_convention(&name),
            )
            .with_span(end_line(node), start_column(node))
            .with_signature(Some(collapse_whitespace(&signature)))
            .with_documentation(docstring(body, self.source))
            .with_metadata(metadata),
        );

        if let Some(body) = body {
            let caller = scope.call_key(&name);
            self.walk_children(body, Scope::enter_function(&qualified, &caller));
        }
    }

    /// Module-level `NAME = value` and `name: T = value` bindings.
    fn visit_assignment(&mut self, stmt: Node, scope: Scope) {
        let Some(assignment) = named_children(stmt)
            .into_iter()
            .find(|c| c.kind() == "assignment")
        else {
            return;
        };
        let Some(left) = assignment.child_by_field_name("left") else {
            return;
        };
        if left.kind() != "identifier" {
            return;
        }
        let name = node_text(left, self.source);
        let kind = if is_constant_name(&name) {
            SymbolKind::Constant
        } else {
            SymbolKind::Variable
        };
        let annotation = field_text(assignment, "type", self.source);
        let signature = annotation.as_ref().map(|t| format!("{name}: {t}"));

        self.symbols.push(
            Symbol::new(
                &name,
                kind,
                Language::Python,
                self.path,
                start_line(stmt),
                scope.qualify(&name),
                Visibility::from_name_convention(&name),
            )
            .with_span(end_line(stmt), start_column(stmt))
            .with_signature(signature),
        );
    }

    fn record_call(&mut self, node: Node, scope: Scope) {
        if !self.collect_calls {
            return;
        }
        let Some(caller) = scope.caller else {
            return;
        };
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        let callee = match function.kind() {
            "identifier" => Some(node_text(function, self.source)),
            "attribute" => field_text(function, "attribute", self.source),
            _ => None,
        };
        if let Some(callee) = callee {
            self.calls.push(CallSite {
                caller: caller.to_string(),
                callee,
                line: start_line(node),
            });
        }
    }
}

/// Decorator text without the `@` and without call arguments.
fn decorator_name(node: Node, source: &str) -> String {
    let text = node_text(node, source);
    let text = text.trim_start_matches('@').trim();
    text.split('(').next().unwrap_or(text).trim().to_string()
}

/// The docstring of a class or function: the first statement of the body when
/// it is a bare string literal.
fn docstring(body: Option<Node>, source: &str) -> Option<String> {
    let body = body?;
    let first = named_children(body)
        .into_iter()
        .find(|c| c.kind() != "comment")?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let literal = named_children(first).into_iter().next()?;
    if literal.kind() != "string" {
        return None;
    }
    let raw = node_text(literal, source);
    let raw = raw.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    clean_docstring(raw)
}

/// Strip the quotes of a docstring literal and remove the indentation shared
/// by every line after the first. Content is otherwise kept as written.
fn clean_docstring(raw: &str) -> Option<String> {
    let body = ["\"\"\"", "'''"]
        .iter()
        .find_map(|q| raw.strip_prefix(q).and_then(|r| r.strip_suffix(q)))
        .map(str::to_string)
        .unwrap_or_else(|| unquote(raw));

    let mut lines = body.lines();
    let first = lines.next().unwrap_or_default().trim().to_string();
    let rest: Vec<&str> = lines.collect();
    let indent = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned = vec![first];
    cleaned.extend(
        rest.iter()
            .map(|l| l.get(indent..).unwrap_or_else(|| l.trim_start()).trim_end().to_string()),
    );
    let start = cleaned.iter().position(|l| !l.is_empty())?;
    let end = cleaned.iter().rposition(|l| !l.is_empty())?;
    Some(cleaned[start..=end].join("\n"))
}

/// `import a.b` and `import a.b as c`.
fn extract_plain_imports(stmt: Node, parsed: &ParsedFile, deps: &mut Vec<DependencyRecord>) {
    for name in field_children(stmt, "name") {
        let (target, alias) = match name.kind() {
            "aliased_import" => (
                field_text(name, "name", &parsed.content),
                field_text(name, "alias", &parsed.content),
            ),
            _ => (Some(node_text(name, &parsed.content)), None),
        };
        let Some(target) = target else {
            continue;
        };
        let mut dep = DependencyRecord::import(&parsed.path, target, start_line(stmt));
        dep.alias = alias;
        deps.push(dep);
    }
}

/// `from a import b`, `from a import b as c`, `from a import *`, `from . import x`.
fn extract_from_import(stmt: Node, parsed: &ParsedFile, deps: &mut Vec<DependencyRecord>) {
    let Some(module) = field_text(stmt, "module_name", &parsed.content) else {
        return;
    };
    let names: Vec<String> = field_children(stmt, "name")
        .into_iter()
        .filter_map(|n| match n.kind() {
            "aliased_import" => field_text(n, "name", &parsed.content),
            _ => Some(node_text(n, &parsed.content)),
        })
        .collect();
    let aliases: Vec<String> = field_children(stmt, "name")
        .into_iter()
        .filter(|n| n.kind() == "aliased_import")
        .filter_map(|n| field_text(n, "alias", &parsed.content))
        .collect();

    let mut dep = DependencyRecord::import(&parsed.path, module.clone(), start_line(stmt));
    dep.is_external = !module.starts_with('.');
    dep.is_wildcard = has_child_kind(stmt, "wildcard_import");
    dep.imported_names = names;
    if aliases.len() == 1 {
        dep.alias = aliases.into_iter().next();
    }
    deps.push(dep);
}
