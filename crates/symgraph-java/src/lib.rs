use anyhow::Result;
use tree_sitter::{Language as Grammar, Node};

use symgraph_core::analyzer::{check_grammar, parse_with, LanguageExtractor, ParsedFile};
use symgraph_core::syntax::*;
use symgraph_core::types::*;

/// Java language extractor using tree-sitter.
pub struct JavaExtractor {
    grammar: Grammar,
}

impl JavaExtractor {
    pub fn new() -> Result<Self> {
        let grammar: Grammar = tree_sitter_java::LANGUAGE.into();
        check_grammar(&grammar, "Java")?;
        Ok(Self { grammar })
    }
}

impl LanguageExtractor for JavaExtractor {
    fn language(&self) -> Language {
        Language::Java
    }

    fn file_extensions(&self) -> &[&str] {
        &["java"]
    }

    fn parse_file(&self, path: &str, content: &str) -> Result<ParsedFile> {
        parse_with(&self.grammar, "Java", path, content)
    }

    fn symbols(&self, parsed: &ParsedFile) -> Vec<Symbol> {
        let mut walker = Walker::new(parsed, false);
        walker.walk(parsed.tree.root_node(), Scope::root(), Visibility::Package);
        walker.symbols
    }

    fn imports(&self, parsed: &ParsedFile) -> Vec<DependencyRecord> {
        named_children(parsed.tree.root_node())
            .into_iter()
            .filter(|n| n.kind() == "import_declaration")
            .filter_map(|n| import_record(n, parsed))
            .collect()
    }

    fn call_sites(&self, parsed: &ParsedFile) -> Vec<CallSite> {
        let mut walker = Walker::new(parsed, true);
        walker.walk(parsed.tree.root_node(), Scope::root(), Visibility::Package);
        walker.calls
    }
}

/// Modifier keywords and annotation names read from a `modifiers` node.
#[derive(Default)]
struct Modifiers {
    keywords: Vec<String>,
    annotations: Vec<String>,
}

impl Modifiers {
    fn of(node: Node, source: &str) -> Self {
        let mut modifiers = Self::default();
        let Some(list) = child_of_kind(node, "modifiers") else {
            return modifiers;
        };
        for child in children(list) {
            match child.kind() {
                "marker_annotation" | "annotation" => {
                    if let Some(name) = field_text(child, "name", source) {
                        modifiers.annotations.push(name);
                    }
                }
                "line_comment" | "block_comment" => {}
                _ => modifiers.keywords.push(node_text(child, source)),
            }
        }
        modifiers
    }

    fn has(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }

    /// Explicit access keyword, else the member default of the enclosing body.
    fn visibility(&self, default: Visibility) -> Visibility {
        self.keywords
            .iter()
            .find_map(|k| Visibility::from_keyword(k))
            .unwrap_or(default)
    }

    fn record(&self, metadata: &mut Metadata) {
        put_list(metadata, keys::MODIFIERS, &self.keywords);
        put_list(metadata, keys::ANNOTATIONS, &self.annotations);
        put_flag(metadata, keys::IS_STATIC, self.has("static"));
        put_flag(metadata, keys::IS_ABSTRACT, self.has("abstract"));
        put_flag(metadata, keys::IS_SEALED, self.has("sealed"));
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum TypeShape {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

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

    fn walk_children(&mut self, node: Node, scope: Scope, member_default: Visibility) {
        for child in named_children(node) {
            self.walk(child, scope, member_default);
        }
    }

    /// `member_default` is the visibility of unmarked members in the current body.
    fn walk(&mut self, node: Node, scope: Scope, member_default: Visibility) {
        if node.is_error() {
            return;
        }
        match node.kind() {
            "class_declaration" => self.visit_type(node, TypeShape::Class, scope, member_default),
            "interface_declaration" => {
                self.visit_type(node, TypeShape::Interface, scope, member_default)
            }
            "enum_declaration" => self.visit_type(node, TypeShape::Enum, scope, member_default),
            "record_declaration" => self.visit_type(node, TypeShape::Record, scope, member_default),
            "annotation_type_declaration" => {
                self.visit_type(node, TypeShape::Annotation, scope, member_default)
            }
            "method_declaration" | "constructor_declaration" | "compact_constructor_declaration" => {
                self.visit_method(node, scope, member_default)
            }
            "field_declaration" | "constant_declaration" => {
                self.visit_field(node, scope, member_default)
            }
            "method_invocation" => {
                let callee = field_text(node, "name", self.source);
                self.record_call(callee, node, scope);
                self.walk_children(node, scope, member_default);
            }
            "object_creation_expression" => {
                let callee = field_text(node, "type", self.source).map(|t| simple_type_name(&t));
                self.record_call(callee, node, scope);
                self.walk_children(node, scope, member_default);
            }
            _ => self.walk_children(node, scope, member_default),
        }
    }

    fn visit_type(&mut self, node: Node, shape: TypeShape, scope: Scope, member_default: Visibility) {
        let Some(name) = declaration_name(node, self.source) else {
            tracing::debug!(path = self.path, line = start_line(node), "skipping unnamed type");
            return;
        };
        let qualified = scope.qualify(&name);
        let modifiers = Modifiers::of(node, self.source);
        let type_params = field_text(node, "type_parameters", self.source).unwrap_or_default();

        let superclass = node
            .child_by_field_name("superclass")
            .and_then(|s| named_children(s).into_iter().next())
            .map(|t| collapse_whitespace(&node_text(t, self.source)));
        let interfaces = node
            .child_by_field_name("interfaces")
            .map(|n| type_list(n, self.source))
            .unwrap_or_default();
        let extended = child_of_kind(node, "extends_interfaces")
            .map(|n| type_list(n, self.source))
            .unwrap_or_default();

        let mut metadata = Metadata::new();
        modifiers.record(&mut metadata);
        put_str(&mut metadata, keys::TYPE_PARAMETERS, type_params.clone());
        if let Some(base) = &superclass {
            put_str(&mut metadata, keys::BASE_CLASS, base.clone());
        }
        put_list(&mut metadata, keys::BASE_CLASSES, &extended);
        put_list(&mut metadata, keys::INTERFACES, &interfaces);
        put_flag(&mut metadata, keys::IS_RECORD, shape == TypeShape::Record);
        put_flag(&mut metadata, keys::IS_ANNOTATION, shape == TypeShape::Annotation);
        if shape == TypeShape::Record {
            if let Some(params) = field_text(node, "parameters", self.source) {
                put_str(&mut metadata, keys::PARAMETERS, collapse_whitespace(&params));
            }
        }

        let (kind, keyword) = match shape {
            TypeShape::Class => (SymbolKind::Class, "class"),
            TypeShape::Interface => (SymbolKind::Interface, "interface"),
            TypeShape::Enum => (SymbolKind::Enum, "enum"),
            TypeShape::Record => (SymbolKind::Class, "record"),
            TypeShape::Annotation => (SymbolKind::Interface, "@interface"),
        };
        let mut signature = modifiers.keywords.clone();
        signature.push(format!("{keyword} {name}{type_params}"));
        if let Some(base) = &superclass {
            signature.push(format!("extends {base}"));
        }
        if !extended.is_empty() {
            signature.push(format!("extends {}", extended.join(", ")));
        }
        if !interfaces.is_empty() {
            signature.push(format!("implements {}", interfaces.join(", ")));
        }

        self.symbols.push(
            Symbol::new(
                &name,
                kind,
                Language::Java,
                self.path,
                start_line(node),
                &qualified,
                modifiers.visibility(member_default),
            )
            .with_span(end_line(node), start_column(node))
            .with_signature(Some(signature.join(" ")))
            .with_documentation(preceding_doc_comment(node, self.source, "/**", &[]))
            .with_metadata(metadata),
        );

        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        let inner_default = match shape {
            TypeShape::Interface | TypeShape::Annotation => Visibility::Public,
            _ => Visibility::Package,
        };
        self.walk_children(body, Scope::enter_class(&qualified, &name), inner_default);
    }

    fn visit_method(&mut self, node: Node, scope: Scope, member_default: Visibility) {
        let body = node.child_by_field_name("body");
        let is_constructor = node.kind() != "method_declaration";
        let name = if is_constructor {
            scope.class_name.map(str::to_string)
        } else {
            declaration_name(node, self.source)
        };
        // Members of anonymous class bodies are not declarations of the file.
        let (Some(name), true) = (name, scope.in_class()) else {
            if let Some(body) = body {
                self.walk_children(body, scope, member_default);
            }
            return;
        };
        let qualified = scope.qualify(&name);
        let modifiers = Modifiers::of(node, self.source);
        let type_params = field_text(node, "type_parameters", self.source).unwrap_or_default();
        let params = field_text(node, "parameters", self.source)
            .map(|p| collapse_whitespace(&p))
            .unwrap_or_default();
        let return_type = field_text(node, "type", self.source);
        let is_abstract = modifiers.has("abstract")
            || (body.is_none() && member_default == Visibility::Public && !modifiers.has("static"));

        let mut metadata = Metadata::new();
        modifiers.record(&mut metadata);
        if let Some(class) = scope.class_name {
            put_str(&mut metadata, keys::PARENT_CLASS, class);
        }
        put_flag(&mut metadata, keys::IS_CONSTRUCTOR, is_constructor);
        put_flag(&mut metadata, keys::IS_ABSTRACT, is_abstract);
        put_str(&mut metadata, keys::TYPE_PARAMETERS, type_params.clone());
        put_str(&mut metadata, keys::PARAMETERS, params.clone());
        if let Some(ret) = &return_type {
            put_str(&mut metadata, keys::RETURN_TYPE, ret.clone());
        }

        let mut signature = modifiers.keywords.clone();
        if !type_params.is_empty() {
            signature.push(type_params);
        }
        if let Some(ret) = &return_type {
            signature.push(ret.clone());
        }
        signature.push(format!("{name}{params}"));
        if let Some(throws) = child_of_kind(node, "throws") {
            signature.push(node_text(throws, self.source));
        }

        self.symbols.push(
            Symbol::new(
                &name,
                SymbolKind::Method,
                Language::Java,
                self.path,
                start_line(node),
                &qualified,
                modifiers.visibility(member_default),
            )
            .with_span(end_line(node), start_column(node))
            .with_signature(Some(collapse_whitespace(&signature.join(" "))))
            .with_documentation(preceding_doc_comment(node, self.source, "/**", &[]))
            .with_metadata(metadata),
        );

        if let Some(body) = body {
            let caller = scope.call_key(&name);
            self.walk_children(
                body,
                Scope::enter_function(&qualified, &caller),
                Visibility::Package,
            );
        }
    }

    /// `static final` fields, and every interface constant, become constants.
    fn visit_field(&mut self, node: Node, scope: Scope, member_default: Visibility) {
        let modifiers = Modifiers::of(node, self.source);
        let constant = node.kind() == "constant_declaration"
            || (modifiers.has("static") && modifiers.has("final"));
        if !constant || !scope.in_class() {
            self.walk_children(node, scope, member_default);
            return;
        }
        let field_type = field_text(node, "type", self.source).unwrap_or_default();
        for declarator in field_children(node, "declarator") {
            let Some(name) = field_text(declarator, "name", self.source) else {
                continue;
            };
            let mut metadata = Metadata::new();
            modifiers.record(&mut metadata);
            if let Some(class) = scope.class_name {
                put_str(&mut metadata, keys::PARENT_CLASS, class);
            }
            let mut signature = modifiers.keywords.clone();
            signature.push(format!("{field_type} {name}"));

            self.symbols.push(
                Symbol::new(
                    &name,
                    SymbolKind::Constant,
                    Language::Java,
                    self.path,
                    start_line(node),
                    scope.qualify(&name),
                    modifiers.visibility(member_default),
                )
                .with_span(end_line(node), start_column(declarator))
                .with_signature(Some(signature.join(" ")))
                .with_documentation(preceding_doc_comment(node, self.source, "/**", &[]))
                .with_metadata(metadata),
            );
        }
    }

    fn record_call(&mut self, callee: Option<String>, node: Node, scope: Scope) {
        if !self.collect_calls {
            return;
        }
        if let (Some(caller), Some(callee)) = (scope.caller, callee) {
            self.calls.push(CallSite {
                caller: caller.to_string(),
                callee,
                line: start_line(node),
            });
        }
    }
}

/// Types listed in a `super_interfaces` or `extends_interfaces` clause.
fn type_list(clause: Node, source: &str) -> Vec<String> {
    let list = child_of_kind(clause, "type_list").unwrap_or(clause);
    named_children(list)
        .into_iter()
        .map(|t| collapse_whitespace(&node_text(t, source)))
        .collect()
}

/// `import a.b.C;`, `import a.b.*;`, `import static a.b.C.m;`.
fn import_record(node: Node, parsed: &ParsedFile) -> Option<DependencyRecord> {
    let path = named_children(node)
        .into_iter()
        .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))?;
    let target = node_text(path, &parsed.content);
    let is_static = has_child_kind(node, "static");
    let is_wildcard = has_child_kind(node, "asterisk");

    let mut dep = DependencyRecord::import(&parsed.path, target.clone(), start_line(node));
    if is_static {
        dep.kind = DependencyKind::StaticImport;
    }
    dep.is_wildcard = is_wildcard;
    if !is_wildcard {
        if let Some(last) = target.rsplit('.').next() {
            dep.imported_names = vec![last.to_string()];
        }
    }
    Some(dep)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(content: &str) -> Vec<Symbol> {
        let extractor = JavaExtractor::new().unwrap();
        extractor.extract_symbols(content, "src/main/java/com/example/user/UserService.java")
    }

    fn find<'s>(symbols: &'s [Symbol], qualified: &str) -> &'s Symbol {
        symbols
            .iter()
            .find(|s| s.qualified_name == qualified)
            .unwrap_or_else(|| panic!("missing symbol {qualified}: {symbols:#?}"))
    }

    #[test]
    fn test_parse_java_interface() {
        let content = r#"
package com.example.domain.user;

public interface UserRepository {
    void save(User user);
    User findById(String id);
}
"#;
        let syms = symbols(content);
        let repo = find(&syms, "UserRepository");
        assert_eq!(repo.kind, SymbolKind::Interface);
        assert!(repo.is_exported);

        let save = find(&syms, "UserRepository.save");
        assert_eq!(save.kind, SymbolKind::Method);
        assert_eq!(save.visibility, Visibility::Public, "interface members default to public");
        assert_eq!(save.metadata.get(keys::IS_ABSTRACT), Some(&true.into()));
        assert_eq!(save.metadata.get(keys::RETURN_TYPE), Some(&"void".into()));
        assert!(syms.iter().any(|s| s.qualified_name == "UserRepository.findById"));
    }

    #[test]
    fn test_parse_java_class_with_heritage() {
        let content = r#"
package com.example.infrastructure.postgres;

/**
 * Stores users in Postgres.
 * @author someone
 */
@Repository
public class PostgresUserRepository<T> extends BaseRepository<T> implements UserRepository, Closeable {
    private final DataSource dataSource;
    public static final int MAX_POOL = 10;

    public PostgresUserRepository(DataSource dataSource) {
        this.dataSource = dataSource;
    }

    /** Persist one user. */
    public void save(User user) {
        validate(user);
    }

    void validate(User user) {}
}
"#;
        let syms = symbols(content);
        let repo = find(&syms, "PostgresUserRepository");
        assert_eq!(repo.kind, SymbolKind::Class);
        assert_eq!(repo.documentation.as_deref(), Some("Stores users in Postgres."));
        assert_eq!(repo.metadata.get(keys::BASE_CLASS), Some(&"BaseRepository<T>".into()));
        assert_eq!(
            repo.interfaces(),
            vec!["UserRepository".to_string(), "Closeable".to_string()]
        );
        assert_eq!(
            repo.metadata.get(keys::ANNOTATIONS),
            Some(&serde_json::json!(["Repository"]))
        );
        assert_eq!(repo.metadata.get(keys::TYPE_PARAMETERS), Some(&"<T>".into()));

        let ctor = find(&syms, "PostgresUserRepository.PostgresUserRepository");
        assert_eq!(ctor.metadata.get(keys::IS_CONSTRUCTOR), Some(&true.into()));

        let save = find(&syms, "PostgresUserRepository.save");
        assert_eq!(save.documentation.as_deref(), Some("Persist one user."));
        assert_eq!(save.parent_class(), Some("PostgresUserRepository"));
        assert_eq!(save.signature.as_deref(), Some("public void save(User user)"));

        let validate = find(&syms, "PostgresUserRepository.validate");
        assert_eq!(validate.visibility, Visibility::Package);
        assert!(!validate.is_exported);

        let max = find(&syms, "PostgresUserRepository.MAX_POOL");
        assert_eq!(max.kind, SymbolKind::Constant);
        assert!(!syms.iter().any(|s| s.name == "dataSource"));
    }

    #[test]
    fn test_enum_record_and_nested_types() {
        let content = r#"
public class Outer {
    enum Status { ACTIVE, INACTIVE; String label() { return name(); } }
    public record Point(int x, int y) {}
    @interface Marker {}
    static class Inner {
        class Deepest {}
    }
}
"#;
        let syms = symbols(content);
        assert_eq!(find(&syms, "Outer.Status").kind, SymbolKind::Enum);
        assert_eq!(find(&syms, "Outer.Status.label").kind, SymbolKind::Method);
        let point = find(&syms, "Outer.Point");
        assert_eq!(point.metadata.get(keys::IS_RECORD), Some(&true.into()));
        let marker = find(&syms, "Outer.Marker");
        assert_eq!(marker.kind, SymbolKind::Interface);
        assert_eq!(marker.metadata.get(keys::IS_ANNOTATION), Some(&true.into()));
        let deepest = find(&syms, "Outer.Inner.Deepest");
        assert_eq!(deepest.depth(), 2);
        assert_eq!(deepest.visibility, Visibility::Package);
    }

    #[test]
    fn test_interface_extends_goes_to_base_classes() {
        let syms = symbols("interface Reader extends Closeable, AutoCloseable {}");
        let reader = find(&syms, "Reader");
        assert_eq!(
            reader.base_classes(),
            vec!["Closeable".to_string(), "AutoCloseable".to_string()]
        );
    }

    #[test]
    fn test_extract_imports() {
        let extractor = JavaExtractor::new().unwrap();
        let content = r#"
package com.example.application;

import java.util.List;
import java.util.*;
import static org.junit.Assert.assertEquals;
import com.example.domain.user.User;
"#;
        let deps = extractor.extract_dependencies(content, "UserService.java", None);
        assert_eq!(deps.len(), 4);
        assert_eq!(deps[0].target, "java.util.List");
        assert_eq!(deps[0].imported_names, vec!["List"]);
        assert_eq!(deps[1].target, "java.util");
        assert!(deps[1].is_wildcard);
        assert_eq!(deps[2].kind, DependencyKind::StaticImport);
        assert_eq!(deps[2].target, "org.junit.Assert.assertEquals");
        assert_eq!(deps[3].target, "com.example.domain.user.User");
        assert!(deps.iter().all(|d| d.is_import()));
    }

    #[test]
    fn test_calls_and_instantiation() {
        let extractor = JavaExtractor::new().unwrap();
        let content = r#"
class Service {
    void run() {
        helper();
        Repo repo = new Repo();
        repo.save();
        Runnable r = new Runnable() { public void run() { helper(); } };
    }
    void helper() {}
}
"#;
        let deps = extractor.extract_dependencies(content, "Service.java", None);
        let callees: Vec<&str> = deps.iter().filter_map(|d| d.callee.as_deref()).collect();
        assert_eq!(callees, vec!["helper", "Repo", "save", "Runnable"]);
        assert!(deps.iter().all(|d| d.caller.as_deref() == Some("Service.run")));
        assert!(!deps[0].is_external);
        assert!(deps[1].is_external);
    }

    #[test]
    fn test_anonymous_class_members_are_not_symbols() {
        let content = "class A { void f() { Runnable r = new Runnable() { public void run() {} }; } }";
        let syms = symbols(content);
        let names: Vec<&str> = syms.iter().map(|s| s.qualified_name.as_str()).collect();
        assert_eq!(names, vec!["A", "A.f"]);
    }

    #[test]
    fn test_malformed_input_does_not_fail() {
        let syms = symbols("public class {{{ void ( }");
        assert!(syms.iter().all(|s| !s.name.is_empty()));
    }
}
