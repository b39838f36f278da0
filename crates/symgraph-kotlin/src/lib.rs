use anyhow::Result;
use tree_sitter::{Language as Grammar, Node};

use symgraph_core::analyzer::{check_grammar, parse_with, LanguageExtractor, ParsedFile};
use symgraph_core::syntax::*;
use symgraph_core::types::*;

/// Node kinds that spell a type reference.
const TYPE_KINDS: &[&str] = &[
    "type",
    "user_type",
    "nullable_type",
    "function_type",
    "parenthesized_type",
    "non_nullable_type",
];

/// Kotlin language extractor using tree-sitter.
pub struct KotlinExtractor {
    grammar: Grammar,
}

impl KotlinExtractor {
    pub fn new() -> Result<Self> {
        let grammar: Grammar = tree_sitter_kotlin_ng::LANGUAGE.into();
        check_grammar(&grammar, "Kotlin")?;
        Ok(Self { grammar })
    }
}

impl LanguageExtractor for KotlinExtractor {
    fn language(&self) -> Language {
        Language::Kotlin
    }

    fn file_extensions(&self) -> &[&str] {
        &["kt", "kts"]
    }

    fn parse_file(&self, path: &str, content: &str) -> Result<ParsedFile> {
        parse_with(&self.grammar, "Kotlin", path, content)
    }

    fn symbols(&self, parsed: &ParsedFile) -> Vec<Symbol> {
        let mut walker = Walker::new(parsed, false);
        walker.walk(parsed.tree.root_node(), Scope::root());
        walker.symbols
    }

    fn imports(&self, parsed: &ParsedFile) -> Vec<DependencyRecord> {
        let mut deps = Vec::new();
        for node in named_children(parsed.tree.root_node()) {
            match node.kind() {
                "import_list" => {
                    for header in named_children(node) {
                        deps.extend(import_record(header, parsed));
                    }
                }
                "import" | "import_header" => deps.extend(import_record(node, parsed)),
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

/// Modifier keywords and annotation names of a declaration.
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
        for child in named_children(list) {
            match child.kind() {
                "annotation" | "file_annotation" => {
                    modifiers.annotations.push(annotation_name(child, source))
                }
                kind if kind.contains("comment") => {}
                _ => modifiers.keywords.push(node_text(child, source)),
            }
        }
        modifiers
    }

    fn has(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }

    /// Kotlin declarations are public unless marked otherwise.
    fn visibility(&self) -> Visibility {
        self.keywords
            .iter()
            .find_map(|k| Visibility::from_keyword(k))
            .unwrap_or(Visibility::Public)
    }

    fn record(&self, metadata: &mut Metadata) {
        put_list(metadata, keys::MODIFIERS, &self.keywords);
        put_list(metadata, keys::ANNOTATIONS, &self.annotations);
        put_flag(metadata, keys::IS_ABSTRACT, self.has("abstract"));
        put_flag(metadata, keys::IS_SEALED, self.has("sealed"));
        put_flag(metadata, keys::IS_DATA_CLASS, self.has("data"));
        put_flag(metadata, keys::IS_ASYNC, self.has("suspend"));
    }
}

/// Supertypes split by whether they are invoked as constructors.
#[derive(Default)]
struct Supertypes {
    classes: Vec<String>,
    interfaces: Vec<String>,
}

impl Supertypes {
    fn of(node: Node, source: &str) -> Self {
        let mut supertypes = Self::default();
        let specifiers = match child_of_kind(node, "delegation_specifiers") {
            Some(list) => named_children(list),
            None => named_children(node),
        };
        for spec in specifiers
            .into_iter()
            .filter(|s| s.kind() == "delegation_specifier")
        {
            let Some(inner) = named_children(spec).into_iter().next() else {
                continue;
            };
            match inner.kind() {
                "constructor_invocation" => {
                    if let Some(ty) = named_children(inner).into_iter().next() {
                        supertypes
                            .classes
                            .push(collapse_whitespace(&node_text(ty, source)));
                    }
                }
                "explicit_delegation" => {
                    if let Some(ty) = named_children(inner).into_iter().next() {
                        supertypes
                            .interfaces
                            .push(collapse_whitespace(&node_text(ty, source)));
                    }
                }
                _ => supertypes
                    .interfaces
                    .push(collapse_whitespace(&node_text(inner, source))),
            }
        }
        supertypes
    }

    fn all(&self) -> Vec<String> {
        self.classes.iter().chain(&self.interfaces).cloned().collect()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ObjectShape {
    Class,
    Object,
    Companion,
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
            "class_declaration" => self.visit_class(node, ObjectShape::Class, scope),
            "object_declaration" => self.visit_class(node, ObjectShape::Object, scope),
            "companion_object" => self.visit_class(node, ObjectShape::Companion, scope),
            "function_declaration" => self.visit_function(node, scope),
            "secondary_constructor" => self.visit_constructor(node, scope),
            "property_declaration" => self.visit_property(node, scope),
            "type_alias" => self.visit_type_alias(node, scope),
            "call_expression" => {
                self.record_call(node, scope);
                self.walk_children(node, scope);
            }
            _ => self.walk_children(node, scope),
        }
    }

    fn push(&mut self, node: Node, symbol: Symbol) {
        let doc = preceding_doc_comment(node, self.source, "/**", &[]);
        self.symbols.push(
            symbol
                .with_span(end_line(node), start_column(node))
                .with_documentation(doc),
        );
    }

    fn visit_class(&mut self, node: Node, shape: ObjectShape, scope: Scope) {
        let name = match declaration_name(node, self.source) {
            Some(name) => name,
            None if shape == ObjectShape::Companion => "Companion".to_string(),
            None => {
                tracing::debug!(path = self.path, line = start_line(node), "skipping unnamed class");
                return;
            }
        };
        let qualified = scope.qualify(&name);
        let modifiers = Modifiers::of(node, self.source);
        let supertypes = Supertypes::of(node, self.source);
        let type_params = child_of_kind(node, "type_parameters")
            .map(|n| node_text(n, self.source))
            .unwrap_or_default();
        let primary_ctor = child_of_kind(node, "primary_constructor")
            .map(|n| collapse_whitespace(&node_text(n, self.source)))
            .unwrap_or_default();

        let is_interface = has_child_kind(node, "interface");
        let is_enum = modifiers.has("enum") || has_child_kind(node, "enum_class_body");
        let kind = if is_interface {
            SymbolKind::Interface
        } else if is_enum {
            SymbolKind::Enum
        } else {
            SymbolKind::Class
        };

        let mut metadata = Metadata::new();
        modifiers.record(&mut metadata);
        put_str(&mut metadata, keys::TYPE_PARAMETERS, type_params.clone());
        put_str(&mut metadata, keys::PARAMETERS, primary_ctor.clone());
        if is_interface {
            put_list(&mut metadata, keys::BASE_CLASSES, &supertypes.all());
        } else {
            if let Some(base) = supertypes.classes.first() {
                put_str(&mut metadata, keys::BASE_CLASS, base.clone());
            }
            put_list(&mut metadata, keys::BASE_CLASSES, &supertypes.classes);
            put_list(&mut metadata, keys::INTERFACES, &supertypes.interfaces);
        }
        put_flag(&mut metadata, keys::IS_OBJECT, shape != ObjectShape::Class);
        put_flag(&mut metadata, keys::IS_COMPANION, shape == ObjectShape::Companion);
        if shape == ObjectShape::Companion {
            if let Some(owner) = scope.class_name {
                put_str(&mut metadata, keys::PARENT_CLASS, owner);
            }
        }

        let keyword = match (shape, is_interface) {
            (ObjectShape::Companion, _) => "companion object",
            (ObjectShape::Object, _) => "object",
            (_, true) => "interface",
            _ => "class",
        };
        let mut signature = modifiers.keywords.clone();
        signature.retain(|k| k != "companion");
        signature.push(format!("{keyword} {name}{type_params}{primary_ctor}"));
        let all = supertypes.all();
        if !all.is_empty() {
            signature.push(format!(": {}", all.join(", ")));
        }

        let symbol = Symbol::new(
            &name,
            kind,
            Language::Kotlin,
            self.path,
            start_line(node),
            &qualified,
            modifiers.visibility(),
        )
        .with_signature(Some(signature.join(" ")))
        .with_metadata(metadata);
        self.push(node, symbol);

        let body = child_of_kind(node, "class_body").or_else(|| child_of_kind(node, "enum_class_body"));
        if let Some(body) = body {
            self.walk_children(body, Scope::enter_class(&qualified, &name));
        }
    }

    fn visit_function(&mut self, node: Node, scope: Scope) {
        let Some(name_node) = node.child_by_field_name("name") else {
            // Anonymous functions are expressions; their calls belong to the enclosing body.
            self.walk_children(node, scope);
            return;
        };
        let name = node_text(name_node, self.source);
        let qualified = scope.qualify(&name);
        let kind = scope.callable_kind();
        let modifiers = Modifiers::of(node, self.source);
        let nodes = named_children(node);

        let receiver = nodes
            .iter()
            .take_while(|c| c.id() != name_node.id())
            .find(|c| !matches!(c.kind(), "modifiers" | "type_parameters") && !c.kind().contains("comment"))
            .map(|c| simple_receiver(&node_text(*c, self.source)));
        let type_params = child_of_kind(node, "type_parameters")
            .map(|n| node_text(n, self.source))
            .unwrap_or_default();
        let params_index = nodes
            .iter()
            .position(|c| c.kind() == "function_value_parameters");
        let params = params_index
            .map(|i| collapse_whitespace(&node_text(nodes[i], self.source)))
            .unwrap_or_default();
        let return_type = params_index.and_then(|i| {
            nodes[i + 1..]
                .iter()
                .find(|c| TYPE_KINDS.contains(&c.kind()))
                .map(|c| collapse_whitespace(&node_text(*c, self.source)))
        });

        let mut metadata = Metadata::new();
        modifiers.record(&mut metadata);
        if kind == SymbolKind::Method {
            if let Some(class) = scope.class_name {
                put_str(&mut metadata, keys::PARENT_CLASS, class);
            }
        }
        if let Some(receiver) = &receiver {
            put_flag(&mut metadata, keys::IS_EXTENSION, true);
            put_str(&mut metadata, keys::RECEIVER_TYPE, receiver.clone());
        }
        put_str(&mut metadata, keys::TYPE_PARAMETERS, type_params.clone());
        put_str(&mut metadata, keys::PARAMETERS, params.clone());
        if let Some(ret) = &return_type {
            put_str(&mut metadata, keys::RETURN_TYPE, ret.clone());
        }

        let mut signature = modifiers.keywords.clone();
        let mut head = String::from("fun ");
        if !type_params.is_empty() {
            head.push_str(&type_params);
            head.push(' ');
        }
        if let Some(receiver) = &receiver {
            head.push_str(receiver);
            head.push('.');
        }
        head.push_str(&name);
        head.push_str(&params);
        if let Some(ret) = &return_type {
            head.push_str(": ");
            head.push_str(ret);
        }
        signature.push(head);

        let symbol = Symbol::new(
            &name,
            kind,
            Language::Kotlin,
            self.path,
            start_line(node),
            &qualified,
            modifiers.visibility(),
        )
        .with_signature(Some(signature.join(" ")))
        .with_metadata(metadata);
        self.push(node, symbol);

        let caller = scope.call_key(&name);
        let inner = Scope::enter_function(&qualified, &caller);
        for child in nodes {
            if child.kind() != "modifiers" {
                self.walk(child, inner);
            }
        }
    }

    fn visit_constructor(&mut self, node: Node, scope: Scope) {
        let Some(class) = scope.class_name.filter(|_| scope.in_class()) else {
            self.walk_children(node, scope);
            return;
        };
        let name = class.to_string();
        let qualified = scope.qualify(&name);
        let modifiers = Modifiers::of(node, self.source);
        let params = child_of_kind(node, "function_value_parameters")
            .map(|n| collapse_whitespace(&node_text(n, self.source)))
            .unwrap_or_default();

        let mut metadata = Metadata::new();
        modifiers.record(&mut metadata);
        put_str(&mut metadata, keys::PARENT_CLASS, class);
        put_flag(&mut metadata, keys::IS_CONSTRUCTOR, true);
        put_str(&mut metadata, keys::PARAMETERS, params.clone());

        let mut signature = modifiers.keywords.clone();
        signature.push(format!("constructor{params}"));

        let symbol = Symbol::new(
            &name,
            SymbolKind::Method,
            Language::Kotlin,
            self.path,
            start_line(node),
            &qualified,
            modifiers.visibility(),
        )
        .with_signature(Some(signature.join(" ")))
        .with_metadata(metadata);
        self.push(node, symbol);

        let caller = scope.call_key(&name);
        self.walk_children(node, Scope::enter_function(&qualified, &caller));
    }

    /// Top-level properties, plus `const val` members of objects.
    fn visit_property(&mut self, node: Node, scope: Scope) {
        let modifiers = Modifiers::of(node, self.source);
        let is_const = modifiers.has("const");
        let declaration = child_of_kind(node, "variable_declaration");
        let name = declaration.and_then(|d| {
            named_children(d)
                .into_iter()
                .find(|c| IDENTIFIER_KINDS.contains(&c.kind()))
                .map(|c| node_text(c, self.source))
        });
        let wanted = scope.is_top_level() || (is_const && scope.in_class());
        let (Some(name), true) = (name, wanted) else {
            self.walk_children(node, scope);
            return;
        };

        let kind = if is_const {
            SymbolKind::Constant
        } else {
            SymbolKind::Variable
        };
        let mutability = if has_child_kind(node, "var") { "var" } else { "val" };
        let mut signature = modifiers.keywords.clone();
        if let Some(declaration) = declaration {
            signature.push(format!(
                "{mutability} {}",
                collapse_whitespace(&node_text(declaration, self.source))
            ));
        }
        let mut metadata = Metadata::new();
        modifiers.record(&mut metadata);
        if scope.in_class() {
            if let Some(class) = scope.class_name {
                put_str(&mut metadata, keys::PARENT_CLASS, class);
            }
        }

        let symbol = Symbol::new(
            &name,
            kind,
            Language::Kotlin,
            self.path,
            start_line(node),
            scope.qualify(&name),
            modifiers.visibility(),
        )
        .with_signature(Some(signature.join(" ")))
        .with_metadata(metadata);
        self.push(node, symbol);
    }

    fn visit_type_alias(&mut self, node: Node, scope: Scope) {
        let name = field_text(node, "type", self.source).or_else(|| declaration_name(node, self.source));
        let Some(name) = name else {
            return;
        };
        let modifiers = Modifiers::of(node, self.source);
        let mut metadata = Metadata::new();
        modifiers.record(&mut metadata);
        put_flag(&mut metadata, keys::IS_TYPE_ALIAS, true);

        let symbol = Symbol::new(
            &name,
            SymbolKind::Interface,
            Language::Kotlin,
            self.path,
            start_line(node),
            scope.qualify(&name),
            modifiers.visibility(),
        )
        .with_signature(Some(collapse_whitespace(&node_text(node, self.source))))
        .with_metadata(metadata);
        self.push(node, symbol);
    }

    fn record_call(&mut self, node: Node, scope: Scope) {
        if !self.collect_calls {
            return;
        }
        let Some(caller) = scope.caller else {
            return;
        };
        let Some(callee) = named_children(node).into_iter().next() else {
            return;
        };
        if let Some(callee) = callee_name(callee, self.source) {
            self.calls.push(CallSite {
                caller: caller.to_string(),
                callee,
                line: start_line(node),
            });
        }
    }
}

/// Name being invoked: `foo()` -> `foo`, `a.b.foo()` -> `foo`.
fn callee_name(node: Node, source: &str) -> Option<String> {
    match node.kind() {
        "identifier" | "simple_identifier" => Some(node_text(node, source)),
        "navigation_expression" | "navigation_suffix" => named_children(node)
            .into_iter()
            .rev()
            .find_map(|c| callee_name(c, source)),
        _ => None,
    }
}

/// Receiver type without generics or nullability, as written before the `.`.
fn simple_receiver(text: &str) -> String {
    text.trim().trim_end_matches('.').trim().to_string()
}

fn annotation_name(node: Node, source: &str) -> String {
    let text = node_text(node, source);
    let text = text.trim_start_matches('@');
    let text = text.split(['(', ' ', '\n']).next().unwrap_or(text);
    text.rsplit(':').next().unwrap_or(text).to_string()
}

/// `import a.b.C`, `import a.b.*`, `import a.b.C as D`.
fn import_record(node: Node, parsed: &ParsedFile) -> Option<DependencyRecord> {
    if !matches!(node.kind(), "import" | "import_header") {
        return None;
    }
    let mut target = None;
    let mut alias = None;
    let mut wildcard = false;
    let mut after_as = false;
    for child in children(node) {
        match child.kind() {
            "as" => after_as = true,
            "*" | "wildcard_import" => wildcard = true,
            "import_alias" => {
                alias = named_children(child)
                    .last()
                    .map(|n| node_text(*n, &parsed.content))
            }
            "qualified_identifier" | "identifier" | "simple_identifier" => {
                let text = node_text(child, &parsed.content);
                if after_as {
                    alias = Some(text);
                } else if target.is_none() {
                    target = Some(text);
                }
            }
            _ => {}
        }
    }
    let target = target?;
    let target = target.trim_end_matches(".*").to_string();
    let mut dep = DependencyRecord::import(&parsed.path, target.clone(), start_line(node));
    dep.alias = alias;
    dep.is_wildcard = wildcard;
    if !wildcard {
        if let Some(last) = target.rsplit('.').next() {
            dep.imported_names = vec![last.to_string()];
        }
    }
    Some(dep)
}
