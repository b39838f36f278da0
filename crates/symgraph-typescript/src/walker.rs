//! Declaration walk shared by the TypeScript and JavaScript grammars.
//!
//! The two grammars agree on almost every node kind; TypeScript only adds
//! interfaces, enums, type aliases, namespaces and access modifiers, which
//! simply never appear in a JavaScript tree.

use tree_sitter::Node;

use symgraph_core::syntax::*;
use symgraph_core::types::*;

/// Right-hand sides that make a binding a function.
const FUNCTION_VALUES: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function",
    "generator_function",
];

/// How the enclosing `export` statement exposes a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Export {
    None,
    Named,
    Default,
}

/// Where a function-shaped declaration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    Declaration,
    Binding,
    CommonJs,
}

pub(crate) struct Walker<'a> {
    source: &'a str,
    path: &'a str,
    language: Language,
    collect_calls: bool,
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) calls: Vec<CallSite>,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(source: &'a str, path: &'a str, language: Language, collect_calls: bool) -> Self {
        Self {
            source,
            path,
            language,
            collect_calls,
            symbols: Vec::new(),
            calls: Vec::new(),
        }
    }

    pub(crate) fn run(&mut self, root: Node) {
        self.walk(root, Scope::root(), Export::None);
    }

    fn walk_children(&mut self, node: Node, scope: Scope) {
        for child in named_children(node) {
            self.walk(child, scope, Export::None);
        }
    }

    fn walk(&mut self, node: Node, scope: Scope, export: Export) {
        if node.is_error() {
            return;
        }
        match node.kind() {
            "export_statement" => {
                let export = if has_child_kind(node, "default") {
                    Export::Default
                } else {
                    Export::Named
                };
                for child in named_children(node) {
                    self.walk(child, scope, export);
                }
            }
            "function_declaration" | "generator_function_declaration" | "function_signature" => {
                if let Some(name) = declaration_name(node, self.source) {
                    self.visit_function(node, node, &name, scope, export, Form::Declaration);
                } else {
                    self.walk_children(node, scope);
                }
            }
            "class_declaration" | "abstract_class_declaration" => {
                self.visit_class(node, scope, export)
            }
            "interface_declaration" => self.visit_interface(node, scope, export),
            "enum_declaration" => self.visit_enum(node, scope, export),
            "type_alias_declaration" => self.visit_type_alias(node, scope, export),
            "internal_module" | "module" => self.visit_namespace(node, scope, export),
            "lexical_declaration" | "variable_declaration" => {
                self.visit_bindings(node, scope, export)
            }
            "method_definition" | "method_signature" | "abstract_method_signature" => {
                self.visit_method(node, scope)
            }
            "public_field_definition" | "field_definition" => self.visit_field(node, scope),
            "expression_statement" => {
                if scope.is_top_level() && self.visit_commonjs(node, scope) {
                    return;
                }
                self.walk_children(node, scope);
            }
            "call_expression" => {
                let callee = node
                    .child_by_field_name("function")
                    .and_then(|f| callee_name(f, self.source));
                self.record_call(callee, node, scope);
                self.walk_children(node, scope);
            }
            "new_expression" => {
                let callee = node
                    .child_by_field_name("constructor")
                    .and_then(|f| callee_name(f, self.source));
                self.record_call(callee, node, scope);
                self.walk_children(node, scope);
            }
            _ => self.walk_children(node, scope),
        }
    }

    /// Doc comment above a declaration, looking past an enclosing `export`.
    fn doc_for(&self, node: Node) -> Option<String> {
        let mut anchor = node;
        if anchor.kind() == "variable_declarator" {
            anchor = anchor.parent().unwrap_or(anchor);
        }
        if let Some(parent) = anchor.parent().filter(|p| p.kind() == "export_statement") {
            anchor = parent;
        }
        preceding_doc_comment(anchor, self.source, "/**", &["decorator"])
    }

    /// Decorators attached directly, on an enclosing `export`, or listed just
    /// before a class member.
    fn decorators(&self, node: Node) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        match node.parent() {
            Some(parent) if parent.kind() == "export_statement" => names.extend(
                named_children(parent)
                    .into_iter()
                    .filter(|c| c.kind() == "decorator")
                    .map(|c| decorator_name(c, self.source)),
            ),
            _ => {
                let mut current = node.prev_named_sibling();
                while let Some(sibling) = current.filter(|s| s.kind() == "decorator") {
                    names.insert(0, decorator_name(sibling, self.source));
                    current = sibling.prev_named_sibling();
                }
            }
        }
        names.extend(
            named_children(node)
                .into_iter()
                .filter(|c| c.kind() == "decorator")
                .map(|c| decorator_name(c, self.source)),
        );
        names
    }

    fn new_symbol(
        &self,
        node: Node,
        name: &str,
        kind: SymbolKind,
        qualified: &str,
        visibility: Visibility,
    ) -> Symbol {
        Symbol::new(
            name,
            kind,
            self.language,
            self.path,
            start_line(node),
            qualified,
            visibility,
        )
        .with_span(end_line(node), start_column(node))
    }

    /// Top-level declarations are exported only through `export`; nested ones
    /// follow their visibility.
    fn exported(scope: Scope, export: Export, visibility: Visibility) -> bool {
        if scope.is_top_level() {
            export != Export::None
        } else {
            visibility == Visibility::Public
        }
    }

    /// A function declaration, a binding to a function value, or a CommonJS
    /// `exports.name = function` assignment. `decl` is the node the symbol spans;
    /// `func` carries the parameters and body.
    fn visit_function(
        &mut self,
        decl: Node,
        func: Node,
        name: &str,
        scope: Scope,
        export: Export,
        form: Form,
    ) {
        let qualified = scope.qualify(name);
        let kind = scope.callable_kind();
        let visibility = Visibility::from_name_convention(name);
        let is_async = has_child_kind(func, "async");
        let is_generator = func.kind().contains("generator") || has_child_kind(func, "*");
        let is_arrow = func.kind() == "arrow_function";
        let type_params = field_text(func, "type_parameters", self.source).unwrap_or_default();
        let params = function_params(func, self.source);
        let return_type = return_type(func, self.source);

        let mut metadata = Metadata::new();
        put_flag(&mut metadata, keys::IS_ASYNC, is_async);
        put_flag(&mut metadata, keys::IS_GENERATOR, is_generator);
        put_flag(&mut metadata, keys::IS_ARROW, is_arrow);
        put_flag(&mut metadata, keys::IS_DEFAULT_EXPORT, export == Export::Default);
        put_str(&mut metadata, keys::TYPE_PARAMETERS, type_params.clone());
        put_str(&mut metadata, keys::PARAMETERS, params.clone());
        if let Some(ret) = &return_type {
            put_str(&mut metadata, keys::RETURN_TYPE, ret.clone());
        }

        let mut signature = String::new();
        if is_async {
            signature.push_str("async ");
        }
        if is_arrow {
            signature.push_str(&format!("{name}{type_params}{params}"));
        } else {
            signature.push_str(if is_generator { "function* " } else { "function " });
            signature.push_str(&format!("{name}{type_params}{params}"));
        }
        if let Some(ret) = &return_type {
            signature.push_str(&format!(": {ret}"));
        }
        if is_arrow {
            signature.push_str(" =>");
        }

        let exported = form == Form::CommonJs || Self::exported(scope, export, visibility);
        let symbol = self
            .new_symbol(decl, name, kind, &qualified, visibility)
            .with_signature(Some(collapse_whitespace(&signature)))
            .with_documentation(self.doc_for(decl))
            .with_exported(exported)
            .with_metadata(metadata);
        self.symbols.push(symbol);

        if let Some(body) = func.child_by_field_name("body") {
            let caller = scope.call_key(name);
            self.walk(body, Scope::enter_function(&qualified, &caller), Export::None);
        }
    }

    fn visit_class(&mut self, node: Node, scope: Scope, export: Export) {
        let Some(name) = declaration_name(node, self.source) else {
            tracing::debug!(path = self.path, line = start_line(node), "skipping anonymous class");
            self.walk_children(node, scope);
            return;
        };
        let qualified = scope.qualify(&name);
        let visibility = Visibility::from_name_convention(&name);
        let is_abstract = node.kind() == "abstract_class_declaration";
        let type_params = field_text(node, "type_parameters", self.source).unwrap_or_default();
        let (bases, interfaces) = class_heritage(node, self.source);
        let decorators = self.decorators(node);

        let mut metadata = Metadata::new();
        if let Some(base) = bases.first() {
            put_str(&mut metadata, keys::BASE_CLASS, base.clone());
        }
        put_list(&mut metadata, keys::BASE_CLASSES, &bases);
        put_list(&mut metadata, keys::INTERFACES, &interfaces);
        put_list(&mut metadata, keys::DECORATORS, &decorators);
        put_str(&mut metadata, keys::TYPE_PARAMETERS, type_params.clone());
        put_flag(&mut metadata, keys::IS_ABSTRACT, is_abstract);
        put_flag(&mut metadata, keys::IS_DEFAULT_EXPORT, export == Export::Default);

        let mut signature = String::new();
        if is_abstract {
            signature.push_str("abstract ");
        }
        signature.push_str(&format!("class {name}{type_params}"));
        if !bases.is_empty() {
            signature.push_str(&format!(" extends {}", bases.join(", ")));
        }
        if !interfaces.is_empty() {
            signature.push_str(&format!(" implements {}", interfaces.join(", ")));
        }

        let symbol = self
            .new_symbol(node, &name, SymbolKind::Class, &qualified, visibility)
            .with_signature(Some(signature))
            .with_documentation(self.doc_for(node))
            .with_exported(Self::exported(scope, export, visibility))
            .with_metadata(metadata);
        self.symbols.push(symbol);

        if let Some(body) = node.child_by_field_name("body") {
            self.walk_children(body, Scope::enter_class(&qualified, &name));
        }
    }

    fn visit_interface(&mut self, node: Node, scope: Scope, export: Export) {
        let Some(name) = declaration_name(node, self.source) else {
            return;
        };
        let qualified = scope.qualify(&name);
        let type_params = field_text(node, "type_parameters", self.source).unwrap_or_default();
        let extended: Vec<String> = child_of_kind(node, "extends_type_clause")
            .map(|clause| {
                named_children(clause)
                    .into_iter()
                    .map(|t| collapse_whitespace(&node_text(t, self.source)))
                    .collect()
            })
            .unwrap_or_default();

        let mut metadata = Metadata::new();
        put_list(&mut metadata, keys::BASE_CLASSES, &extended);
        put_str(&mut metadata, keys::TYPE_PARAMETERS, type_params.clone());
        put_flag(&mut metadata, keys::IS_DEFAULT_EXPORT, export == Export::Default);

        let mut signature = format!("interface {name}{type_params}");
        if !extended.is_empty() {
            signature.push_str(&format!(" extends {}", extended.join(", ")));
        }

        let symbol = self
            .new_symbol(node, &name, SymbolKind::Interface, &qualified, Visibility::Public)
            .with_signature(Some(signature))
            .with_documentation(self.doc_for(node))
            .with_exported(Self::exported(scope, export, Visibility::Public))
            .with_metadata(metadata);
        self.symbols.push(symbol);

        if let Some(body) = node.child_by_field_name("body") {
            self.walk_children(body, Scope::enter_class(&qualified, &name));
        }
    }

    fn visit_enum(&mut self, node: Node, scope: Scope, export: Export) {
        let Some(name) = declaration_name(node, self.source) else {
            return;
        };
        let is_const = has_child_kind(node, "const");
        let mut metadata = Metadata::new();
        if is_const {
            put_list(&mut metadata, keys::MODIFIERS, &["const".to_string()]);
        }
        let signature = if is_const {
            format!("const enum {name}")
        } else {
            format!("enum {name}")
        };
        let symbol = self
            .new_symbol(node, &name, SymbolKind::Enum, &scope.qualify(&name), Visibility::Public)
            .with_signature(Some(signature))
            .with_documentation(self.doc_for(node))
            .with_exported(Self::exported(scope, export, Visibility::Public))
            .with_metadata(metadata);
        self.symbols.push(symbol);
    }

    fn visit_type_alias(&mut self, node: Node, scope: Scope, export: Export) {
        let Some(name) = declaration_name(node, self.source) else {
            return;
        };
        let type_params = field_text(node, "type_parameters", self.source).unwrap_or_default();
        let mut metadata = Metadata::new();
        put_flag(&mut metadata, keys::IS_TYPE_ALIAS, true);
        put_str(&mut metadata, keys::TYPE_PARAMETERS, type_params.clone());
        let mut signature = format!("type {name}{type_params}");
        if let Some(value) = field_text(node, "value", self.source) {
            signature.push_str(&format!(" = {}", collapse_whitespace(&value)));
        }
        let symbol = self
            .new_symbol(node, &name, SymbolKind::Interface, &scope.qualify(&name), Visibility::Public)
            .with_signature(Some(signature))
            .with_documentation(self.doc_for(node))
            .with_exported(Self::exported(scope, export, Visibility::Public))
            .with_metadata(metadata);
        self.symbols.push(symbol);
    }

    /// `namespace A.B { ... }`, `module M { ... }`, `declare module "pkg" { ... }`.
    fn visit_namespace(&mut self, node: Node, scope: Scope, export: Export) {
        let Some(name) = field_text(node, "name", self.source).map(|n| unquote(&n)) else {
            self.walk_children(node, scope);
            return;
        };
        let qualified = scope.qualify(&name);
        let keyword = if node.kind() == "module" { "module" } else { "namespace" };
        let symbol = self
            .new_symbol(node, &name, SymbolKind::Module, &qualified, Visibility::Public)
            .with_signature(Some(format!("{keyword} {name}")))
            .with_documentation(self.doc_for(node))
            .with_exported(Self::exported(scope, export, Visibility::Public));
        self.symbols.push(symbol);

        if let Some(body) = node.child_by_field_name("body") {
            self.walk_children(body, Scope::enter_namespace(&qualified));
        }
    }

    /// `const f = () => {}`, `let g = function () {}`, and module-level values.
    fn visit_bindings(&mut self, node: Node, scope: Scope, export: Export) {
        let is_const = has_child_kind(node, "const");
        for declarator in named_children(node)
            .into_iter()
            .filter(|c| c.kind() == "variable_declarator")
        {
            let name_node = declarator.child_by_field_name("name");
            let value = declarator.child_by_field_name("value");
            let name = name_node
                .filter(|n| n.kind() == "identifier")
                .map(|n| node_text(n, self.source));
            let Some(name) = name else {
                if let Some(value) = value {
                    self.walk(value, scope, Export::None);
                }
                continue;
            };

            match value {
                Some(func) if FUNCTION_VALUES.contains(&func.kind()) => {
                    self.visit_function(declarator, func, &name, scope, export, Form::Binding);
                }
                _ => {
                    if scope.is_top_level() {
                        self.push_variable(node, declarator, &name, is_const, scope, export);
                    }
                    if let Some(value) = value {
                        self.walk(value, scope, Export::None);
                    }
                }
            }
        }
    }

    fn push_variable(
        &mut self,
        statement: Node,
        declarator: Node,
        name: &str,
        is_const: bool,
        scope: Scope,
        export: Export,
    ) {
        let kind = if is_const && is_constant_name(name) {
            SymbolKind::Constant
        } else {
            SymbolKind::Variable
        };
        let keyword = children(statement)
            .first()
            .map(|k| node_text(*k, self.source))
            .unwrap_or_default();
        let mut signature = format!("{keyword} {name}");
        if let Some(ty) = field_text(declarator, "type", self.source) {
            signature.push_str(&ty);
        }
        let visibility = Visibility::from_name_convention(name);
        let symbol = self
            .new_symbol(declarator, name, kind, &scope.qualify(name), visibility)
            .with_signature(Some(collapse_whitespace(&signature)))
            .with_documentation(self.doc_for(statement))
            .with_exported(Self::exported(scope, export, visibility));
        self.symbols.push(symbol);
    }

    fn visit_method(&mut self, node: Node, scope: Scope) {
        let name = field_text(node, "name", self.source);
        // Methods of object literals are not declarations; their calls still count.
        let (Some(name), true) = (name, scope.in_class()) else {
            if let Some(body) = node.child_by_field_name("body") {
                self.walk(body, scope, Export::None);
            }
            return;
        };
        let qualified = scope.qualify(&name);
        let modifiers = member_modifiers(node, self.source);
        let visibility = member_visibility(node, &name, self.source);
        let has = |keyword: &str| modifiers.iter().any(|m| m == keyword);
        let is_accessor = has_child_kind(node, "get") || has_child_kind(node, "set");
        let type_params = field_text(node, "type_parameters", self.source).unwrap_or_default();
        let params = function_params(node, self.source);
        let return_type = return_type(node, self.source);

        let mut metadata = Metadata::new();
        if let Some(class) = scope.class_name {
            put_str(&mut metadata, keys::PARENT_CLASS, class);
        }
        put_list(&mut metadata, keys::MODIFIERS, &modifiers);
        put_list(&mut metadata, keys::DECORATORS, &self.decorators(node));
        put_flag(&mut metadata, keys::IS_STATIC, has("static"));
        put_flag(&mut metadata, keys::IS_ASYNC, has("async"));
        put_flag(
            &mut metadata,
            keys::IS_ABSTRACT,
            has("abstract") || node.kind() == "abstract_method_signature",
        );
        put_flag(&mut metadata, keys::IS_GENERATOR, has_child_kind(node, "*"));
        put_flag(&mut metadata, keys::IS_PROPERTY, is_accessor);
        put_flag(&mut metadata, keys::IS_CONSTRUCTOR, name == "constructor");
        put_str(&mut metadata, keys::TYPE_PARAMETERS, type_params.clone());
        put_str(&mut metadata, keys::PARAMETERS, params.clone());
        if let Some(ret) = &return_type {
            put_str(&mut metadata, keys::RETURN_TYPE, ret.clone());
        }

        let mut signature = modifiers.clone();
        for accessor in ["get", "set"] {
            if has_child_kind(node, accessor) {
                signature.push(accessor.to_string());
            }
        }
        let mut head = format!("{name}{type_params}{params}");
        if let Some(ret) = &return_type {
            head.push_str(&format!(": {ret}"));
        }
        signature.push(head);

        let symbol = self
            .new_symbol(node, &name, SymbolKind::Method, &qualified, visibility)
            .with_signature(Some(collapse_whitespace(&signature.join(" "))))
            .with_documentation(preceding_doc_comment(node, self.source, "/**", &["decorator"]))
            .with_metadata(metadata);
        self.symbols.push(symbol);

        if let Some(body) = node.child_by_field_name("body") {
            let caller = scope.call_key(&name);
            self.walk(body, Scope::enter_function(&qualified, &caller), Export::None);
        }
    }

    /// Class fields holding a function value become methods.
    fn visit_field(&mut self, node: Node, scope: Scope) {
        let name = field_text(node, "name", self.source)
            .or_else(|| field_text(node, "property", self.source));
        let value = node.child_by_field_name("value");
        let func = value.filter(|v| FUNCTION_VALUES.contains(&v.kind()));
        let (Some(name), Some(func), true) = (name, func, scope.in_class()) else {
            if let Some(value) = value {
                self.walk(value, scope, Export::None);
            }
            return;
        };
        let qualified = scope.qualify(&name);
        let modifiers = member_modifiers(node, self.source);
        let visibility = member_visibility(node, &name, self.source);
        let params = function_params(func, self.source);
        let return_type = return_type(func, self.source);
        let is_arrow = func.kind() == "arrow_function";

        let mut metadata = Metadata::new();
        if let Some(class) = scope.class_name {
            put_str(&mut metadata, keys::PARENT_CLASS, class);
        }
        put_list(&mut metadata, keys::MODIFIERS, &modifiers);
        put_list(&mut metadata, keys::DECORATORS, &self.decorators(node));
        put_flag(&mut metadata, keys::IS_STATIC, modifiers.iter().any(|m| m == "static"));
        put_flag(&mut metadata, keys::IS_ASYNC, has_child_kind(func, "async"));
        put_flag(&mut metadata, keys::IS_ARROW, is_arrow);
        put_str(&mut metadata, keys::PARAMETERS, params.clone());
        if let Some(ret) = &return_type {
            put_str(&mut metadata, keys::RETURN_TYPE, ret.clone());
        }

        let mut signature = modifiers.clone();
        let mut head = format!("{name} = {params}");
        if let Some(ret) = &return_type {
            head.push_str(&format!(": {ret}"));
        }
        if is_arrow {
            head.push_str(" =>");
        }
        signature.push(head);

        let symbol = self
            .new_symbol(node, &name, SymbolKind::Method, &qualified, visibility)
            .with_signature(Some(collapse_whitespace(&signature.join(" "))))
            .with_documentation(preceding_doc_comment(node, self.source, "/**", &["decorator"]))
            .with_metadata(metadata);
        self.symbols.push(symbol);

        if let Some(body) = func.child_by_field_name("body") {
            let caller = scope.call_key(&name);
            self.walk(body, Scope::enter_function(&qualified, &caller), Export::None);
        }
    }

    /// `exports.name = function`, `module.exports.name = () => {}` and
    /// `Type.prototype.name = function`. Returns whether the statement was one.
    fn visit_commonjs(&mut self, statement: Node, scope: Scope) -> bool {
        let Some(assignment) = named_children(statement)
            .into_iter()
            .find(|c| c.kind() == "assignment_expression")
        else {
            return false;
        };
        let (Some(left), Some(right)) = (
            assignment.child_by_field_name("left"),
            assignment.child_by_field_name("right"),
        ) else {
            return false;
        };
        if left.kind() != "member_expression" || !FUNCTION_VALUES.contains(&right.kind()) {
            return false;
        }
        let (Some(object), Some(name)) = (
            left.child_by_field_name("object"),
            field_text(left, "property", self.source),
        ) else {
            return false;
        };
        let object_text = node_text(object, self.source);

        if object_text == "exports" || object_text == "module.exports" {
            self.visit_function(statement, right, &name, scope, Export::Named, Form::CommonJs);
            return true;
        }

        let Some(owner) = object_text.strip_suffix(".prototype") else {
            return false;
        };
        let owner = owner.rsplit('.').next().unwrap_or(owner).to_string();
        let qualified = format!("{owner}.{name}");
        let params = function_params(right, self.source);

        let mut metadata = Metadata::new();
        put_str(&mut metadata, keys::PARENT_CLASS, owner.clone());
        put_flag(&mut metadata, keys::IS_PROTOTYPE_METHOD, true);
        put_flag(&mut metadata, keys::IS_ASYNC, has_child_kind(right, "async"));
        put_flag(&mut metadata, keys::IS_ARROW, right.kind() == "arrow_function");
        put_str(&mut metadata, keys::PARAMETERS, params.clone());

        let visibility = Visibility::from_name_convention(&name);
        let symbol = self
            .new_symbol(statement, &name, SymbolKind::Method, &qualified, visibility)
            .with_signature(Some(collapse_whitespace(&format!(
                "{owner}.prototype.{name} = function{params}"
            ))))
            .with_documentation(self.doc_for(statement))
            .with_metadata(metadata);
        self.symbols.push(symbol);

        if let Some(body) = right.child_by_field_name("body") {
            self.walk(body, Scope::enter_function(&qualified, &qualified), Export::None);
        }
        true
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

/// Last name segment of a call target: `foo` -> `foo`, `this.repo.save` -> `save`.
fn callee_name(node: Node, source: &str) -> Option<String> {
    match node.kind() {
        "identifier" | "property_identifier" | "private_property_identifier" => {
            Some(node_text(node, source))
        }
        "member_expression" => field_text(node, "property", source),
        _ => None,
    }
}

fn decorator_name(node: Node, source: &str) -> String {
    let text = node_text(node, source);
    let text = text.trim_start_matches('@').trim();
    text.split('(').next().unwrap_or(text).trim().to_string()
}

/// Parameter list text; a bare arrow parameter `x => x` is wrapped as `(x)`.
fn function_params(node: Node, source: &str) -> String {
    if let Some(params) = field_text(node, "parameters", source) {
        return collapse_whitespace(&params);
    }
    field_text(node, "parameter", source)
        .map(|p| format!("({p})"))
        .unwrap_or_default()
}

/// Declared return type without its leading colon.
fn return_type(node: Node, source: &str) -> Option<String> {
    field_text(node, "return_type", source)
        .map(|t| collapse_whitespace(t.trim_start_matches(':').trim()))
        .filter(|t| !t.is_empty())
}

/// `extends` targets and `implements` types of a class. JavaScript heritage is
/// a bare expression after `extends`.
fn class_heritage(node: Node, source: &str) -> (Vec<String>, Vec<String>) {
    let mut bases = Vec::new();
    let mut interfaces = Vec::new();
    let Some(heritage) = child_of_kind(node, "class_heritage") else {
        return (bases, interfaces);
    };
    for clause in named_children(heritage) {
        match clause.kind() {
            "extends_clause" => {
                let values = field_children(clause, "value");
                let values = if values.is_empty() {
                    named_children(clause)
                } else {
                    values
                };
                bases.extend(
                    values
                        .into_iter()
                        .filter(|v| v.kind() != "type_arguments")
                        .map(|v| collapse_whitespace(&node_text(v, source))),
                );
            }
            "implements_clause" => interfaces.extend(
                named_children(clause)
                    .into_iter()
                    .map(|t| collapse_whitespace(&node_text(t, source))),
            ),
            kind if kind.contains("comment") => {}
            _ => bases.push(collapse_whitespace(&node_text(clause, source))),
        }
    }
    (bases, interfaces)
}

/// Keyword modifiers on a class member, in source order.
fn member_modifiers(node: Node, source: &str) -> Vec<String> {
    children(node)
        .into_iter()
        .filter_map(|c| match c.kind() {
            "accessibility_modifier" | "override_modifier" => Some(node_text(c, source)),
            "static" | "readonly" | "abstract" | "async" | "declare" => Some(c.kind().to_string()),
            _ => None,
        })
        .collect()
}

/// Explicit TypeScript access modifier, then the `#name` / `_name` convention.
fn member_visibility(node: Node, name: &str, source: &str) -> Visibility {
    child_of_kind(node, "accessibility_modifier")
        .and_then(|m| Visibility::from_keyword(node_text(m, source).trim()))
        .unwrap_or_else(|| Visibility::from_name_convention(name))
}
