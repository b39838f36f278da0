use tree_sitter::Node;

use symgraph_core::analyzer::ParsedFile;
use symgraph_core::syntax::*;
use symgraph_core::types::DependencyRecord;

/// Nodes whose bodies belong to a function; `require` inside them is not a
/// module-level import.
const FUNCTION_SCOPES: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "function_expression",
    "function",
    "generator_function",
    "arrow_function",
    "method_definition",
    "class_body",
];

/// Import records from the top-level statements of a file.
pub(crate) fn extract_imports(parsed: &ParsedFile) -> Vec<DependencyRecord> {
    let mut deps = Vec::new();
    for stmt in named_children(parsed.tree.root_node()) {
        match stmt.kind() {
            "import_statement" => deps.extend(import_statement(stmt, parsed)),
            "export_statement" => {
                if let Some(dep) = reexport(stmt, parsed) {
                    deps.push(dep);
                } else {
                    find_requires(stmt, parsed, &mut deps);
                }
            }
            "lexical_declaration" | "variable_declaration" | "expression_statement" => {
                find_requires(stmt, parsed, &mut deps)
            }
            _ => {}
        }
    }
    deps
}

/// Relative specifiers point into the project.
fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier.starts_with('/')
}

fn record(parsed: &ParsedFile, node: Node, specifier: String) -> DependencyRecord {
    let mut dep = DependencyRecord::import(&parsed.path, specifier.clone(), start_line(node));
    dep.is_external = !is_relative(&specifier);
    dep
}

/// `import a from "m"`, `import { b as c } from "m"`, `import * as ns from "m"`,
/// `import "m"` and `import x = require("m")`.
fn import_statement(stmt: Node, parsed: &ParsedFile) -> Option<DependencyRecord> {
    let source = &parsed.content;
    let require_clause = child_of_kind(stmt, "import_require_clause");
    let specifier = stmt
        .child_by_field_name("source")
        .or_else(|| require_clause.and_then(|c| c.child_by_field_name("source")))
        .map(|s| unquote(&node_text(s, source)))?;
    let mut dep = record(parsed, stmt, specifier);

    if let Some(clause) = require_clause {
        dep.alias = named_children(clause)
            .into_iter()
            .find(|c| c.kind() == "identifier")
            .map(|c| node_text(c, source));
        return Some(dep);
    }

    let Some(clause) = child_of_kind(stmt, "import_clause") else {
        return Some(dep);
    };
    let mut aliases = Vec::new();
    for part in named_children(clause) {
        match part.kind() {
            "identifier" => {
                dep.imported_names.push("default".to_string());
                aliases.push(node_text(part, source));
            }
            "namespace_import" => {
                dep.is_wildcard = true;
                if let Some(name) = named_children(part).into_iter().next() {
                    aliases.push(node_text(name, source));
                }
            }
            "named_imports" => {
                for spec in named_children(part)
                    .into_iter()
                    .filter(|s| s.kind() == "import_specifier")
                {
                    if let Some(name) = field_text(spec, "name", source) {
                        dep.imported_names.push(name);
                    }
                    if let Some(alias) = field_text(spec, "alias", source) {
                        aliases.push(alias);
                    }
                }
            }
            _ => {}
        }
    }
    if aliases.len() == 1 {
        dep.alias = aliases.pop();
    }
    Some(dep)
}

/// `export { a } from "m"` and `export * from "m"`.
fn reexport(stmt: Node, parsed: &ParsedFile) -> Option<DependencyRecord> {
    let specifier = field_text(stmt, "source", &parsed.content).map(|s| unquote(&s))?;
    let mut dep = record(parsed, stmt, specifier);
    match child_of_kind(stmt, "export_clause") {
        Some(clause) => {
            dep.imported_names = named_children(clause)
                .into_iter()
                .filter(|s| s.kind() == "export_specifier")
                .filter_map(|s| field_text(s, "name", &parsed.content))
                .collect();
        }
        None => dep.is_wildcard = has_child_kind(stmt, "*") || has_child_kind(stmt, "namespace_export"),
    }
    Some(dep)
}

/// `require("m")` calls outside function bodies, with the binding they feed.
fn find_requires(node: Node, parsed: &ParsedFile, deps: &mut Vec<DependencyRecord>) {
    if FUNCTION_SCOPES.contains(&node.kind()) {
        return;
    }
    if node.kind() == "call_expression" {
        if let Some(dep) = require_call(node, parsed) {
            deps.push(dep);
            return;
        }
    }
    for child in named_children(node) {
        find_requires(child, parsed, deps);
    }
}

fn require_call(call: Node, parsed: &ParsedFile) -> Option<DependencyRecord> {
    let source = &parsed.content;
    let function = call.child_by_field_name("function")?;
    if function.kind() != "identifier" || node_text(function, source) != "require" {
        return None;
    }
    let argument = call
        .child_by_field_name("arguments")
        .and_then(|args| named_children(args).into_iter().next())
        .filter(|a| matches!(a.kind(), "string" | "template_string"))?;
    let mut dep = record(parsed, call, unquote(&node_text(argument, source)));

    if let Some(binding) = call
        .parent()
        .filter(|p| p.kind() == "variable_declarator")
        .and_then(|p| p.child_by_field_name("name"))
    {
        match binding.kind() {
            "identifier" => dep.alias = Some(node_text(binding, source)),
            "object_pattern" => {
                for prop in named_children(binding) {
                    let name = match prop.kind() {
                        "shorthand_property_identifier_pattern" => Some(node_text(prop, source)),
                        "pair_pattern" => field_text(prop, "key", source),
                        _ => None,
                    };
                    dep.imported_names.extend(name);
                }
            }
            _ => {}
        }
    }
    Some(dep)
}
