use std::collections::BTreeSet;

use symgraph::{
    build_graph, code_analyzer, serialize, BuildOptions, DependencyKind, EdgeRelation,
    ExportFormat, GraphType, Language, NodeType, Symbol, SymbolKind, Symgraph, Visibility,
};

fn symgraph() -> Symgraph {
    Symgraph::new().unwrap()
}

fn graph_for(sg: &Symgraph, files: &[(&str, &str)], graph_type: GraphType) -> symgraph::DependencyGraphResult {
    let mut symbols = Vec::new();
    let mut deps = Vec::new();
    for (path, source) in files {
        let file_symbols = sg.extract_symbols(source, path);
        deps.extend(sg.extract_dependencies(source, path, Some(&file_symbols)));
        symbols.extend(file_symbols);
    }
    build_graph(&symbols, &deps, graph_type, &BuildOptions::default())
}

#[test]
fn test_detect_language() {
    assert_eq!(symgraph::detect_language("src/app.py"), Some(Language::Python));
    assert_eq!(symgraph::detect_language("App.java"), Some(Language::Java));
    assert_eq!(symgraph::detect_language("build.gradle.kts"), Some(Language::Kotlin));
    assert_eq!(symgraph::detect_language("view.tsx"), Some(Language::TypeScript));
    assert_eq!(symgraph::detect_language("server.mjs"), Some(Language::JavaScript));
    assert_eq!(symgraph::detect_language("main.go"), None);
}

#[test]
fn test_unsupported_file_yields_nothing() {
    let sg = symgraph();
    assert!(sg.extract_symbols("package main", "main.go").is_empty());
    assert!(sg.extract_dependencies("package main", "main.go", None).is_empty());
}

#[test]
fn test_python_class_graph_inherits() {
    let sg = symgraph();
    let source = "class Animal: pass\nclass Dog(Animal): pass\n";
    let graph = graph_for(&sg, &[("zoo.py", source)], GraphType::Class);

    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);
    assert!(graph.has_edge("zoo.py:Dog", "zoo.py:Animal", EdgeRelation::Inherits));
}

#[test]
fn test_python_function_graph_calls() {
    let sg = symgraph();
    let source = "def helper(): return 1\ndef main(): helper()\n";
    let graph = graph_for(&sg, &[("app.py", source)], GraphType::Function);

    assert!(graph.has_edge("app.py:main", "app.py:helper", EdgeRelation::Calls));
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn test_duplicate_base_yields_one_edge() {
    let sg = symgraph();
    let source = r#"
interface Named {}
class Base {}
class Child extends Base implements Named, Named {}
"#;
    let graph = graph_for(&sg, &[("model.ts", source)], GraphType::Class);
    let implements: Vec<_> = graph
        .edges
        .iter()
        .filter(|e| e.relation == EdgeRelation::Implements)
        .collect();
    assert_eq!(implements.len(), 1);
    assert!(graph.has_edge("model.ts:Child", "model.ts:Base", EdgeRelation::Inherits));
}

#[test]
fn test_unknown_base_becomes_external_node() {
    let sg = symgraph();
    let source = r#"
public class Handler extends HttpServlet {
}
"#;
    let graph = graph_for(&sg, &[("Handler.java", source)], GraphType::Class);
    let external = graph.node("external:HttpServlet").unwrap();
    assert_eq!(external.node_type, NodeType::External);
    assert!(graph.has_edge("Handler.java:Handler", "external:HttpServlet", EdgeRelation::Inherits));
    assert_eq!(graph.node_count(), 2);
}

#[test]
fn test_qualified_name_depth_matches_nesting() {
    let sg = symgraph();
    let cases = [
        ("a.py", "class Outer:\n    class Inner:\n        def run(self):\n            pass\n"),
        (
            "A.java",
            "class Outer {\n  static class Inner {\n    void run() {}\n  }\n}\n",
        ),
        ("A.kt", "class Outer {\n  class Inner {\n    fun run() {}\n  }\n}\n"),
        ("a.ts", "namespace Outer {\n  export class Inner {\n    run() {}\n  }\n}\n"),
    ];
    for (path, source) in cases {
        let symbols = sg.extract_symbols(source, path);
        let run = symbols
            .iter()
            .find(|s| s.name == "run")
            .unwrap_or_else(|| panic!("no run in {path}: {symbols:?}"));
        assert_eq!(run.qualified_name, "Outer.Inner.run", "{path}");
        for symbol in &symbols {
            assert!(symbol.qualified_name.ends_with(&symbol.name), "{path}");
        }
        let inner = symbols.iter().find(|s| s.name == "Inner").unwrap();
        assert_eq!(inner.depth(), 1, "{path}");
    }
}

#[test]
fn test_top_level_scripts_export_only_through_export_forms() {
    let sg = symgraph();
    let ts = r#"
function internalHelper() { return 1; }
export function publicApi() { return internalHelper(); }
export default class Widget {
  render() {}
  private reset() {}
}
"#;
    let symbols = sg.extract_symbols(ts, "src/widget.ts");
    let exported = |qualified: &str| {
        symbols
            .iter()
            .find(|s| s.qualified_name == qualified)
            .unwrap_or_else(|| panic!("missing {qualified}: {symbols:?}"))
            .is_exported
    };
    assert_eq!(
        symbols
            .iter()
            .find(|s| s.name == "internalHelper")
            .map(|s| s.visibility),
        Some(Visibility::Public)
    );
    assert!(!exported("internalHelper"));
    assert!(exported("publicApi"));
    assert!(exported("Widget"));
    assert!(exported("Widget.render"));
    assert!(!exported("Widget.reset"));

    let js = "function hidden() {}\nexports.handle = function () { hidden(); };\n";
    let symbols = sg.extract_symbols(js, "lib/legacy.js");
    let hidden = symbols.iter().find(|s| s.name == "hidden").unwrap();
    let handle = symbols.iter().find(|s| s.name == "handle").unwrap();
    assert!(!hidden.is_exported);
    assert!(handle.is_exported);
}

#[test]
fn test_extraction_is_idempotent() {
    let sg = symgraph();
    let source = r#"
import { helper } from "./helper";

export class Service {
  private count = 0;
  run(): number { return helper(this.count); }
}
"#;
    let first = sg.extract_symbols(source, "service.ts");
    let second = sg.extract_symbols(source, "service.ts");
    assert_eq!(first, second);
    assert_eq!(
        sg.extract_dependencies(source, "service.ts", None),
        sg.extract_dependencies(source, "service.ts", Some(&first))
    );
}

#[test]
fn test_analyze_files_order_independent() {
    let sg = symgraph();
    let files = vec![
        ("a.py".to_string(), "def a():\n    b()\n".to_string()),
        ("B.java".to_string(), "public class B { void go() {} }".to_string()),
        ("c.kt".to_string(), "object C { fun go() = 1 }".to_string()),
        ("README.md".to_string(), "# readme".to_string()),
    ];
    let mut reversed = files.clone();
    reversed.reverse();

    let forward = sg.analyzer().analyze_files(&files);
    let backward = sg.analyzer().analyze_files(&reversed);
    assert_eq!(forward.len(), 3, "unsupported files are dropped");
    assert_eq!(forward[0].path, "a.py");

    let as_set = |symbols: Vec<Symbol>| -> BTreeSet<String> {
        symbols
            .into_iter()
            .map(|s| format!("{}:{}", s.file_path, s.qualified_name))
            .collect()
    };
    assert_eq!(
        as_set(code_analyzer::aggregate(&forward)),
        as_set(code_analyzer::aggregate(&backward))
    );
}

#[test]
fn test_empty_input_for_every_graph_type() {
    for graph_type in GraphType::ALL {
        let graph = build_graph(&[], &[], graph_type, &BuildOptions::default());
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        for format in [ExportFormat::Json, ExportFormat::Dot, ExportFormat::GraphMl] {
            assert!(!serialize(&graph, format).is_empty());
        }
    }
}

#[test]
fn test_depth_zero_keeps_full_graph() {
    let sg = symgraph();
    let source = "def a():\n    b()\ndef b():\n    c()\ndef c():\n    pass\n";
    let symbols = sg.extract_symbols(source, "chain.py");
    let deps = sg.extract_dependencies(source, "chain.py", Some(&symbols));

    let full = build_graph(&symbols, &deps, GraphType::Function, &BuildOptions::default());
    assert_eq!(full.node_count(), 3);
    assert_eq!(full.edge_count(), 2);

    let limited = build_graph(
        &symbols,
        &deps,
        GraphType::Function,
        &BuildOptions {
            max_depth: 1,
            ..Default::default()
        },
    );
    assert_eq!(limited.node_count(), 2);
    assert!(limited.node("chain.py:c").is_none());
}

#[test]
fn test_cross_language_file_graph() {
    let sg = symgraph();
    let files = [
        ("web/index.ts", "import { format } from './util';\nimport React from 'react';\n"),
        ("web/util.ts", "export function format(s: string) { return s; }\n"),
        ("svc/app.py", "from svc.models import User\nimport os\n"),
        ("svc/models.py", "class User:\n    pass\n"),
    ];
    let graph = graph_for(&sg, &files, GraphType::File);
    assert!(graph.has_edge("web/index.ts", "web/util.ts", EdgeRelation::Imports));
    assert!(graph.has_edge("web/index.ts", "external:react", EdgeRelation::Imports));
    assert!(graph.has_edge("svc/app.py", "svc/models.py", EdgeRelation::Imports));
    assert!(graph.has_edge("svc/app.py", "external:os", EdgeRelation::Imports));
    assert_eq!(graph.metadata.languages, vec!["python", "typescript"]);

    let modules = graph_for(&sg, &files, GraphType::Module);
    assert!(modules.has_edge("svc.app", "svc.models", EdgeRelation::Imports));
}

#[test]
fn test_dependency_kinds() {
    let sg = symgraph();
    let source = r#"
import static org.junit.Assert.assertEquals;
import java.util.*;

class T {
    void check() { assertEquals(1, 1); }
}
"#;
    let deps = sg.extract_dependencies(source, "T.java", None);
    assert!(deps.iter().any(|d| d.kind == DependencyKind::StaticImport));
    assert!(deps.iter().any(|d| d.is_wildcard && d.target == "java.util"));
    let call = deps
        .iter()
        .find(|d| d.kind == DependencyKind::Call)
        .unwrap();
    assert_eq!(call.caller.as_deref(), Some("T.check"));
    assert_eq!(call.callee.as_deref(), Some("assertEquals"));
}

#[test]
fn test_statistics_and_filters_over_real_symbols() {
    let sg = symgraph();
    let source = "class Repo:\n    def save(self):\n        pass\n    def _flush(self):\n        pass\n";
    let symbols = sg.extract_symbols(source, "repo.py");
    let methods = code_analyzer::filter_by_kind(&symbols, SymbolKind::Method);
    assert_eq!(methods.len(), 2);
    assert_eq!(code_analyzer::exported_only(methods).len(), 1);

    let stats = code_analyzer::statistics(&symbols);
    assert_eq!(stats.total, 3);
    assert_eq!(stats.by_visibility.get("private"), Some(&1));
}

#[test]
fn test_metadata_survives_json_round_trip() {
    let sg = symgraph();
    let source = "@dataclass\nclass Point:\n    x: int = 0\n\nasync def fetch() -> dict:\n    pass\n";
    let symbols = sg.extract_symbols(source, "geo.py");
    let encoded = serde_json::to_string(&symbols).unwrap();
    let decoded: Vec<Symbol> = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, symbols);
}
