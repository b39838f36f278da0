use symgraph_core::graph::{DependencyGraphResult, EdgeRelation, GraphEdge, NodeType};

/// Fill colour for a node type.
fn node_color(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::Class => "#A9DFBF",
        NodeType::Interface => "#F9E79F",
        NodeType::Enum => "#F1948A",
        NodeType::Function => "#AED6F1",
        NodeType::Method => "#D6EAF8",
        NodeType::File => "#FAD7A0",
        NodeType::Module => "#D7BDE2",
        NodeType::ExternalModule => "#EAECEE",
        _ => "#FDFEFE",
    }
}

/// Edge attributes by relation. External edges are always dotted gray.
fn edge_style(edge: &GraphEdge) -> &'static str {
    if edge.is_external() {
        return "color=gray, style=dotted";
    }
    match edge.relation {
        EdgeRelation::Inherits => "color=\"#1E8449\", style=bold",
        EdgeRelation::Implements => "color=\"#2874A6\", style=dashed",
        EdgeRelation::Calls => "color=\"#7D3C98\"",
        EdgeRelation::Contains => "color=\"#566573\", arrowhead=odiamond",
        _ => "color=\"#2C3E50\"",
    }
}

/// Escape text for a double-quoted DOT string.
pub fn escape_dot(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Format a graph as a GraphViz DOT digraph. Every id is quoted, so any
/// node id survives the round trip through a DOT parser.
pub fn to_dot(result: &DependencyGraphResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("digraph \"{}\" {{\n", escape_dot(&result.id)));
    out.push_str(&format!("  label=\"{}\";\n", escape_dot(&result.label)));
    out.push_str("  rankdir=LR;\n");
    out.push_str("  node [shape=box, style=\"rounded,filled\", fontname=\"Helvetica\"];\n");
    out.push_str("  edge [fontname=\"Helvetica\", fontsize=10];\n\n");

    for node in result.nodes.values() {
        let style = if node.node_type.is_external() {
            ", style=\"rounded,filled,dashed\""
        } else {
            ""
        };
        out.push_str(&format!(
            "  \"{}\" [label=\"{}\", fillcolor=\"{}\"{style}];\n",
            escape_dot(&node.id),
            escape_dot(&node.label),
            node_color(node.node_type),
        ));
    }

    if !result.edges.is_empty() {
        out.push('\n');
    }
    for edge in &result.edges {
        out.push_str(&format!(
            "  \"{}\" -> \"{}\" [label=\"{}\", {}];\n",
            escape_dot(&edge.source),
            escape_dot(&edge.target),
            edge.relation,
            edge_style(edge),
        ));
    }

    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use symgraph_core::graph::{build_graph, BuildOptions, GraphType};
    use symgraph_core::types::{keys, Language, Metadata, Symbol, SymbolKind, Visibility};

    fn class(name: &str, kind: SymbolKind, bases: &[&str], interfaces: &[&str]) -> Symbol {
        let mut metadata = Metadata::new();
        metadata.insert(keys::BASE_CLASSES.into(), json!(bases));
        metadata.insert(keys::INTERFACES.into(), json!(interfaces));
        Symbol::new(name, kind, Language::Java, "Zoo.java", 1, name, Visibility::Public)
            .with_metadata(metadata)
    }

    #[test]
    fn test_escape_dot() {
        assert_eq!(escape_dot(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape_dot("a\nb"), "a\\nb");
        assert_eq!(escape_dot(r"C:\src"), r"C:\\src");
    }

    #[test]
    fn test_to_dot_colors_and_edge_styles() {
        let symbols = vec![
            class("Animal", SymbolKind::Class, &[], &[]),
            class("Pet", SymbolKind::Interface, &[], &[]),
            class("Dog", SymbolKind::Class, &["Animal"], &["Pet", "Serializable"]),
        ];
        let graph = build_graph(&symbols, &[], GraphType::Class, &BuildOptions::default());
        let dot = to_dot(&graph);

        assert!(dot.starts_with("digraph \"class-dependency-graph\" {"));
        assert!(dot.contains("\"Zoo.java:Dog\" [label=\"Dog\", fillcolor=\"#A9DFBF\"]"));
        assert!(dot.contains("\"Zoo.java:Pet\" [label=\"Pet\", fillcolor=\"#F9E79F\"]"));
        assert!(dot.contains("\"Zoo.java:Dog\" -> \"Zoo.java:Animal\" [label=\"inherits\", color=\"#1E8449\", style=bold]"));
        assert!(dot.contains("\"Zoo.java:Dog\" -> \"Zoo.java:Pet\" [label=\"implements\", color=\"#2874A6\", style=dashed]"));
        assert!(dot.contains("\"Zoo.java:Dog\" -> \"external:Serializable\" [label=\"implements\", color=gray, style=dotted]"));
        assert!(dot.contains("style=\"rounded,filled,dashed\""));
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn test_to_dot_escapes_identifiers() {
        let symbols = vec![Symbol::new(
            "weird\"name",
            SymbolKind::Function,
            Language::JavaScript,
            "src/<a&b>.js",
            1,
            "weird\"name",
            Visibility::Public,
        )];
        let graph = build_graph(&symbols, &[], GraphType::Function, &BuildOptions::default());
        let dot = to_dot(&graph);
        assert!(dot.contains("\"src/<a&b>.js:weird\\\"name\" [label=\"weird\\\"name\""));
        assert_eq!(dot.matches('{').count(), 1);
    }
}
