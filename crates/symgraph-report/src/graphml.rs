use serde_json::Value;

use symgraph_core::graph::{DependencyGraphResult, GraphNode};

/// Node attributes exported as `<data>` elements: (key id, metadata key, attr type).
const NODE_KEYS: &[(&str, &str, &str)] = &[
    ("d_file", "file", "string"),
    ("d_line_start", "line_start", "int"),
    ("d_language", "language", "string"),
    ("d_visibility", "visibility", "string"),
];

/// Escape the five XML special characters.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn metadata_text(node: &GraphNode, key: &str) -> Option<String> {
    match node.metadata.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Format a graph as GraphML.
pub fn to_graphml(result: &DependencyGraphResult) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<graphml xmlns=\"http://graphml.graphdrawing.org/xmlns\" ");
    out.push_str("xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" ");
    out.push_str("xsi:schemaLocation=\"http://graphml.graphdrawing.org/xmlns ");
    out.push_str("http://graphml.graphdrawing.org/xmlns/1.0/graphml.xsd\">\n");

    out.push_str("  <key id=\"d_label\" for=\"node\" attr.name=\"label\" attr.type=\"string\"/>\n");
    out.push_str("  <key id=\"d_type\" for=\"node\" attr.name=\"type\" attr.type=\"string\"/>\n");
    for (id, name, ty) in NODE_KEYS {
        out.push_str(&format!(
            "  <key id=\"{id}\" for=\"node\" attr.name=\"{name}\" attr.type=\"{ty}\"/>\n"
        ));
    }
    out.push_str(
        "  <key id=\"d_relation\" for=\"edge\" attr.name=\"relation\" attr.type=\"string\"/>\n",
    );

    out.push_str(&format!(
        "  <graph id=\"{}\" edgedefault=\"directed\">\n",
        escape_xml(&result.id)
    ));

    for node in result.nodes.values() {
        out.push_str(&format!("    <node id=\"{}\">\n", escape_xml(&node.id)));
        out.push_str(&format!(
            "      <data key=\"d_label\">{}</data>\n",
            escape_xml(&node.label)
        ));
        out.push_str(&format!(
            "      <data key=\"d_type\">{}</data>\n",
            node.node_type
        ));
        for (id, key, _) in NODE_KEYS {
            if let Some(text) = metadata_text(node, key) {
                out.push_str(&format!(
                    "      <data key=\"{id}\">{}</data>\n",
                    escape_xml(&text)
                ));
            }
        }
        out.push_str("    </node>\n");
    }

    for (i, edge) in result.edges.iter().enumerate() {
        out.push_str(&format!(
            "    <edge id=\"e{i}\" source=\"{}\" target=\"{}\">\n",
            escape_xml(&edge.source),
            escape_xml(&edge.target)
        ));
        out.push_str(&format!(
            "      <data key=\"d_relation\">{}</data>\n",
            edge.relation
        ));
        out.push_str("    </edge>\n");
    }

    out.push_str("  </graph>\n");
    out.push_str("</graphml>\n");
    out
}
