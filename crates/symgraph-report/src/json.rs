use serde_json::{json, Map, Value};

use symgraph_core::graph::{DependencyGraphResult, GraphMetadata};

/// Format a graph as JSON Graph Format:
/// `{"graph": {id, type, label, directed, metadata, nodes: {id: {...}}, edges: [...]}}`.
pub fn to_json_graph(result: &DependencyGraphResult) -> String {
    let nodes: Map<String, Value> = result
        .nodes
        .values()
        .map(|node| {
            let mut metadata = node.metadata.clone();
            metadata.insert("type".into(), json!(node.node_type.as_str()));
            (
                node.id.clone(),
                json!({ "label": node.label, "metadata": metadata }),
            )
        })
        .collect();

    let edges: Vec<Value> = result
        .edges
        .iter()
        .map(|edge| {
            let mut value = json!({
                "source": edge.source,
                "target": edge.target,
                "relation": edge.relation.as_str(),
                "directed": edge.directed,
            });
            if !edge.metadata.is_empty() {
                value["metadata"] = Value::Object(edge.metadata.clone());
            }
            value
        })
        .collect();

    let document = json!({
        "graph": {
            "id": result.id,
            "type": result.graph_type.as_str(),
            "label": result.label,
            "directed": true,
            "metadata": graph_metadata(&result.metadata),
            "nodes": nodes,
            "edges": edges,
        }
    });
    format!("{document:#}")
}

fn graph_metadata(metadata: &GraphMetadata) -> Value {
    let mut value = json!({
        "generator": metadata.generator,
        "version": metadata.version,
        "generated_at": metadata.generated_at,
        "graph_type": metadata.graph_type.as_str(),
        "node_count": metadata.node_count,
        "edge_count": metadata.edge_count,
        "languages": metadata.languages,
    });
    if let Some(depth) = metadata.max_depth {
        value["max_depth"] = json!(depth);
    }
    if let Some(repository) = &metadata.repository {
        value["repository"] = repository.clone();
    }
    value
}
