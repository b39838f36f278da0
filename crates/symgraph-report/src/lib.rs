//! Serializers and terminal summaries for symgraph results.

pub mod dot;
pub mod graphml;
pub mod json;
pub mod text;

use std::fmt;

use symgraph_core::error::SymgraphError;
use symgraph_core::graph::DependencyGraphResult;

/// Interchange format of an exported graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// JSON Graph Format
    #[default]
    Json,
    /// GraphViz DOT
    Dot,
    GraphMl,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Dot => "dot",
            ExportFormat::GraphMl => "graphml",
        }
    }

    /// Conventional file extension for the format.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Dot => "dot",
            ExportFormat::GraphMl => "graphml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = SymgraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" | "jgf" => Ok(ExportFormat::Json),
            "dot" | "gv" | "graphviz" => Ok(ExportFormat::Dot),
            "graphml" | "xml" => Ok(ExportFormat::GraphMl),
            _ => Err(SymgraphError::UnknownFormat(s.to_string())),
        }
    }
}

/// Render a graph in the requested format. Never fails for a built graph.
pub fn serialize(result: &DependencyGraphResult, format: ExportFormat) -> String {
    match format {
        ExportFormat::Json => json::to_json_graph(result),
        ExportFormat::Dot => dot::to_dot(result),
        ExportFormat::GraphMl => graphml::to_graphml(result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symgraph_core::graph::{build_graph, BuildOptions, GraphType};

    #[test]
    fn test_parse_format_aliases() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("jgf".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("gv".parse::<ExportFormat>().unwrap(), ExportFormat::Dot);
        assert_eq!("xml".parse::<ExportFormat>().unwrap(), ExportFormat::GraphMl);
        assert!(matches!(
            "svg".parse::<ExportFormat>(),
            Err(SymgraphError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_serialize_empty_graph_in_every_format() {
        let graph = build_graph(&[], &[], GraphType::File, &BuildOptions::default());
        assert!(serialize(&graph, ExportFormat::Json).contains("\"nodes\""));
        assert!(serialize(&graph, ExportFormat::Dot).starts_with("digraph"));
        assert!(serialize(&graph, ExportFormat::GraphMl).contains("<graphml"));
    }
}
