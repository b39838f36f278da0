pub mod analyzer;
pub mod cache;
pub mod code_analyzer;
pub mod config;
pub mod error;
pub mod filter;
pub mod graph;
pub mod pipeline;
pub mod resolve;
pub mod syntax;
pub mod types;

pub use analyzer::{LanguageExtractor, ParsedFile};
pub use code_analyzer::{CodeAnalyzer, FileAnalysis, SymbolStatistics};
pub use config::Config;
pub use error::SymgraphError;
pub use graph::{
    build_graph, BuildOptions, DependencyGraphResult, EdgeRelation, GraphEdge, GraphNode,
    GraphType, NodeType,
};
pub use pipeline::{AnalysisPipeline, ProjectAnalysis};
pub use types::*;
