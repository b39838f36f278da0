//! Symbol extraction and dependency graphs for Python, Java, Kotlin,
//! TypeScript and JavaScript sources.
//!
//! ```no_run
//! use symgraph::{BuildOptions, ExportFormat, GraphType, Symgraph};
//!
//! let sg = Symgraph::new()?;
//! let source = "class Animal: pass\nclass Dog(Animal): pass\n";
//! let symbols = sg.extract_symbols(source, "zoo.py");
//! let deps = sg.extract_dependencies(source, "zoo.py", Some(&symbols));
//! let graph = symgraph::build_graph(&symbols, &deps, GraphType::Class, &BuildOptions::default());
//! println!("{}", symgraph::serialize(&graph, ExportFormat::Dot));
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Context, Result};

pub use symgraph_core::code_analyzer::{self, CodeAnalyzer, FileAnalysis, SymbolStatistics};
pub use symgraph_core::config::Config;
pub use symgraph_core::error::SymgraphError;
pub use symgraph_core::graph::{
    build_graph, BuildOptions, DependencyGraphResult, EdgeRelation, GraphEdge, GraphNode,
    GraphType, NodeType,
};
pub use symgraph_core::pipeline::{AnalysisPipeline, ProjectAnalysis};
pub use symgraph_core::types::{
    keys, DependencyKind, DependencyRecord, Language, Metadata, Symbol, SymbolKind, Visibility,
};
pub use symgraph_core::LanguageExtractor;
pub use symgraph_report::{serialize, ExportFormat};

use symgraph_java::JavaExtractor;
use symgraph_kotlin::KotlinExtractor;
use symgraph_python::PythonExtractor;
use symgraph_typescript::{JavaScriptExtractor, TypeScriptExtractor};

/// One extractor per supported language.
pub fn default_extractors() -> Result<Vec<Box<dyn LanguageExtractor>>> {
    Ok(vec![
        Box::new(PythonExtractor::new().context("failed to initialize Python extractor")?),
        Box::new(JavaExtractor::new().context("failed to initialize Java extractor")?),
        Box::new(KotlinExtractor::new().context("failed to initialize Kotlin extractor")?),
        Box::new(
            TypeScriptExtractor::new().context("failed to initialize TypeScript extractor")?,
        ),
        Box::new(
            JavaScriptExtractor::new().context("failed to initialize JavaScript extractor")?,
        ),
    ])
}

/// Project pipeline with every extractor registered.
pub fn pipeline(config: Config) -> Result<AnalysisPipeline> {
    Ok(AnalysisPipeline::new(
        CodeAnalyzer::new(default_extractors()?),
        config,
    ))
}

/// Language of a path by extension.
pub fn detect_language(path: &str) -> Option<Language> {
    CodeAnalyzer::detect_language(path)
}

/// Entry point holding one extractor per language.
pub struct Symgraph {
    analyzer: CodeAnalyzer,
}

impl Symgraph {
    pub fn new() -> Result<Self> {
        Ok(Self {
            analyzer: CodeAnalyzer::new(default_extractors()?),
        })
    }

    pub fn analyzer(&self) -> &CodeAnalyzer {
        &self.analyzer
    }

    /// Symbols declared in `text`. Unsupported paths and unparsable text
    /// yield an empty list.
    pub fn extract_symbols(&self, text: &str, path: &str) -> Vec<Symbol> {
        match self.extractor_for(path) {
            Some(extractor) => extractor.extract_symbols(text, path),
            None => Vec::new(),
        }
    }

    /// Import and call records of `text`. Pass the file's symbols when they
    /// are already known to avoid extracting them twice.
    pub fn extract_dependencies(
        &self,
        text: &str,
        path: &str,
        known_symbols: Option<&[Symbol]>,
    ) -> Vec<DependencyRecord> {
        match self.extractor_for(path) {
            Some(extractor) => extractor.extract_dependencies(text, path, known_symbols),
            None => Vec::new(),
        }
    }

    fn extractor_for(&self, path: &str) -> Option<&dyn LanguageExtractor> {
        let language = detect_language(path)?;
        let extractor = self.analyzer.extractor(language);
        if extractor.is_none() {
            tracing::debug!(path, "no extractor for file");
        }
        extractor
    }
}
