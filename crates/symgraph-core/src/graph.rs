use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::SymgraphError;
use crate::resolve::{module_id, ImportResolver};
use crate::syntax::simple_type_name;
use crate::types::{DependencyKind, DependencyRecord, Language, Metadata, Symbol, SymbolKind};

/// Granularity at which a dependency graph is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphType {
    #[default]
    File,
    Module,
    Class,
    Function,
    Symbol,
}

impl GraphType {
    pub const ALL: [GraphType; 5] = [
        GraphType::File,
        GraphType::Module,
        GraphType::Class,
        GraphType::Function,
        GraphType::Symbol,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GraphType::File => "file",
            GraphType::Module => "module",
            GraphType::Class => "class",
            GraphType::Function => "function",
            GraphType::Symbol => "symbol",
        }
    }
}

impl fmt::Display for GraphType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GraphType {
    type Err = SymgraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" | "files" => Ok(GraphType::File),
            "module" | "modules" => Ok(GraphType::Module),
            "class" | "classes" => Ok(GraphType::Class),
            "function" | "functions" | "call" | "calls" => Ok(GraphType::Function),
            "symbol" | "symbols" => Ok(GraphType::Symbol),
            _ => Err(SymgraphError::UnknownGraphType(s.to_string())),
        }
    }
}

/// What a graph node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    File,
    Module,
    Class,
    Interface,
    Enum,
    Function,
    Method,
    Variable,
    Constant,
    ExternalModule,
    External,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::File => "file",
            NodeType::Module => "module",
            NodeType::Class => "class",
            NodeType::Interface => "interface",
            NodeType::Enum => "enum",
            NodeType::Function => "function",
            NodeType::Method => "method",
            NodeType::Variable => "variable",
            NodeType::Constant => "constant",
            NodeType::ExternalModule => "external_module",
            NodeType::External => "external",
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, NodeType::External | NodeType::ExternalModule)
    }
}

impl From<SymbolKind> for NodeType {
    fn from(kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::Function => NodeType::Function,
            SymbolKind::Method => NodeType::Method,
            SymbolKind::Class => NodeType::Class,
            SymbolKind::Interface => NodeType::Interface,
            SymbolKind::Enum => NodeType::Enum,
            SymbolKind::Variable => NodeType::Variable,
            SymbolKind::Constant => NodeType::Constant,
            SymbolKind::Module => NodeType::Module,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relation carried by a graph edge.
///
/// `Uses` and `Instantiates` are part of the vocabulary but no strategy emits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeRelation {
    Imports,
    Inherits,
    Implements,
    Calls,
    Contains,
    Uses,
    Instantiates,
}

impl EdgeRelation {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeRelation::Imports => "imports",
            EdgeRelation::Inherits => "inherits",
            EdgeRelation::Implements => "implements",
            EdgeRelation::Calls => "calls",
            EdgeRelation::Contains => "contains",
            EdgeRelation::Uses => "uses",
            EdgeRelation::Instantiates => "instantiates",
        }
    }
}

impl fmt::Display for EdgeRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node in a dependency graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub node_type: NodeType,
    #[serde(default)]
    pub metadata: Metadata,
}

impl GraphNode {
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// Directed edge in a dependency graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub relation: EdgeRelation,
    pub directed: bool,
    #[serde(default)]
    pub metadata: Metadata,
}

impl GraphEdge {
    pub fn is_external(&self) -> bool {
        self.metadata
            .get("is_external")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub generator: String,
    pub version: String,
    /// RFC 3339 UTC timestamp.
    pub generated_at: String,
    pub graph_type: GraphType,
    pub node_count: usize,
    pub edge_count: usize,
    /// Distinct languages of the input, sorted.
    pub languages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<Value>,
}

/// A built graph. Nodes are keyed and ordered by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyGraphResult {
    pub id: String,
    pub label: String,
    pub graph_type: GraphType,
    pub nodes: BTreeMap<String, GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub metadata: GraphMetadata,
}

impl DependencyGraphResult {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// Whether an edge `source -relation-> target` exists.
    pub fn has_edge(&self, source: &str, target: &str, relation: EdgeRelation) -> bool {
        self.edges
            .iter()
            .any(|e| e.source == source && e.target == target && e.relation == relation)
    }

    /// Edge counts per relation.
    pub fn relation_counts(&self) -> BTreeMap<EdgeRelation, usize> {
        let mut counts = BTreeMap::new();
        for edge in &self.edges {
            *counts.entry(edge.relation).or_insert(0) += 1;
        }
        counts
    }
}

/// Caller-supplied settings for [`build_graph`].
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub id: Option<String>,
    pub label: Option<String>,
    /// Keep only nodes within this many hops of a root; 0 keeps everything.
    pub max_depth: usize,
    /// Free-form repository descriptor copied into the metadata.
    pub repository: Option<Value>,
}

/// Build a dependency graph of the requested granularity.
///
/// Empty input yields an empty graph. Building never fails: references that
/// cannot be resolved become external nodes or are dropped.
pub fn build_graph(
    symbols: &[Symbol],
    dependencies: &[DependencyRecord],
    graph_type: GraphType,
    options: &BuildOptions,
) -> DependencyGraphResult {
    let mut builder = GraphBuilder::default();
    match graph_type {
        GraphType::File => builder.file_graph(symbols, dependencies),
        GraphType::Module => builder.module_graph(symbols, dependencies),
        GraphType::Class => builder.class_graph(symbols),
        GraphType::Function => builder.function_graph(symbols, dependencies),
        GraphType::Symbol => builder.symbol_graph(symbols, dependencies),
    }

    let (nodes, edges) = if options.max_depth > 0 {
        limit_depth(builder.nodes, builder.edges, options.max_depth)
    } else {
        (builder.nodes, builder.edges)
    };

    tracing::debug!(
        graph_type = %graph_type,
        nodes = nodes.len(),
        edges = edges.len(),
        "built dependency graph"
    );

    let metadata = GraphMetadata {
        generator: "symgraph".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        graph_type,
        node_count: nodes.len(),
        edge_count: edges.len(),
        languages: languages(symbols, dependencies),
        max_depth: (options.max_depth > 0).then_some(options.max_depth),
        repository: options.repository.clone(),
    };

    DependencyGraphResult {
        id: options
            .id
            .clone()
            .unwrap_or_else(|| format!("{graph_type}-dependency-graph")),
        label: options
            .label
            .clone()
            .unwrap_or_else(|| format!("{graph_type} dependency graph")),
        graph_type,
        nodes,
        edges,
        metadata,
    }
}

fn languages(symbols: &[Symbol], dependencies: &[DependencyRecord]) -> Vec<String> {
    let mut seen: BTreeSet<&'static str> = symbols.iter().map(|s| s.language.as_str()).collect();
    seen.extend(
        dependencies
            .iter()
            .filter_map(|d| Language::from_path(&d.source_file))
            .map(|l| l.as_str()),
    );
    seen.into_iter().map(str::to_string).collect()
}

/// `file:name` id used by the class graph.
fn class_node_id(symbol: &Symbol) -> String {
    format!("{}:{}", symbol.file_path, symbol.name)
}

/// `file:[Parent.]name` id used by the function and symbol graphs.
fn symbol_node_id(symbol: &Symbol) -> String {
    format!("{}:{}", symbol.file_path, symbol.call_key())
}

fn symbol_metadata(symbol: &Symbol) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("file".into(), json!(symbol.file_path));
    metadata.insert("line_start".into(), json!(symbol.line_start));
    if let Some(end) = symbol.line_end {
        metadata.insert("line_end".into(), json!(end));
    }
    metadata.insert("language".into(), json!(symbol.language.as_str()));
    metadata.insert("visibility".into(), json!(symbol.visibility.as_str()));
    metadata.insert("kind".into(), json!(symbol.kind.as_str()));
    metadata.insert("qualified_name".into(), json!(symbol.qualified_name));
    metadata.insert("is_exported".into(), json!(symbol.is_exported));
    if let Some(parent) = symbol.parent_class() {
        metadata.insert("parent_class".into(), json!(parent));
    }
    if let Some(signature) = &symbol.signature {
        metadata.insert("signature".into(), json!(signature));
    }
    metadata
}

fn file_label(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

/// Accumulates nodes and deduplicated edges for one build.
#[derive(Default)]
struct GraphBuilder {
    nodes: BTreeMap<String, GraphNode>,
    edges: Vec<GraphEdge>,
    seen: HashSet<(String, String, EdgeRelation)>,
}

impl GraphBuilder {
    /// Insert a node unless one with the same id exists.
    fn add_node(&mut self, id: String, label: String, node_type: NodeType, metadata: Metadata) {
        self.nodes.entry(id.clone()).or_insert(GraphNode {
            id,
            label,
            node_type,
            metadata,
        });
    }

    fn add_external(&mut self, id: &str, label: &str, node_type: NodeType) {
        let mut metadata = Metadata::new();
        metadata.insert("is_external".into(), Value::Bool(true));
        self.add_node(id.to_string(), label.to_string(), node_type, metadata);
    }

    /// Add an edge once per `(source, target, relation)`; self-loops are dropped.
    fn add_edge(&mut self, source: &str, target: &str, relation: EdgeRelation, metadata: Metadata) {
        if source == target {
            return;
        }
        let key = (source.to_string(), target.to_string(), relation);
        if !self.seen.insert(key) {
            return;
        }
        self.edges.push(GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
            relation,
            directed: true,
            metadata,
        });
    }

    fn file_graph(&mut self, symbols: &[Symbol], dependencies: &[DependencyRecord]) {
        let files = known_files(symbols, dependencies);
        for file in &files {
            let mut metadata = Metadata::new();
            metadata.insert("file".into(), json!(file));
            if let Some(language) = Language::from_path(file) {
                metadata.insert("language".into(), json!(language.as_str()));
            }
            let count = symbols.iter().filter(|s| &s.file_path == file).count();
            metadata.insert("symbol_count".into(), json!(count));
            self.add_node(file.clone(), file_label(file), NodeType::File, metadata);
        }

        let resolver = ImportResolver::new(files.iter().map(String::as_str));
        for dep in dependencies.iter().filter(|d| d.is_import()) {
            match resolver.resolve(dep) {
                Some(target) => {
                    let target = target.to_string();
                    self.add_edge(&dep.source_file, &target, EdgeRelation::Imports, import_metadata(dep, false));
                }
                None => {
                    let id = format!("external:{}", dep.target);
                    self.add_external(&id, &dep.target, NodeType::ExternalModule);
                    self.add_edge(&dep.source_file, &id, EdgeRelation::Imports, import_metadata(dep, true));
                }
            }
        }
    }

    fn module_graph(&mut self, symbols: &[Symbol], dependencies: &[DependencyRecord]) {
        let files = known_files(symbols, dependencies);
        for file in &files {
            let id = module_id(file);
            let label = id.rsplit('.').next().unwrap_or(&id).to_string();
            let mut metadata = Metadata::new();
            metadata.insert("file".into(), json!(file));
            if let Some(language) = Language::from_path(file) {
                metadata.insert("language".into(), json!(language.as_str()));
            }
            self.add_node(id, label, NodeType::Module, metadata);
        }

        let resolver = ImportResolver::new(files.iter().map(String::as_str));
        for dep in dependencies.iter().filter(|d| d.is_import()) {
            let source = module_id(&dep.source_file);
            match resolver.resolve(dep) {
                Some(file) => {
                    let target = module_id(file);
                    self.add_edge(&source, &target, EdgeRelation::Imports, import_metadata(dep, false));
                }
                None => {
                    let id = format!("external:{}", dep.target);
                    self.add_external(&id, &dep.target, NodeType::ExternalModule);
                    self.add_edge(&source, &id, EdgeRelation::Imports, import_metadata(dep, true));
                }
            }
        }
    }

    fn class_graph(&mut self, symbols: &[Symbol]) {
        for symbol in symbols.iter().filter(|s| s.kind.is_type()) {
            let mut metadata = symbol_metadata(symbol);
            let methods: Vec<&str> = symbols
                .iter()
                .filter(|m| {
                    m.kind == SymbolKind::Method
                        && m.file_path == symbol.file_path
                        && m.parent_class() == Some(symbol.name.as_str())
                })
                .map(|m| m.name.as_str())
                .collect();
            metadata.insert("methods".into(), json!(methods));
            self.add_node(class_node_id(symbol), symbol.name.clone(), symbol.kind.into(), metadata);
        }
        self.heritage_edges(symbols, class_node_id);
    }

    /// `inherits` and `implements` edges between type symbols, resolving names
    /// against known types and synthesizing `external:<name>` nodes otherwise.
    fn heritage_edges(&mut self, symbols: &[Symbol], node_id: fn(&Symbol) -> String) {
        let types: Vec<&Symbol> = symbols.iter().filter(|s| s.kind.is_type()).collect();
        let mut by_name: HashMap<&str, Vec<(String, &str)>> = HashMap::new();
        for t in &types {
            by_name
                .entry(t.name.as_str())
                .or_default()
                .push((node_id(t), t.file_path.as_str()));
        }
        for candidates in by_name.values_mut() {
            candidates.sort();
        }

        for symbol in &types {
            let source = node_id(symbol);
            let relations = symbol
                .base_classes()
                .into_iter()
                .map(|b| (b, EdgeRelation::Inherits))
                .chain(
                    symbol
                        .interfaces()
                        .into_iter()
                        .map(|i| (i, EdgeRelation::Implements)),
                );
            for (reference, relation) in relations {
                let name = simple_type_name(&reference);
                if name.is_empty() {
                    continue;
                }
                let resolved = by_name.get(name.as_str()).and_then(|candidates| {
                    let others: Vec<&(String, &str)> =
                        candidates.iter().filter(|(id, _)| *id != source).collect();
                    others
                        .iter()
                        .find(|(_, file)| *file == symbol.file_path)
                        .or_else(|| others.first())
                        .map(|(id, _)| id.clone())
                });
                match resolved {
                    Some(target) => self.add_edge(&source, &target, relation, Metadata::new()),
                    None => {
                        let id = format!("external:{name}");
                        self.add_external(&id, &name, NodeType::External);
                        let mut metadata = Metadata::new();
                        metadata.insert("is_external".into(), Value::Bool(true));
                        self.add_edge(&source, &id, relation, metadata);
                    }
                }
            }
        }
    }

    fn function_graph(&mut self, symbols: &[Symbol], dependencies: &[DependencyRecord]) {
        for symbol in symbols.iter().filter(|s| s.kind.is_callable()) {
            self.add_node(
                symbol_node_id(symbol),
                symbol.call_key(),
                symbol.kind.into(),
                symbol_metadata(symbol),
            );
        }
        self.call_edges(symbols, dependencies);
    }

    /// `calls` edges, resolving caller and callee names against callable nodes.
    /// Records whose caller or callee cannot be resolved are dropped.
    fn call_edges(&mut self, symbols: &[Symbol], dependencies: &[DependencyRecord]) {
        let index = CallIndex::new(symbols.iter().filter(|s| s.kind.is_callable()));
        for dep in dependencies.iter().filter(|d| d.kind == DependencyKind::Call) {
            let (Some(caller), Some(callee)) = (dep.caller.as_deref(), dep.callee.as_deref()) else {
                continue;
            };
            let (Some(source), Some(target)) = (
                index.resolve(&dep.source_file, caller),
                index.resolve(&dep.source_file, callee),
            ) else {
                tracing::trace!(caller, callee, file = %dep.source_file, "unresolved call");
                continue;
            };
            let (source, target) = (source.to_string(), target.to_string());
            let mut metadata = Metadata::new();
            if let Some(line) = dep.line {
                metadata.insert("line".into(), json!(line));
            }
            self.add_edge(&source, &target, EdgeRelation::Calls, metadata);
        }
    }

    fn symbol_graph(&mut self, symbols: &[Symbol], dependencies: &[DependencyRecord]) {
        for symbol in symbols {
            self.add_node(
                symbol_node_id(symbol),
                symbol.name.clone(),
                symbol.kind.into(),
                symbol_metadata(symbol),
            );
        }
        self.heritage_edges(symbols, symbol_node_id);
        self.call_edges(symbols, dependencies);

        let owners: HashMap<(&str, &str), String> = symbols
            .iter()
            .filter(|s| s.kind.is_type())
            .map(|s| ((s.file_path.as_str(), s.name.as_str()), symbol_node_id(s)))
            .collect();
        for method in symbols.iter().filter(|s| s.kind == SymbolKind::Method) {
            let Some(parent) = method.parent_class() else {
                continue;
            };
            if let Some(owner) = owners.get(&(method.file_path.as_str(), parent)) {
                let owner = owner.clone();
                self.add_edge(&owner, &symbol_node_id(method), EdgeRelation::Contains, Metadata::new());
            }
        }
    }
}

/// Every file named by a symbol or a dependency record, sorted.
fn known_files(symbols: &[Symbol], dependencies: &[DependencyRecord]) -> BTreeSet<String> {
    symbols
        .iter()
        .map(|s| s.file_path.clone())
        .chain(dependencies.iter().map(|d| d.source_file.clone()))
        .collect()
}

fn import_metadata(dep: &DependencyRecord, is_external: bool) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("import".into(), json!(dep.target));
    if let Some(line) = dep.line {
        metadata.insert("line".into(), json!(line));
    }
    if dep.kind == DependencyKind::StaticImport {
        metadata.insert("static".into(), Value::Bool(true));
    }
    if is_external {
        metadata.insert("is_external".into(), Value::Bool(true));
    }
    metadata
}

/// Callable node ids indexed by their last name segment.
struct CallIndex {
    by_name: HashMap<String, Vec<String>>,
}

impl CallIndex {
    fn new<'a>(callables: impl Iterator<Item = &'a Symbol>) -> Self {
        let mut by_name: HashMap<String, Vec<String>> = HashMap::new();
        for symbol in callables {
            by_name
                .entry(symbol.name.clone())
                .or_default()
                .push(symbol_node_id(symbol));
        }
        for ids in by_name.values_mut() {
            ids.sort();
            ids.dedup();
        }
        Self { by_name }
    }

    /// Resolve a caller key or callee name seen in `file`.
    ///
    /// An exact `file:name` id wins. Otherwise any id ending in `:name` or
    /// `.name` matches, preferring ids in the same file, then the smallest id.
    fn resolve(&self, file: &str, name: &str) -> Option<&str> {
        let last = name.rsplit('.').next().unwrap_or(name);
        let candidates = self.by_name.get(last)?;
        let exact = format!("{file}:{name}");
        if let Some(id) = candidates.iter().find(|id| **id == exact) {
            return Some(id);
        }
        let colon = format!(":{name}");
        let dot = format!(".{name}");
        let matching: Vec<&String> = candidates
            .iter()
            .filter(|id| id.ends_with(&colon) || id.ends_with(&dot))
            .collect();
        let same_file = format!("{file}:");
        matching
            .iter()
            .find(|id| id.starts_with(&same_file))
            .or_else(|| matching.first())
            .map(|id| id.as_str())
    }
}

/// Keep nodes reachable within `max_depth` hops of a root, and the edges
/// between them. Roots are nodes without incoming edges, or every node when
/// the graph has none.
fn limit_depth(
    nodes: BTreeMap<String, GraphNode>,
    edges: Vec<GraphEdge>,
    max_depth: usize,
) -> (BTreeMap<String, GraphNode>, Vec<GraphEdge>) {
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();
    for id in nodes.keys() {
        index.insert(id.as_str(), graph.add_node(id.as_str()));
    }
    for edge in &edges {
        if let (Some(&a), Some(&b)) = (index.get(edge.source.as_str()), index.get(edge.target.as_str())) {
            graph.add_edge(a, b, ());
        }
    }

    let mut roots: Vec<NodeIndex> = graph
        .node_indices()
        .filter(|&n| graph.neighbors_directed(n, Direction::Incoming).next().is_none())
        .collect();
    if roots.is_empty() {
        roots = graph.node_indices().collect();
    }

    let mut depth: HashMap<NodeIndex, usize> = HashMap::new();
    let mut queue: VecDeque<NodeIndex> = VecDeque::new();
    for root in roots {
        depth.insert(root, 0);
        queue.push_back(root);
    }
    while let Some(current) = queue.pop_front() {
        let level = depth[&current];
        if level >= max_depth {
            continue;
        }
        for next in graph.neighbors_directed(current, Direction::Outgoing) {
            if let std::collections::hash_map::Entry::Vacant(slot) = depth.entry(next) {
                slot.insert(level + 1);
                queue.push_back(next);
            }
        }
    }

    let kept: HashSet<String> = depth.keys().map(|&n| graph[n].to_string()).collect();
    let nodes: BTreeMap<String, GraphNode> = nodes
        .into_iter()
        .filter(|(id, _)| kept.contains(id))
        .collect();
    let edges = edges
        .into_iter()
        .filter(|e| kept.contains(&e.source) && kept.contains(&e.target))
        .collect();
    (nodes, edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{keys, Visibility};

    fn class(name: &str, file: &str, bases: &[&str]) -> Symbol {
        let mut metadata = Metadata::new();
        if !bases.is_empty() {
            metadata.insert(keys::BASE_CLASSES.into(), json!(bases));
        }
        Symbol::new(name, SymbolKind::Class, Language::Python, file, 1, name, Visibility::Public)
            .with_metadata(metadata)
    }

    fn interface(name: &str, file: &str) -> Symbol {
        Symbol::new(name, SymbolKind::Interface, Language::Java, file, 1, name, Visibility::Public)
    }

    fn function(name: &str, file: &str) -> Symbol {
        Symbol::new(name, SymbolKind::Function, Language::Python, file, 1, name, Visibility::Public)
    }

    fn method(name: &str, parent: &str, file: &str) -> Symbol {
        let mut metadata = Metadata::new();
        metadata.insert(keys::PARENT_CLASS.into(), json!(parent));
        Symbol::new(
            name,
            SymbolKind::Method,
            Language::Python,
            file,
            2,
            format!("{parent}.{name}"),
            Visibility::Public,
        )
        .with_metadata(metadata)
    }

    fn call(file: &str, caller: &str, callee: &str) -> DependencyRecord {
        DependencyRecord::call(file, caller, callee, 1, false)
    }

    fn build(symbols: &[Symbol], deps: &[DependencyRecord], graph_type: GraphType) -> DependencyGraphResult {
        build_graph(symbols, deps, graph_type, &BuildOptions::default())
    }

    #[test]
    fn test_empty_input_builds_empty_graphs() {
        for graph_type in GraphType::ALL {
            let graph = build(&[], &[], graph_type);
            assert_eq!(graph.node_count(), 0, "{graph_type}");
            assert_eq!(graph.edge_count(), 0, "{graph_type}");
            assert_eq!(graph.metadata.node_count, 0);
            assert!(graph.metadata.languages.is_empty());
        }
    }

    #[test]
    fn test_class_graph_inherits_once() {
        let symbols = vec![
            class("Animal", "zoo.py", &[]),
            class("Dog", "zoo.py", &["Animal", "Animal"]),
        ];
        let graph = build(&symbols, &[], GraphType::Class);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.has_edge("zoo.py:Dog", "zoo.py:Animal", EdgeRelation::Inherits));
        assert_eq!(graph.metadata.languages, vec!["python"]);
    }

    #[test]
    fn test_class_graph_synthesizes_external_base() {
        let symbols = vec![class("Handler", "a.py", &["BaseHTTPRequestHandler"])];
        let graph = build(&symbols, &[], GraphType::Class);
        let external = graph.node("external:BaseHTTPRequestHandler").unwrap();
        assert_eq!(external.node_type, NodeType::External);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.edges[0].is_external());
    }

    #[test]
    fn test_class_graph_implements_and_generic_bases() {
        let mut service = class("UserService", "UserService.java", &["Base<User>"]);
        service
            .metadata
            .insert(keys::INTERFACES.into(), json!(["com.example.Repository"]));
        let symbols = vec![
            service,
            class("Base", "Base.java", &[]),
            interface("Repository", "Repository.java"),
        ];
        let graph = build(&symbols, &[], GraphType::Class);
        assert!(graph.has_edge("UserService.java:UserService", "Base.java:Base", EdgeRelation::Inherits));
        assert!(graph.has_edge(
            "UserService.java:UserService",
            "Repository.java:Repository",
            EdgeRelation::Implements
        ));
    }

    #[test]
    fn test_class_graph_prefers_same_file_base() {
        let symbols = vec![
            class("Base", "a.py", &[]),
            class("Base", "b.py", &[]),
            class("Child", "b.py", &["Base"]),
        ];
        let graph = build(&symbols, &[], GraphType::Class);
        assert!(graph.has_edge("b.py:Child", "b.py:Base", EdgeRelation::Inherits));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_class_graph_folds_methods_into_metadata() {
        let symbols = vec![class("Dog", "zoo.py", &[]), method("bark", "Dog", "zoo.py")];
        let graph = build(&symbols, &[], GraphType::Class);
        assert_eq!(graph.node_count(), 1);
        let dog = graph.node("zoo.py:Dog").unwrap();
        assert_eq!(dog.metadata.get("methods"), Some(&json!(["bark"])));
    }

    #[test]
    fn test_function_graph_calls() {
        let symbols = vec![function("helper", "app.py"), function("main", "app.py")];
        let deps = vec![call("app.py", "main", "helper"), call("app.py", "main", "print")];
        let graph = build(&symbols, &deps, GraphType::Function);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1, "unresolved callee drops the edge");
        assert!(graph.has_edge("app.py:main", "app.py:helper", EdgeRelation::Calls));
    }

    #[test]
    fn test_function_graph_resolves_methods_and_prefers_same_file() {
        let symbols = vec![
            method("run", "App", "b.py"),
            function("save", "a.py"),
            function("save", "b.py"),
            method("save", "Repo", "c.py"),
        ];
        let deps = vec![call("b.py", "App.run", "save")];
        let graph = build(&symbols, &deps, GraphType::Function);
        assert!(graph.has_edge("b.py:App.run", "b.py:save", EdgeRelation::Calls));
        assert_eq!(graph.edge_count(), 1);

        let deps = vec![call("d.py", "App.run", "save")];
        let graph = build(&symbols, &deps, GraphType::Function);
        assert!(
            graph.has_edge("b.py:App.run", "a.py:save", EdgeRelation::Calls),
            "ties resolve to the smallest id"
        );
    }

    #[test]
    fn test_symbol_graph_unions_edges_and_contains() {
        let symbols = vec![
            class("Animal", "zoo.py", &[]),
            class("Dog", "zoo.py", &["Animal"]),
            method("bark", "Dog", "zoo.py"),
            method("growl", "Dog", "zoo.py"),
        ];
        let deps = vec![call("zoo.py", "Dog.bark", "growl")];
        let graph = build(&symbols, &deps, GraphType::Symbol);
        assert_eq!(graph.node_count(), 4);
        assert!(graph.has_edge("zoo.py:Dog", "zoo.py:Animal", EdgeRelation::Inherits));
        assert!(graph.has_edge("zoo.py:Dog.bark", "zoo.py:Dog.growl", EdgeRelation::Calls));
        assert!(graph.has_edge("zoo.py:Dog", "zoo.py:Dog.bark", EdgeRelation::Contains));
        assert!(graph.has_edge("zoo.py:Dog", "zoo.py:Dog.growl", EdgeRelation::Contains));
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn test_file_graph_resolves_imports() {
        let symbols = vec![
            function("main", "src/app.py"),
            class("User", "src/models/user.py", &[]),
            function("render", "web/index.ts"),
            function("format", "web/util/format.ts"),
        ];
        let mut relative = DependencyRecord::import("web/index.ts", "./util/format", 1);
        relative.is_external = false;
        let deps = vec![
            DependencyRecord::import("src/app.py", "models.user", 1),
            DependencyRecord::import("src/app.py", "os", 2),
            relative,
        ];
        let graph = build(&symbols, &deps, GraphType::File);
        assert_eq!(graph.node("src/app.py").unwrap().node_type, NodeType::File);
        assert!(graph.has_edge("src/app.py", "src/models/user.py", EdgeRelation::Imports));
        assert!(graph.has_edge("src/app.py", "external:os", EdgeRelation::Imports));
        assert_eq!(
            graph.node("external:os").unwrap().node_type,
            NodeType::ExternalModule
        );
        assert!(graph.has_edge("web/index.ts", "web/util/format.ts", EdgeRelation::Imports));
        assert_eq!(graph.metadata.languages, vec!["python", "typescript"]);
    }

    #[test]
    fn test_module_graph_uses_dotted_ids() {
        let symbols = vec![
            function("main", "src/app.py"),
            class("User", "src/models/user.py", &[]),
        ];
        let deps = vec![DependencyRecord::import("src/app.py", "models.user", 1)];
        let graph = build(&symbols, &deps, GraphType::Module);
        assert!(graph.node("src.app").is_some());
        assert_eq!(graph.node("src.models.user").unwrap().label, "user");
        assert!(graph.has_edge("src.app", "src.models.user", EdgeRelation::Imports));
    }

    #[test]
    fn test_depth_zero_is_noop_and_depth_limits_chain() {
        let symbols: Vec<Symbol> = ["a", "b", "c", "d"].iter().map(|n| function(n, "f.py")).collect();
        let deps = vec![
            call("f.py", "a", "b"),
            call("f.py", "b", "c"),
            call("f.py", "c", "d"),
        ];
        let full = build(&symbols, &deps, GraphType::Function);
        assert_eq!(full.node_count(), 4);
        assert_eq!(full.edge_count(), 3);
        assert_eq!(full.metadata.max_depth, None);

        let options = BuildOptions {
            max_depth: 1,
            ..Default::default()
        };
        let limited = build_graph(&symbols, &deps, GraphType::Function, &options);
        assert_eq!(limited.node_count(), 2);
        assert!(limited.node("f.py:a").is_some());
        assert!(limited.node("f.py:b").is_some());
        assert_eq!(limited.edge_count(), 1);
        assert_eq!(limited.metadata.max_depth, Some(1));
        assert_eq!(limited.metadata.node_count, 2);
    }

    #[test]
    fn test_depth_limit_without_roots_keeps_cycle() {
        let symbols = vec![function("a", "f.py"), function("b", "f.py")];
        let deps = vec![call("f.py", "a", "b"), call("f.py", "b", "a")];
        let options = BuildOptions {
            max_depth: 1,
            ..Default::default()
        };
        let graph = build_graph(&symbols, &deps, GraphType::Function, &options);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_options_and_metadata() {
        let options = BuildOptions {
            id: Some("g1".into()),
            label: Some("My graph".into()),
            max_depth: 0,
            repository: Some(json!({"name": "demo"})),
        };
        let graph = build_graph(&[function("f", "a.py")], &[], GraphType::Function, &options);
        assert_eq!(graph.id, "g1");
        assert_eq!(graph.label, "My graph");
        assert_eq!(graph.metadata.generator, "symgraph");
        assert_eq!(graph.metadata.repository, Some(json!({"name": "demo"})));
        assert!(chrono::DateTime::parse_from_rfc3339(&graph.metadata.generated_at).is_ok());
    }

    #[test]
    fn test_graph_type_parsing() {
        assert_eq!("Class".parse::<GraphType>().unwrap(), GraphType::Class);
        assert_eq!("calls".parse::<GraphType>().unwrap(), GraphType::Function);
        assert!(matches!(
            "tree".parse::<GraphType>(),
            Err(SymgraphError::UnknownGraphType(_))
        ));
    }
}
