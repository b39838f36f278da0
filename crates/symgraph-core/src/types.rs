use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;

use crate::error::SymgraphError;

/// Open, JSON-compatible bag of language-specific facts attached to a symbol.
///
/// Known keys are listed in [`keys`]; extractors never invent others.
pub type Metadata = serde_json::Map<String, Value>;

/// Fixed vocabulary of metadata keys shared by all extractors.
pub mod keys {
    pub const MODIFIERS: &str = "modifiers";
    pub const BASE_CLASS: &str = "base_class";
    pub const BASE_CLASSES: &str = "base_classes";
    pub const INTERFACES: &str = "interfaces";
    pub const PARENT_CLASS: &str = "parent_class";
    pub const TYPE_PARAMETERS: &str = "type_parameters";
    pub const PARAMETERS: &str = "parameters";
    pub const RETURN_TYPE: &str = "return_type";
    pub const DECORATORS: &str = "decorators";
    pub const ANNOTATIONS: &str = "annotations";
    pub const IS_ASYNC: &str = "is_async";
    pub const IS_STATIC: &str = "is_static";
    pub const IS_ABSTRACT: &str = "is_abstract";
    pub const IS_SEALED: &str = "is_sealed";
    pub const IS_DATA_CLASS: &str = "is_data_class";
    pub const IS_EXTENSION: &str = "is_extension";
    pub const RECEIVER_TYPE: &str = "receiver_type";
    pub const IS_CONSTRUCTOR: &str = "is_constructor";
    pub const IS_OBJECT: &str = "is_object";
    pub const IS_COMPANION: &str = "is_companion";
    pub const IS_RECORD: &str = "is_record";
    pub const IS_ANNOTATION: &str = "is_annotation";
    pub const IS_TYPE_ALIAS: &str = "is_type_alias";
    pub const IS_GENERATOR: &str = "is_generator";
    pub const IS_ARROW: &str = "is_arrow";
    pub const IS_PROPERTY: &str = "is_property";
    pub const IS_CLASSMETHOD: &str = "is_classmethod";
    pub const IS_DEFAULT_EXPORT: &str = "is_default_export";
    pub const IS_PROTOTYPE_METHOD: &str = "is_prototype_method";
    pub const IS_PROTOCOL: &str = "is_protocol";
}

/// Source language of an extracted symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Java,
    Kotlin,
    TypeScript,
    JavaScript,
}

/// Static extension table used for language detection.
const EXTENSION_TABLE: &[(&str, Language)] = &[
    ("py", Language::Python),
    ("pyi", Language::Python),
    ("java", Language::Java),
    ("kt", Language::Kotlin),
    ("kts", Language::Kotlin),
    ("ts", Language::TypeScript),
    ("tsx", Language::TypeScript),
    ("mts", Language::TypeScript),
    ("cts", Language::TypeScript),
    ("js", Language::JavaScript),
    ("jsx", Language::JavaScript),
    ("mjs", Language::JavaScript),
    ("cjs", Language::JavaScript),
];

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Python,
        Language::Java,
        Language::Kotlin,
        Language::TypeScript,
        Language::JavaScript,
    ];

    /// Look up a language by file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        EXTENSION_TABLE
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, lang)| *lang)
    }

    /// Detect the language of a file path from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// All extensions mapped to this language.
    pub fn extensions(&self) -> Vec<&'static str> {
        EXTENSION_TABLE
            .iter()
            .filter(|(_, lang)| lang == self)
            .map(|(e, _)| *e)
            .collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Java => "java",
            Language::Kotlin => "kotlin",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = SymgraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            "kotlin" | "kt" => Ok(Language::Kotlin),
            "typescript" | "ts" => Ok(Language::TypeScript),
            "javascript" | "js" => Ok(Language::JavaScript),
            _ => Err(SymgraphError::UnknownLanguage(s.to_string())),
        }
    }
}

/// Kind of declared code entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Variable,
    Module,
    Interface,
    Enum,
    Constant,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Variable => "variable",
            SymbolKind::Module => "module",
            SymbolKind::Interface => "interface",
            SymbolKind::Enum => "enum",
            SymbolKind::Constant => "constant",
        }
    }

    /// Class-like kinds participate in the class graph.
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            SymbolKind::Class | SymbolKind::Interface | SymbolKind::Enum
        )
    }

    /// Callable kinds participate in the function graph.
    pub fn is_callable(&self) -> bool {
        matches!(self, SymbolKind::Function | SymbolKind::Method)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SymbolKind {
    type Err = SymgraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "function" | "fn" => Ok(SymbolKind::Function),
            "method" => Ok(SymbolKind::Method),
            "class" => Ok(SymbolKind::Class),
            "variable" | "var" => Ok(SymbolKind::Variable),
            "module" | "namespace" => Ok(SymbolKind::Module),
            "interface" => Ok(SymbolKind::Interface),
            "enum" => Ok(SymbolKind::Enum),
            "constant" | "const" => Ok(SymbolKind::Constant),
            _ => Err(SymgraphError::UnknownSymbolKind(s.to_string())),
        }
    }
}

/// Access level of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
    Protected,
    Internal,
    Package,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Protected => "protected",
            Visibility::Internal => "internal",
            Visibility::Package => "package",
        }
    }

    /// Map an explicit modifier keyword to a visibility.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "public" => Some(Visibility::Public),
            "private" => Some(Visibility::Private),
            "protected" => Some(Visibility::Protected),
            "internal" => Some(Visibility::Internal),
            _ => None,
        }
    }

    /// Convention used by Python and JavaScript: a leading `_` or `#` marks a private name.
    /// Dunder names (`__init__`) stay public.
    pub fn from_name_convention(name: &str) -> Self {
        let dunder = name.len() > 4 && name.starts_with("__") && name.ends_with("__");
        if !dunder && (name.starts_with('_') || name.starts_with('#')) {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Visibility {
    type Err = SymgraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            "protected" => Ok(Visibility::Protected),
            "internal" => Ok(Visibility::Internal),
            "package" => Ok(Visibility::Package),
            _ => Err(SymgraphError::UnknownVisibility(s.to_string())),
        }
    }
}

/// A declared code entity extracted from one file.
///
/// Symbols are built once during a single walk of a syntax tree and never
/// mutated afterwards. Nesting is expressed through `qualified_name` and the
/// `parent_class` metadata entry, never through back-pointers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub file_path: String,
    pub line_start: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_end: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    pub visibility: Visibility,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub qualified_name: String,
    pub is_exported: bool,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Symbol {
    /// Start a symbol. `is_exported` defaults to `visibility == Public`.
    pub fn new(
        name: impl Into<String>,
        kind: SymbolKind,
        language: Language,
        file_path: impl Into<String>,
        line_start: usize,
        qualified_name: impl Into<String>,
        visibility: Visibility,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            file_path: file_path.into(),
            line_start,
            line_end: None,
            column_start: None,
            signature: None,
            visibility,
            language,
            documentation: None,
            qualified_name: qualified_name.into(),
            is_exported: visibility == Visibility::Public,
            metadata: Metadata::new(),
        }
    }

    pub fn with_span(mut self, line_end: usize, column_start: usize) -> Self {
        self.line_end = Some(line_end);
        self.column_start = Some(column_start);
        self
    }

    pub fn with_signature(mut self, signature: Option<String>) -> Self {
        self.signature = signature.filter(|s| !s.is_empty());
        self
    }

    pub fn with_documentation(mut self, documentation: Option<String>) -> Self {
        self.documentation = documentation;
        self
    }

    pub fn with_exported(mut self, exported: bool) -> Self {
        self.is_exported = exported;
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Name of the class a method belongs to, if any.
    pub fn parent_class(&self) -> Option<&str> {
        self.metadata.get(keys::PARENT_CLASS).and_then(Value::as_str)
    }

    /// Key a call site uses to refer to this symbol: `Parent.name` or `name`.
    pub fn call_key(&self) -> String {
        match self.parent_class() {
            Some(parent) => format!("{parent}.{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Declared base classes, from `base_classes` or the single `base_class` entry.
    pub fn base_classes(&self) -> Vec<String> {
        match self.metadata.get(keys::BASE_CLASSES) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => self
                .metadata
                .get(keys::BASE_CLASS)
                .and_then(Value::as_str)
                .map(|b| vec![b.to_string()])
                .unwrap_or_default(),
        }
    }

    /// Declared implemented interfaces.
    pub fn interfaces(&self) -> Vec<String> {
        match self.metadata.get(keys::INTERFACES) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Nesting depth derived from the qualified name.
    pub fn depth(&self) -> usize {
        self.qualified_name.matches('.').count()
    }
}

/// Kind of raw dependency fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Import,
    Call,
    StaticImport,
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyKind::Import => write!(f, "import"),
            DependencyKind::Call => write!(f, "call"),
            DependencyKind::StaticImport => write!(f, "static_import"),
        }
    }
}

/// An import or call fact extracted from one file, before graph resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub kind: DependencyKind,
    pub source_file: String,
    /// Module path for imports, callee name for calls.
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default = "default_external")]
    pub is_external: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imported_names: Vec<String>,
    #[serde(default)]
    pub is_wildcard: bool,
}

fn default_external() -> bool {
    true
}

impl DependencyRecord {
    /// An import of `target` from `source_file`; external unless marked otherwise.
    pub fn import(source_file: impl Into<String>, target: impl Into<String>, line: usize) -> Self {
        Self {
            kind: DependencyKind::Import,
            source_file: source_file.into(),
            target: target.into(),
            line: Some(line),
            is_external: true,
            caller: None,
            callee: None,
            alias: None,
            imported_names: Vec::new(),
            is_wildcard: false,
        }
    }

    /// A call from `caller` to `callee` inside `source_file`.
    pub fn call(
        source_file: impl Into<String>,
        caller: impl Into<String>,
        callee: impl Into<String>,
        line: usize,
        is_external: bool,
    ) -> Self {
        let callee = callee.into();
        Self {
            kind: DependencyKind::Call,
            source_file: source_file.into(),
            target: callee.clone(),
            line: Some(line),
            is_external,
            caller: Some(caller.into()),
            callee: Some(callee),
            alias: None,
            imported_names: Vec::new(),
            is_wildcard: false,
        }
    }

    pub fn is_import(&self) -> bool {
        matches!(self.kind, DependencyKind::Import | DependencyKind::StaticImport)
    }
}
