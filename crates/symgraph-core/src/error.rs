use thiserror::Error;

/// Typed failures surfaced by the symgraph crates.
///
/// Extraction never returns these for malformed source; they cover bad user
/// input (unknown names), grammars that do not load into the linked
/// tree-sitter runtime, and a parser that produced no tree at all.
#[derive(Debug, Error)]
pub enum SymgraphError {
    #[error("unknown graph type '{0}' (expected file, module, class, function or symbol)")]
    UnknownGraphType(String),

    #[error("unknown export format '{0}' (expected json, dot or graphml)")]
    UnknownFormat(String),

    #[error("unknown symbol kind '{0}'")]
    UnknownSymbolKind(String),

    #[error("unknown visibility '{0}'")]
    UnknownVisibility(String),

    #[error("unknown language '{0}'")]
    UnknownLanguage(String),

    #[error("failed to load {language} grammar: {message}")]
    Grammar { language: String, message: String },

    #[error("failed to parse {path}")]
    Parse { path: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_error_names_language() {
        let err = SymgraphError::Grammar {
            language: "Kotlin".into(),
            message: "Incompatible language version 16".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to load Kotlin grammar: Incompatible language version 16"
        );
    }

    #[test]
    fn test_parse_error_survives_anyhow() {
        let err: anyhow::Error = SymgraphError::Parse {
            path: "src/app.py".into(),
        }
        .into();
        assert!(matches!(
            err.downcast_ref::<SymgraphError>(),
            Some(SymgraphError::Parse { path }) if path == "src/app.py"
        ));
    }
}
