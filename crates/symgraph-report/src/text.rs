use std::collections::BTreeMap;

use colored::Colorize;

use symgraph_core::code_analyzer::SymbolStatistics;
use symgraph_core::graph::DependencyGraphResult;
use symgraph_core::types::{Symbol, Visibility};

/// Format symbol statistics for terminal output.
pub fn format_statistics(stats: &SymbolStatistics) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{}\n", "symgraph - Symbol Summary".bold()));
    out.push_str(&format!("{}\n\n", "=".repeat(40)));

    out.push_str(&format!(
        "{}: {} symbols in {} files ({} exported)\n",
        "Summary".bold(),
        stats.total,
        stats.files,
        stats.exported,
    ));

    if stats.total == 0 {
        out.push_str(&format!("\n{}\n", "No symbols found.".yellow()));
        return out;
    }

    out.push_str(&format_counts("By language", &stats.by_language));
    out.push_str(&format_counts("By kind", &stats.by_kind));
    out.push_str(&format_counts("By visibility", &stats.by_visibility));
    out
}

fn format_counts(title: &str, counts: &BTreeMap<String, usize>) -> String {
    let mut out = format!("\n{}\n{}\n", title.bold(), "-".repeat(40));
    let width = counts.keys().map(String::len).max().unwrap_or(0);
    for (name, count) in counts {
        out.push_str(&format!("  {name:<width$}  {count:>6}\n"));
    }
    out
}

/// One line per symbol: location, kind, qualified name and signature.
pub fn format_symbols(symbols: &[&Symbol]) -> String {
    let mut out = String::new();
    for symbol in symbols {
        let location = format!("{}:{}", symbol.file_path, symbol.line_start);
        let visibility = match symbol.visibility {
            Visibility::Public => symbol.visibility.as_str().green().to_string(),
            Visibility::Private => symbol.visibility.as_str().red().to_string(),
            _ => symbol.visibility.as_str().yellow().to_string(),
        };
        out.push_str(&format!(
            "{}  {:<9} {:<9} {}",
            location.dimmed(),
            symbol.kind.as_str().cyan(),
            visibility,
            symbol.qualified_name.bold(),
        ));
        if let Some(signature) = &symbol.signature {
            out.push_str(&format!("  {}", signature.dimmed()));
        }
        out.push('\n');
    }
    out.push_str(&format!("\n{} symbols\n", symbols.len()));
    out
}

/// Short description of a built graph, for stderr after an export.
pub fn format_graph_summary(graph: &DependencyGraphResult) -> String {
    let mut out = format!(
        "{} {} graph: {} nodes, {} edges",
        "Built".green().bold(),
        graph.graph_type,
        graph.node_count(),
        graph.edge_count(),
    );
    let relations: Vec<String> = graph
        .relation_counts()
        .iter()
        .map(|(relation, count)| format!("{relation}={count}"))
        .collect();
    if !relations.is_empty() {
        out.push_str(&format!(" ({})", relations.join(", ")));
    }
    if let Some(depth) = graph.metadata.max_depth {
        out.push_str(&format!(", depth limited to {depth}"));
    }
    out.push('\n');
    out
}
