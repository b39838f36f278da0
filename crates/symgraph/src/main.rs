use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use symgraph::code_analyzer;
use symgraph::{
    BuildOptions, Config, ExportFormat, GraphType, Language, ProjectAnalysis, Symbol, SymbolKind,
    Visibility,
};
use symgraph_core::config::CONFIG_FILE;
use symgraph_report::text;

#[derive(Parser)]
#[command(name = "symgraph")]
#[command(about = "Extract code symbols and export dependency graphs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Config file path (defaults to .symgraph.toml in the project or an ancestor)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Reuse cached results for unchanged files
    #[arg(long, global = true)]
    incremental: bool,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List the symbols declared in a project
    Symbols {
        /// Path to the project root or a single file
        path: PathBuf,
        /// Only symbols of this kind (function, method, class, ...)
        #[arg(long)]
        kind: Option<String>,
        /// Only symbols with this visibility
        #[arg(long)]
        visibility: Option<String>,
        /// Only symbols of this language
        #[arg(long)]
        language: Option<String>,
        /// Case-insensitive substring of the name or qualified name
        #[arg(long)]
        search: Option<String>,
        /// Only exported symbols
        #[arg(long)]
        exported: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Build a dependency graph and export it
    Graph {
        /// Path to the project root or a single file
        path: PathBuf,
        /// Graph type: file, module, class, function or symbol
        #[arg(short = 't', long = "type")]
        graph_type: Option<String>,
        /// Output format: json, dot or graphml
        #[arg(short, long)]
        format: Option<String>,
        /// Keep only nodes within this many hops of a root (0 = everything)
        #[arg(long)]
        max_depth: Option<usize>,
        /// Graph id
        #[arg(long)]
        id: Option<String>,
        /// Graph label
        #[arg(long)]
        label: Option<String>,
        /// Repository name recorded in the graph metadata
        #[arg(long)]
        repository: Option<String>,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print symbol statistics
    Stats {
        /// Path to the project root or a single file
        path: PathBuf,
        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Create a default .symgraph.toml configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Filters for `symgraph symbols`.
struct SymbolQuery {
    kind: Option<SymbolKind>,
    visibility: Option<Visibility>,
    language: Option<Language>,
    search: Option<String>,
    exported: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Symbols {
            path,
            kind,
            visibility,
            language,
            search,
            exported,
            json,
        } => parse_query(kind, visibility, language, search, exported)
            .and_then(|query| cmd_symbols(&path, config_path, cli.incremental, &query, json)),
        Commands::Graph {
            path,
            graph_type,
            format,
            max_depth,
            id,
            label,
            repository,
            output,
        } => cmd_graph(
            &path,
            config_path,
            cli.incremental,
            GraphArgs {
                graph_type,
                format,
                max_depth,
                id,
                label,
                repository,
                output,
            },
        ),
        Commands::Stats { path, json } => cmd_stats(&path, config_path, cli.incremental, json),
        Commands::Init { force } => cmd_init(force),
    };

    if let Err(e) = result {
        eprintln!("{} {e:#}", "Error:".red().bold());
        process::exit(2);
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env("SYMGRAPH_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn parse_query(
    kind: Option<String>,
    visibility: Option<String>,
    language: Option<String>,
    search: Option<String>,
    exported: bool,
) -> Result<SymbolQuery> {
    Ok(SymbolQuery {
        kind: kind.map(|k| k.parse()).transpose()?,
        visibility: visibility.map(|v| v.parse()).transpose()?,
        language: language.map(|l| l.parse()).transpose()?,
        search,
        exported,
    })
}

fn cmd_symbols(
    path: &Path,
    config_path: Option<&Path>,
    incremental: bool,
    query: &SymbolQuery,
    json: bool,
) -> Result<()> {
    let config = load_config(path, config_path)?;
    let analysis = run_analysis(path, config, incremental)?;

    let mut selected: Vec<&Symbol> = analysis.symbols.iter().collect();
    if let Some(kind) = query.kind {
        selected = code_analyzer::filter_by_kind(selected, kind);
    }
    if let Some(visibility) = query.visibility {
        selected = code_analyzer::filter_by_visibility(selected, visibility);
    }
    if let Some(language) = query.language {
        selected = code_analyzer::filter_by_language(selected, language);
    }
    if query.exported {
        selected = code_analyzer::exported_only(selected);
    }
    if let Some(search) = &query.search {
        selected = code_analyzer::search(selected, search);
    }

    if json {
        let output =
            serde_json::to_string_pretty(&selected).context("failed to serialize symbols")?;
        println!("{output}");
    } else {
        print!("{}", text::format_symbols(&selected));
    }
    Ok(())
}

struct GraphArgs {
    graph_type: Option<String>,
    format: Option<String>,
    max_depth: Option<usize>,
    id: Option<String>,
    label: Option<String>,
    repository: Option<String>,
    output: Option<PathBuf>,
}

fn cmd_graph(
    path: &Path,
    config_path: Option<&Path>,
    incremental: bool,
    args: GraphArgs,
) -> Result<()> {
    let config = load_config(path, config_path)?;
    let graph_type: GraphType = match &args.graph_type {
        Some(t) => t.parse()?,
        None => config.graph.graph_type,
    };
    let format: ExportFormat = args
        .format
        .as_deref()
        .unwrap_or(&config.graph.format)
        .parse()?;
    let max_depth = args.max_depth.unwrap_or(config.graph.max_depth);

    let analysis = run_analysis(path, config, incremental)?;
    let options = BuildOptions {
        id: args.id,
        label: args.label,
        max_depth,
        repository: args
            .repository
            .map(|name| serde_json::json!({ "name": name })),
    };
    let graph = symgraph::build_graph(&analysis.symbols, &analysis.dependencies, graph_type, &options);
    let rendered = symgraph::serialize(&graph, format);

    match &args.output {
        Some(output) => {
            std::fs::write(output, &rendered)
                .with_context(|| format!("failed to write {}", output.display()))?;
            eprint!("{}", text::format_graph_summary(&graph));
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn cmd_stats(path: &Path, config_path: Option<&Path>, incremental: bool, json: bool) -> Result<()> {
    let config = load_config(path, config_path)?;
    let analysis = run_analysis(path, config, incremental)?;
    let stats = analysis.statistics();
    if json {
        let output =
            serde_json::to_string_pretty(&stats).context("failed to serialize statistics")?;
        println!("{output}");
    } else {
        print!("{}", text::format_statistics(&stats));
    }
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let target = PathBuf::from(CONFIG_FILE);
    if target.exists() && !force {
        anyhow::bail!("{CONFIG_FILE} already exists. Use --force to overwrite.");
    }
    std::fs::write(&target, Config::default_toml())
        .with_context(|| format!("failed to write {CONFIG_FILE}"))?;
    println!("Created {CONFIG_FILE} with default configuration.");
    Ok(())
}

fn load_config(project_path: &Path, config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(p) => Config::load(p),
        None => {
            let dir = if project_path.is_file() {
                project_path.parent().unwrap_or(project_path)
            } else {
                project_path
            };
            Ok(Config::load_or_default(dir))
        }
    }
}

fn run_analysis(project_path: &Path, config: Config, incremental: bool) -> Result<ProjectAnalysis> {
    let incremental = incremental || config.cache.enabled;
    let pipeline = symgraph::pipeline(config)?;
    if incremental {
        pipeline.analyze_incremental(project_path)
    } else {
        pipeline.analyze(project_path)
    }
}
