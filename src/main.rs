use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use spring_scout::analysis::{Analysis, AnalysisOptions, analyze_project};
use spring_scout::cache;
use spring_scout::cli::{Cli, Commands};
use spring_scout::config::{resolve_cache_dir, resolve_project_root};
use spring_scout::model::{Component, MethodDescriptor};
use spring_scout::query::QueryEngine;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let project_root = resolve_project_root(&cli)?;
    let cache_dir = resolve_cache_dir(&cli, &project_root);

    match cli.command {
        Commands::ClearCache => {
            cache::clear(&cache_dir)?;
            print_json(&ClearOutput { cleared: cache_dir })
        }
        command => {
            let analysis = analyze_project(&AnalysisOptions {
                project_root,
                cache_dir,
                use_cache: !cli.no_cache,
            })?;
            run_query(command, &analysis)
        }
    }
}

fn run_query(command: Commands, analysis: &Analysis) -> Result<()> {
    let engine = QueryEngine::new(&analysis.index, &analysis.graph);

    match command {
        Commands::Scan => print_json(&analysis.summary),
        Commands::Components { role } => {
            let rows: Vec<ComponentRow> = engine
                .list_components(role)
                .into_iter()
                .map(ComponentRow::from)
                .collect();
            print_json(&rows)
        }
        Commands::Find { name } => print_json(&engine.find_component(&name)),
        Commands::Methods { pattern } => {
            let rows: Vec<MethodRow> = engine
                .search_methods(&pattern)
                .into_iter()
                .map(MethodRow::from)
                .collect();
            print_json(&rows)
        }
        Commands::Search { pattern } => print_json(&engine.search_code(&pattern)?),
        Commands::Analyze {
            method_key,
            depth,
            callers,
        } => match engine.analyze_method(&method_key, depth, callers)? {
            Some(report) => print_json(&report),
            None => anyhow::bail!("method not found: {method_key}"),
        },
        Commands::Errors => print_json(&analysis.parse_errors),
        Commands::Stats => {
            let mut roles: BTreeMap<&'static str, usize> = BTreeMap::new();
            for component in engine.list_components(None) {
                *roles.entry(component.role.as_str()).or_default() += 1;
            }
            print_json(&StatsOutput {
                components: analysis.summary.component_count,
                methods: analysis.summary.method_count,
                call_nodes: analysis.graph.node_count(),
                call_edges: analysis.graph.edge_count(),
                unresolved_calls: analysis.graph.unresolved_calls,
                parse_errors: analysis.summary.parse_error_count,
                roles,
            })
        }
        // Cleared before the analysis runs; nothing left to do.
        Commands::ClearCache => Ok(()),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Debug, Serialize)]
struct ClearOutput {
    cleared: PathBuf,
}

#[derive(Debug, Serialize)]
struct ComponentRow {
    fqn: String,
    role: &'static str,
    path: String,
    fields: usize,
    methods: usize,
}

impl From<&Component> for ComponentRow {
    fn from(c: &Component) -> Self {
        ComponentRow {
            fqn: c.fqn.clone(),
            role: c.role.as_str(),
            path: c.path.clone(),
            fields: c.fields.len(),
            methods: c.methods.len(),
        }
    }
}

#[derive(Debug, Serialize)]
struct MethodRow {
    key: String,
    owner: String,
    return_type: String,
    start_line: usize,
}

impl From<&MethodDescriptor> for MethodRow {
    fn from(m: &MethodDescriptor) -> Self {
        MethodRow {
            key: m.key(),
            owner: m.owner.clone(),
            return_type: m.return_type.clone(),
            start_line: m.start_line,
        }
    }
}

#[derive(Debug, Serialize)]
struct StatsOutput {
    components: usize,
    methods: usize,
    call_nodes: usize,
    call_edges: usize,
    unresolved_calls: u64,
    parse_errors: usize,
    roles: BTreeMap<&'static str, usize>,
}
