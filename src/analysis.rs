//! Full-project analysis pipeline.
//!
//! Scan, parse, classify, index, link, in that order, with a cache probe
//! in front. A run is all-or-nothing: either the cached document matches
//! the current fingerprint exactly, or everything is rebuilt from source.

use anyhow::{Context, Result, ensure};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::{self, CacheRecord, FORMAT_VERSION};
use crate::graph::{CallGraph, build_call_graph};
use crate::model::{ParseError, StructuralIndex};
use crate::parse::{ParsedFile, parse_source, read_source};
use crate::scan::{is_source_file, scan_tracked_files};

pub struct AnalysisOptions {
    pub project_root: PathBuf,
    pub cache_dir: PathBuf,
    pub use_cache: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub scanned_files: usize,
    pub component_count: usize,
    pub method_count: usize,
    pub call_edges: usize,
    pub unresolved_calls: u64,
    pub parse_error_count: usize,
    pub cache_hit: bool,
    pub duration_ms: u64,
}

pub struct Analysis {
    pub index: StructuralIndex,
    pub graph: CallGraph,
    pub parse_errors: Vec<ParseError>,
    pub summary: AnalysisSummary,
}

pub fn analyze_project(options: &AnalysisOptions) -> Result<Analysis> {
    let started = Instant::now();
    let root = &options.project_root;
    ensure!(
        root.is_dir(),
        "project root {} is not a directory",
        root.display()
    );

    let files = scan_tracked_files(root)
        .with_context(|| format!("failed to scan {}", root.display()))?;
    let fingerprint = cache::fingerprint(root, &files)?;
    debug!(files = files.len(), %fingerprint, "project scanned");

    if options.use_cache
        && let Some(record) = cache::load(&options.cache_dir, &fingerprint)
    {
        info!("analysis loaded from cache");
        return Ok(finish(record, files.len(), true, started));
    }

    let mut parsed: Vec<ParsedFile> = Vec::new();
    let mut parse_errors: Vec<ParseError> = Vec::new();
    for path in files.iter().filter(|p| is_source_file(p)) {
        let attempt = read_source(path).and_then(|text| parse_source(path, text));
        match attempt {
            Ok(file) => parsed.push(file),
            Err(error) => {
                warn!(
                    path = %error.path,
                    line = error.line,
                    message = %error.message,
                    "source file skipped"
                );
                parse_errors.push(error);
            }
        }
    }

    let index = crate::structure::build_index(&parsed);
    let graph = build_call_graph(&index, &parsed);
    info!(
        components = index.component_count(),
        methods = index.method_count(),
        edges = graph.edge_count(),
        skipped = parse_errors.len(),
        "analysis complete"
    );

    let record = CacheRecord {
        format_version: FORMAT_VERSION,
        fingerprint,
        index,
        graph,
        parse_errors,
    };

    if options.use_cache {
        // A failed store degrades the next run to a rebuild, nothing more.
        if let Err(err) = cache::store(&options.cache_dir, &record) {
            warn!(error = %err, "failed to store analysis cache");
        }
    }

    Ok(finish(record, files.len(), false, started))
}

fn finish(record: CacheRecord, scanned_files: usize, cache_hit: bool, started: Instant) -> Analysis {
    let summary = AnalysisSummary {
        scanned_files,
        component_count: record.index.component_count(),
        method_count: record.index.method_count(),
        call_edges: record.graph.edge_count(),
        unresolved_calls: record.graph.unresolved_calls,
        parse_error_count: record.parse_errors.len(),
        cache_hit,
        duration_ms: started.elapsed().as_millis() as u64,
    };
    Analysis {
        index: record.index,
        graph: record.graph,
        parse_errors: record.parse_errors,
        summary,
    }
}
