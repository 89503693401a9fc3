use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::cache;
use crate::cli::Cli;

/// Canonicalizes the project root so cache fingerprints and reported paths
/// are stable regardless of how the root was spelled on the command line.
pub fn resolve_project_root(cli: &Cli) -> Result<PathBuf> {
    cli.project
        .canonicalize()
        .with_context(|| format!("project root not found: {}", cli.project.display()))
}

pub fn resolve_cache_dir(cli: &Cli, project_root: &std::path::Path) -> PathBuf {
    match cli.cache_dir.clone() {
        Some(dir) => dir,
        None => cache::default_cache_dir(project_root),
    }
}
