use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::classify::Role;

#[derive(Debug, Clone, Parser)]
#[command(name = "spring-scout")]
#[command(about = "Static structure and call-flow explorer for Spring-style Java projects")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project root to analyze.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project: PathBuf,

    /// Cache directory override; defaults to .scout-cache under the root.
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Rebuild from source even when a valid cache exists, and skip storing.
    #[arg(long)]
    pub no_cache: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Analyze the project and print a summary.
    Scan,
    /// List indexed components, optionally filtered by role.
    Components {
        #[arg(long, value_enum, value_name = "ROLE")]
        role: Option<Role>,
    },
    /// Look a component up by name or FQN.
    Find {
        name: String,
    },
    /// List methods whose name contains the pattern.
    Methods {
        pattern: String,
    },
    /// Search the raw source text for an exact substring.
    Search {
        pattern: String,
    },
    /// Call-flow analysis for one method key.
    Analyze {
        /// Canonical key, e.g. com.example.UserService.findById(Long)
        method_key: String,

        /// Outgoing traversal depth.
        #[arg(long, value_name = "N", default_value_t = 3)]
        depth: usize,

        /// Incoming traversal depth.
        #[arg(long, value_name = "N", default_value_t = 1)]
        callers: usize,
    },
    /// List source files skipped due to parse errors.
    Errors,
    /// Index and call graph statistics.
    Stats,
    /// Delete the analysis cache.
    ClearCache,
}
