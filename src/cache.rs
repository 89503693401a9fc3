//! Persistent analysis cache.
//!
//! One JSON document per project, stored under `.scout-cache/` inside the
//! project root. The document carries a fingerprint over every tracked
//! file's path, size and mtime; a mismatch on any of them invalidates the
//! whole document. Writes go through a temp file and an atomic rename so a
//! crashed run never leaves a torn cache behind.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, warn};

use crate::graph::CallGraph;
use crate::model::{ParseError, StructuralIndex};

pub const CACHE_DIR_NAME: &str = ".scout-cache";
pub const CACHE_FILE: &str = "analysis.json";

/// Bumped whenever the on-disk shape or the analysis semantics change.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub format_version: u32,
    pub fingerprint: String,
    pub index: StructuralIndex,
    pub graph: CallGraph,
    pub parse_errors: Vec<ParseError>,
}

pub fn default_cache_dir(project_root: &Path) -> PathBuf {
    project_root.join(CACHE_DIR_NAME)
}

fn cache_file(cache_dir: &Path) -> PathBuf {
    cache_dir.join(CACHE_FILE)
}

/// Hashes the tracked file list into a project fingerprint. `files` must
/// already be sorted; `scan_tracked_files` guarantees that.
pub fn fingerprint(project_root: &Path, files: &[PathBuf]) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(format!("scout-v{FORMAT_VERSION}\n"));

    for path in files {
        let rel = path.strip_prefix(project_root).unwrap_or(path);
        let meta = fs::metadata(path)
            .with_context(|| format!("failed to stat {}", path.display()))?;
        let mtime = meta
            .modified()
            .with_context(|| format!("no modification time for {}", path.display()))?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);

        hasher.update(rel.to_string_lossy().as_bytes());
        hasher.update([0u8]);
        hasher.update(meta.len().to_le_bytes());
        hasher.update(mtime.to_le_bytes());
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Loads the cached analysis if it exists, parses, and matches both the
/// format version and the current fingerprint. Every failure mode is a
/// plain miss; a corrupt cache must never fail an analysis run.
pub fn load(cache_dir: &Path, expected_fingerprint: &str) -> Option<CacheRecord> {
    let path = cache_file(cache_dir);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(_) => return None,
    };

    let record: CacheRecord = match serde_json::from_str(&text) {
        Ok(record) => record,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "discarding unreadable cache");
            return None;
        }
    };

    if record.format_version != FORMAT_VERSION {
        debug!(
            found = record.format_version,
            expected = FORMAT_VERSION,
            "cache format version mismatch"
        );
        return None;
    }
    if record.fingerprint != expected_fingerprint {
        debug!("project fingerprint changed, cache stale");
        return None;
    }

    Some(record)
}

/// Writes the record through a temp file in the same directory, then
/// renames it over the live cache.
pub fn store(cache_dir: &Path, record: &CacheRecord) -> Result<()> {
    fs::create_dir_all(cache_dir)
        .with_context(|| format!("failed to create {}", cache_dir.display()))?;

    let target = cache_file(cache_dir);
    let temp = cache_dir.join(format!(".{CACHE_FILE}.{}.tmp", std::process::id()));

    let json = serde_json::to_vec(record).context("failed to serialize analysis cache")?;
    fs::write(&temp, &json).with_context(|| format!("failed to write {}", temp.display()))?;
    fs::rename(&temp, &target)
        .with_context(|| format!("failed to publish {}", target.display()))?;

    debug!(path = %target.display(), bytes = json.len(), "cache stored");
    Ok(())
}

pub fn clear(cache_dir: &Path) -> Result<()> {
    if cache_dir.exists() {
        fs::remove_dir_all(cache_dir)
            .with_context(|| format!("failed to remove {}", cache_dir.display()))?;
    }
    Ok(())
}
