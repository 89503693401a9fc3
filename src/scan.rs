//! Project file discovery.

use anyhow::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// Files parsed into the structural model.
pub const SOURCE_EXTENSION: &str = "java";

/// Extensions that participate in the cache fingerprint. Only `.java` files
/// are parsed; the rest invalidate the cache when touched.
pub const TRACKED_EXTENSIONS: &[&str] = &["java", "properties", "yml", "yaml", "xml"];

/// Build output and tooling directories never worth descending into.
pub const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".gradle",
    ".idea",
    ".settings",
    "build",
    "dist",
    "node_modules",
    "out",
    "target",
    crate::cache::CACHE_DIR_NAME,
];

/// Walks the project root and returns every tracked file, sorted by path for
/// deterministic downstream fingerprints and scan order.
pub fn scan_tracked_files(root: &Path) -> Result<Vec<PathBuf>> {
    let (tx, rx) = mpsc::channel();

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !(entry.file_type().is_some_and(|t| t.is_dir())
                && IGNORED_DIRS.contains(&name.as_ref()))
        })
        .build_parallel();

    walker.run(|| {
        let tx = tx.clone();
        Box::new(move |entry| {
            if let Ok(entry) = entry {
                let path = entry.path();
                if path.is_file() && has_tracked_extension(path) {
                    let _ = tx.send(path.to_path_buf());
                }
            }
            ignore::WalkState::Continue
        })
    });

    drop(tx);
    let mut files: Vec<PathBuf> = rx.iter().collect();
    files.sort_unstable();
    Ok(files)
}

pub fn is_source_file(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == SOURCE_EXTENSION)
}

fn has_tracked_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| TRACKED_EXTENSIONS.contains(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir(prefix: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "{prefix}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        p
    }

    #[test]
    fn scan_finds_tracked_files_and_skips_build_dirs() {
        let base = temp_dir("spring-scout-scan");
        fs::create_dir_all(base.join("src/main/java")).unwrap();
        fs::create_dir_all(base.join("src/main/resources")).unwrap();
        fs::create_dir_all(base.join("target/classes")).unwrap();

        fs::write(base.join("src/main/java/A.java"), "class A {}").unwrap();
        fs::write(base.join("src/main/resources/application.yml"), "a: 1").unwrap();
        fs::write(base.join("target/classes/B.java"), "class B {}").unwrap();
        fs::write(base.join("README.md"), "# readme").unwrap();

        let files = scan_tracked_files(&base).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["A.java", "application.yml"]);
        let _ = fs::remove_dir_all(base);
    }

    #[test]
    fn scan_output_is_sorted() {
        let base = temp_dir("spring-scout-scan-sorted");
        fs::create_dir_all(&base).unwrap();
        for name in ["C.java", "A.java", "B.java"] {
            fs::write(base.join(name), "class X {}").unwrap();
        }

        let files = scan_tracked_files(&base).unwrap();
        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted);
        let _ = fs::remove_dir_all(base);
    }
}
