//! Source file discovery.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::analysis::registered_extensions;
use crate::config::Config;

/// Directory names never descended into.
const SKIPPED_DIRS: &[&str] = &[
    "__pycache__",
    "venv",
    "node_modules",
    "site-packages",
    "build",
    "dist",
];

/// Directory names whose contents count as tests.
const TEST_DIRS: &[&str] = &["tests", "test"];

/// Whether a root-relative path looks like a test file.
pub fn is_test_file(rel_path: &Path) -> bool {
    let name = rel_path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let stem = name.split('.').next().unwrap_or("");

    if stem.starts_with("test_") || stem.ends_with("_test") || stem == "conftest" {
        return true;
    }

    rel_path
        .parent()
        .map(|p| {
            p.components().any(|c| {
                c.as_os_str()
                    .to_str()
                    .map(|s| TEST_DIRS.contains(&s))
                    .unwrap_or(false)
            })
        })
        .unwrap_or(false)
}

/// Collect the source files to analyze under `root`.
///
/// A file root is returned as-is when its extension is supported. Results are
/// sorted for deterministic ordering.
pub fn collect_files(root: &Path, config: &Config) -> anyhow::Result<Vec<PathBuf>> {
    let extensions = registered_extensions();
    let has_supported_ext = |path: &Path| {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.contains(&e))
            .unwrap_or(false)
    };

    if root.is_file() {
        return Ok(if has_supported_ext(root) {
            vec![root.to_path_buf()]
        } else {
            Vec::new()
        });
    }

    let exclusions = config.exclusion_matcher()?;
    let include_tests = config.should_include_test_files();
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            // Skip hidden directories (.git, .venv, .tox, ...)
            if name.starts_with('.') {
                return false;
            }
            !SKIPPED_DIRS.contains(&&*name)
        })
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || !has_supported_ext(entry.path()) {
            continue;
        }

        let rel_path = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if !include_tests && is_test_file(rel_path) {
            tracing::debug!(path = %rel_path.display(), "skipping test file");
            continue;
        }
        if exclusions.is_match(rel_path) {
            tracing::debug!(path = %rel_path.display(), "skipping excluded file");
            continue;
        }

        files.push(entry.path().to_path_buf());
    }

    files.sort();
    Ok(files)
}
