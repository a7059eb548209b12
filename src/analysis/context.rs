//! Per-file analysis driver.
//!
//! Each file is read, parsed once, and run through entity extraction and call
//! extraction with its own scope tracker. Files are independent, so a batch
//! can be fanned out over rayon; results are merged only after every file has
//! finished.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::{get_analyzer, AnalysisError, Entity, FileAnalysis, Import};
use crate::relationships::CallRecord;

/// A file that could not be analyzed.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: String,
    pub reason: String,
}

/// A call record tagged with the file it came from.
#[derive(Debug, Clone, Serialize)]
pub struct LocatedCall<'a> {
    #[serde(flatten)]
    pub call: &'a CallRecord,
    pub file: &'a str,
}

/// Merged result of analyzing a batch of files.
#[derive(Debug, Clone, Default)]
pub struct ProjectAnalysis {
    /// Successfully analyzed files, sorted by path.
    pub files: Vec<FileAnalysis>,
    /// Files that were skipped, sorted by path.
    pub failures: Vec<FileFailure>,
}

impl ProjectAnalysis {
    /// All call records, file by file, each file in traversal order.
    pub fn calls(&self) -> impl Iterator<Item = &CallRecord> {
        self.files.iter().flat_map(|f| f.calls.iter())
    }

    pub fn located_calls(&self) -> Vec<LocatedCall<'_>> {
        self.files
            .iter()
            .flat_map(|f| {
                f.calls.iter().map(move |call| LocatedCall {
                    call,
                    file: f.path(),
                })
            })
            .collect()
    }

    pub fn entities(&self) -> impl Iterator<Item = (&str, &Entity)> {
        self.files
            .iter()
            .flat_map(|f| f.facts.entities.iter().map(move |e| (f.path(), e)))
    }

    pub fn imports(&self) -> impl Iterator<Item = (&str, &Import)> {
        self.files
            .iter()
            .flat_map(|f| f.facts.imports.iter().map(move |i| (f.path(), i)))
    }

    fn sort(&mut self) {
        self.files.sort_by(|a, b| a.path().cmp(b.path()));
        self.failures.sort_by(|a, b| a.path.cmp(&b.path));
    }
}

/// Analysis context for a set of files.
pub struct AnalysisContext {
    /// Base directory for relative path resolution.
    base_dir: PathBuf,
    allow_partial_parse: bool,
    parallel: bool,
}

impl AnalysisContext {
    /// Create a new analysis context.
    ///
    /// Reported paths are relative to `base_dir`.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            allow_partial_parse: false,
            parallel: true,
        }
    }

    /// Analyze files whose syntax tree contains errors instead of failing them.
    pub fn allow_partial_parse(mut self, allow: bool) -> Self {
        self.allow_partial_parse = allow;
        self
    }

    /// Set whether batches are analyzed on the rayon pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn relative_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.base_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Analyze a single file.
    pub fn analyze_file<P: AsRef<Path>>(&self, path: P) -> Result<FileAnalysis, AnalysisError> {
        let path = path.as_ref();
        let abs_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        };
        let rel_path = self.relative_path(&abs_path);

        let ext = abs_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        let analyzer =
            get_analyzer(ext).ok_or_else(|| AnalysisError::UnsupportedLanguage(ext.to_string()))?;

        let source = fs::read(&abs_path).map_err(|source| AnalysisError::Read {
            path: rel_path.clone(),
            source,
        })?;
        let parsed = analyzer.parse(&abs_path, &source)?;

        if !self.allow_partial_parse {
            if let Some(line) = parsed.first_error_line() {
                return Err(AnalysisError::Syntax {
                    path: rel_path,
                    line,
                });
            }
        }

        let mut facts = analyzer.extract_facts(&parsed)?;
        facts.path = rel_path;
        let calls = analyzer.extract_calls(&parsed)?;

        tracing::debug!(
            path = %facts.path,
            entities = facts.entities.len(),
            imports = facts.imports.len(),
            calls = calls.len(),
            partial = facts.has_parse_errors,
            "analyzed file"
        );

        Ok(FileAnalysis { facts, calls })
    }

    /// Analyze a batch of files.
    ///
    /// Failures are collected, not propagated: a file that cannot be read,
    /// parsed or traversed is listed in `failures` and the rest of the batch
    /// is still analyzed.
    pub fn analyze_files(&self, paths: &[PathBuf]) -> ProjectAnalysis {
        let results: Vec<(String, Result<FileAnalysis, AnalysisError>)> = if self.parallel {
            use rayon::prelude::*;

            paths
                .par_iter()
                .map(|p| (self.relative_path(p), self.analyze_file(p)))
                .collect()
        } else {
            paths
                .iter()
                .map(|p| (self.relative_path(p), self.analyze_file(p)))
                .collect()
        };

        let mut project = ProjectAnalysis::default();
        for (path, result) in results {
            match result {
                Ok(analysis) => project.files.push(analysis),
                Err(e) => {
                    // Log but don't fail - some files may not be parseable
                    tracing::warn!(path = %path, error = %e, "skipping file");
                    project.failures.push(FileFailure {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        // Sort by path for deterministic ordering
        project.sort();
        project
    }
}
