//! Per-file analysis errors.

use thiserror::Error;

use crate::relationships::ScopeError;

/// Reasons a single file could not be analyzed.
///
/// None of these abort a run; the driver records them as file failures and
/// moves on.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no analyzer for extension {0:?}")]
    UnsupportedLanguage(String),
    #[error("parser setup failed: {0}")]
    Language(#[from] tree_sitter::LanguageError),
    #[error("invalid query: {0}")]
    Query(#[from] tree_sitter::QueryError),
    #[error("failed to parse {0}")]
    Parse(String),
    #[error("syntax error near line {line} in {path}")]
    Syntax { path: String, line: usize },
    #[error("scope tracking failed: {0}")]
    Scope(#[from] ScopeError),
}
