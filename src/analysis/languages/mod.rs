//! Language-specific analyzer implementations.

mod python;

pub use python::{PyNode, PythonAnalyzer};

use super::LanguageAnalyzer;
use once_cell::sync::OnceCell;

/// Static storage for Python analyzer.
static PYTHON_ANALYZER: OnceCell<PythonAnalyzer> = OnceCell::new();

/// Register all available language analyzers.
///
/// This is idempotent - calling it multiple times is safe.
pub fn register_analyzers() {
    PYTHON_ANALYZER.get_or_init(PythonAnalyzer::new);
}

/// Get an analyzer for the given file extension.
///
/// Returns None if no analyzer is registered for the extension.
pub fn get_analyzer(ext: &str) -> Option<&'static dyn LanguageAnalyzer> {
    register_analyzers();

    PYTHON_ANALYZER
        .get()
        .filter(|a| a.handles_extension(ext))
        .map(|a| a as &'static dyn LanguageAnalyzer)
}

/// Get all registered file extensions.
pub fn registered_extensions() -> Vec<&'static str> {
    register_analyzers();

    PYTHON_ANALYZER
        .get()
        .map(|a| a.file_extensions().to_vec())
        .unwrap_or_default()
}
