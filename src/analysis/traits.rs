//! Core traits for language analysis.

use std::path::Path;

use super::{AnalysisError, FileFacts};
use crate::relationships::CallRecord;

/// Holds a parsed tree-sitter tree and associated metadata.
///
/// Entity extraction and call extraction both run over the same tree, so a
/// file is parsed once.
pub struct ParsedFile {
    /// The tree-sitter parse tree.
    pub tree: tree_sitter::Tree,
    /// The source code (kept for node text extraction).
    pub source: Vec<u8>,
    /// The file path (for error reporting).
    pub path: String,
}

impl ParsedFile {
    /// Get text for a tree-sitter node.
    pub fn node_text(&self, node: tree_sitter::Node) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }

    /// Whether the tree contains ERROR or MISSING nodes.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// 1-indexed line of the first syntax error, if any.
    pub fn first_error_line(&self) -> Option<usize> {
        let root = self.tree.root_node();
        if !root.has_error() {
            return None;
        }

        let mut cursor = root.walk();
        loop {
            let node = cursor.node();
            if node.is_error() || node.is_missing() {
                return Some(node.start_position().row + 1);
            }
            // Descend only into subtrees that contain the error.
            if node.has_error() && cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return Some(root.start_position().row + 1);
                }
            }
        }
    }
}

/// Language-specific analyzer trait.
///
/// # Thread Safety
///
/// Note: tree_sitter::Parser is not Sync, so implementations create parsers
/// and queries per call. Analyzers themselves are shared across rayon workers.
pub trait LanguageAnalyzer: Send + Sync {
    /// Returns the language identifier (e.g., "python").
    fn language_id(&self) -> &'static str;

    /// Returns file extensions this analyzer handles (without dot).
    fn file_extensions(&self) -> &'static [&'static str];

    /// Parse a source file into a tree-sitter tree.
    ///
    /// Partial parse errors still produce a tree with ERROR nodes; callers
    /// decide whether to accept it.
    fn parse(&self, path: &Path, source: &[u8]) -> Result<ParsedFile, AnalysisError>;

    /// Extract declared entities and imports.
    fn extract_facts(&self, parsed: &ParsedFile) -> Result<FileFacts, AnalysisError>;

    /// Extract caller→callee records in traversal order.
    fn extract_calls(&self, parsed: &ParsedFile) -> Result<Vec<CallRecord>, AnalysisError>;

    /// Check if this analyzer handles the given file extension.
    fn handles_extension(&self, ext: &str) -> bool {
        self.file_extensions().contains(&ext)
    }
}
