//! Fact structures extracted from AST analysis.

use serde::Serialize;
use std::fmt;

use crate::relationships::CallRecord;

/// Source location span with byte offsets and line/column positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset (0-indexed).
    pub start_byte: usize,
    /// End byte offset (0-indexed, exclusive).
    pub end_byte: usize,
    /// Start line (1-indexed).
    pub start_line: usize,
    /// End line (1-indexed).
    pub end_line: usize,
}

impl Span {
    /// Create a span from a tree-sitter node.
    pub fn from_node(node: tree_sitter::Node) -> Self {
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_line: node.start_position().row + 1, // tree-sitter is 0-indexed
            end_line: node.end_position().row + 1,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_line, self.end_line)
    }
}

/// Kind of declared entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Class,
    Function,
    /// A function whose nearest enclosing declaration is a class.
    Method,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Class => "class",
            EntityKind::Function => "function",
            EntityKind::Method => "method",
        }
    }

    /// Check if this is a callable (function or method).
    pub fn is_callable(&self) -> bool {
        matches!(self, EntityKind::Function | EntityKind::Method)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A class or function declared in a file.
#[derive(Debug, Clone, Serialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub name: String,
    /// Enclosing declaration names and this one, joined with `.`.
    pub qualified_name: String,
    /// Line of the `def`/`class` keyword (decorators excluded).
    pub line: usize,
    pub end_line: usize,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_async: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<String>,
    /// Superclass expressions (classes only).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<String>,
    /// Functions defined directly in the class body (classes only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    #[serde(skip)]
    pub span: Span,
}

/// Which import statement form produced an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// `import a.b as c`
    Import,
    /// `from a import b as c`
    FromImport,
}

/// One imported name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Import {
    #[serde(rename = "type")]
    pub kind: ImportKind,
    /// Module path; relative modules keep their leading dots.
    pub module: String,
    /// Imported name for `from` imports (`*` for wildcard imports).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub alias: Option<String>,
    pub line: usize,
}

/// All facts extracted from a single file.
#[derive(Debug, Clone)]
pub struct FileFacts {
    /// File path.
    pub path: String,
    /// Language identifier.
    pub language: String,
    /// Declared classes and functions, in source order.
    pub entities: Vec<Entity>,
    /// Imported names, in source order.
    pub imports: Vec<Import>,
    /// Whether the tree contains syntax errors.
    pub has_parse_errors: bool,
}

impl FileFacts {
    /// Create empty facts for a file.
    pub fn empty(path: &str, language: &str) -> Self {
        Self {
            path: path.to_string(),
            language: language.to_string(),
            entities: Vec::new(),
            imports: Vec::new(),
            has_parse_errors: false,
        }
    }

    /// Find an entity by qualified name.
    pub fn find_entity(&self, qualified_name: &str) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|e| e.qualified_name == qualified_name)
    }

    /// Find entities by kind.
    pub fn entities_by_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(move |e| e.kind == kind)
    }

    pub fn class_count(&self) -> usize {
        self.entities_by_kind(EntityKind::Class).count()
    }

    /// Functions and methods.
    pub fn callable_count(&self) -> usize {
        self.entities.iter().filter(|e| e.kind.is_callable()).count()
    }
}

/// Everything learned about one successfully analyzed file.
#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub facts: FileFacts,
    /// Call records in traversal order.
    pub calls: Vec<CallRecord>,
}

impl FileAnalysis {
    pub fn path(&self) -> &str {
        &self.facts.path
    }
}
