//! AST-backed code analysis module.
//!
//! This module turns source files into facts using tree-sitter:
//! - Entities (classes, functions, methods) with their locations
//! - Imports
//! - Call records, via the scope-aware walk in `crate::relationships`
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────┐     ┌───────────────┐
//! │ Source Files    │────▶│ Analyzers    │────▶│ FileAnalysis  │
//! └─────────────────┘     │ (Python)     │     │ (Entities,    │
//!                         └──────────────┘     │  Imports,     │
//!                                              │  CallRecords) │
//!                                              └───────────────┘
//!                                                      │
//!                                                      ▼
//!                                              ┌───────────────┐
//!                                              │ProjectAnalysis│
//!                                              │ (merged, by   │
//!                                              │  file path)   │
//!                                              └───────────────┘
//! ```
//!
//! # Adding a New Language
//!
//! 1. Create a new module in `src/analysis/languages/`
//! 2. Implement `LanguageAnalyzer`, and `SyntaxNode` for its tree nodes
//! 3. Register the analyzer in `languages/mod.rs`

mod context;
mod error;
mod facts;
mod languages;
mod traits;

pub use context::{AnalysisContext, FileFailure, LocatedCall, ProjectAnalysis};
pub use error::AnalysisError;
pub use facts::{Entity, EntityKind, FileAnalysis, FileFacts, Import, ImportKind, Span};
pub use languages::{get_analyzer, register_analyzers, registered_extensions, PyNode, PythonAnalyzer};
pub use traits::{LanguageAnalyzer, ParsedFile};
