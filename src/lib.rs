//! Callscope - scope-aware call relationships for Python code.
//!
//! Callscope walks Python syntax trees once per file and records, for every
//! call, the innermost enclosing function, method or class (the caller) and a
//! syntactic rendering of what is called (the callee). The records are ranked
//! into most-called and top-orchestrator tables and reported alongside the
//! classes, functions and imports found in each file.
//!
//! # Architecture
//!
//! - `relationships`: Scope tracking and call resolution over any `SyntaxNode`
//! - `analysis`: tree-sitter Python analyzer and the per-file driver
//! - `summary`: Ranked tables and headline counts
//! - `discover`: Source file discovery
//! - `config`: YAML configuration
//! - `report`: Output formatting (pretty, JSON, saved artifacts)
//!
//! # Example
//!
//! ```no_run
//! use callscope::{AnalysisContext, ModuleCallPolicy, Summary};
//! use std::path::PathBuf;
//!
//! let ctx = AnalysisContext::new(".");
//! let project = ctx.analyze_files(&[PathBuf::from("app.py")]);
//! let summary = Summary::build(&project, 10, ModuleCallPolicy::Sentinel);
//! println!("{} calls", summary.total_calls);
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod discover;
pub mod logging;
pub mod relationships;
pub mod report;
pub mod summary;

pub use analysis::{
    register_analyzers, AnalysisContext, AnalysisError, Entity, EntityKind, FileAnalysis,
    FileFacts, Import, LanguageAnalyzer, ProjectAnalysis, PythonAnalyzer,
};
pub use config::{Config, ModuleCallPolicy};
pub use relationships::{
    extract_calls, CallRecord, CallTarget, Caller, RelationshipResolver, ScopeError,
    ScopeTracker, SyntaxNode,
};
pub use summary::{most_called, top_orchestrators, RankedName, Summary};
