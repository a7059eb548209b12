//! Scope-aware call-relationship extraction.
//!
//! A single depth-first walk of a syntax tree pushes a [`ScopeFrame`] when it
//! enters a declaration and pops it on the way out. Every call node met on the
//! way becomes a [`CallRecord`] whose caller is the innermost open frame
//! (or `<module>` at top level) and whose callee is resolved syntactically.
//!
//! ```text
//! SyntaxNode ──▶ walk ──┬──▶ ScopeTracker (enter/exit)
//!                       └──▶ RelationshipResolver (visit_call) ──▶ Vec<CallRecord>
//! ```
//!
//! The core is generic over [`SyntaxNode`]; the Python tree-sitter adapter
//! lives in `analysis::languages::python`.

mod resolver;
mod scope;
mod syntax;
mod walk;

#[cfg(test)]
pub(crate) mod testing;

pub use resolver::{CallRecord, CallTarget, RelationshipResolver, DYNAMIC_SENTINEL};
pub use scope::{anonymous_name, Caller, ScopeError, ScopeFrame, ScopeTracker, MODULE_SENTINEL};
pub use syntax::{Expr, NodeKind, ScopeKind, SyntaxNode};
pub use walk::{extract_calls, walk};
