//! Capability view over a parsed syntax tree.
//!
//! The relationship core never looks at grammar-specific node names. A parser
//! adapter maps its nodes onto the closed [`NodeKind`] tag and the closed
//! [`Expr`] shape, and the traversal dispatches on those.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of declaration that opens a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    Function,
    Class,
}

impl ScopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Function => "function",
            ScopeKind::Class => "class",
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tag the traversal dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A function, method, class or anonymous function.
    Declaration(ScopeKind),
    /// A call expression.
    Call,
    /// Everything else; only its children matter.
    Other,
}

/// Syntactic shape of an expression, as far as callee resolution cares.
#[derive(Debug, Clone)]
pub enum Expr<N> {
    /// A bare identifier (`foo`).
    Name(String),
    /// Attribute access (`object.attr`).
    Attribute { object: N, attr: String },
    /// A call expression used as a value (`f()` in `f().g`).
    Call { function: N },
    /// Parentheses around a single expression.
    Group(N),
    /// Anything that cannot be rendered as a dotted name.
    Other,
}

/// A node of a parsed syntax tree.
///
/// Implementations are cheap handles (tree-sitter nodes are `Copy`), so
/// `children` returns owned values.
pub trait SyntaxNode: Clone {
    /// Identity used to pair scope enter/exit. Unique within one tree.
    fn id(&self) -> usize;

    fn kind(&self) -> NodeKind;

    /// Declared name, for declaration nodes that have one.
    fn name(&self) -> Option<String>;

    /// 1-indexed source line where the node starts.
    fn line(&self) -> usize;

    /// Child nodes in source order.
    fn children(&self) -> Vec<Self>;

    /// For call nodes: the expression being called.
    fn call_function(&self) -> Option<Self>;

    /// Expression shape of this node.
    fn expr(&self) -> Expr<Self>;
}
