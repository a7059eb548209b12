//! Enclosing-declaration stack for a single traversal.

use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use super::syntax::{NodeKind, ScopeKind, SyntaxNode};

/// Display name of the module-level caller.
pub const MODULE_SENTINEL: &str = "<module>";

/// Errors raised when enter/exit calls are not properly nested.
///
/// These indicate a bug in the traversal driving the tracker, never a problem
/// with the analyzed source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("exit for node {node} at line {line} with an empty scope stack")]
    Underflow { node: usize, line: usize },
    #[error("exit for node {node} at line {line} does not match open scope {open:?}")]
    Mismatch {
        node: usize,
        line: usize,
        open: String,
    },
    #[error("node {node} at line {line} is not a declaration")]
    NotADeclaration { node: usize, line: usize },
    #[error("{count} scope(s) still open at end of traversal, innermost {innermost:?}")]
    Unclosed { count: usize, innermost: String },
}

/// One enclosing declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFrame {
    /// Dot-joined path from the outermost declaration to this one.
    pub qualified_name: String,
    pub kind: ScopeKind,
    /// Line of the declaration.
    pub line: usize,
    node_id: usize,
}

/// The caller side of a call record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Caller {
    /// Code outside any declaration.
    Module,
    /// Qualified name of the innermost enclosing declaration.
    Scope(String),
}

impl Caller {
    pub fn as_str(&self) -> &str {
        match self {
            Caller::Module => MODULE_SENTINEL,
            Caller::Scope(name) => name,
        }
    }

    pub fn is_module(&self) -> bool {
        matches!(self, Caller::Module)
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Caller {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Synthetic name for declarations without one (lambdas, recovered nodes).
pub fn anonymous_name(line: usize) -> String {
    format!("<anonymous@{}>", line)
}

/// Tracks the stack of declarations enclosing the traversal position.
///
/// One tracker serves exactly one traversal of one tree.
#[derive(Debug, Default)]
pub struct ScopeTracker {
    frames: Vec<ScopeFrame>,
    entered: usize,
    exited: usize,
}

impl ScopeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a frame for a declaration node.
    pub fn enter_declaration<N: SyntaxNode>(&mut self, node: &N) -> Result<&ScopeFrame, ScopeError> {
        let kind = match node.kind() {
            NodeKind::Declaration(kind) => kind,
            _ => {
                return Err(ScopeError::NotADeclaration {
                    node: node.id(),
                    line: node.line(),
                })
            }
        };

        let line = node.line();
        let local = node
            .name()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| anonymous_name(line));

        let qualified_name = match self.frames.last() {
            Some(parent) => format!("{}.{}", parent.qualified_name, local),
            None => local,
        };

        self.entered += 1;
        self.frames.push(ScopeFrame {
            qualified_name,
            kind,
            line,
            node_id: node.id(),
        });
        Ok(&self.frames[self.frames.len() - 1])
    }

    /// Pop the frame pushed for `node`.
    pub fn exit_declaration<N: SyntaxNode>(&mut self, node: &N) -> Result<ScopeFrame, ScopeError> {
        match self.frames.pop() {
            Some(frame) if frame.node_id == node.id() => {
                self.exited += 1;
                Ok(frame)
            }
            Some(frame) => {
                let open = frame.qualified_name.clone();
                self.frames.push(frame);
                Err(ScopeError::Mismatch {
                    node: node.id(),
                    line: node.line(),
                    open,
                })
            }
            None => Err(ScopeError::Underflow {
                node: node.id(),
                line: node.line(),
            }),
        }
    }

    /// The caller for a call at the current position.
    pub fn current_caller(&self) -> Caller {
        match self.frames.last() {
            Some(frame) => Caller::Scope(frame.qualified_name.clone()),
            None => Caller::Module,
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Number of `enter_declaration` calls that succeeded.
    pub fn entered(&self) -> usize {
        self.entered
    }

    /// Number of `exit_declaration` calls that succeeded.
    pub fn exited(&self) -> usize {
        self.exited
    }

    /// Verify the traversal closed every scope it opened.
    pub fn finish(&self) -> Result<(), ScopeError> {
        match self.frames.last() {
            None => Ok(()),
            Some(frame) => Err(ScopeError::Unclosed {
                count: self.frames.len(),
                innermost: frame.qualified_name.clone(),
            }),
        }
    }
}
