//! In-memory syntax tree for exercising the relationship core without a parser.

use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::syntax::{Expr, NodeKind, ScopeKind, SyntaxNode};

static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

#[derive(Debug)]
enum Shape {
    Module,
    Function(Option<String>),
    Class(String),
    Call(TestNode),
    Name(String),
    Attribute(TestNode, String),
    Group(TestNode),
    Literal,
}

#[derive(Debug)]
struct Inner {
    id: usize,
    shape: Shape,
    line: usize,
    children: Vec<TestNode>,
}

#[derive(Debug, Clone)]
pub(crate) struct TestNode(Rc<Inner>);

fn node(shape: Shape, line: usize, children: Vec<TestNode>) -> TestNode {
    TestNode(Rc::new(Inner {
        id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
        shape,
        line,
        children,
    }))
}

pub(crate) fn module(body: Vec<TestNode>) -> TestNode {
    node(Shape::Module, 1, body)
}

pub(crate) fn def(name: &str, line: usize, body: Vec<TestNode>) -> TestNode {
    node(Shape::Function(Some(name.to_string())), line, body)
}

pub(crate) fn lambda(line: usize, body: Vec<TestNode>) -> TestNode {
    node(Shape::Function(None), line, body)
}

pub(crate) fn class(name: &str, line: usize, body: Vec<TestNode>) -> TestNode {
    node(Shape::Class(name.to_string()), line, body)
}

/// A call of `function` at `line`; `args` become children after the callee.
pub(crate) fn call(function: TestNode, line: usize, args: Vec<TestNode>) -> TestNode {
    let mut children = vec![function.clone()];
    children.extend(args);
    node(Shape::Call(function), line, children)
}

pub(crate) fn name(id: &str) -> TestNode {
    node(Shape::Name(id.to_string()), 0, Vec::new())
}

pub(crate) fn attr(object: TestNode, attr: &str) -> TestNode {
    node(
        Shape::Attribute(object.clone(), attr.to_string()),
        0,
        vec![object],
    )
}

pub(crate) fn group(inner: TestNode) -> TestNode {
    node(Shape::Group(inner.clone()), 0, vec![inner])
}

pub(crate) fn literal() -> TestNode {
    node(Shape::Literal, 0, Vec::new())
}

/// Shorthand for `a.b.c` from a dotted string.
pub(crate) fn dotted(path: &str) -> TestNode {
    let mut parts = path.split('.');
    let mut expr = name(parts.next().unwrap_or_default());
    for part in parts {
        expr = attr(expr, part);
    }
    expr
}

impl SyntaxNode for TestNode {
    fn id(&self) -> usize {
        self.0.id
    }

    fn kind(&self) -> NodeKind {
        match self.0.shape {
            Shape::Function(_) => NodeKind::Declaration(ScopeKind::Function),
            Shape::Class(_) => NodeKind::Declaration(ScopeKind::Class),
            Shape::Call(_) => NodeKind::Call,
            _ => NodeKind::Other,
        }
    }

    fn name(&self) -> Option<String> {
        match &self.0.shape {
            Shape::Function(name) => name.clone(),
            Shape::Class(name) => Some(name.clone()),
            _ => None,
        }
    }

    fn line(&self) -> usize {
        self.0.line
    }

    fn children(&self) -> Vec<Self> {
        self.0.children.clone()
    }

    fn call_function(&self) -> Option<Self> {
        match &self.0.shape {
            Shape::Call(function) => Some(function.clone()),
            _ => None,
        }
    }

    fn expr(&self) -> Expr<Self> {
        match &self.0.shape {
            Shape::Name(id) => Expr::Name(id.clone()),
            Shape::Attribute(object, attr) => Expr::Attribute {
                object: object.clone(),
                attr: attr.clone(),
            },
            Shape::Call(function) => Expr::Call {
                function: function.clone(),
            },
            Shape::Group(inner) => Expr::Group(inner.clone()),
            _ => Expr::Other,
        }
    }
}
