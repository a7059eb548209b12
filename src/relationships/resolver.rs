//! Callee resolution for call expressions.
//!
//! Resolution is purely syntactic: `obj.method()` resolves to `obj.method`
//! whatever `obj` happens to be at runtime.

use serde::Serialize;
use std::fmt;

use super::scope::{Caller, ScopeTracker};
use super::syntax::{Expr, SyntaxNode};

/// Display name for calls whose target cannot be written as a dotted name.
pub const DYNAMIC_SENTINEL: &str = "<dynamic>";

/// Resolved target of a call expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    /// `foo()`
    SimpleName(String),
    /// `obj.method()`, `a.b.c()`, `get().run()`
    DottedAccess(String),
    /// `f()()`, `handlers[0]()`, `"".join()` and friends.
    Dynamic,
}

impl CallTarget {
    pub fn display_name(&self) -> &str {
        match self {
            CallTarget::SimpleName(name) | CallTarget::DottedAccess(name) => name,
            CallTarget::Dynamic => DYNAMIC_SENTINEL,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, CallTarget::Dynamic)
    }
}

impl fmt::Display for CallTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One observed lexical call relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRecord {
    pub caller: Caller,
    pub callee: String,
    pub line: usize,
}

/// Resolves call nodes into [`CallRecord`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct RelationshipResolver;

impl RelationshipResolver {
    pub fn new() -> Self {
        Self
    }

    /// Build the record for a call node at the tracker's current position.
    pub fn visit_call<N: SyntaxNode>(&self, node: &N, tracker: &ScopeTracker) -> CallRecord {
        CallRecord {
            caller: tracker.current_caller(),
            callee: self.resolve(node).display_name().to_string(),
            line: node.line(),
        }
    }

    /// Resolve the target of a call node.
    pub fn resolve<N: SyntaxNode>(&self, call: &N) -> CallTarget {
        let Some(function) = call.call_function() else {
            return CallTarget::Dynamic;
        };

        match unwrap_groups(function).expr() {
            Expr::Name(name) if !name.is_empty() => CallTarget::SimpleName(name),
            Expr::Attribute { object, attr } => match render_receiver(object) {
                Some(receiver) => CallTarget::DottedAccess(format!("{}.{}", receiver, attr)),
                None => CallTarget::Dynamic,
            },
            // Call-on-call, subscripts, literals, lambdas.
            _ => CallTarget::Dynamic,
        }
    }
}

fn unwrap_groups<N: SyntaxNode>(mut node: N) -> N {
    while let Expr::Group(inner) = node.expr() {
        node = inner;
    }
    node
}

/// Textual reconstruction of an attribute receiver.
///
/// Returns `None` when any part of the receiver chain has no dotted-name
/// rendering.
fn render_receiver<N: SyntaxNode>(node: N) -> Option<String> {
    match unwrap_groups(node).expr() {
        Expr::Name(name) if !name.is_empty() => Some(name),
        Expr::Attribute { object, attr } => {
            render_receiver(object).map(|receiver| format!("{}.{}", receiver, attr))
        }
        Expr::Call { function } => match unwrap_groups(function).expr() {
            Expr::Name(name) if !name.is_empty() => Some(format!("{}()", name)),
            Expr::Attribute { object, attr } => {
                render_receiver(object).map(|receiver| format!("{}.{}()", receiver, attr))
            }
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationships::testing::*;

    fn resolve(function: TestNode) -> CallTarget {
        RelationshipResolver::new().resolve(&call(function, 1, vec![]))
    }

    #[test]
    fn test_simple_name() {
        assert_eq!(resolve(name("foo")), CallTarget::SimpleName("foo".into()));
    }

    #[test]
    fn test_attribute_chain() {
        assert_eq!(resolve(dotted("a.b")), CallTarget::DottedAccess("a.b".into()));
        assert_eq!(
            resolve(dotted("self.db.session.commit")).display_name(),
            "self.db.session.commit"
        );
    }

    #[test]
    fn test_call_on_call_is_dynamic() {
        // f()()
        let target = resolve(call(name("f"), 1, vec![]));
        assert_eq!(target, CallTarget::Dynamic);
        assert_eq!(target.display_name(), "<dynamic>");
    }

    #[test]
    fn test_receiver_call_is_reconstructed() {
        // get_db().query()
        let receiver = call(name("get_db"), 1, vec![]);
        assert_eq!(resolve(attr(receiver, "query")).display_name(), "get_db().query");

        // super().__init__()
        let receiver = call(name("super"), 1, vec![]);
        assert_eq!(resolve(attr(receiver, "__init__")).display_name(), "super().__init__");

        // self.repo.find().first()
        let receiver = call(dotted("self.repo.find"), 1, vec![]);
        assert_eq!(
            resolve(attr(receiver, "first")).display_name(),
            "self.repo.find().first"
        );
    }

    #[test]
    fn test_unrenderable_receiver_is_dynamic() {
        // "".join()
        assert!(resolve(attr(literal(), "join")).is_dynamic());
        // f()().g()
        let inner = call(call(name("f"), 1, vec![]), 1, vec![]);
        assert!(resolve(attr(inner, "g")).is_dynamic());
    }

    #[test]
    fn test_parentheses_are_transparent() {
        assert_eq!(resolve(group(name("f"))).display_name(), "f");
        assert_eq!(resolve(attr(group(name("obj")), "run")).display_name(), "obj.run");
    }

    #[test]
    fn test_visit_call_uses_current_scope() {
        let mut tracker = ScopeTracker::new();
        let resolver = RelationshipResolver::new();
        let site = call(dotted("self.check"), 12, vec![]);

        let record = resolver.visit_call(&site, &tracker);
        assert_eq!(record.caller, Caller::Module);

        let method = def("validate", 10, vec![]);
        tracker.enter_declaration(&method).unwrap();
        let record = resolver.visit_call(&site, &tracker);
        assert_eq!(record.caller.as_str(), "validate");
        assert_eq!(record.callee, "self.check");
        assert_eq!(record.line, 12);
    }

    #[test]
    fn test_record_serializes_caller_as_string() {
        let record = CallRecord {
            caller: Caller::Module,
            callee: "main".to_string(),
            line: 3,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["caller"], "<module>");
        assert_eq!(json["callee"], "main");
        assert_eq!(json["line"], 3);
    }
}
