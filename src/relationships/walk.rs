//! Depth-first traversal that drives the scope tracker and the resolver.

use super::resolver::{CallRecord, RelationshipResolver};
use super::scope::{ScopeError, ScopeTracker};
use super::syntax::{NodeKind, SyntaxNode};

enum Step<N> {
    Visit(N),
    Leave(N),
}

/// Extract every call relationship in the tree rooted at `root`.
///
/// Calls are recorded in pre-order: an outer call comes before the calls in
/// its arguments. The traversal uses an explicit stack, so deeply nested
/// sources cannot overflow the native stack.
pub fn extract_calls<N: SyntaxNode>(root: &N) -> Result<Vec<CallRecord>, ScopeError> {
    let mut tracker = ScopeTracker::new();
    let calls = walk(root, &mut tracker)?;
    tracker.finish()?;
    tracing::trace!(
        calls = calls.len(),
        scopes = tracker.entered(),
        "call extraction finished"
    );
    Ok(calls)
}

/// Walk `root` with a caller-supplied tracker.
pub fn walk<N: SyntaxNode>(
    root: &N,
    tracker: &mut ScopeTracker,
) -> Result<Vec<CallRecord>, ScopeError> {
    let resolver = RelationshipResolver::new();
    let mut calls = Vec::new();
    let mut stack = vec![Step::Visit(root.clone())];

    while let Some(step) = stack.pop() {
        match step {
            Step::Visit(node) => {
                match node.kind() {
                    NodeKind::Declaration(_) => {
                        tracker.enter_declaration(&node)?;
                        stack.push(Step::Leave(node.clone()));
                    }
                    NodeKind::Call => calls.push(resolver.visit_call(&node, tracker)),
                    NodeKind::Other => {}
                }
                for child in node.children().into_iter().rev() {
                    stack.push(Step::Visit(child));
                }
            }
            Step::Leave(node) => {
                tracker.exit_declaration(&node)?;
            }
        }
    }

    Ok(calls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationships::scope::Caller;
    use crate::relationships::testing::*;

    fn edges(calls: &[CallRecord]) -> Vec<(String, String, usize)> {
        calls
            .iter()
            .map(|c| (c.caller.to_string(), c.callee.clone(), c.line))
            .collect()
    }

    fn edge(caller: &str, callee: &str, line: usize) -> (String, String, usize) {
        (caller.to_string(), callee.to_string(), line)
    }

    #[test]
    fn test_method_calls_are_qualified() {
        // class A:
        //     def validate(self):
        //         self.check()
        //         helper()
        //
        // def helper():
        //     pass
        let tree = module(vec![
            class(
                "A",
                1,
                vec![def(
                    "validate",
                    2,
                    vec![
                        call(dotted("self.check"), 3, vec![]),
                        call(name("helper"), 4, vec![]),
                    ],
                )],
            ),
            def("helper", 6, vec![]),
        ]);

        let calls = extract_calls(&tree).unwrap();
        assert_eq!(
            edges(&calls),
            vec![
                edge("A.validate", "self.check", 3),
                edge("A.validate", "helper", 4),
            ]
        );
    }

    #[test]
    fn test_nested_functions() {
        // def outer():
        //     def inner():
        //         helper()
        //     inner()
        let tree = module(vec![def(
            "outer",
            1,
            vec![
                def("inner", 2, vec![call(name("helper"), 3, vec![])]),
                call(name("inner"), 4, vec![]),
            ],
        )]);

        let calls = extract_calls(&tree).unwrap();
        assert_eq!(
            edges(&calls),
            vec![edge("outer.inner", "helper", 3), edge("outer", "inner", 4)]
        );
    }

    #[test]
    fn test_module_level_calls_use_sentinel() {
        let tree = module(vec![
            call(name("main"), 10, vec![]),
            def("main", 1, vec![]),
        ]);
        let calls = extract_calls(&tree).unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].caller, Caller::Module);
        assert_eq!(calls[0].callee, "main");
    }

    #[test]
    fn test_nested_calls_in_preorder() {
        // print(format(x), len(y))
        let tree = module(vec![def(
            "report",
            1,
            vec![call(
                name("print"),
                2,
                vec![
                    call(name("format"), 2, vec![name("x")]),
                    call(name("len"), 2, vec![name("y")]),
                ],
            )],
        )]);

        let callees: Vec<_> = extract_calls(&tree)
            .unwrap()
            .into_iter()
            .map(|c| c.callee)
            .collect();
        assert_eq!(callees, vec!["print", "format", "len"]);
    }

    #[test]
    fn test_call_on_call_records_both() {
        // f()()
        let tree = module(vec![call(call(name("f"), 1, vec![]), 1, vec![])]);
        let calls = extract_calls(&tree).unwrap();
        assert_eq!(
            edges(&calls),
            vec![edge("<module>", "<dynamic>", 1), edge("<module>", "f", 1)]
        );
    }

    #[test]
    fn test_lambda_gets_anonymous_scope() {
        // def run():
        //     apply(lambda: log())
        let tree = module(vec![def(
            "run",
            1,
            vec![call(
                name("apply"),
                2,
                vec![lambda(2, vec![call(name("log"), 2, vec![])])],
            )],
        )]);
        let calls = extract_calls(&tree).unwrap();
        assert_eq!(
            edges(&calls),
            vec![edge("run", "apply", 2), edge("run.<anonymous@2>", "log", 2)]
        );
    }

    #[test]
    fn test_repeated_calls_are_not_deduplicated() {
        let tree = module(vec![def(
            "main",
            1,
            vec![
                call(name("step"), 2, vec![]),
                call(name("step"), 3, vec![]),
                call(name("step"), 4, vec![]),
            ],
        )]);
        assert_eq!(extract_calls(&tree).unwrap().len(), 3);
    }

    #[test]
    fn test_traversal_is_deterministic() {
        let tree = module(vec![
            class(
                "Service",
                1,
                vec![def(
                    "run",
                    2,
                    vec![
                        call(dotted("self.load"), 3, vec![]),
                        call(attr(call(name("db"), 4, vec![]), "commit"), 4, vec![]),
                    ],
                )],
            ),
            call(dotted("Service.run"), 6, vec![]),
        ]);

        let first = extract_calls(&tree).unwrap();
        let second = extract_calls(&tree).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_stack_discipline_balanced() {
        let tree = module(vec![class(
            "A",
            1,
            vec![
                def("a", 2, vec![def("b", 3, vec![lambda(4, vec![])])]),
                def("c", 5, vec![]),
            ],
        )]);

        let mut tracker = ScopeTracker::new();
        walk(&tree, &mut tracker).unwrap();
        assert_eq!(tracker.entered(), 5);
        assert_eq!(tracker.exited(), 5);
        assert_eq!(tracker.depth(), 0);
    }

    #[test]
    fn test_prepopulated_tracker_is_reported() {
        let tree = module(vec![call(name("f"), 1, vec![])]);
        let mut tracker = ScopeTracker::new();
        let stray = def("stray", 1, vec![]);
        tracker.enter_declaration(&stray).unwrap();

        let calls = walk(&tree, &mut tracker).unwrap();
        assert_eq!(calls[0].caller.as_str(), "stray");
        assert!(tracker.finish().is_err());
    }
}
