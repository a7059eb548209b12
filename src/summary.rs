//! Aggregation of call records into ranked tables.
//!
//! Both tables count every record (repeats included) and sort by count,
//! descending. Equal counts keep the order in which names were first seen, so
//! the same record sequence always produces the same table.

use serde::{Serialize, Serializer};
use std::collections::HashMap;

use crate::analysis::{EntityKind, ProjectAnalysis};
use crate::config::ModuleCallPolicy;
use crate::relationships::CallRecord;

/// A name and how many records mention it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedName {
    pub name: String,
    pub count: usize,
}

// Serialized as a `[name, count]` pair.
impl Serialize for RankedName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.name, self.count).serialize(serializer)
    }
}

/// Count occurrences of `key` and rank them, ties in first-seen order.
pub fn rank_by<'a, I, F>(records: I, key: F) -> Vec<RankedName>
where
    I: IntoIterator<Item = &'a CallRecord>,
    F: Fn(&'a CallRecord) -> Option<&'a str>,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut ranked: Vec<RankedName> = Vec::new();

    for record in records {
        let Some(name) = key(record) else {
            continue;
        };
        match index.get(name) {
            Some(&i) => ranked[i].count += 1,
            None => {
                index.insert(name, ranked.len());
                ranked.push(RankedName {
                    name: name.to_string(),
                    count: 1,
                });
            }
        }
    }

    // sort_by is stable: equal counts stay in first-seen order.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}

/// Callees ranked by how often they are called.
pub fn most_called<'a, I>(records: I) -> Vec<RankedName>
where
    I: IntoIterator<Item = &'a CallRecord>,
{
    rank_by(records, |r| Some(r.callee.as_str()))
}

/// Callers ranked by how many calls they make.
pub fn top_orchestrators<'a, I>(records: I, policy: ModuleCallPolicy) -> Vec<RankedName>
where
    I: IntoIterator<Item = &'a CallRecord>,
{
    rank_by(records, move |r| match policy {
        ModuleCallPolicy::Omit if r.caller.is_module() => None,
        _ => Some(r.caller.as_str()),
    })
}

/// Headline numbers and ranked tables for a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total_files: usize,
    pub failed_files: usize,
    pub total_calls: usize,
    /// Functions plus methods, nested ones included.
    pub total_functions: usize,
    pub total_classes: usize,
    pub total_imports: usize,
    pub unique_callees: usize,
    pub most_called: Vec<RankedName>,
    pub most_calling: Vec<RankedName>,
}

impl Summary {
    /// Build the summary; tables are truncated to `top_n` rows.
    pub fn build(project: &ProjectAnalysis, top_n: usize, policy: ModuleCallPolicy) -> Self {
        let called = most_called(project.calls());
        let calling = top_orchestrators(project.calls(), policy);

        let mut total_functions = 0;
        let mut total_classes = 0;
        for (_, entity) in project.entities() {
            match entity.kind {
                EntityKind::Class => total_classes += 1,
                EntityKind::Function | EntityKind::Method => total_functions += 1,
            }
        }

        Self {
            total_files: project.files.len(),
            failed_files: project.failures.len(),
            total_calls: project.calls().count(),
            total_functions,
            total_classes,
            total_imports: project.imports().count(),
            unique_callees: called.len(),
            most_called: called.into_iter().take(top_n).collect(),
            most_calling: calling.into_iter().take(top_n).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationships::Caller;

    fn record(caller: Option<&str>, callee: &str, line: usize) -> CallRecord {
        CallRecord {
            caller: caller
                .map(|c| Caller::Scope(c.to_string()))
                .unwrap_or(Caller::Module),
            callee: callee.to_string(),
            line,
        }
    }

    fn pairs(ranked: &[RankedName]) -> Vec<(&str, usize)> {
        ranked.iter().map(|r| (r.name.as_str(), r.count)).collect()
    }

    #[test]
    fn test_most_called_ties_in_first_seen_order() {
        let records = vec![
            record(Some("A.validate"), "self.check", 3),
            record(Some("A.validate"), "helper", 4),
        ];
        assert_eq!(
            pairs(&most_called(&records)),
            vec![("self.check", 1), ("helper", 1)]
        );
    }

    #[test]
    fn test_most_called_sorted_by_count() {
        let records = vec![
            record(Some("a"), "x", 1),
            record(Some("a"), "y", 2),
            record(Some("b"), "y", 3),
            record(Some("b"), "z", 4),
            record(Some("c"), "z", 5),
            record(Some("c"), "z", 6),
        ];
        assert_eq!(
            pairs(&most_called(&records)),
            vec![("z", 3), ("y", 2), ("x", 1)]
        );
    }

    #[test]
    fn test_orchestrators_count_repeats_and_module() {
        let records = vec![
            record(None, "setup", 1),
            record(Some("main"), "step", 2),
            record(Some("main"), "step", 3),
            record(Some("main"), "step", 4),
            record(None, "main", 9),
        ];

        let ranked = top_orchestrators(&records, ModuleCallPolicy::Sentinel);
        assert_eq!(pairs(&ranked), vec![("main", 3), ("<module>", 2)]);

        let ranked = top_orchestrators(&records, ModuleCallPolicy::Omit);
        assert_eq!(pairs(&ranked), vec![("main", 3)]);
    }

    #[test]
    fn test_reaggregation_is_idempotent() {
        let records = vec![
            record(Some("a"), "x", 1),
            record(Some("b"), "x", 2),
            record(None, "a", 3),
            record(Some("b"), "y", 4),
        ];
        let first = top_orchestrators(&records, ModuleCallPolicy::Sentinel);
        let second = top_orchestrators(&records, ModuleCallPolicy::Sentinel);
        assert_eq!(first, second);
        assert_eq!(pairs(&first), vec![("b", 2), ("a", 1), ("<module>", 1)]);
    }

    #[test]
    fn test_total_functions_counts_every_depth() {
        use crate::analysis::AnalysisContext;
        use std::fs;
        use tempfile::TempDir;

        let temp = TempDir::new().unwrap();
        let file = temp.path().join("jobs.py");
        fs::write(
            &file,
            "def outer():\n    def inner():\n        pass\n\nclass Job:\n    def run(self):\n        def step():\n            pass\n",
        )
        .unwrap();
        let project = AnalysisContext::new(temp.path()).analyze_files(&[file]);

        let summary = Summary::build(&project, 10, ModuleCallPolicy::Sentinel);
        // outer, outer.inner, Job.run, Job.run.step
        assert_eq!(summary.total_functions, 4);
        assert_eq!(summary.total_classes, 1);
    }

    #[test]
    fn test_ranked_name_json() {
        let ranked = RankedName {
            name: "helper".to_string(),
            count: 4,
        };
        assert_eq!(
            serde_json::to_value(&ranked).unwrap(),
            serde_json::json!(["helper", 4])
        );
    }
}
