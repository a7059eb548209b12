//! Output formatting for callscope results.
//!
//! Supports:
//! - Pretty: colored terminal summary for human readability
//! - JSON: structured output on stdout for programmatic consumption
//! - Saved artifacts: entities.json, relationships.json, summary.md and
//!   diagram.mermaid written to an output directory

use colored::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::{Entity, EntityKind, FileFailure, Import, LocatedCall, ProjectAnalysis};
use crate::relationships::{CallRecord, DYNAMIC_SENTINEL, MODULE_SENTINEL};
use crate::summary::Summary;

/// Rows shown per table in the terminal summary.
const PRETTY_TOP_ROWS: usize = 5;

/// Modules listed in the markdown dependency section.
const MARKDOWN_TOP_MODULES: usize = 15;

// =============================================================================
// JSON Format
// =============================================================================

/// An import tagged with the file it came from.
#[derive(Serialize)]
pub struct LocatedImport<'a> {
    #[serde(flatten)]
    pub import: &'a Import,
    pub file: &'a str,
}

/// Full JSON report written to stdout.
#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub version: &'static str,
    pub path: &'a str,
    pub summary: &'a Summary,
    pub entities: BTreeMap<&'a str, &'a [Entity]>,
    pub calls: Vec<LocatedCall<'a>>,
    pub imports: Vec<LocatedImport<'a>>,
    pub failures: &'a [FileFailure],
}

/// Contents of relationships.json.
#[derive(Serialize)]
pub struct RelationshipsReport<'a> {
    pub calls: Vec<LocatedCall<'a>>,
    pub imports: Vec<LocatedImport<'a>>,
    pub summary: &'a Summary,
}

fn entities_by_file(project: &ProjectAnalysis) -> BTreeMap<&str, &[Entity]> {
    project
        .files
        .iter()
        .map(|f| (f.path(), f.facts.entities.as_slice()))
        .collect()
}

fn located_imports(project: &ProjectAnalysis) -> Vec<LocatedImport<'_>> {
    project
        .imports()
        .map(|(file, import)| LocatedImport { import, file })
        .collect()
}

pub fn json_report<'a>(
    path: &'a str,
    project: &'a ProjectAnalysis,
    summary: &'a Summary,
) -> JsonReport<'a> {
    JsonReport {
        version: env!("CARGO_PKG_VERSION"),
        path,
        summary,
        entities: entities_by_file(project),
        calls: project.located_calls(),
        imports: located_imports(project),
        failures: &project.failures,
    }
}

/// Write results in JSON format.
pub fn write_json(path: &str, project: &ProjectAnalysis, summary: &Summary) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&json_report(path, project, summary))?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// Saved artifacts
// =============================================================================

/// Write all report files into `output_dir`, creating it if needed.
///
/// Returns the paths written, in order.
pub fn save_results(
    output_dir: &Path,
    project: &ProjectAnalysis,
    summary: &Summary,
    mermaid_max_edges: usize,
) -> anyhow::Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)?;

    let relationships = RelationshipsReport {
        calls: project.located_calls(),
        imports: located_imports(project),
        summary,
    };

    let outputs = [
        (
            "entities.json",
            serde_json::to_string_pretty(&entities_by_file(project))?,
        ),
        (
            "relationships.json",
            serde_json::to_string_pretty(&relationships)?,
        ),
        ("summary.md", markdown_summary(project, summary)),
        (
            "diagram.mermaid",
            mermaid_diagram(project.calls(), mermaid_max_edges),
        ),
    ];

    let mut written = Vec::with_capacity(outputs.len());
    for (name, content) in outputs {
        let path = output_dir.join(name);
        fs::write(&path, content)?;
        tracing::info!(path = %path.display(), "saved report");
        written.push(path);
    }
    Ok(written)
}

/// Render the markdown report.
pub fn markdown_summary(project: &ProjectAnalysis, summary: &Summary) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Code Analysis Report");
    let _ = writeln!(out);
    let _ = writeln!(out, "## Overview");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Metric | Count |");
    let _ = writeln!(out, "|--------|-------|");
    let _ = writeln!(out, "| Files analyzed | {} |", summary.total_files);
    if summary.failed_files > 0 {
        let _ = writeln!(out, "| Files skipped | {} |", summary.failed_files);
    }
    let _ = writeln!(out, "| Classes | {} |", summary.total_classes);
    let _ = writeln!(out, "| Functions | {} |", summary.total_functions);
    let _ = writeln!(out, "| Call relationships | {} |", summary.total_calls);
    let _ = writeln!(out);

    let classes: Vec<_> = project
        .entities()
        .filter(|(_, e)| e.kind == EntityKind::Class)
        .collect();
    if !classes.is_empty() {
        let _ = writeln!(out, "---");
        let _ = writeln!(out);
        let _ = writeln!(out, "## Classes Found");
        let _ = writeln!(out);
        for (file, class) in classes {
            let _ = writeln!(out, "### `{}`", class.qualified_name);
            let _ = writeln!(out);
            let _ = writeln!(out, "- **File:** `{}`", file);
            let _ = writeln!(out, "- **Line:** {}", class.line);
            let _ = writeln!(out, "- **Inherits:** {}", bases_text(class));
            let _ = writeln!(out, "- **Methods:** {}", class.method_count.unwrap_or(0));
            if !class.decorators.is_empty() {
                let _ = writeln!(out, "- **Decorators:** {}", class.decorators.join(", "));
            }
            if let Some(doc) = &class.docstring {
                let _ = writeln!(out, "- **Description:** {}", first_line(doc, 100));
            }
            let _ = writeln!(out);
        }
    }

    if !summary.most_called.is_empty() {
        let _ = writeln!(out, "---");
        let _ = writeln!(out);
        let _ = writeln!(out, "## Most Called Functions");
        let _ = writeln!(out);
        let _ = writeln!(out, "| Function | Call Count |");
        let _ = writeln!(out, "|----------|------------|");
        for row in &summary.most_called {
            let _ = writeln!(out, "| `{}` | {} |", row.name, row.count);
        }
        let _ = writeln!(out);
    }

    if !summary.most_calling.is_empty() {
        let _ = writeln!(out, "---");
        let _ = writeln!(out);
        let _ = writeln!(out, "## Orchestrator Functions");
        let _ = writeln!(out);
        let _ = writeln!(out, "| Function | Calls Made |");
        let _ = writeln!(out, "|----------|------------|");
        for row in &summary.most_calling {
            let _ = writeln!(out, "| `{}` | {} |", row.name, row.count);
        }
        let _ = writeln!(out);
    }

    let modules = imported_modules(project);
    if !modules.is_empty() {
        let _ = writeln!(out, "---");
        let _ = writeln!(out);
        let _ = writeln!(out, "## External Dependencies");
        let _ = writeln!(out);
        for (module, count) in modules.into_iter().take(MARKDOWN_TOP_MODULES) {
            let plural = if count != 1 { "s" } else { "" };
            let _ = writeln!(out, "- `{}` ({} import{})", module, count, plural);
        }
        let _ = writeln!(out);
    }

    if !project.failures.is_empty() {
        let _ = writeln!(out, "---");
        let _ = writeln!(out);
        let _ = writeln!(out, "## Skipped Files");
        let _ = writeln!(out);
        for failure in &project.failures {
            let _ = writeln!(out, "- `{}`: {}", failure.path, failure.reason);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "---");
    let _ = writeln!(out);
    let _ = write!(out, "*Report generated by callscope {}*", env!("CARGO_PKG_VERSION"));
    out
}

/// Import counts per module, most imported first, ties by module name.
fn imported_modules(project: &ProjectAnalysis) -> Vec<(&str, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for (_, import) in project.imports() {
        *counts.entry(import.module.as_str()).or_insert(0) += 1;
    }
    let mut modules: Vec<_> = counts.into_iter().collect();
    modules.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    modules
}

fn bases_text(class: &Entity) -> String {
    if class.bases.is_empty() {
        "none".to_string()
    } else {
        class.bases.join(", ")
    }
}

fn first_line(text: &str, max_chars: usize) -> String {
    let line = text.lines().next().unwrap_or("").trim();
    if line.chars().count() > max_chars {
        let cut: String = line.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        line.to_string()
    }
}

/// Mermaid-safe node id.
///
/// Sentinels get reserved ids so they never merge with a real name; anything
/// outside `[A-Za-z0-9_]` becomes `_`.
fn mermaid_id(name: &str) -> String {
    match name {
        DYNAMIC_SENTINEL => "__dynamic__".to_string(),
        MODULE_SENTINEL => "__module__".to_string(),
        _ => name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect(),
    }
}

/// Render the call graph as a Mermaid flowchart.
///
/// Edges are aggregated per (caller, callee). Self-calls and module-level
/// calls are left out; the `max_edges` most frequent edges are drawn, ties in
/// first-seen order.
pub fn mermaid_diagram<'a, I>(calls: I, max_edges: usize) -> String
where
    I: IntoIterator<Item = &'a CallRecord>,
{
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut edges: Vec<((&str, &str), usize)> = Vec::new();

    for call in calls {
        let caller = call.caller.as_str();
        if call.caller.is_module() || caller == call.callee {
            continue;
        }
        let key = (caller, call.callee.as_str());
        match index.get(&key) {
            Some(&i) => edges[i].1 += 1,
            None => {
                index.insert(key, edges.len());
                edges.push((key, 1));
            }
        }
    }
    edges.sort_by(|a, b| b.1.cmp(&a.1));
    edges.truncate(max_edges);

    let mut lines = vec![
        "graph TD".to_string(),
        "    %% Call Graph - Who calls whom".to_string(),
        "    %% Arrows point from caller to callee".to_string(),
        String::new(),
    ];

    for ((caller, callee), count) in &edges {
        let arrow = if *count > 1 {
            format!("-->|{}x|", count)
        } else {
            "-->".to_string()
        };
        lines.push(format!(
            "    {}[\"{}\"] {} {}[\"{}\"]",
            mermaid_id(caller),
            caller,
            arrow,
            mermaid_id(callee),
            callee
        ));
    }

    if edges.is_empty() {
        lines.push("    NoRelationships[No call relationships found]".to_string());
    }

    lines.join("\n")
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in pretty (human-readable) format.
pub fn write_pretty(path: &str, project: &ProjectAnalysis, summary: &Summary) {
    print!("{}", render_pretty(path, project, summary));
}

/// Render the terminal summary.
pub fn render_pretty(path: &str, project: &ProjectAnalysis, summary: &Summary) -> String {
    let mut out = String::new();

    // Header
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "  {} v{}",
        "callscope".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "  {}{}", "Analyzing: ".dimmed(), path);
    let _ = writeln!(out);

    // Overview
    let _ = writeln!(out, "  {}", "Overview:".bold());
    let _ = writeln!(out, "    Files analyzed      {:>6}", summary.total_files);
    if summary.failed_files > 0 {
        let _ = writeln!(
            out,
            "    Files skipped       {:>6}",
            summary.failed_files.to_string().yellow()
        );
    }
    let _ = writeln!(out, "    Classes             {:>6}", summary.total_classes);
    let _ = writeln!(out, "    Functions           {:>6}", summary.total_functions);
    let _ = writeln!(out, "    Call relationships  {:>6}", summary.total_calls);
    let _ = writeln!(out);

    if !summary.most_called.is_empty() {
        let _ = writeln!(
            out,
            "  {} {}",
            "Most called".bold(),
            "(potential core utilities):".dimmed()
        );
        for row in summary.most_called.iter().take(PRETTY_TOP_ROWS) {
            let _ = writeln!(out, "    {:>4}x  {}", row.count, row.name.green());
        }
        let _ = writeln!(out);
    }

    if !summary.most_calling.is_empty() {
        let _ = writeln!(
            out,
            "  {} {}",
            "Orchestrators".bold(),
            "(call the most others):".dimmed()
        );
        for row in summary.most_calling.iter().take(PRETTY_TOP_ROWS) {
            let _ = writeln!(out, "    {:>4} calls  {}", row.count, row.name.green());
        }
        let _ = writeln!(out);
    }

    if !project.files.is_empty() {
        let _ = writeln!(out, "  {}", "Files:".bold());
        for file in &project.files {
            let _ = writeln!(out, "    {}", file.path().blue());
            let _ = writeln!(
                out,
                "      {}",
                format!(
                    "classes: {}, functions: {}",
                    file.facts.class_count(),
                    file.facts.callable_count()
                )
                .dimmed()
            );
        }
        let _ = writeln!(out);
    }

    let classes: Vec<_> = project
        .entities()
        .filter(|(_, e)| e.kind == EntityKind::Class)
        .collect();
    if !classes.is_empty() {
        let _ = writeln!(out, "  {}", "Key entities:".bold());
        for (file, class) in classes {
            let _ = writeln!(
                out,
                "    class {} (inherits: {}, methods: {})",
                class.qualified_name.cyan(),
                bases_text(class),
                class.method_count.unwrap_or(0)
            );
            let _ = writeln!(
                out,
                "          {}",
                format!("└─ {}:{}", file, class.line).dimmed()
            );
        }
        let _ = writeln!(out);
    }

    if !project.failures.is_empty() {
        let _ = writeln!(
            out,
            "  {} ({}):",
            "Skipped".yellow().bold(),
            project.failures.len()
        );
        for failure in &project.failures {
            let _ = writeln!(out, "    {}  {}", failure.path.blue(), failure.reason.dimmed());
        }
        let _ = writeln!(out);
    }

    out
}
