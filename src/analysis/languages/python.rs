//! Python language analyzer using tree-sitter.

use std::path::Path;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

use crate::analysis::{
    AnalysisError, Entity, EntityKind, FileFacts, Import, ImportKind, LanguageAnalyzer,
    ParsedFile, Span,
};
use crate::relationships::{self, anonymous_name, CallRecord, Expr, NodeKind, ScopeKind, SyntaxNode};

const DECLARATION_QUERY: &str = r#"
; Function definitions (plain, async and decorated)
(function_definition
  name: (identifier) @func_name
) @function

; Class definitions
(class_definition
  name: (identifier) @class_name
) @class
"#;

/// Tree-sitter query for extracting imports.
const IMPORT_QUERY: &str = r#"
; import module [as alias]
(import_statement) @import

; from module import name [as alias]
(import_from_statement) @import_from

; from __future__ import name
(future_import_statement) @import_future
"#;

/// A Python tree-sitter node seen through the [`SyntaxNode`] capability view.
#[derive(Clone, Copy)]
pub struct PyNode<'a> {
    node: Node<'a>,
    source: &'a [u8],
}

impl<'a> PyNode<'a> {
    pub fn new(node: Node<'a>, source: &'a [u8]) -> Self {
        Self { node, source }
    }

    /// Root of a parsed file.
    pub fn root(parsed: &'a ParsedFile) -> Self {
        Self::new(parsed.tree.root_node(), &parsed.source)
    }

    fn wrap(&self, node: Node<'a>) -> Self {
        Self::new(node, self.source)
    }

    fn text(&self, node: Node<'a>) -> String {
        node.utf8_text(self.source).unwrap_or("").to_string()
    }

    fn field(&self, name: &str) -> Option<Self> {
        self.node.child_by_field_name(name).map(|n| self.wrap(n))
    }
}

impl<'a> SyntaxNode for PyNode<'a> {
    fn id(&self) -> usize {
        self.node.id()
    }

    fn kind(&self) -> NodeKind {
        match self.node.kind() {
            "function_definition" | "lambda" => NodeKind::Declaration(ScopeKind::Function),
            "class_definition" => NodeKind::Declaration(ScopeKind::Class),
            "call" => NodeKind::Call,
            _ => NodeKind::Other,
        }
    }

    fn name(&self) -> Option<String> {
        match self.node.kind() {
            "function_definition" | "class_definition" => self
                .node
                .child_by_field_name("name")
                .map(|n| self.text(n)),
            _ => None,
        }
    }

    fn line(&self) -> usize {
        self.node.start_position().row + 1
    }

    fn children(&self) -> Vec<Self> {
        let mut cursor = self.node.walk();
        self.node
            .named_children(&mut cursor)
            .map(|n| self.wrap(n))
            .collect()
    }

    fn call_function(&self) -> Option<Self> {
        if self.node.kind() != "call" {
            return None;
        }
        self.field("function")
    }

    fn expr(&self) -> Expr<Self> {
        match self.node.kind() {
            "identifier" => Expr::Name(self.text(self.node)),
            "attribute" => {
                let object = self.field("object");
                let attr = self.node.child_by_field_name("attribute");
                match (object, attr) {
                    (Some(object), Some(attr)) => Expr::Attribute {
                        object,
                        attr: self.text(attr),
                    },
                    _ => Expr::Other,
                }
            }
            "call" => match self.field("function") {
                Some(function) => Expr::Call { function },
                None => Expr::Other,
            },
            "parenthesized_expression" => {
                let mut cursor = self.node.walk();
                let inner: Vec<_> = self
                    .node
                    .named_children(&mut cursor)
                    .filter(|n| n.kind() != "comment")
                    .collect();
                match inner.as_slice() {
                    [only] => Expr::Group(self.wrap(*only)),
                    _ => Expr::Other,
                }
            }
            _ => Expr::Other,
        }
    }
}

pub struct PythonAnalyzer {
    language: Language,
}

impl PythonAnalyzer {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
        }
    }

    fn create_parser(&self) -> Result<Parser, AnalysisError> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;
        Ok(parser)
    }

    fn extract_entities(&self, parsed: &ParsedFile) -> Result<Vec<Entity>, AnalysisError> {
        let query = Query::new(&self.language, DECLARATION_QUERY)?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, parsed.tree.root_node(), &parsed.source[..]);

        let mut entities = Vec::new();

        while let Some(m) = matches.next() {
            let mut name = String::new();
            let mut is_class = false;
            let mut decl_node = None;

            for capture in m.captures {
                let capture_name = query.capture_names()[capture.index as usize];
                match capture_name {
                    "func_name" => {
                        name = parsed.node_text(capture.node).to_string();
                    }
                    "class_name" => {
                        name = parsed.node_text(capture.node).to_string();
                        is_class = true;
                    }
                    "function" | "class" => {
                        decl_node = Some(capture.node);
                    }
                    _ => {}
                }
            }

            if name.is_empty() {
                continue;
            }
            if let Some(node) = decl_node {
                entities.push(self.build_entity(parsed, node, name, is_class));
            }
        }

        entities.sort_by_key(|e| (e.span.start_byte, e.qualified_name.clone()));
        Ok(entities)
    }

    fn build_entity(&self, parsed: &ParsedFile, node: Node, name: String, is_class: bool) -> Entity {
        let enclosing = enclosing_declarations(parsed, node);

        let kind = if is_class {
            EntityKind::Class
        } else if enclosing.last().map(|(_, k)| *k) == Some(ScopeKind::Class) {
            EntityKind::Method
        } else {
            EntityKind::Function
        };

        let mut path: Vec<String> = enclosing.into_iter().map(|(n, _)| n).collect();
        path.push(name.clone());

        let body = node.child_by_field_name("body");

        Entity {
            kind,
            name,
            qualified_name: path.join("."),
            line: node.start_position().row + 1,
            end_line: node.end_position().row + 1,
            is_async: !is_class && node.child(0).map(|c| c.kind() == "async").unwrap_or(false),
            decorators: decorators(parsed, node),
            bases: if is_class { class_bases(parsed, node) } else { Vec::new() },
            method_count: if is_class { body.map(count_methods) } else { None },
            docstring: body.and_then(|b| docstring(parsed, b)),
            span: Span::from_node(node),
        }
    }

    fn extract_imports(&self, parsed: &ParsedFile) -> Result<Vec<Import>, AnalysisError> {
        let query = Query::new(&self.language, IMPORT_QUERY)?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, parsed.tree.root_node(), &parsed.source[..]);

        let mut imports = Vec::new();

        while let Some(m) = matches.next() {
            for capture in m.captures {
                let node = capture.node;
                let line = node.start_position().row + 1;
                match query.capture_names()[capture.index as usize] {
                    "import" => {
                        for (module, alias) in imported_names(parsed, node) {
                            imports.push(Import {
                                kind: ImportKind::Import,
                                module,
                                name: None,
                                alias,
                                line,
                            });
                        }
                    }
                    "import_from" | "import_future" => {
                        let module = match node.child_by_field_name("module_name") {
                            Some(m) => parsed.node_text(m).to_string(),
                            None => "__future__".to_string(),
                        };

                        let mut names = imported_names(parsed, node);
                        if has_wildcard(node) {
                            names.push(("*".to_string(), None));
                        }

                        for (name, alias) in names {
                            imports.push(Import {
                                kind: ImportKind::FromImport,
                                module: module.clone(),
                                name: Some(name),
                                alias,
                                line,
                            });
                        }
                    }
                    _ => {}
                }
            }
        }

        imports.sort_by_key(|i| i.line);
        Ok(imports)
    }
}

impl Default for PythonAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for PythonAnalyzer {
    fn language_id(&self) -> &'static str {
        "python"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["py"]
    }

    fn parse(&self, path: &Path, source: &[u8]) -> Result<ParsedFile, AnalysisError> {
        let mut parser = self.create_parser()?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| AnalysisError::Parse(path.display().to_string()))?;

        Ok(ParsedFile {
            tree,
            source: source.to_vec(),
            path: path.to_string_lossy().to_string(),
        })
    }

    fn extract_facts(&self, parsed: &ParsedFile) -> Result<FileFacts, AnalysisError> {
        Ok(FileFacts {
            path: parsed.path.clone(),
            language: self.language_id().to_string(),
            entities: self.extract_entities(parsed)?,
            imports: self.extract_imports(parsed)?,
            has_parse_errors: parsed.has_errors(),
        })
    }

    fn extract_calls(&self, parsed: &ParsedFile) -> Result<Vec<CallRecord>, AnalysisError> {
        Ok(relationships::extract_calls(&PyNode::root(parsed))?)
    }
}

/// Names (and kinds) of the declarations enclosing `node`, outermost first.
///
/// Lambdas are named the same way the scope tracker names them, so entity
/// qualified names line up with call-record callers.
fn enclosing_declarations(parsed: &ParsedFile, node: Node) -> Vec<(String, ScopeKind)> {
    let mut path = Vec::new();
    let mut current = node.parent();

    while let Some(ancestor) = current {
        let line = ancestor.start_position().row + 1;
        match ancestor.kind() {
            "function_definition" | "class_definition" => {
                let kind = if ancestor.kind() == "class_definition" {
                    ScopeKind::Class
                } else {
                    ScopeKind::Function
                };
                let name = ancestor
                    .child_by_field_name("name")
                    .map(|n| parsed.node_text(n).to_string())
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| anonymous_name(line));
                path.push((name, kind));
            }
            "lambda" => path.push((anonymous_name(line), ScopeKind::Function)),
            _ => {}
        }
        current = ancestor.parent();
    }

    path.reverse();
    path
}

fn decorators(parsed: &ParsedFile, node: Node) -> Vec<String> {
    let Some(parent) = node.parent().filter(|p| p.kind() == "decorated_definition") else {
        return Vec::new();
    };

    let mut cursor = parent.walk();
    parent
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "decorator")
        .map(|c| {
            let text = parsed.node_text(c).trim();
            text.strip_prefix('@').unwrap_or(text).trim().to_string()
        })
        .collect()
}

fn class_bases(parsed: &ParsedFile, node: Node) -> Vec<String> {
    let Some(args) = node.child_by_field_name("superclasses") else {
        return Vec::new();
    };

    let mut cursor = args.walk();
    args.named_children(&mut cursor)
        .filter(|c| !matches!(c.kind(), "keyword_argument" | "comment"))
        .map(|c| parsed.node_text(c).to_string())
        .collect()
}

fn count_methods(body: Node) -> usize {
    let mut cursor = body.walk();
    body.named_children(&mut cursor)
        .filter(|stmt| match stmt.kind() {
            "function_definition" => true,
            "decorated_definition" => stmt
                .child_by_field_name("definition")
                .map(|d| d.kind() == "function_definition")
                .unwrap_or(false),
            _ => false,
        })
        .count()
}

fn docstring(parsed: &ParsedFile, body: Node) -> Option<String> {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|n| n.kind() != "comment")?;

    if first.kind() != "expression_statement" {
        return None;
    }
    let literal = first.named_child(0).filter(|n| n.kind() == "string")?;
    let text = strip_string_literal(parsed.node_text(literal));
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Remove prefix letters and quotes from a Python string literal.
fn strip_string_literal(text: &str) -> String {
    let body = text.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(inner) = body.strip_prefix(quote).and_then(|s| s.strip_suffix(quote)) {
            return inner.trim().to_string();
        }
    }
    body.trim().to_string()
}

/// `(name, alias)` pairs from the `name` fields of an import statement.
fn imported_names(parsed: &ParsedFile, node: Node) -> Vec<(String, Option<String>)> {
    let mut cursor = node.walk();
    node.children_by_field_name("name", &mut cursor)
        .filter_map(|n| match n.kind() {
            "aliased_import" => {
                let name = n.child_by_field_name("name")?;
                let alias = n
                    .child_by_field_name("alias")
                    .map(|a| parsed.node_text(a).to_string());
                Some((parsed.node_text(name).to_string(), alias))
            }
            _ => Some((parsed.node_text(n).to_string(), None)),
        })
        .collect()
}

fn has_wildcard(node: Node) -> bool {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .any(|c| c.kind() == "wildcard_import");
    found
}
