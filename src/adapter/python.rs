//! Python grammar plumbing
//!
//! Wraps tree-sitter-python: builds a parser, reports the first syntax error
//! as a [`Diagnostic`], and offers the small text/children helpers the
//! visitor needs.

use crate::{Error, Result};
use tree_sitter::{Node, Parser, Tree};

/// Position-tagged parse failure. Line and column are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (line {line}, column {column})")]
pub struct Diagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self { message: message.into(), line, column }
    }

    fn at(node: Node, message: String) -> Self {
        let pos = node.start_position();
        Self::new(message, pos.row + 1, pos.column + 1)
    }
}

/// Python source parser
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    /// Create a parser loaded with the Python grammar
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| Error::Adapter(format!("Failed to set language: {}", e)))?;
        Ok(Self { parser })
    }

    /// Parse source into a syntax tree. Syntax errors still yield a tree.
    pub fn parse(&mut self, source: &str) -> Result<Tree> {
        self.parser
            .parse(source, None)
            .ok_or_else(|| Error::Adapter("Failed to parse source".to_string()))
    }

    /// Parse and reject source with syntax errors
    pub fn parse_checked(&mut self, source: &str) -> Result<std::result::Result<Tree, Diagnostic>> {
        let tree = self.parse(source)?;
        Ok(match syntax_diagnostic(&tree, source) {
            Some(diagnostic) => Err(diagnostic),
            None => Ok(tree),
        })
    }
}

/// Report the first `ERROR` or `MISSING` node in document order
pub fn syntax_diagnostic(tree: &Tree, source: &str) -> Option<Diagnostic> {
    let node = first_error(tree.root_node())?;
    let message = if node.is_missing() {
        format!("missing `{}`", node.kind())
    } else {
        let snippet: String = text(node, source).lines().next().unwrap_or("").chars().take(40).collect();
        if snippet.trim().is_empty() {
            "invalid syntax".to_string()
        } else {
            format!("invalid syntax near `{}`", snippet.trim())
        }
    };
    Some(Diagnostic::at(node, message))
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    None
}

/// Source text of a node
pub fn text<'s>(node: Node, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Named children, comments excluded
pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// All children stored under one field name
pub fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

/// Strip any number of enclosing parentheses
pub fn unwrap_parens(mut node: Node) -> Node {
    while node.kind() == "parenthesized_expression" {
        match named_children(node).first() {
            Some(inner) => node = *inner,
            None => break,
        }
    }
    node
}
