//! Python frontend
//!
//! tree-sitter-python produces the syntax tree; the [`WorldVisitor`] turns it
//! into a scoped graph and the linker resolves its call sites.

pub mod python;
pub mod visitor;

pub use python::{Diagnostic, PythonParser};
pub use visitor::{Slot, WorldVisitor};

use crate::Result;
use crate::graph::Graph;
use crate::id::WorldId;
use crate::linker;

/// Build the unlinked graph of a module.
///
/// Source with a syntax error yields an empty graph and the diagnostic of
/// the first error.
pub fn build_graph(source: &str) -> Result<(Graph, Option<Diagnostic>)> {
    let mut parser = PythonParser::new()?;
    let tree = match parser.parse_checked(source)? {
        Ok(tree) => tree,
        Err(diagnostic) => return Ok((Graph::new(), Some(diagnostic))),
    };

    let mut visitor = WorldVisitor::new(source);
    visitor.visit_module(tree.root_node(), &WorldId::Root);
    Ok((visitor.finish(), None))
}

/// Full-file parse: build the graph, then link its calls
pub fn parse(source: &str) -> Result<(Graph, Option<Diagnostic>)> {
    let (mut graph, diagnostic) = build_graph(source)?;
    if diagnostic.is_none() {
        linker::link(&mut graph);
    }
    Ok((graph, diagnostic))
}
