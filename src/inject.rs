//! Merge/injection - parse a snippet into an existing world
//!
//! The snippet is parsed into a transient graph by a visitor whose symbol
//! table has been replayed from the base graph along the path from the root
//! to the target world, so reads in the snippet bind to existing variables.
//! The base graph is only read: a successful injection returns a new graph,
//! a failed one returns an error and leaves nothing changed.

use std::collections::HashSet;
use tracing::info;
use crate::{Error, Result};
use crate::adapter::{PythonParser, WorldVisitor};
use crate::graph::Graph;
use crate::id::{NodeId, WorldId};
use crate::linker::CallLinker;
use crate::node::{NodeData, NodeKind, VariableMode};
use crate::scope::{ProxyCache, SymbolTable, WorldTree};

/// Parse `snippet` into `target` of `base`.
///
/// Returns the merged graph and the number of nodes added.
pub fn inject(base: &Graph, snippet: &str, target: &WorldId) -> Result<(Graph, usize)> {
    if !base.has_world(target) || *target == WorldId::Imports {
        return Err(Error::NodeNotFound(format!("world {}", target)));
    }

    let mut parser = PythonParser::new()?;
    let tree = parser.parse_checked(snippet)?.map_err(Error::Syntax)?;

    let mut visitor = WorldVisitor::with_state(snippet, replay_symbols(base, target), seed_proxies(base));
    visitor.visit_module(tree.root_node(), target);
    let transient = visitor.finish();

    let added = transient.nodes.len();
    let new_calls: HashSet<NodeId> = transient
        .nodes_of_kind(NodeKind::Call)
        .map(|n| n.id.clone())
        .collect();

    let mut merged = base.clone();
    merged.nodes.extend(transient.nodes);
    for edge in transient.edges {
        merged.add_edge(edge);
    }
    CallLinker::new(&merged).run_on(&mut merged, &new_calls);

    info!("Injected {} nodes into world {}", added, target);
    Ok((merged, added))
}

/// Rebuild the symbol scopes from the root down to `target`.
///
/// Every Variable and definition of each world on the path is replayed as a
/// write, in construction order; import bindings land in the root scope.
fn replay_symbols(base: &Graph, target: &WorldId) -> SymbolTable {
    let mut symbols = SymbolTable::new();

    for world in WorldTree::from_graph(base).path_from_root(target) {
        if !world.is_root() {
            symbols.push_scope();
        }

        let replayed = base
            .nodes
            .iter()
            .filter(|n| n.world == world || (world.is_root() && n.world == WorldId::Imports));
        for node in replayed {
            match &node.data {
                NodeData::Import { bindings } => {
                    for name in bindings {
                        symbols.define_write(name, node.id.clone(), WorldId::Imports);
                    }
                }
                NodeData::Variable(_) | NodeData::FunctionDef { .. } | NodeData::ClassDef { .. } => {
                    symbols.define_write(&node.label, node.id.clone(), world.clone());
                }
                _ => {}
            }
        }
    }
    symbols
}

/// Existing closure proxies, so the snippet reuses them
fn seed_proxies(base: &Graph) -> ProxyCache {
    let mut proxies = ProxyCache::new();
    for node in &base.nodes {
        if let Some(var) = node.variable() {
            if let VariableMode::ClosureRead { origin, .. } = &var.mode {
                proxies.insert(node.world.clone(), origin.clone(), node.id.clone());
            }
        }
    }
    proxies
}
