//! Editor mutation helpers
//!
//! Each helper takes the whole graph by value and hands it back. A command
//! naming an unknown node, or a node of the wrong kind, returns the graph
//! unchanged; stale ids from an editor are expected and only logged.

use tracing::debug;
use crate::edge::{Edge, EdgeKind};
use crate::graph::Graph;
use crate::id::{NodeId, WorldId};
use crate::node::{positional_slot, Node, NodeData, NodeKind};

/// Create a bare node of `kind` in an existing world
pub fn add_node(mut graph: Graph, kind: NodeKind, label: &str, world: &WorldId) -> (Graph, Option<NodeId>) {
    if !graph.has_world(world) {
        debug!("add_node: unknown world {}", world);
        return (graph, None);
    }
    let id = graph.add_node(Node::new(kind.default_data(), label, world.clone()));
    (graph, Some(id))
}

/// Remove nodes and every edge touching them
pub fn remove_nodes(mut graph: Graph, ids: &[NodeId]) -> Graph {
    for id in ids {
        if !graph.remove_node(id) {
            debug!("remove_nodes: unknown node {}", id);
        }
    }
    graph
}

/// Replace the text of a Literal node
pub fn update_node_literal(mut graph: Graph, id: &NodeId, text: &str) -> Graph {
    match graph.node_mut(id) {
        Some(node) if node.kind() == NodeKind::Literal => node.label = text.to_string(),
        _ => debug!("update_node_literal: {} is not a literal", id),
    }
    graph
}

/// Add an edge between existing nodes; a duplicate is ignored
pub fn add_edge(mut graph: Graph, source: &NodeId, target: &NodeId, kind: EdgeKind) -> Graph {
    if !graph.contains(source) || !graph.contains(target) {
        debug!("add_edge: unknown endpoint {} -> {}", source, target);
        return graph;
    }
    graph.add_edge(Edge::new(source.clone(), target.clone(), kind));
    graph
}

/// Remove edges between two nodes, optionally only those of one kind
pub fn remove_edge(mut graph: Graph, source: &NodeId, target: &NodeId, kind: Option<&EdgeKind>) -> Graph {
    if graph.remove_edges(source, target, kind) == 0 {
        debug!("remove_edge: no edge {} -> {}", source, target);
    }
    graph
}

/// Override the source text bound to a named parameter of a call
pub fn set_param_value(mut graph: Graph, call: &NodeId, param: &str, text: &str) -> Graph {
    match graph.node_mut(call).and_then(|n| n.call_mut()) {
        Some(site) => {
            site.overrides.insert(param.to_string(), text.to_string());
        }
        None => debug!("set_param_value: {} is not a call", call),
    }
    graph
}

/// Set the literal wired into a call's port.
///
/// The port is a parameter name. An existing literal on that port is
/// updated in place; otherwise a new Literal is created in the call's world
/// and wired as a keyword argument, replacing any non-literal input.
/// Surrounding quotes are dropped; the synthesizer re-quotes the text.
pub fn set_port_literal(mut graph: Graph, call: &NodeId, port: &str, value: &str) -> Graph {
    let Some(node) = graph.node(call).filter(|n| n.kind() == NodeKind::Call) else {
        debug!("set_port_literal: {} is not a call", call);
        return graph;
    };
    let world = node.world.clone();
    let position = positional_slot(node.params(), port);
    let text = unquote(value);

    let existing = graph
        .edges_to(call)
        .find(|e| match &e.kind {
            EdgeKind::Argument { keyword: Some(k), .. } => k == port,
            EdgeKind::Argument { index: Some(i), keyword: None } => Some(*i) == position,
            _ => false,
        })
        .cloned();

    if let Some(edge) = &existing {
        if let Some(literal) = graph.node_mut(&edge.source).filter(|n| n.kind() == NodeKind::Literal) {
            literal.label = text.to_string();
            return graph;
        }
        graph.remove_edges(&edge.source, call, Some(&edge.kind));
    }

    let kind = existing.map_or_else(|| EdgeKind::keyword(port), |e| e.kind);
    let literal = graph.add_node(Node::new(NodeData::Literal, text, world));
    graph.add_edge(Edge::new(literal, call.clone(), kind));
    graph
}

fn unquote(value: &str) -> &str {
    let trimmed = value.trim();
    let quoted = trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')));
    if quoted { &trimmed[1..trimmed.len() - 1] } else { trimmed }
}

/// Next free index among a node's incoming edges of one family
fn next_index<F>(graph: &Graph, target: &NodeId, index_of: F) -> usize
where
    F: Fn(&EdgeKind) -> Option<usize>,
{
    graph
        .edges_to(target)
        .filter_map(|e| index_of(&e.kind))
        .max()
        .map_or(0, |max| max + 1)
}

/// Source of the incoming edge of `kind`, if it is a Literal
fn literal_source(graph: &Graph, target: &NodeId, kind: &EdgeKind) -> Option<NodeId> {
    graph
        .edges_to(target)
        .find(|e| &e.kind == kind)
        .map(|e| e.source.clone())
        .filter(|source| graph.node(source).is_some_and(|n| n.kind() == NodeKind::Literal))
}

fn world_of(graph: &Graph, id: &NodeId, kind: NodeKind) -> Option<WorldId> {
    graph.node(id).filter(|n| n.kind() == kind).map(|n| n.world.clone())
}

/// Append a literal element to a list constructor
pub fn add_list_item(mut graph: Graph, list: &NodeId, value: &str) -> Graph {
    let Some(world) = world_of(&graph, list, NodeKind::ListConstructor) else {
        debug!("add_list_item: {} is not a list", list);
        return graph;
    };
    let index = next_index(&graph, list, |k| match k {
        EdgeKind::ListElement { index } => Some(*index),
        _ => None,
    });
    let item = graph.add_node(Node::new(NodeData::Literal, value, world));
    graph.add_edge(Edge::new(item, list.clone(), EdgeKind::ListElement { index }));
    graph
}

/// Replace the literal element at `index`
pub fn update_list_item(graph: Graph, list: &NodeId, index: usize, value: &str) -> Graph {
    match literal_source(&graph, list, &EdgeKind::ListElement { index }) {
        Some(item) => update_node_literal(graph, &item, value),
        None => {
            debug!("update_list_item: no literal at {}[{}]", list, index);
            graph
        }
    }
}

/// Append a literal key/value pair to a dict constructor
pub fn add_dict_pair(mut graph: Graph, dict: &NodeId, key: &str, value: &str) -> Graph {
    let Some(world) = world_of(&graph, dict, NodeKind::DictConstructor) else {
        debug!("add_dict_pair: {} is not a dict", dict);
        return graph;
    };
    let index = next_index(&graph, dict, |k| match k {
        EdgeKind::DictKey { index } | EdgeKind::DictValue { index } => Some(*index),
        _ => None,
    });
    let key = graph.add_node(Node::new(NodeData::Literal, key, world.clone()));
    let value = graph.add_node(Node::new(NodeData::Literal, value, world));
    graph.add_edge(Edge::new(key, dict.clone(), EdgeKind::DictKey { index }));
    graph.add_edge(Edge::new(value, dict.clone(), EdgeKind::DictValue { index }));
    graph
}

/// Replace the key and/or value literal of the pair at `index`
pub fn update_dict_pair(mut graph: Graph, dict: &NodeId, index: usize, key: Option<&str>, value: Option<&str>) -> Graph {
    if let Some(text) = key {
        match literal_source(&graph, dict, &EdgeKind::DictKey { index }) {
            Some(id) => graph = update_node_literal(graph, &id, text),
            None => debug!("update_dict_pair: no literal key at {}[{}]", dict, index),
        }
    }
    if let Some(text) = value {
        match literal_source(&graph, dict, &EdgeKind::DictValue { index }) {
            Some(id) => graph = update_node_literal(graph, &id, text),
            None => debug!("update_dict_pair: no literal value at {}[{}]", dict, index),
        }
    }
    graph
}
