//! World Graph - the persisted, editable program representation
//!
//! The graph is an arena: two flat, ordered collections keyed by id. Node
//! order is construction order, which the synthesizer relies on to emit
//! statements in their original sequence.

use std::collections::{BTreeMap, HashMap};
use serde::{Deserialize, Serialize};
use crate::edge::{Edge, EdgeKind};
use crate::id::{NodeId, WorldId};
use crate::node::{Node, NodeKind};

/// Scoped dataflow graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node, returning its id
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }

    /// Add an edge unless an identical one exists.
    ///
    /// Returns `true` if the edge was inserted.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        if self.edges.contains(&edge) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    /// Remove a node and every edge touching it
    pub fn remove_node(&mut self, id: &NodeId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| &n.id != id);
        self.edges.retain(|e| !e.touches(id));
        self.nodes.len() != before
    }

    /// Remove edges between two nodes, optionally only those of one kind
    pub fn remove_edges(&mut self, source: &NodeId, target: &NodeId, kind: Option<&EdgeKind>) -> usize {
        let before = self.edges.len();
        self.edges.retain(|e| {
            !(&e.source == source && &e.target == target && kind.is_none_or(|k| &e.kind == k))
        });
        before - self.edges.len()
    }

    /// Get a node by id
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| &n.id == id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Check that a world exists: sentinels always do, nested worlds
    /// exist while their owning node does
    pub fn has_world(&self, world: &WorldId) -> bool {
        match world {
            WorldId::Root | WorldId::Imports => true,
            WorldId::Node(id) => self.node(id).is_some_and(|n| n.kind().owns_world()),
        }
    }

    /// Nodes of one world, in construction order
    pub fn nodes_in_world<'a>(&'a self, world: &WorldId) -> impl Iterator<Item = &'a Node> + use<'a> {
        let world = world.clone();
        self.nodes.iter().filter(move |n| n.world == world)
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.kind() == kind)
    }

    /// Distinct worlds in use, in order of first appearance
    pub fn worlds(&self) -> Vec<WorldId> {
        let mut seen = Vec::new();
        for node in &self.nodes {
            if !seen.contains(&node.world) {
                seen.push(node.world.clone());
            }
        }
        seen
    }

    /// Incoming edges of a node
    pub fn edges_to<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| &e.target == id)
    }

    /// Outgoing edges of a node
    pub fn edges_from<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| &e.source == id)
    }

    /// Incoming edges accepted by a filter
    pub fn edges_to_by<'a, F>(&'a self, id: &'a NodeId, filter: F) -> Vec<&'a Edge>
    where
        F: Fn(&EdgeKind) -> bool + 'a,
    {
        self.edges_to(id).filter(|e| filter(&e.kind)).collect()
    }

    /// Every edge touching a node, paired with the node on the other end
    pub fn neighbors<'a>(&'a self, id: &'a NodeId) -> Vec<(&'a Edge, Option<&'a Node>)> {
        self.edges
            .iter()
            .filter(|e| e.touches(id))
            .map(|e| {
                let other = if &e.source == id { &e.target } else { &e.source };
                (e, self.node(other))
            })
            .collect()
    }

    /// Get statistics about the graph
    pub fn stats(&self) -> GraphStats {
        let mut by_kind = BTreeMap::new();
        for node in &self.nodes {
            *by_kind.entry(node.kind()).or_insert(0) += 1;
        }

        GraphStats {
            total_nodes: self.nodes.len(),
            total_edges: self.edges.len(),
            worlds: self.worlds().len(),
            by_kind,
        }
    }
}

/// Borrowed lookup tables over a graph, for read-heavy passes.
///
/// Edge lists keep the graph's edge order.
pub struct GraphIndex<'g> {
    nodes: HashMap<&'g NodeId, &'g Node>,
    incoming: HashMap<&'g NodeId, Vec<&'g Edge>>,
    outgoing: HashMap<&'g NodeId, Vec<&'g Edge>>,
}

impl<'g> GraphIndex<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        let mut incoming: HashMap<&NodeId, Vec<&Edge>> = HashMap::new();
        let mut outgoing: HashMap<&NodeId, Vec<&Edge>> = HashMap::new();
        for edge in &graph.edges {
            incoming.entry(&edge.target).or_default().push(edge);
            outgoing.entry(&edge.source).or_default().push(edge);
        }

        Self {
            nodes: graph.nodes.iter().map(|n| (&n.id, n)).collect(),
            incoming,
            outgoing,
        }
    }

    pub fn node(&self, id: &NodeId) -> Option<&'g Node> {
        self.nodes.get(id).copied()
    }

    pub fn incoming(&self, id: &NodeId) -> &[&'g Edge] {
        self.incoming.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn outgoing(&self, id: &NodeId) -> &[&'g Edge] {
        self.outgoing.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// First incoming edge accepted by the filter, as its source node id
    pub fn input<F>(&self, id: &NodeId, filter: F) -> Option<&'g NodeId>
    where
        F: Fn(&EdgeKind) -> bool,
    {
        self.incoming(id)
            .iter()
            .copied()
            .find(|e| filter(&e.kind))
            .map(|e| &e.source)
    }
}

/// Statistics about a graph
#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub worlds: usize,
    pub by_kind: BTreeMap<NodeKind, usize>,
}

impl std::fmt::Display for GraphStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "World Graph Statistics:")?;
        writeln!(f, "  Nodes: {}", self.total_nodes)?;
        writeln!(f, "  Edges: {}", self.total_edges)?;
        writeln!(f, "  Worlds: {}", self.worlds)?;
        for (kind, count) in &self.by_kind {
            writeln!(f, "    {}: {}", kind, count)?;
        }
        Ok(())
    }
}
