//! World hierarchy and definitions registry
//!
//! Parentage between worlds is never persisted. It is rebuilt on demand by
//! scanning scope-owning nodes: the parent of world `n` is the world node
//! `n` itself lives in.

use std::collections::HashMap;
use crate::graph::Graph;
use crate::id::{NodeId, WorldId};

/// Child → parent map over worlds
#[derive(Debug, Default, Clone)]
pub struct WorldTree {
    parents: HashMap<WorldId, WorldId>,
}

impl WorldTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the tree from the scope-owning nodes of a graph
    pub fn from_graph(graph: &Graph) -> Self {
        let mut tree = Self::new();
        for node in &graph.nodes {
            if let Some(world) = node.own_world() {
                tree.add_world(world, node.world.clone());
            }
        }
        tree
    }

    pub fn add_world(&mut self, world: WorldId, parent: WorldId) {
        self.parents.insert(world, parent);
    }

    /// Get the parent of a world
    pub fn parent(&self, world: &WorldId) -> Option<&WorldId> {
        self.parents.get(world)
    }

    pub fn contains(&self, world: &WorldId) -> bool {
        matches!(world, WorldId::Root | WorldId::Imports) || self.parents.contains_key(world)
    }

    /// Get world chain from a world up to root
    pub fn chain(&self, world: &WorldId) -> Vec<WorldId> {
        let mut chain = vec![world.clone()];
        let mut current = world;
        while let Some(parent) = self.parent(current) {
            // a malformed graph may contain a cycle
            if chain.contains(parent) {
                break;
            }
            chain.push(parent.clone());
            current = parent;
        }
        chain
    }

    /// Worlds from the root down to `world`, inclusive
    pub fn path_from_root(&self, world: &WorldId) -> Vec<WorldId> {
        let mut chain = self.chain(world);
        chain.reverse();
        chain
    }
}

/// Function and class definitions by `(defining world, name)`
///
/// A later definition of the same name in the same world replaces the
/// earlier one.
#[derive(Debug, Default, Clone)]
pub struct Definitions {
    definitions: HashMap<(WorldId, String), NodeId>,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every def node of a graph, in construction order
    pub fn from_graph(graph: &Graph) -> Self {
        let mut defs = Self::new();
        for node in &graph.nodes {
            if node.kind().is_definition() {
                defs.define(node.world.clone(), node.label.clone(), node.id.clone());
            }
        }
        defs
    }

    /// Add a definition to a world
    pub fn define(&mut self, world: WorldId, name: impl Into<String>, def: NodeId) {
        self.definitions.insert((world, name.into()), def);
    }

    /// Look up a definition in a world (not walking parents)
    pub fn lookup_local(&self, world: &WorldId, name: &str) -> Option<&NodeId> {
        self.definitions.get(&(world.clone(), name.to_string()))
    }

    /// Look up a definition walking up the world chain; innermost wins
    pub fn lookup(&self, tree: &WorldTree, world: &WorldId, name: &str) -> Option<&NodeId> {
        tree.chain(world)
            .iter()
            .find_map(|w| self.lookup_local(w, name))
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, NodeData};

    fn world(s: &str) -> WorldId {
        WorldId::Node(NodeId::from(s))
    }

    #[test]
    fn test_world_chain() {
        let mut tree = WorldTree::new();
        tree.add_world(world("f"), WorldId::Root);
        tree.add_world(world("if"), world("f"));
        tree.add_world(world("for"), world("if"));

        assert_eq!(
            tree.chain(&world("for")),
            vec![world("for"), world("if"), world("f"), WorldId::Root]
        );
        assert_eq!(tree.path_from_root(&world("if")), vec![WorldId::Root, world("f"), world("if")]);
        assert_eq!(tree.parent(&WorldId::Root), None);
    }

    #[test]
    fn test_tree_from_graph() {
        let mut graph = Graph::new();
        let f = graph.add_node(Node::new(NodeData::FunctionDef { params: vec![] }, "f", WorldId::Root));
        let block = graph.add_node(Node::new(NodeData::WhileBlock, "while x", WorldId::Node(f.clone())));

        let tree = WorldTree::from_graph(&graph);
        assert_eq!(tree.parent(&WorldId::Node(block)), Some(&WorldId::Node(f)));
        assert!(tree.contains(&WorldId::Imports));
    }

    #[test]
    fn test_innermost_definition_wins() {
        let mut tree = WorldTree::new();
        tree.add_world(world("outer"), WorldId::Root);
        tree.add_world(world("inner"), world("outer"));

        let mut defs = Definitions::new();
        defs.define(WorldId::Root, "helper", NodeId::from("root_helper"));
        defs.define(world("outer"), "helper", NodeId::from("outer_helper"));

        assert_eq!(
            defs.lookup(&tree, &world("inner"), "helper"),
            Some(&NodeId::from("outer_helper"))
        );
        assert_eq!(
            defs.lookup(&tree, &WorldId::Root, "helper"),
            Some(&NodeId::from("root_helper"))
        );
        assert!(defs.lookup(&tree, &world("inner"), "missing").is_none());
    }

    #[test]
    fn test_later_definition_replaces_earlier() {
        let mut graph = Graph::new();
        graph.add_node(Node::new(NodeData::FunctionDef { params: vec![] }, "f", WorldId::Root));
        let second = graph.add_node(Node::new(NodeData::FunctionDef { params: vec![] }, "f", WorldId::Root));

        let defs = Definitions::from_graph(&graph);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs.lookup_local(&WorldId::Root, "f"), Some(&second));
    }
}
