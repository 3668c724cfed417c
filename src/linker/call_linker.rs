//! Call linker - binds call sites to their lexical definitions
//!
//! Two steps over the Call nodes of a graph:
//! 1. Linking: walk from the call's world up through its ancestors and take
//!    the first `(world, name)` definition found. The call records the
//!    definition as its `target_world` and copies its parameter list.
//! 2. Hydration: calls still without a target or parameters get a
//!    best-effort parameter list inferred from their wired arguments.

use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info};
use crate::edge::EdgeKind;
use crate::graph::Graph;
use crate::id::{NodeId, WorldId};
use crate::node::{NodeKind, Param};
use crate::scope::{Definitions, WorldTree};

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct LinkStats {
    pub total: usize,
    pub linked: usize,
    pub hydrated: usize,
    pub methods: usize,
    pub external: usize,
}

impl fmt::Display for LinkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Call Linker Stats:")?;
        writeln!(f, "  Total Calls: {}", self.total)?;
        writeln!(f, "  ✅ Linked: {}", self.linked)?;
        writeln!(f, "  💧 Hydrated: {}", self.hydrated)?;
        writeln!(f, "  🔗 Methods: {}", self.methods)?;
        writeln!(f, "  🌍 External: {}", self.external)
    }
}

/// Linker over a snapshot of a graph's worlds and definitions
pub struct CallLinker {
    definitions: Definitions,
    worlds: WorldTree,
}

impl CallLinker {
    /// Snapshot the world tree and definitions of `graph`
    pub fn new(graph: &Graph) -> Self {
        Self {
            definitions: Definitions::from_graph(graph),
            worlds: WorldTree::from_graph(graph),
        }
    }

    /// Link every call of the graph
    pub fn run(&self, graph: &mut Graph) -> LinkStats {
        let calls: HashSet<NodeId> = graph.nodes_of_kind(NodeKind::Call).map(|n| n.id.clone()).collect();
        self.run_on(graph, &calls)
    }

    /// Link only the given calls
    pub fn run_on(&self, graph: &mut Graph, calls: &HashSet<NodeId>) -> LinkStats {
        let mut stats = LinkStats {
            total: calls.len(),
            ..LinkStats::default()
        };

        // resolve against the unmodified graph, then apply
        let mut links = Vec::new();
        for node in graph.nodes.iter().filter(|n| calls.contains(&n.id)) {
            let Some(site) = node.call() else { continue };
            if site.is_method {
                stats.methods += 1;
                continue;
            }
            let Some(def_id) = self.definitions.lookup(&self.worlds, &node.world, &node.label) else {
                continue;
            };
            let params = graph.node(def_id).map(|d| d.params().to_vec()).unwrap_or_default();
            debug!("Linked call {} ({}) to {}", node.id, node.label, def_id);
            links.push((node.id.clone(), WorldId::Node(def_id.clone()), params));
        }

        for (call_id, target, params) in links {
            if let Some(site) = graph.node_mut(&call_id).and_then(|n| n.call_mut()) {
                site.target_world = Some(target);
                site.params = params;
                stats.linked += 1;
            }
        }

        for call_id in calls {
            if hydrate(graph, call_id) {
                stats.hydrated += 1;
            }
        }

        stats.external = stats.total - stats.linked - stats.methods;
        stats
    }
}

/// Infer parameters for an unresolved call from its `Argument` edges.
///
/// Positional parameters are dense (`arg0..argN`, gaps included) so that
/// their order matches argument indices; keyword names follow in edge order.
fn hydrate(graph: &mut Graph, call_id: &NodeId) -> bool {
    let needs_params = graph
        .node(call_id)
        .and_then(|n| n.call())
        .is_some_and(|site| site.target_world.is_none() && site.params.is_empty());
    if !needs_params {
        return false;
    }

    let mut max_index = None;
    let mut keywords = Vec::new();
    for edge in graph.edges_to(call_id) {
        if let EdgeKind::Argument { index, keyword } = &edge.kind {
            if let Some(i) = index {
                max_index = max_index.max(Some(*i));
            }
            if let Some(k) = keyword {
                if !keywords.contains(k) {
                    keywords.push(k.clone());
                }
            }
        }
    }

    let mut params: Vec<Param> = match max_index {
        Some(max) => (0..=max).map(|i| Param::required(format!("arg{}", i))).collect(),
        None => Vec::new(),
    };
    params.extend(keywords.into_iter().map(Param::required));
    if params.is_empty() {
        return false;
    }

    if let Some(site) = graph.node_mut(call_id).and_then(|n| n.call_mut()) {
        site.params = params;
        return true;
    }
    false
}

/// Link and hydrate every call of a graph
pub fn link(graph: &mut Graph) -> LinkStats {
    let stats = CallLinker::new(graph).run(graph);
    info!(
        "Linked {} of {} calls ({} hydrated, {} methods)",
        stats.linked, stats.total, stats.hydrated, stats.methods
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::build_graph;
    use crate::edge::Edge;
    use crate::node::{CallSite, Node, NodeData};

    fn built(source: &str) -> Graph {
        let (graph, diagnostic) = build_graph(source).unwrap();
        assert!(diagnostic.is_none());
        graph
    }

    fn calls<'g>(graph: &'g Graph, name: &str) -> Vec<&'g CallSite> {
        graph
            .nodes_of_kind(NodeKind::Call)
            .filter(|n| n.label == name)
            .filter_map(|n| n.call())
            .collect()
    }

    #[test]
    fn test_calls_link_to_definition() {
        let mut graph = built("def f(a):\n    return a * 2\nprint(f(3))\nprint(f(4))\n");
        let stats = link(&mut graph);

        let def = graph.nodes_of_kind(NodeKind::FunctionDef).next().unwrap().id.clone();
        let sites = calls(&graph, "f");
        assert_eq!(sites.len(), 2);
        for site in sites {
            assert_eq!(site.target_world, Some(WorldId::Node(def.clone())));
            assert_eq!(site.params, vec![Param::required("a")]);
        }
        assert_eq!(stats.linked, 2);
    }

    #[test]
    fn test_innermost_definition_wins() {
        let source = "def helper():\n    return 1\ndef outer():\n    def helper(x):\n        return x\n    return helper(2)\n";
        let mut graph = built(source);
        link(&mut graph);

        let inner_helper = graph
            .nodes_of_kind(NodeKind::FunctionDef)
            .filter(|n| n.label == "helper")
            .nth(1)
            .unwrap()
            .id
            .clone();
        let site = calls(&graph, "helper")[0];
        assert_eq!(site.target_world, Some(WorldId::Node(inner_helper)));
        assert_eq!(site.params.len(), 1);
    }

    #[test]
    fn test_recursive_call_links_to_itself() {
        let mut graph = built("def fact(n):\n    return n * fact(n - 1)\n");
        link(&mut graph);

        let def = graph.nodes_of_kind(NodeKind::FunctionDef).next().unwrap().id.clone();
        assert_eq!(calls(&graph, "fact")[0].target_world, Some(WorldId::Node(def)));
    }

    #[test]
    fn test_unresolved_call_is_hydrated() {
        let mut graph = built("print(1, 2, sep='-')\n");
        let stats = link(&mut graph);

        let site = calls(&graph, "print")[0];
        assert!(site.target_world.is_none());
        let names: Vec<_> = site.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["arg0", "arg1", "sep"]);
        assert_eq!(stats.hydrated, 1);
        assert_eq!(stats.external, 1);
    }

    #[test]
    fn test_hydration_keeps_positional_gaps() {
        let mut graph = Graph::new();
        let call = graph.add_node(Node::new(NodeData::Call(CallSite::function()), "g", WorldId::Root));
        let lit = graph.add_node(Node::new(NodeData::Literal, "1", WorldId::Root));
        graph.add_edge(Edge::new(lit, call.clone(), EdgeKind::positional(2)));
        link(&mut graph);

        let params = graph.node(&call).unwrap().params();
        assert_eq!(params.len(), 3);
        assert_eq!(params[2].name, "arg2");
    }

    #[test]
    fn test_methods_are_not_linked() {
        let mut graph = built("def append(x):\n    return x\nitems = []\nitems.append(1)\n");
        let stats = link(&mut graph);

        let site = calls(&graph, "append")[0];
        assert!(site.is_method);
        assert!(site.target_world.is_none());
        assert_eq!(site.params, vec![Param::required("arg0")]);
        assert_eq!(stats.methods, 1);
    }

    #[test]
    fn test_call_without_arguments_stays_bare() {
        let mut graph = built("main()\n");
        let stats = link(&mut graph);

        assert!(calls(&graph, "main")[0].params.is_empty());
        assert_eq!(stats.hydrated, 0);
    }

    #[test]
    fn test_class_call_links_to_class() {
        let mut graph = built("class Box:\n    pass\nb = Box()\n");
        link(&mut graph);

        let class = graph.nodes_of_kind(NodeKind::ClassDef).next().unwrap().id.clone();
        let site = calls(&graph, "Box")[0];
        assert_eq!(site.target_world, Some(WorldId::Node(class)));
        assert!(site.params.is_empty());
    }

    #[test]
    fn test_stats_display() {
        let stats = LinkStats { total: 3, linked: 1, hydrated: 1, methods: 1, external: 1 };
        let text = stats.to_string();
        assert!(text.contains("Total Calls: 3"));
        assert!(text.contains("Linked: 1"));
    }
}
