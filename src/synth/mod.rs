//! Synthesizer - regenerates Python source from a graph
//!
//! Each world is written as one statement per node, in construction order.
//! Expression nodes are only reached through the edges of the statement
//! that consumes them. A missing required edge renders as [`MISSING`] and
//! is reported in [`Synthesis::incomplete`]; generation never aborts.

mod expr;
mod stmt;

pub use expr::literal_text;

use std::collections::HashSet;
use serde::Serialize;
use tracing::warn;
use crate::graph::{Graph, GraphIndex};
use crate::id::{NodeId, WorldId};
use crate::node::Node;

/// Placeholder for a value the graph does not provide
pub const MISSING: &str = "__missing__";

/// What part of the graph to synthesize
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthScope {
    /// Imports, then the root world
    Whole,
    /// The statements of one world
    World(WorldId),
    /// One node: a statement with its nested bodies, or an expression
    Node(NodeId),
}

/// A node that could not be rendered completely
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Incomplete {
    pub node: NodeId,
    pub label: String,
    pub reason: String,
}

impl std::fmt::Display for Incomplete {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.node, self.label, self.reason)
    }
}

/// Synthesized source plus the placeholders it contains
#[derive(Debug, Clone, Default, Serialize)]
pub struct Synthesis {
    pub source: String,
    pub incomplete: Vec<Incomplete>,
}

impl Synthesis {
    pub fn is_complete(&self) -> bool {
        self.incomplete.is_empty()
    }
}

/// Source generator over one graph
pub struct Synthesizer<'g> {
    graph: &'g Graph,
    index: GraphIndex<'g>,
    indent: usize,
    incomplete: Vec<Incomplete>,
    visiting: HashSet<NodeId>,
}

impl<'g> Synthesizer<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            index: GraphIndex::new(graph),
            indent: 4,
            incomplete: Vec::new(),
            visiting: HashSet::new(),
        }
    }

    /// Spaces per indentation level
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent.max(1);
        self
    }

    pub fn run(mut self, scope: &SynthScope) -> Synthesis {
        let mut lines = Vec::new();
        match scope {
            SynthScope::Whole => {
                for import in self.graph.nodes_in_world(&WorldId::Imports) {
                    lines.push(import.label.clone());
                }
                self.write_world(&WorldId::Root, 0, &mut lines);
            }
            SynthScope::World(world) => self.write_world(world, 0, &mut lines),
            SynthScope::Node(id) => match self.index.node(id) {
                Some(node) => self.write_single(node, &mut lines),
                None => warn!("Cannot synthesize unknown node {}", id),
            },
        }

        if !self.incomplete.is_empty() {
            warn!("Synthesized with {} incomplete node(s)", self.incomplete.len());
        }

        let mut source = lines.join("\n");
        if !source.is_empty() {
            source.push('\n');
        }
        Synthesis {
            source,
            incomplete: self.incomplete,
        }
    }

    fn line(&self, depth: usize, text: &str) -> String {
        format!("{}{}", " ".repeat(depth * self.indent), text)
    }

    /// Record an incomplete node once per reason
    fn mark(&mut self, node: &Node, reason: impl Into<String>) {
        let record = Incomplete {
            node: node.id.clone(),
            label: node.label.clone(),
            reason: reason.into(),
        };
        if !self.incomplete.contains(&record) {
            self.incomplete.push(record);
        }
    }
}

/// Synthesize with the default indentation
pub fn synthesize(graph: &Graph, scope: &SynthScope) -> Synthesis {
    Synthesizer::new(graph).run(scope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::parse;
    use crate::edge::{Edge, EdgeKind};
    use crate::node::{CallSite, NodeData, NodeKind, Param};
    use crate::sandbox::{ProcessSandbox, Sandbox};

    fn parsed(source: &str) -> Graph {
        let (graph, diagnostic) = parse(source).unwrap();
        assert!(diagnostic.is_none(), "{:?}", diagnostic);
        graph
    }

    fn whole(source: &str) -> String {
        synthesize(&parsed(source), &SynthScope::Whole).source
    }

    /// Run both the source program and its synthesized form and compare output.
    /// Skipped when no interpreter is installed.
    fn assert_round_trip(source: &str) {
        let sandbox = ProcessSandbox::default();
        if !sandbox.is_available() {
            return;
        }
        let synthesized = whole(source);
        let expected = sandbox.execute(source).unwrap();
        let actual = sandbox.execute(&synthesized).unwrap();
        assert!(expected.error.is_none(), "source program failed: {:?}", expected.error);
        assert_eq!(actual.error, None, "synthesized:\n{}", synthesized);
        assert_eq!(actual.stdout, expected.stdout, "synthesized:\n{}", synthesized);
    }

    #[test]
    fn test_simple_dataflow() {
        let out = whole("x = 1\ny = x + 2\nprint(y)\n");
        assert_eq!(out, "x = 1\ny = (x + 2)\nprint(y)\n");
        assert_round_trip("x = 1\ny = x + 2\nprint(y)\n");
    }

    #[test]
    fn test_function_and_calls() {
        let source = "def f(a):\n    return a * 2\nprint(f(3))\nprint(f(4))\n";
        let out = whole(source);
        assert_eq!(out, "def f(a):\n    return (a * 2)\nprint(f(3))\nprint(f(4))\n");
        assert_round_trip(source);
    }

    #[test]
    fn test_if_else_relinearized() {
        let source = "cond = False\nif cond:\n    a = 1\nelse:\n    a = 2\n    print(a)\n";
        let out = whole(source);
        assert_eq!(
            out,
            "cond = False\nif cond:\n    a = 1\nelse:\n    a = 2\n    print(a)\n"
        );
        assert_round_trip(source);
    }

    #[test]
    fn test_elif_chain() {
        let source = "n = 5\nif n < 0:\n    print('neg')\nelif n == 0:\n    print('zero')\nelse:\n    print('pos')\n";
        let out = whole(source);
        assert!(out.contains("if (n < 0):\n"));
        assert!(out.contains("elif (n == 0):\n"));
        assert!(out.contains("else:\n    print('pos')"));
        assert_round_trip(source);
    }

    #[test]
    fn test_closure_round_trip() {
        let source = "def outer():\n    base = 10\n    def inner(k):\n        return base + k\n    return inner(5)\nprint(outer())\n";
        assert_round_trip(source);
        assert!(whole(source).contains("        return (base + k)\n"));
    }

    #[test]
    fn test_loops_and_containers() {
        let source = "items = [1, 2, 3]\ntotal = 0\nfor item in items:\n    total += item\nprint(total)\nconfig = {'a': 1, 'b': items[0]}\nprint(config['b'])\ni = 0\nwhile i < 2:\n    i = i + 1\nprint(i)\n";
        let out = whole(source);
        assert!(out.contains("for item in items:\n    total = (total + item)\n"));
        assert!(out.contains("config = {'a': 1, 'b': items[0]}"));
        assert!(out.contains("while (i < 2):\n"));
        assert_round_trip(source);
    }

    #[test]
    fn test_try_except() {
        let source = "try:\n    x = int('no')\nexcept ValueError as err:\n    print('bad')\nexcept TypeError:\n    print('type')\n";
        let out = whole(source);
        assert!(out.contains("try:\n    x = int('no')\n"));
        assert!(out.contains("except ValueError as err:\n    print('bad')\n"));
        assert!(out.contains("except TypeError:\n"));
        assert_round_trip(source);
    }

    #[test]
    fn test_keywords_methods_and_imports() {
        let source = "import math\nparts = []\nparts.append(math.floor(2.5))\nprint(parts, sep='-', end='!\\n')\n";
        let out = whole(source);
        assert!(out.starts_with("import math\n"));
        assert!(out.contains("parts.append(math.floor(2.5))"));
        assert!(out.contains("print(parts, sep='-', end='!\\n')"));
        assert_round_trip(source);
    }

    #[test]
    fn test_defaults_switch_to_keyword_form() {
        let source = "def f(a, b=2, c=3):\n    return a + b + c\nprint(f(1, c=10))\n";
        let out = whole(source);
        assert!(out.contains("print(f(1, c=10))"));
        assert_round_trip(source);
    }

    #[test]
    fn test_varargs_keep_later_defaults() {
        let source = "def f(*a, b=1):\n    return len(a) + b\nprint(f(1, 2, 3))\n";
        let out = whole(source);
        assert!(out.contains("print(f(1, 2, 3))\n"), "{}", out);
        assert_round_trip(source);

        let source = "def g(x, *rest, sep='-'):\n    return sep.join(rest) + x\nprint(g('!', 'a', 'b'))\n";
        let out = whole(source);
        assert!(out.contains("print(g('!', 'a', 'b'))\n"), "{}", out);
        assert_round_trip(source);
    }

    #[test]
    fn test_varargs_with_keyword_after() {
        let source = "def f(*a, b=1):\n    return len(a) + b\nprint(f(1, 2, b=5))\n";
        let out = whole(source);
        assert!(out.contains("print(f(1, 2, b=5))\n"), "{}", out);
        assert_round_trip(source);
    }

    #[test]
    fn test_kwargs_collects_extra_keywords() {
        let source = "def k(a, **opts):\n    return len(opts) + a\nprint(k(1, x=2, y=3))\n";
        let out = whole(source);
        assert!(out.contains("print(k(1, x=2, y=3))\n"), "{}", out);
        assert_round_trip(source);
    }

    #[test]
    fn test_keyword_only_separator() {
        let source = "def h(a, *, b=2, c):\n    return a + b + c\nprint(h(1, c=3))\n";
        let out = whole(source);
        assert!(out.starts_with("def h(a, *, b=2, c):\n"), "{}", out);
        assert!(out.contains("print(h(1, c=3))\n"), "{}", out);
        assert_round_trip(source);
    }

    #[test]
    fn test_positional_only_separator() {
        let source = "def p(a, b=5, /, c=0):\n    return a + b + c\nprint(p(1, c=2))\nprint(p(1, 2))\n";
        let out = whole(source);
        assert!(out.starts_with("def p(a, b=5, /, c=0):\n"), "{}", out);
        assert!(out.contains("print(p(1, c=2))\n"), "{}", out);
        assert!(out.contains("print(p(1, 2))\n"), "{}", out);
        assert_round_trip(source);
    }

    #[test]
    fn test_skipped_positional_only_default_is_filled() {
        let mut graph = parsed("def p(a, b=5, c=7, /):\n    return a + b + c\nprint(p(1, 2, 3))\n");
        let call = graph.nodes_of_kind(NodeKind::Call).find(|n| n.label == "p").unwrap().id.clone();
        let middle = graph
            .edges_to(&call)
            .find(|e| e.kind == EdgeKind::positional(1))
            .unwrap()
            .clone();
        graph.remove_edges(&middle.source, &call, Some(&middle.kind));

        let result = synthesize(&graph, &SynthScope::Whole);
        assert!(result.source.contains("print(p(1, 5, 3))\n"), "{}", result.source);
        assert!(result.is_complete());
    }

    #[test]
    fn test_dict_renders_paired_prefix() {
        let mut graph = parsed("d = {'a': 1, 'b': 2, 'c': 3}\nprint(d)\n");
        let dict = graph.nodes_of_kind(NodeKind::DictConstructor).next().unwrap().id.clone();
        let second = graph
            .edges_to(&dict)
            .find(|e| e.kind == EdgeKind::DictValue { index: 1 })
            .unwrap()
            .clone();
        graph.remove_edges(&second.source, &dict, Some(&second.kind));

        let out = synthesize(&graph, &SynthScope::Whole).source;
        assert!(out.starts_with("d = {'a': 1}\n"), "{}", out);
    }

    #[test]
    fn test_dict_with_extra_key_drops_it() {
        let mut graph = parsed("d = {'a': 1, 'b': 2}\n");
        let dict = graph.nodes_of_kind(NodeKind::DictConstructor).next().unwrap().id.clone();
        let last = graph
            .edges_to(&dict)
            .find(|e| e.kind == EdgeKind::DictValue { index: 1 })
            .unwrap()
            .clone();
        graph.remove_edges(&last.source, &dict, Some(&last.kind));

        assert_eq!(synthesize(&graph, &SynthScope::Whole).source, "d = {'a': 1}\n");
    }

    #[test]
    fn test_class_and_methods() {
        let source = "class Counter:\n    def __init__(self, start):\n        self.count = start\n    def value(self):\n        return self.count\nc = Counter(3)\nprint(c.value())\n";
        let out = whole(source);
        assert!(out.contains("class Counter:\n    def __init__(self, start):\n"));
        assert!(out.contains("c = Counter(3)"));
    }

    #[test]
    fn test_statement_order_preserved() {
        let source = "def f():\n    print('first')\n    x = 1\n    print('second')\n    return x\nf()\n";
        let out = whole(source);
        assert_eq!(
            out,
            "def f():\n    print('first')\n    x = 1\n    print('second')\n    return x\nf()\n"
        );
    }

    #[test]
    fn test_empty_body_gets_pass() {
        let out = whole("def noop():\n    pass\nnoop()\n");
        assert_eq!(out, "def noop():\n    pass\nnoop()\n");
    }

    #[test]
    fn test_missing_argument_placeholder() {
        let mut graph = parsed("def f(a, b):\n    return a\nf(1, 2)\n");
        let call = graph.nodes_of_kind(NodeKind::Call).next().unwrap().id.clone();
        let second = graph
            .edges_to(&call)
            .find(|e| e.kind == EdgeKind::positional(1))
            .unwrap()
            .clone();
        graph.remove_edges(&second.source, &call, Some(&second.kind));

        let result = synthesize(&graph, &SynthScope::Whole);
        assert!(result.source.contains("f(1, __missing__)"));
        assert_eq!(result.incomplete.len(), 1);
        assert_eq!(result.incomplete[0].node, call);
    }

    #[test]
    fn test_missing_operand_placeholder() {
        let mut graph = Graph::new();
        let x = graph.add_node(Node::new(NodeData::Variable(crate::node::Variable::write(1)), "x", WorldId::Root));
        let op = graph.add_node(Node::new(NodeData::Operator { unary: false }, "+", WorldId::Root));
        graph.add_edge(Edge::new(op.clone(), x, EdgeKind::WritesTo));

        let result = synthesize(&graph, &SynthScope::Whole);
        assert_eq!(result.source, "x = (__missing__ + __missing__)\n");
        assert!(!result.is_complete());
    }

    #[test]
    fn test_override_wins() {
        let mut graph = parsed("def greet(name, punct='!'):\n    print(name + punct)\ngreet('hi')\n");
        let call = graph.nodes_of_kind(NodeKind::Call).find(|n| n.label == "greet").unwrap().id.clone();
        graph
            .node_mut(&call)
            .and_then(|n| n.call_mut())
            .unwrap()
            .overrides
            .insert("name".to_string(), "'yo'".to_string());

        let out = synthesize(&graph, &SynthScope::Whole).source;
        assert!(out.contains("greet('yo')"));
    }

    #[test]
    fn test_world_and_node_scopes() {
        let graph = parsed("def f(a):\n    b = a + 1\n    return b\nf(2)\n");
        let def = graph.nodes_of_kind(NodeKind::FunctionDef).next().unwrap().id.clone();

        let world = synthesize(&graph, &SynthScope::World(WorldId::Node(def.clone()))).source;
        assert_eq!(world, "b = (a + 1)\nreturn b\n");

        let single = synthesize(&graph, &SynthScope::Node(def)).source;
        assert!(single.starts_with("def f(a):\n"));

        let op = graph.nodes_of_kind(NodeKind::Operator).next().unwrap().id.clone();
        assert_eq!(synthesize(&graph, &SynthScope::Node(op)).source, "(a + 1)\n");
    }

    #[test]
    fn test_unlinked_call_with_params_renders_extras() {
        let mut graph = Graph::new();
        let call = graph.add_node(Node::new(
            NodeData::Call(CallSite {
                params: vec![Param::required("arg0")],
                ..CallSite::default()
            }),
            "print",
            WorldId::Root,
        ));
        for (i, value) in ["1", "2"].iter().enumerate() {
            let lit = graph.add_node(Node::new(NodeData::Literal, *value, WorldId::Root));
            graph.add_edge(Edge::new(lit, call.clone(), EdgeKind::positional(i)));
        }
        assert_eq!(synthesize(&graph, &SynthScope::Whole).source, "print(1, 2)\n");
    }

    #[test]
    fn test_custom_indent() {
        let graph = parsed("if True:\n    x = 1\n");
        let out = Synthesizer::new(&graph).with_indent(2).run(&SynthScope::Whole).source;
        assert_eq!(out, "if True:\n  x = 1\n");
    }
}
