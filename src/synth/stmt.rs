//! Statement emission: one line (plus nested body) per statement node

use std::collections::HashSet;
use crate::edge::EdgeKind;
use crate::id::WorldId;
use crate::node::{Node, NodeData, NodeKind, Param};
use super::{Synthesizer, MISSING};

impl<'g> Synthesizer<'g> {
    /// Write the statements of a world in construction order
    pub(super) fn write_world(&mut self, world: &WorldId, depth: usize, out: &mut Vec<String>) {
        let graph = self.graph;
        for node in graph.nodes_in_world(world) {
            self.write_statement(node, depth, out);
        }
    }

    /// Nested body of a compound statement; never empty
    fn write_body(&mut self, node: &'g Node, depth: usize, out: &mut Vec<String>) {
        let before = out.len();
        self.write_world(&WorldId::Node(node.id.clone()), depth, out);
        if out.len() == before {
            out.push(self.line(depth, "pass"));
        }
    }

    pub(super) fn write_statement(&mut self, node: &'g Node, depth: usize, out: &mut Vec<String>) {
        match &node.data {
            NodeData::FunctionDef { params } => {
                let header: Vec<String> = params.iter().map(Param::header).collect();
                out.push(self.line(depth, &format!("def {}({}):", node.label, header.join(", "))));
                self.write_body(node, depth + 1, out);
            }
            NodeData::ClassDef { bases } => {
                let header = if bases.is_empty() {
                    format!("class {}:", node.label)
                } else {
                    format!("class {}({}):", node.label, bases.join(", "))
                };
                out.push(self.line(depth, &header));
                self.write_body(node, depth + 1, out);
            }
            NodeData::Variable(var) if var.is_write() => {
                if let Some(source) = self.index.input(&node.id, |k| *k == EdgeKind::WritesTo) {
                    let value = self.resolve(source);
                    out.push(self.line(depth, &format!("{} = {}", node.label, value)));
                }
            }
            NodeData::Call(_) => {
                // calls consumed by another node are rendered there
                if !self.feeds_expression(node) {
                    let call = self.resolve(&node.id);
                    out.push(self.line(depth, &call));
                }
            }
            NodeData::Return => match self.index.input(&node.id, |k| *k == EdgeKind::Input) {
                Some(source) => {
                    let value = self.resolve(source);
                    out.push(self.line(depth, &format!("return {}", value)));
                }
                None => out.push(self.line(depth, "return")),
            },
            NodeData::IfBlock => self.write_if_chain(node, depth, out),
            NodeData::ForBlock { target } => {
                let iterable = match self.index.input(&node.id, |k| *k == EdgeKind::IteratesOn) {
                    Some(source) => self.resolve(source),
                    None => self.label_fallback(node, &format!("for {} in", target)),
                };
                let target = if target.is_empty() {
                    self.mark(node, "missing loop target");
                    MISSING
                } else {
                    target.as_str()
                };
                out.push(self.line(depth, &format!("for {} in {}:", target, iterable)));
                self.write_body(node, depth + 1, out);
            }
            NodeData::WhileBlock => {
                let test = self.clause_test(node, "while");
                out.push(self.line(depth, &format!("while {}:", test)));
                self.write_body(node, depth + 1, out);
            }
            NodeData::TryBlock => self.write_try(node, depth, out),
            NodeData::ElifBlock | NodeData::ElseBlock | NodeData::ExceptBlock { .. } => {
                // written by their head; one without a head cannot be placed
                if !self.has_head(node) {
                    self.mark(node, "clause without a preceding block");
                }
            }
            NodeData::Import { .. } => out.push(self.line(depth, &node.label)),
            _ => {}
        }
    }

    /// A single node, for [`SynthScope::Node`](super::SynthScope::Node)
    pub(super) fn write_single(&mut self, node: &'g Node, out: &mut Vec<String>) {
        match node.kind() {
            NodeKind::ElifBlock | NodeKind::ElseBlock | NodeKind::ExceptBlock => self.write_clause(node, 0, out),
            NodeKind::Call => {
                let call = self.resolve(&node.id);
                out.push(call);
            }
            NodeKind::Variable if !node.variable().is_some_and(|v| v.is_write()) => out.push(node.label.clone()),
            kind if kind.owns_world() || matches!(kind, NodeKind::Variable | NodeKind::Return | NodeKind::Import) => {
                self.write_statement(node, 0, out)
            }
            _ => {
                let expr = self.resolve(&node.id);
                out.push(expr);
            }
        }
    }

    fn write_if_chain(&mut self, head: &'g Node, depth: usize, out: &mut Vec<String>) {
        let test = self.clause_test(head, "if");
        out.push(self.line(depth, &format!("if {}:", test)));
        self.write_body(head, depth + 1, out);

        let mut seen = HashSet::from([head.id.clone()]);
        let mut current = head;
        while let Some(next) = self.next_clause(current) {
            if !seen.insert(next.id.clone()) {
                break;
            }
            self.write_clause(next, depth, out);
            if next.kind() == NodeKind::ElseBlock {
                break;
            }
            current = next;
        }
    }

    fn write_try(&mut self, block: &'g Node, depth: usize, out: &mut Vec<String>) {
        out.push(self.line(depth, "try:"));
        self.write_body(block, depth + 1, out);

        let mut handlers: Vec<(usize, &'g Node)> = self
            .index
            .outgoing(&block.id)
            .iter()
            .filter_map(|e| match e.kind {
                EdgeKind::NextClause { index: Some(i) } => self.index.node(&e.target).map(|n| (i, n)),
                _ => None,
            })
            .filter(|(_, n)| n.kind() == NodeKind::ExceptBlock)
            .collect();
        handlers.sort_by_key(|(i, _)| *i);

        if handlers.is_empty() {
            // a bare try is not valid Python
            out.push(self.line(depth, "finally:"));
            out.push(self.line(depth + 1, "pass"));
        }
        for (_, handler) in handlers {
            self.write_clause(handler, depth, out);
        }
    }

    /// Header and body of an elif, else or except clause
    fn write_clause(&mut self, clause: &'g Node, depth: usize, out: &mut Vec<String>) {
        let header = match &clause.data {
            NodeData::ElifBlock => format!("elif {}:", self.clause_test(clause, "elif")),
            NodeData::ElseBlock => "else:".to_string(),
            NodeData::ExceptBlock { exception, binding } => {
                let exception = match self.index.input(&clause.id, |k| *k == EdgeKind::Input) {
                    Some(source) => Some(self.resolve(source)),
                    None => exception.clone(),
                };
                let mut header = "except".to_string();
                if let Some(exception) = exception {
                    header.push(' ');
                    header.push_str(&exception);
                }
                if let Some(binding) = binding {
                    header.push_str(" as ");
                    header.push_str(binding);
                }
                header.push(':');
                header
            }
            _ => return self.write_statement(clause, depth, out),
        };
        out.push(self.line(depth, &header));
        self.write_body(clause, depth + 1, out);
    }

    /// Test expression of an `if`/`elif`/`while`: the wired input, else the
    /// condition text kept in the label
    fn clause_test(&mut self, clause: &'g Node, keyword: &str) -> String {
        match self.index.input(&clause.id, |k| *k == EdgeKind::Input) {
            Some(source) => self.resolve(source),
            None => self.label_fallback(clause, keyword),
        }
    }

    fn label_fallback(&mut self, node: &'g Node, prefix: &str) -> String {
        match node.label.strip_prefix(prefix).map(str::trim) {
            Some(rest) if !rest.is_empty() => rest.to_string(),
            _ => {
                self.mark(node, format!("missing `{}` expression", prefix));
                MISSING.to_string()
            }
        }
    }

    fn next_clause(&self, clause: &Node) -> Option<&'g Node> {
        self.index
            .outgoing(&clause.id)
            .iter()
            .filter(|e| e.kind == EdgeKind::NextClause { index: None })
            .filter_map(|e| self.index.node(&e.target))
            .find(|n| matches!(n.kind(), NodeKind::ElifBlock | NodeKind::ElseBlock))
    }

    fn has_head(&self, clause: &Node) -> bool {
        self.index
            .incoming(&clause.id)
            .iter()
            .any(|e| matches!(e.kind, EdgeKind::NextClause { .. }))
    }

    /// Whether a node's value is consumed by another node
    fn feeds_expression(&self, node: &Node) -> bool {
        self.index.outgoing(&node.id).iter().any(|e| e.kind.is_data())
    }
}
