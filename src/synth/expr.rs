//! Expression rendering
//!
//! Expressions are rebuilt by walking incoming data edges. Binary and unary
//! operators are always parenthesized, so no precedence table is needed.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::LazyLock;
use regex::Regex;
use crate::edge::{Edge, EdgeKind};
use crate::id::NodeId;
use crate::node::{CallSite, Node, NodeData, NodeKind, Param, ParamKind};
use super::{Synthesizer, MISSING};

static NUMERIC: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(0[xX][0-9a-fA-F_]+|0[oO][0-7_]+|0[bB][01_]+|(\d[\d_]*\.?[\d_]*|\.\d[\d_]*)([eE][+-]?\d+)?[jJ]?)$").ok()
});

static QUOTED: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"^(?i:[rbuf]{0,2})('''|"""|'|")[\s\S]*$"#).ok()
});

/// Source text for a literal label.
///
/// Numbers, quoted strings and the keyword constants pass through; any other
/// text is treated as a raw string value and quoted.
pub fn literal_text(label: &str) -> String {
    let trimmed = label.trim();
    let keyword = matches!(trimmed, "True" | "False" | "None" | "...");
    let numeric = NUMERIC.as_ref().is_some_and(|re| re.is_match(trimmed));
    let quoted = QUOTED.as_ref().is_some_and(|re| re.is_match(trimmed));
    if keyword || numeric || quoted {
        return trimmed.to_string();
    }
    format!("'{}'", label.replace('\\', "\\\\").replace('\'', "\\'").replace('\n', "\\n"))
}

impl<'g> Synthesizer<'g> {
    /// Render the value a node produces
    pub(super) fn resolve(&mut self, id: &NodeId) -> String {
        let Some(node) = self.index.node(id) else {
            self.incomplete.push(super::Incomplete {
                node: id.clone(),
                label: String::new(),
                reason: "edge to a missing node".to_string(),
            });
            return MISSING.to_string();
        };
        if !self.visiting.insert(id.clone()) {
            self.mark(node, "cyclic expression");
            return MISSING.to_string();
        }

        let rendered = self.render(node);
        self.visiting.remove(id);
        rendered
    }

    fn render(&mut self, node: &'g Node) -> String {
        match &node.data {
            NodeData::Literal => literal_text(&node.label),
            NodeData::Variable(_) | NodeData::FunctionDef { .. } | NodeData::ClassDef { .. } | NodeData::Import { .. } => {
                node.label.clone()
            }
            NodeData::Operator { unary: true } => {
                let operand = self.operand(node, 0);
                if node.label.chars().all(char::is_alphabetic) {
                    format!("({} {})", node.label, operand)
                } else {
                    format!("({}{})", node.label, operand)
                }
            }
            NodeData::Operator { unary: false } => {
                let left = self.operand(node, 0);
                let right = self.operand(node, 1);
                format!("({} {} {})", left, node.label, right)
            }
            NodeData::Call(site) => self.render_call(node, site),
            NodeData::ListConstructor => {
                let elements = self.indexed(node, |k| match k {
                    EdgeKind::ListElement { index } => Some(*index),
                    _ => None,
                });
                let items: Vec<String> = elements.iter().map(|(_, id)| self.resolve(id)).collect();
                format!("[{}]", items.join(", "))
            }
            NodeData::DictConstructor => {
                let keys = self.indexed(node, |k| match k {
                    EdgeKind::DictKey { index } => Some(*index),
                    _ => None,
                });
                let values = self.indexed(node, |k| match k {
                    EdgeKind::DictValue { index } => Some(*index),
                    _ => None,
                });
                // stop at the first key without a value of the same index
                let values: BTreeMap<usize, &'g NodeId> = values.into_iter().collect();
                let mut pairs = Vec::new();
                for (index, key) in keys {
                    let Some(value) = values.get(&index).copied() else { break };
                    pairs.push(format!("{}: {}", self.resolve(key), self.resolve(value)));
                }
                format!("{{{}}}", pairs.join(", "))
            }
            NodeData::Accessor => {
                let value = self.required(node, EdgeKind::AccessValue, "missing accessed value");
                let key = self.required(node, EdgeKind::AccessKey, "missing access key");
                format!("{}[{}]", value, key)
            }
            NodeData::Attribute => {
                let value = self.required(node, EdgeKind::AttributeValue, "missing attribute owner");
                format!("{}.{}", value, node.label)
            }
            _ => {
                self.mark(node, format!("{} has no value", node.kind()));
                MISSING.to_string()
            }
        }
    }

    fn operand(&mut self, node: &'g Node, index: usize) -> String {
        self.required(node, EdgeKind::Operand { index }, &format!("missing operand {}", index))
    }

    fn required(&mut self, node: &'g Node, kind: EdgeKind, reason: &str) -> String {
        match self.index.input(&node.id, |k| *k == kind) {
            Some(source) => self.resolve(source),
            None => {
                self.mark(node, reason);
                MISSING.to_string()
            }
        }
    }

    /// Incoming edges of one indexed family, sorted by index
    fn indexed<F>(&self, node: &Node, index_of: F) -> Vec<(usize, &'g NodeId)>
    where
        F: Fn(&EdgeKind) -> Option<usize>,
    {
        let mut found: Vec<(usize, &'g NodeId)> = self
            .index
            .incoming(&node.id)
            .iter()
            .copied()
            .filter_map(|e: &'g Edge| index_of(&e.kind).map(|i| (i, &e.source)))
            .collect();
        found.sort_by_key(|(i, _)| *i);
        found
    }

    fn render_call(&mut self, node: &'g Node, site: &'g CallSite) -> String {
        let arguments = self.render_arguments(node, site);
        if site.is_method {
            let receiver = self.required(node, EdgeKind::AttributeValue, "missing method receiver");
            format!("{}.{}({})", receiver, node.label, arguments)
        } else {
            format!("{}({})", node.label, arguments)
        }
    }

    /// Parameters a call binds against: the linked def's when it still
    /// exists, otherwise the call's own list
    fn call_params(&self, site: &'g CallSite) -> &'g [Param] {
        let def = site
            .target_world
            .as_ref()
            .and_then(|w| w.owner())
            .and_then(|id| self.index.node(id))
            .filter(|d| d.kind() == NodeKind::FunctionDef);
        match def {
            Some(def) => def.params(),
            None => &site.params,
        }
    }

    /// Bind wired arguments, overrides and defaults to the parameter list.
    ///
    /// Precedence per parameter: override, keyword edge, positional edge.
    /// Once an optional parameter is skipped or a keyword is used, every
    /// later argument is written as a keyword. Parameters after `*args` or
    /// a bare `*` never take a positional argument; those before `/` are
    /// always written positionally.
    fn render_arguments(&mut self, node: &'g Node, site: &'g CallSite) -> String {
        let mut positional: BTreeMap<usize, &'g NodeId> = BTreeMap::new();
        let mut keywords: Vec<(&'g str, &'g NodeId)> = Vec::new();
        let incoming: Vec<&'g Edge> = self.index.incoming(&node.id).to_vec();
        for edge in incoming {
            match &edge.kind {
                EdgeKind::Argument { keyword: Some(name), .. } => {
                    if !keywords.iter().any(|(k, _)| *k == name.as_str()) {
                        keywords.push((name.as_str(), &edge.source));
                    }
                }
                EdgeKind::Argument { index: Some(i), keyword: None } => {
                    positional.entry(*i).or_insert(&edge.source);
                }
                _ => {}
            }
        }

        let params = self.call_params(site);
        let positional_only_end = params.iter().position(|p| p.kind == ParamKind::PositionalOnly);

        let mut used_positional = BTreeSet::new();
        let mut used_keywords = HashSet::new();
        let mut keyword_mode = false;
        // after `*args` or a bare `*`: no more positional slots
        let mut keyword_only = false;
        let mut slot = 0;
        // defaults of skipped positional-only params, written once a later value follows
        let mut pending_defaults: Vec<String> = Vec::new();
        let mut args = Vec::new();

        for (i, param) in params.iter().enumerate() {
            match param.kind {
                ParamKind::VarArgs => {
                    args.append(&mut pending_defaults);
                    for (index, source) in positional.range(slot..) {
                        if used_positional.insert(*index) {
                            args.push(self.resolve(source));
                        }
                    }
                    keyword_mode = true;
                    keyword_only = true;
                }
                ParamKind::KeywordOnly => {
                    pending_defaults.clear();
                    keyword_mode = true;
                    keyword_only = true;
                }
                ParamKind::PositionalOnly => {
                    if !pending_defaults.is_empty() {
                        keyword_mode = true;
                    }
                    pending_defaults.clear();
                }
                // remaining keywords are appended below
                ParamKind::KwArgs => {}
                ParamKind::Positional => {
                    let positional_only = positional_only_end.is_some_and(|end| i < end);
                    let keyword_source = if positional_only {
                        None
                    } else {
                        keywords.iter().find(|(k, _)| *k == param.name).map(|(_, s)| *s)
                    };
                    let positional_source = if keyword_only { None } else { positional.get(&slot).copied() };
                    let this_slot = slot;
                    if !keyword_only {
                        slot += 1;
                    }
                    if keyword_source.is_some() {
                        used_keywords.insert(param.name.as_str());
                    }

                    let value = if let Some(text) = site.overrides.get(&param.name) {
                        if positional_source.is_some() {
                            used_positional.insert(this_slot);
                        }
                        Some(text.clone())
                    } else if let Some(source) = keyword_source {
                        Some(self.resolve(source))
                    } else if let Some(source) = positional_source {
                        used_positional.insert(this_slot);
                        Some(self.resolve(source))
                    } else {
                        None
                    };

                    let as_keyword = !positional_only && (keyword_mode || keyword_source.is_some());
                    match value {
                        Some(value) if as_keyword => {
                            keyword_mode = true;
                            args.push(format!("{}={}", param.name, value));
                        }
                        Some(value) => {
                            args.append(&mut pending_defaults);
                            args.push(value);
                        }
                        None if param.optional && positional_only => {
                            pending_defaults.push(param.default.clone().unwrap_or_else(|| MISSING.to_string()));
                        }
                        None if param.optional => keyword_mode = true,
                        None => {
                            self.mark(node, format!("missing argument `{}`", param.name));
                            if as_keyword {
                                args.push(format!("{}={}", param.name, MISSING));
                            } else {
                                args.append(&mut pending_defaults);
                                args.push(MISSING.to_string());
                            }
                        }
                    }
                }
            }
        }

        for (index, source) in &positional {
            if !used_positional.contains(index) {
                args.push(self.resolve(source));
            }
        }
        for (name, source) in &keywords {
            if !used_keywords.contains(name) {
                args.push(format!("{}={}", name, self.resolve(source)));
            }
        }
        args.join(", ")
    }
}
