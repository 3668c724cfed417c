//! Edge types - dataflow and structure between nodes
//!
//! Edges never encode containment; that is implicit in each node's world.
//! Every edge points from the node that produces a value (or precedes a
//! clause) to the node that consumes it:
//! - `Argument`, `Operand`, `WritesTo`, `Input`: expression wiring
//! - `ListElement`, `DictKey`, `DictValue`: container literals
//! - `AccessValue`, `AccessKey`, `AttributeValue`: subscript / attribute receivers
//! - `IteratesOn`: loop iterable → for block
//! - `NextClause`: if → elif → else chains, try → except handlers
//! - `ClosureOf`: origin variable → per-world proxy

use crate::id::NodeId;
use serde::{Deserialize, Serialize};

/// Edge kinds with their kind-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EdgeKind {
    Argument {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        keyword: Option<String>,
    },
    Operand { index: usize },
    WritesTo,
    Input,
    ListElement { index: usize },
    DictKey { index: usize },
    DictValue { index: usize },
    AccessValue,
    AccessKey,
    AttributeValue,
    IteratesOn,
    NextClause {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
    ClosureOf,
}

impl EdgeKind {
    pub fn positional(index: usize) -> Self {
        EdgeKind::Argument { index: Some(index), keyword: None }
    }

    pub fn keyword(name: impl Into<String>) -> Self {
        EdgeKind::Argument { index: None, keyword: Some(name.into()) }
    }

    /// Get the string representation of the edge kind, without payload
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Argument { .. } => "argument",
            EdgeKind::Operand { .. } => "operand",
            EdgeKind::WritesTo => "writes_to",
            EdgeKind::Input => "input",
            EdgeKind::ListElement { .. } => "list_element",
            EdgeKind::DictKey { .. } => "dict_key",
            EdgeKind::DictValue { .. } => "dict_value",
            EdgeKind::AccessValue => "access_value",
            EdgeKind::AccessKey => "access_key",
            EdgeKind::AttributeValue => "attribute_value",
            EdgeKind::IteratesOn => "iterates_on",
            EdgeKind::NextClause { .. } => "next_clause",
            EdgeKind::ClosureOf => "closure_of",
        }
    }

    /// Check if this edge carries a value into an expression or statement.
    ///
    /// A call with an outgoing data edge is consumed by another expression and
    /// is not emitted as a statement of its own.
    pub fn is_data(&self) -> bool {
        !matches!(self, EdgeKind::NextClause { .. } | EdgeKind::ClosureOf)
    }

    /// Ordering index carried by indexed kinds
    pub fn index(&self) -> Option<usize> {
        match self {
            EdgeKind::Argument { index, .. } | EdgeKind::NextClause { index } => *index,
            EdgeKind::Operand { index }
            | EdgeKind::ListElement { index }
            | EdgeKind::DictKey { index }
            | EdgeKind::DictValue { index } => Some(*index),
            _ => None,
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeKind::Argument { keyword: Some(keyword), .. } => write!(f, "argument[{}]", keyword),
            EdgeKind::NextClause { index: None } => write!(f, "{}", self.as_str()),
            _ => match self.index() {
                Some(index) => write!(f, "{}[{}]", self.as_str(), index),
                None => write!(f, "{}", self.as_str()),
            },
        }
    }
}

/// A directed edge between two nodes.
///
/// Two edges are the same edge when source, target and kind (payload
/// included) all match; graphs never hold duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(flatten)]
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId, kind: EdgeKind) -> Self {
        Self { source, target, kind }
    }

    /// Check if the edge touches the node at either end
    pub fn touches(&self, id: &NodeId) -> bool {
        &self.source == id || &self.target == id
    }
}
