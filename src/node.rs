//! Node types - the vertices of the scoped dataflow graph
//!
//! Every node carries a fixed world and a closed, kind-specific payload
//! ([`NodeData`]). [`NodeKind`] is the payload-free discriminant used for
//! filtering, display and id prefixes.

use crate::{Error, Result};
use crate::id::{NodeId, WorldId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Payload-free node discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    FunctionDef,
    ClassDef,
    Variable,
    Call,
    Literal,
    Operator,
    Return,
    Import,
    IfBlock,
    ElifBlock,
    ElseBlock,
    ForBlock,
    WhileBlock,
    TryBlock,
    ExceptBlock,
    ListConstructor,
    DictConstructor,
    Accessor,
    Attribute,
}

impl NodeKind {
    /// Get the string representation of the node kind
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::FunctionDef => "function_def",
            NodeKind::ClassDef => "class_def",
            NodeKind::Variable => "variable",
            NodeKind::Call => "call",
            NodeKind::Literal => "literal",
            NodeKind::Operator => "operator",
            NodeKind::Return => "return",
            NodeKind::Import => "import",
            NodeKind::IfBlock => "if_block",
            NodeKind::ElifBlock => "elif_block",
            NodeKind::ElseBlock => "else_block",
            NodeKind::ForBlock => "for_block",
            NodeKind::WhileBlock => "while_block",
            NodeKind::TryBlock => "try_block",
            NodeKind::ExceptBlock => "except_block",
            NodeKind::ListConstructor => "list_constructor",
            NodeKind::DictConstructor => "dict_constructor",
            NodeKind::Accessor => "accessor",
            NodeKind::Attribute => "attribute",
        }
    }

    /// Get all node kinds
    pub fn all() -> &'static [NodeKind] {
        &[
            NodeKind::FunctionDef,
            NodeKind::ClassDef,
            NodeKind::Variable,
            NodeKind::Call,
            NodeKind::Literal,
            NodeKind::Operator,
            NodeKind::Return,
            NodeKind::Import,
            NodeKind::IfBlock,
            NodeKind::ElifBlock,
            NodeKind::ElseBlock,
            NodeKind::ForBlock,
            NodeKind::WhileBlock,
            NodeKind::TryBlock,
            NodeKind::ExceptBlock,
            NodeKind::ListConstructor,
            NodeKind::DictConstructor,
            NodeKind::Accessor,
            NodeKind::Attribute,
        ]
    }

    /// Kinds whose id doubles as the id of a nested world
    pub fn owns_world(&self) -> bool {
        matches!(
            self,
            NodeKind::FunctionDef
                | NodeKind::ClassDef
                | NodeKind::IfBlock
                | NodeKind::ElifBlock
                | NodeKind::ElseBlock
                | NodeKind::ForBlock
                | NodeKind::WhileBlock
                | NodeKind::TryBlock
                | NodeKind::ExceptBlock
        )
    }

    /// Function and class definitions
    pub fn is_definition(&self) -> bool {
        matches!(self, NodeKind::FunctionDef | NodeKind::ClassDef)
    }

    /// Empty payload for a kind, used when an editor creates a bare node
    pub fn default_data(&self) -> NodeData {
        match self {
            NodeKind::FunctionDef => NodeData::FunctionDef { params: Vec::new() },
            NodeKind::ClassDef => NodeData::ClassDef { bases: Vec::new() },
            NodeKind::Variable => NodeData::Variable(Variable::write(1)),
            NodeKind::Call => NodeData::Call(CallSite::default()),
            NodeKind::Literal => NodeData::Literal,
            NodeKind::Operator => NodeData::Operator { unary: false },
            NodeKind::Return => NodeData::Return,
            NodeKind::Import => NodeData::Import { bindings: Vec::new() },
            NodeKind::IfBlock => NodeData::IfBlock,
            NodeKind::ElifBlock => NodeData::ElifBlock,
            NodeKind::ElseBlock => NodeData::ElseBlock,
            NodeKind::ForBlock => NodeData::ForBlock { target: String::new() },
            NodeKind::WhileBlock => NodeData::WhileBlock,
            NodeKind::TryBlock => NodeData::TryBlock,
            NodeKind::ExceptBlock => NodeData::ExceptBlock { exception: None, binding: None },
            NodeKind::ListConstructor => NodeData::ListConstructor,
            NodeKind::DictConstructor => NodeData::DictConstructor,
            NodeKind::Accessor => NodeData::Accessor,
            NodeKind::Attribute => NodeData::Attribute,
        }
    }
}

impl FromStr for NodeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        NodeKind::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .or(match normalized.as_str() {
                "def" | "function" => Some(NodeKind::FunctionDef),
                "class" => Some(NodeKind::ClassDef),
                "var" => Some(NodeKind::Variable),
                "list" => Some(NodeKind::ListConstructor),
                "dict" => Some(NodeKind::DictConstructor),
                _ => None,
            })
            .ok_or_else(|| Error::InvalidId(format!("Unknown node kind: {}", s)))
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a parameter binds its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    #[default]
    Positional,
    /// `*args`
    VarArgs,
    /// `**kwargs`
    KwArgs,
    /// Bare `*`: later parameters are keyword-only
    KeywordOnly,
    /// `/`: earlier parameters are positional-only
    PositionalOnly,
}

/// A formal parameter of a def, or an inferred one on a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default)]
    pub optional: bool,
    /// Source text of the default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "is_positional")]
    pub kind: ParamKind,
}

fn is_positional(kind: &ParamKind) -> bool {
    *kind == ParamKind::Positional
}

impl Param {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
            default: None,
            kind: ParamKind::Positional,
        }
    }

    pub fn with_default(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: true,
            default: Some(default.into()),
            kind: ParamKind::Positional,
        }
    }

    pub fn variadic(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            optional: true,
            default: None,
            kind,
        }
    }

    /// A `*` or `/` separator in a def header
    pub fn marker(kind: ParamKind) -> Self {
        Self {
            name: String::new(),
            optional: true,
            default: None,
            kind,
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self.kind, ParamKind::KeywordOnly | ParamKind::PositionalOnly)
    }

    /// Render the parameter as it appears in a def header
    pub fn header(&self) -> String {
        match (self.kind, &self.default) {
            (ParamKind::KeywordOnly, _) => "*".to_string(),
            (ParamKind::PositionalOnly, _) => "/".to_string(),
            (ParamKind::VarArgs, _) => format!("*{}", self.name),
            (ParamKind::KwArgs, _) => format!("**{}", self.name),
            (ParamKind::Positional, Some(default)) => format!("{}={}", self.name, default),
            (ParamKind::Positional, None) => self.name.clone(),
        }
    }
}

/// Index of the positional argument that binds to `name`, if any
pub fn positional_slot(params: &[Param], name: &str) -> Option<usize> {
    let mut slot = 0;
    for param in params {
        match param.kind {
            ParamKind::VarArgs | ParamKind::KeywordOnly => return None,
            ParamKind::Positional if param.name == name => return Some(slot),
            ParamKind::Positional => slot += 1,
            ParamKind::PositionalOnly | ParamKind::KwArgs => {}
        }
    }
    None
}

/// How a Variable node came to exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableMode {
    /// Bound by a def header, loop target or except clause
    Param,
    /// Assignment
    Write,
    /// Per-world stand-in for a variable of an enclosing world
    ClosureRead { origin: NodeId, origin_world: WorldId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub mode: VariableMode,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub optional: bool,
}

impl Variable {
    pub fn param(optional: bool) -> Self {
        Self { mode: VariableMode::Param, version: 1, optional }
    }

    pub fn write(version: u32) -> Self {
        Self { mode: VariableMode::Write, version, optional: false }
    }

    pub fn closure_read(origin: NodeId, origin_world: WorldId) -> Self {
        Self {
            mode: VariableMode::ClosureRead { origin, origin_world },
            version: 0,
            optional: false,
        }
    }

    pub fn is_write(&self) -> bool {
        self.mode == VariableMode::Write
    }
}

/// Call-site payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    #[serde(default)]
    pub is_method: bool,
    /// Definition world the call enters, set by the linker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_world: Option<WorldId>,
    #[serde(default)]
    pub params: Vec<Param>,
    /// Editor overrides: parameter name to source text
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, String>,
}

impl CallSite {
    pub fn function() -> Self {
        Self::default()
    }

    pub fn method() -> Self {
        Self { is_method: true, ..Self::default() }
    }
}

/// Kind-specific payload. The serde tag doubles as the node's `kind` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeData {
    FunctionDef {
        #[serde(default)]
        params: Vec<Param>,
    },
    ClassDef {
        #[serde(default)]
        bases: Vec<String>,
    },
    Variable(Variable),
    Call(CallSite),
    Literal,
    Operator {
        #[serde(default)]
        unary: bool,
    },
    Return,
    Import {
        /// Names the statement binds
        #[serde(default)]
        bindings: Vec<String>,
    },
    IfBlock,
    ElifBlock,
    ElseBlock,
    ForBlock {
        /// Loop target as written
        #[serde(default)]
        target: String,
    },
    WhileBlock,
    TryBlock,
    ExceptBlock {
        #[serde(default)]
        exception: Option<String>,
        #[serde(default)]
        binding: Option<String>,
    },
    ListConstructor,
    DictConstructor,
    Accessor,
    Attribute,
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::FunctionDef { .. } => NodeKind::FunctionDef,
            NodeData::ClassDef { .. } => NodeKind::ClassDef,
            NodeData::Variable(_) => NodeKind::Variable,
            NodeData::Call(_) => NodeKind::Call,
            NodeData::Literal => NodeKind::Literal,
            NodeData::Operator { .. } => NodeKind::Operator,
            NodeData::Return => NodeKind::Return,
            NodeData::Import { .. } => NodeKind::Import,
            NodeData::IfBlock => NodeKind::IfBlock,
            NodeData::ElifBlock => NodeKind::ElifBlock,
            NodeData::ElseBlock => NodeKind::ElseBlock,
            NodeData::ForBlock { .. } => NodeKind::ForBlock,
            NodeData::WhileBlock => NodeKind::WhileBlock,
            NodeData::TryBlock => NodeKind::TryBlock,
            NodeData::ExceptBlock { .. } => NodeKind::ExceptBlock,
            NodeData::ListConstructor => NodeKind::ListConstructor,
            NodeData::DictConstructor => NodeKind::DictConstructor,
            NodeData::Accessor => NodeKind::Accessor,
            NodeData::Attribute => NodeKind::Attribute,
        }
    }
}

/// A vertex of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    /// Fixed at creation
    pub world: WorldId,
    #[serde(flatten)]
    pub data: NodeData,
}

impl Node {
    /// Create a node with a freshly minted id
    pub fn new(data: NodeData, label: impl Into<String>, world: WorldId) -> Self {
        Self {
            id: NodeId::generate(data.kind()),
            label: label.into(),
            world,
            data,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    pub fn variable(&self) -> Option<&Variable> {
        match &self.data {
            NodeData::Variable(var) => Some(var),
            _ => None,
        }
    }

    pub fn call(&self) -> Option<&CallSite> {
        match &self.data {
            NodeData::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn call_mut(&mut self) -> Option<&mut CallSite> {
        match &mut self.data {
            NodeData::Call(call) => Some(call),
            _ => None,
        }
    }

    /// Formal parameters of a def, or the known parameters of a call
    pub fn params(&self) -> &[Param] {
        match &self.data {
            NodeData::FunctionDef { params } => params,
            NodeData::Call(call) => &call.params,
            _ => &[],
        }
    }

    /// The world this node owns, if it owns one
    pub fn own_world(&self) -> Option<WorldId> {
        self.kind().owns_world().then(|| WorldId::Node(self.id.clone()))
    }
}
