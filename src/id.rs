//! Node and world identity
//!
//! Node ids are opaque tokens of the form `<kind>_<hex>`, minted once and never
//! reassigned. A world is either one of two sentinels or the id of the node
//! that owns the nested scope:
//!
//! - `root` - module level
//! - `world_imports` - where import statements live
//! - `<node id>` - the body of a def or control-flow block

use crate::{Error, Result};
use crate::node::NodeKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const ROOT: &str = "root";
const IMPORTS: &str = "world_imports";

/// Globally unique, immutable node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Mint a fresh id for a node of the given kind
    pub fn generate(kind: NodeKind) -> Self {
        let token = Uuid::new_v4().simple().to_string();
        Self(format!("{}_{}", kind.as_str(), &token[..12]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A lexical scope ("world").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WorldId {
    /// Module level scope
    Root,
    /// Holding area for import statements
    Imports,
    /// Scope owned by a def or block node
    Node(NodeId),
}

impl WorldId {
    /// Parse a world string
    ///
    /// Sentinels are matched exactly; anything else is taken as a node id.
    pub fn parse(world: &str) -> Result<Self> {
        match world.trim() {
            "" => Err(Error::InvalidId("empty world id".to_string())),
            ROOT => Ok(WorldId::Root),
            IMPORTS => Ok(WorldId::Imports),
            other => Ok(WorldId::Node(NodeId::from(other))),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            WorldId::Root => ROOT,
            WorldId::Imports => IMPORTS,
            WorldId::Node(id) => id.as_str(),
        }
    }

    /// The owning node, if this is a nested scope
    pub fn owner(&self) -> Option<&NodeId> {
        match self {
            WorldId::Node(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, WorldId::Root)
    }
}

impl From<NodeId> for WorldId {
    fn from(id: NodeId) -> Self {
        WorldId::Node(id)
    }
}

impl From<&NodeId> for WorldId {
    fn from(id: &NodeId) -> Self {
        WorldId::Node(id.clone())
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorldId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for WorldId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for WorldId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        WorldId::parse(&s).map_err(serde::de::Error::custom)
    }
}
