//! Storage Layer - graph persistence
//!
//! A graph is saved as one JSON document:
//! - nodes: `{id, label, world, kind, ...payload}`
//! - edges: `{source, target, kind, ...payload}`
//!
//! Ids and payloads round-trip unchanged, so a loaded graph can be edited,
//! injected into and synthesized exactly like a freshly parsed one.

pub mod json;

pub use json::JsonStore;

use crate::Result;
use crate::graph::Graph;

/// Somewhere a graph can be saved to and loaded from
pub trait GraphStore {
    fn load(&self) -> Result<Graph>;
    fn save(&self, graph: &Graph) -> Result<()>;
}
