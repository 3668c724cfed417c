//! # Worldgraph - scoped dataflow graphs for Python source
//!
//! Python source is parsed into a graph of nodes grouped into nested
//! *worlds* (module, function, class and block scopes) connected by dataflow
//! edges. The graph can be edited as plain data and turned back into
//! runnable source.
//!
//! Worldgraph provides:
//! - A structural visitor over tree-sitter-python with per-scope variable
//!   versioning and closure proxies
//! - A linker binding call sites to their lexical definitions
//! - Partial parsing of snippets into an existing world
//! - A synthesizer that regenerates source from any graph, complete or not
//! - JSON persistence and editor mutation helpers

pub mod id;
pub mod node;
pub mod edge;
pub mod graph;
pub mod scope;
pub mod adapter;
pub mod linker;
pub mod inject;
pub mod synth;
pub mod edit;
pub mod storage;
pub mod sandbox;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use id::{NodeId, WorldId};
pub use node::{CallSite, Node, NodeData, NodeKind, Param, ParamKind, Variable, VariableMode};
pub use edge::{Edge, EdgeKind};
pub use graph::{Graph, GraphStats};
pub use adapter::{parse, Diagnostic};
pub use linker::{link, LinkStats};
pub use inject::inject;
pub use synth::{synthesize, Incomplete, SynthScope, Synthesis, Synthesizer};
pub use storage::{GraphStore, JsonStore};

/// Result type alias for Worldgraph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Worldgraph operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Syntax error: {0}")]
    Syntax(#[from] Diagnostic),

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Adapter error: {0}")]
    Adapter(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sandbox error: {0}")]
    Sandbox(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),
}
