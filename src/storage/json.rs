//! JSON file storage

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use crate::Result;
use crate::graph::Graph;
use super::GraphStore;

/// Graph stored as pretty-printed JSON in a single file
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl GraphStore for JsonStore {
    fn load(&self) -> Result<Graph> {
        let content = fs::read_to_string(&self.path)?;
        let graph: Graph = serde_json::from_str(&content)?;
        debug!(
            "Loaded {} nodes and {} edges from {}",
            graph.nodes.len(),
            graph.edges.len(),
            self.path.display()
        );
        Ok(graph)
    }

    fn save(&self, graph: &Graph) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(graph)?;
        fs::write(&self.path, content)?;
        debug!("Saved graph to {}", self.path.display());
        Ok(())
    }
}
