use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_GRAPH: &str = "graph.json";
pub const DEFAULT_INDENT: usize = 4;
pub const DEFAULT_INTERPRETER: &str = "python3";

/// `worldgraph.toml`; every key is optional
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct WorldgraphConfig {
    /// Graph file used when a command gets no `--graph`
    pub graph: Option<String>,
    /// Spaces per indentation level in synthesized code
    pub indent: Option<usize>,
    /// Interpreter the `run` command hands synthesized source to
    pub interpreter: Option<String>,
}

impl WorldgraphConfig {
    /// Config with every key set to its default, as written by `init`
    pub fn with_defaults() -> Self {
        Self {
            graph: Some(DEFAULT_GRAPH.to_string()),
            indent: Some(DEFAULT_INDENT),
            interpreter: Some(DEFAULT_INTERPRETER.to_string()),
        }
    }

    pub fn graph_path(&self) -> PathBuf {
        PathBuf::from(self.graph.as_deref().unwrap_or(DEFAULT_GRAPH))
    }

    pub fn indent(&self) -> usize {
        self.indent.unwrap_or(DEFAULT_INDENT)
    }

    pub fn interpreter(&self) -> &str {
        self.interpreter.as_deref().unwrap_or(DEFAULT_INTERPRETER)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("worldgraph.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<WorldgraphConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: WorldgraphConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &WorldgraphConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
