use crate::{OutputMode, emit_success};
use anyhow::Context as _;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use worldgraph::config::{self, WorldgraphConfig};
use worldgraph::sandbox::{ProcessSandbox, Sandbox};
use worldgraph::storage::{GraphStore, JsonStore};
use worldgraph::ui::{self, Icons};
use worldgraph::{Graph, NodeId, SynthScope, Synthesizer, WorldId};

/// Settings shared by every command
pub struct Context {
    pub config: WorldgraphConfig,
    pub output_mode: OutputMode,
}

impl Context {
    fn graph_path(&self, explicit: Option<PathBuf>) -> PathBuf {
        explicit.unwrap_or_else(|| self.config.graph_path())
    }

    fn load(&self, path: &Path) -> anyhow::Result<Graph> {
        JsonStore::new(path)
            .load()
            .with_context(|| format!("failed to load graph from {}", path.display()))
    }
}

pub fn run_parse(ctx: &Context, source: &Path, output: Option<PathBuf>) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(source)
        .with_context(|| format!("failed to read {}", source.display()))?;

    let (graph, diagnostic) = worldgraph::parse(&text)?;
    if let Some(diagnostic) = diagnostic {
        anyhow::bail!("{}: {}", source.display(), diagnostic);
    }

    let path = ctx.graph_path(output);
    JsonStore::new(&path).save(&graph)?;
    let stats = graph.stats();

    if ctx.output_mode.is_human() {
        ui::header(&format!("{} Parsed {}", Icons::FILE, source.display()));
        ui::summary_row("Nodes:", &stats.total_nodes.to_string());
        ui::summary_row("Edges:", &stats.total_edges.to_string());
        ui::summary_row("Worlds:", &stats.worlds.to_string());
        ui::success(&format!("Graph saved to {}", path.display()));
    } else {
        let data = serde_json::json!({
            "graph": path,
            "nodes": stats.total_nodes,
            "edges": stats.total_edges,
            "worlds": stats.worlds,
        });
        emit_success(ctx.output_mode, "parse", data)?;
    }
    Ok(())
}

pub fn run_synth(ctx: &Context, graph: Option<PathBuf>, world: Option<String>, node: Option<String>) -> anyhow::Result<()> {
    let graph = ctx.load(&ctx.graph_path(graph))?;

    let scope = match (world, node) {
        (Some(world), _) => {
            let world = WorldId::parse(&world)?;
            if !graph.has_world(&world) {
                anyhow::bail!("unknown world {}", world);
            }
            SynthScope::World(world)
        }
        (None, Some(node)) => {
            let id = NodeId::from(node);
            if !graph.contains(&id) {
                anyhow::bail!("unknown node {}", id);
            }
            SynthScope::Node(id)
        }
        (None, None) => SynthScope::Whole,
    };

    let result = Synthesizer::new(&graph)
        .with_indent(ctx.config.indent())
        .run(&scope);

    if ctx.output_mode.is_human() {
        print!("{}", result.source);
        ui::incomplete(&result.incomplete);
    } else {
        emit_success(ctx.output_mode, "synth", serde_json::to_value(&result)?)?;
    }
    Ok(())
}

pub fn run_inject(ctx: &Context, snippet: &Path, graph: Option<PathBuf>, world: &str) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(snippet)
        .with_context(|| format!("failed to read {}", snippet.display()))?;
    let path = ctx.graph_path(graph);
    let base = ctx.load(&path)?;
    let target = WorldId::parse(world)?;

    let (merged, added) = worldgraph::inject(&base, &text, &target)?;
    JsonStore::new(&path).save(&merged)?;

    if ctx.output_mode.is_human() {
        ui::success(&format!(
            "{} Injected {} node(s) into {}",
            Icons::NEW,
            added,
            target.as_str().style(ui::theme().info)
        ));
    } else {
        let data = serde_json::json!({
            "graph": path,
            "world": target,
            "added": added,
        });
        emit_success(ctx.output_mode, "inject", data)?;
    }
    Ok(())
}

pub fn run_run(ctx: &Context, graph: Option<PathBuf>) -> anyhow::Result<()> {
    let graph = ctx.load(&ctx.graph_path(graph))?;
    let synthesis = Synthesizer::new(&graph)
        .with_indent(ctx.config.indent())
        .run(&SynthScope::Whole);

    let sandbox = ProcessSandbox::new(ctx.config.interpreter());
    let execution = sandbox.execute(&synthesis.source)?;

    if ctx.output_mode.is_human() {
        ui::incomplete(&synthesis.incomplete);
        print!("{}", execution.stdout);
        if let Some(error) = &execution.error {
            ui::error(&format!("{} Program failed", Icons::PLAY));
            eprintln!("{}", error);
            anyhow::bail!("program exited with an error");
        }
    } else {
        let data = serde_json::json!({
            "source": synthesis.source,
            "incomplete": synthesis.incomplete,
            "stdout": execution.stdout,
            "error": execution.error,
        });
        emit_success(ctx.output_mode, "run", data)?;
    }
    Ok(())
}

pub fn run_stats(ctx: &Context, graph: Option<PathBuf>) -> anyhow::Result<()> {
    let path = ctx.graph_path(graph);
    let stats = ctx.load(&path)?.stats();

    if ctx.output_mode.is_human() {
        ui::header(&format!("{} Worldgraph Statistics ({})", Icons::STATS, path.display()));
        println!("{}", ui::stats_table(&stats));
    } else {
        emit_success(ctx.output_mode, "stats", serde_json::to_value(&stats)?)?;
    }
    Ok(())
}

pub fn run_init(output_mode: OutputMode, path: &Path, force: bool) -> anyhow::Result<()> {
    let defaults = WorldgraphConfig::with_defaults();
    config::write_config(path, &defaults, force)?;

    if output_mode.is_human() {
        ui::success(&format!("{} Wrote {}", Icons::GEAR, path.display()));
        ui::info("graph", defaults.graph.as_deref().unwrap_or(config::DEFAULT_GRAPH));
        ui::info("interpreter", defaults.interpreter());
    } else {
        emit_success(output_mode, "init", serde_json::json!({ "config": path }))?;
    }
    Ok(())
}
