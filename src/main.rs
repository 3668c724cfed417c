//! Worldgraph CLI - parse Python into a scoped dataflow graph and back

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use worldgraph::config;

#[derive(Parser)]
#[command(name = "worldgraph")]
#[command(version)]
#[command(about = "Scoped dataflow graphs for Python source")]
#[command(long_about = r#"
Worldgraph turns a Python module into an editable graph of scoped
dataflow nodes and regenerates runnable source from it.

Example usage:
  worldgraph parse app.py -o graph.json
  worldgraph inject patch.py --world root
  worldgraph synth
  worldgraph run
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file (defaults to ./worldgraph.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a Python file into a graph
    Parse {
        /// Python source file
        source: PathBuf,

        /// Where to write the graph
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print source synthesized from a graph
    Synth {
        /// Graph file
        #[arg(short, long)]
        graph: Option<PathBuf>,

        /// Only the statements of this world
        #[arg(long, conflicts_with = "node")]
        world: Option<String>,

        /// Only this node
        #[arg(long)]
        node: Option<String>,
    },

    /// Parse a snippet into an existing world of a graph
    Inject {
        /// Python snippet file
        snippet: PathBuf,

        /// Graph file
        #[arg(short, long)]
        graph: Option<PathBuf>,

        /// Target world id
        #[arg(long, default_value = "root")]
        world: String,
    },

    /// Synthesize a graph and execute it
    Run {
        /// Graph file
        #[arg(short, long)]
        graph: Option<PathBuf>,
    },

    /// Show statistics about a graph
    Stats {
        /// Graph file
        #[arg(short, long)]
        graph: Option<PathBuf>,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(self) -> bool {
        self == OutputMode::Human
    }
}

/// Print a JSON success envelope; human output is printed by the command
pub fn emit_success(output_mode: OutputMode, command: &str, data: serde_json::Value) -> anyhow::Result<()> {
    if output_mode == OutputMode::Json {
        let envelope = serde_json::json!({
            "ok": true,
            "command": command,
            "data": data,
        });
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = if cli.json { OutputMode::Json } else { OutputMode::Human };
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);

    if let Commands::Init { force } = cli.command {
        return commands::run_init(output_mode, &config_path, force);
    }

    let ctx = commands::Context {
        config: config::load_config(Some(&config_path))?.unwrap_or_default(),
        output_mode,
    };

    match cli.command {
        Commands::Parse { source, output } => commands::run_parse(&ctx, &source, output),
        Commands::Synth { graph, world, node } => commands::run_synth(&ctx, graph, world, node),
        Commands::Inject { snippet, graph, world } => commands::run_inject(&ctx, &snippet, graph, &world),
        Commands::Run { graph } => commands::run_run(&ctx, graph),
        Commands::Stats { graph } => commands::run_stats(&ctx, graph),
        Commands::Init { .. } => Ok(()),
    }
}
