use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use graphbind::{
    BindingsDocument, Graph, GraphLayout, GraphSession, GraphView, InMemoryGraph, QueryParameters,
};

/// Resolve visual bindings for a graph and write the rendered document.
#[derive(Parser)]
#[command(name = "graphbind")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a graph with a bindings document
    Render {
        /// Input graph (.json with `nodes` and `edges`)
        #[arg(short, long)]
        graph: PathBuf,

        /// Bindings document (.yaml, .yml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Query text passed to the query runner
        #[arg(short, long, default_value = "MATCH (n)-[r]->(m) RETURN n, r, m")]
        query: String,

        /// Layout overriding the bindings document
        #[arg(short, long)]
        layout: Option<GraphLayout>,

        /// Output file for the rendered document
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Validate a bindings document
    Check {
        /// Bindings document (.yaml, .yml or .json)
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn load_graph(path: &Path) -> anyhow::Result<Graph> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading graph {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing graph {}", path.display()))
}

fn render(
    graph: &Path,
    config: Option<&Path>,
    query: &str,
    layout: Option<GraphLayout>,
    output: &Path,
) -> anyhow::Result<()> {
    let mut session =
        GraphSession::<GraphView>::new().with_query_runner(InMemoryGraph::new(load_graph(graph)?));
    if let Some(config) = config {
        BindingsDocument::load(config)
            .and_then(|document| document.apply(&mut session))
            .with_context(|| format!("loading bindings {}", config.display()))?;
    }

    let view = session.show(query, layout, &QueryParameters::new())?;
    let rendered = view.rendered().context("renderer produced no document")?;
    fs::write(output, serde_json::to_string_pretty(rendered)?)
        .with_context(|| format!("writing {}", output.display()))?;

    info!(
        nodes = rendered.nodes.len(),
        edges = rendered.edges.len(),
        output = %output.display(),
        "wrote rendered graph"
    );
    println!(
        "Rendered {} nodes and {} relationships to {}",
        rendered.nodes.len(),
        rendered.edges.len(),
        output.display()
    );
    Ok(())
}

fn check(config: &Path) -> anyhow::Result<()> {
    let document = BindingsDocument::load(config)?;
    document.validate()?;
    println!(
        "{}: {} node and {} relationship configurations",
        config.display(),
        document.nodes.len(),
        document.relationships.len()
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("graphbind=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            graph,
            config,
            query,
            layout,
            output,
        } => render(&graph, config.as_deref(), &query, layout, &output),
        Commands::Check { config } => check(&config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_render_subcommand() {
        let cli = Cli::try_parse_from([
            "graphbind",
            "render",
            "--graph",
            "graph.json",
            "--config",
            "bindings.yaml",
            "--layout",
            "tree",
            "--output",
            "out.json",
        ])
        .unwrap();
        match cli.command {
            Commands::Render {
                graph,
                config,
                layout,
                output,
                ..
            } => {
                assert_eq!(graph, PathBuf::from("graph.json"));
                assert_eq!(config, Some(PathBuf::from("bindings.yaml")));
                assert_eq!(layout, Some(GraphLayout::Tree));
                assert_eq!(output, PathBuf::from("out.json"));
            }
            _ => panic!("Expected Render command"),
        }
    }

    #[test]
    fn cli_rejects_unknown_layout() {
        let result = Cli::try_parse_from([
            "graphbind", "render", "--graph", "g.json", "--layout", "spiral", "--output", "o.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parses_check_subcommand() {
        let cli = Cli::try_parse_from(["graphbind", "check", "--config", "bindings.yml"]).unwrap();
        match cli.command {
            Commands::Check { config } => assert_eq!(config, PathBuf::from("bindings.yml")),
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["graphbind"]).is_err());
    }
}
