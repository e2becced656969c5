use clap::Parser;
use ustr::ustr;

use typetree::config::{HierarchyView, TreeDisplayConfig};
use typetree::hierarchy_server::make_local_graph_server;
use typetree::hierarchy_types::Position;
use typetree::logging::init_logging;
use typetree::tree_model::{prepare_session, DisplayState, NodeId, TreeAdapter};

/// Explore a type hierarchy graph from the command line: anchor a session at
/// a location, expand to a depth, and print the tree.
#[derive(Debug, Parser)]
#[command(name = "typetree-tool")]
struct Cli {
    /// Path to the JSON type graph file.
    #[clap(long, value_parser)]
    graph: String,

    /// Document URI to anchor at.
    #[clap(long, value_parser)]
    uri: String,

    /// 1-based line of the anchor position.
    #[clap(long, value_parser)]
    line: u32,

    /// 0-based column of the anchor position.
    #[clap(long, value_parser, default_value = "0")]
    col: u32,

    /// Which hierarchy to render.
    #[clap(long, value_enum, default_value = "supertype")]
    view: HierarchyView,

    /// Resolve children eagerly while computing display state.
    #[clap(long, value_parser)]
    prefetch: bool,

    /// How many levels below the roots to expand.
    #[clap(long, value_parser, default_value = "2")]
    depth: u32,
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    let server = match make_local_graph_server(&cli.graph).await {
        Ok(server) => server,
        Err(err) => {
            eprintln!("Unable to load graph {}: {:?}", cli.graph, err);
            std::process::exit(1);
        }
    };

    let pos = Position {
        lineno: cli.line,
        col: cli.col,
    };
    let session = match prepare_session(server, ustr(&cli.uri), pos, cli.view).await {
        Ok(session) => session,
        Err(err) => {
            eprintln!("Hierarchy query failed: {:?}", err);
            std::process::exit(1);
        }
    };
    let model = match session {
        Some(model) => model,
        None => {
            eprintln!("No hierarchy available at {}:{}", cli.uri, cli.line);
            std::process::exit(1);
        }
    };

    let mut adapter = TreeAdapter::new(
        model,
        TreeDisplayConfig {
            prefetch: cli.prefetch,
            class_chain_limit: None,
        },
    );

    let mut stack: Vec<(NodeId, u32)> = adapter
        .children(None)
        .await
        .into_iter()
        .rev()
        .map(|id| (id, 0))
        .collect();
    while let Some((id, depth)) = stack.pop() {
        let marker = match adapter.display_state(id).await {
            DisplayState::Expanded => '*',
            DisplayState::Collapsed => '+',
            DisplayState::Leaf => '-',
        };
        {
            let item = adapter.model().item(id);
            println!(
                "{}{} {} [{}] {}:{}",
                "  ".repeat(depth as usize),
                marker,
                item.name,
                item.kind.name(),
                item.uri,
                item.selection_range.start_lineno,
            );
        }
        if depth < cli.depth {
            let kids = adapter.children(Some(id)).await;
            for kid in kids.into_iter().rev() {
                stack.push((kid, depth + 1));
            }
        }
    }
}
