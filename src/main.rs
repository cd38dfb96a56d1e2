mod commands;
mod diagram;
mod export;
mod graph;
mod layout;
mod logging;
mod parser;
mod persistence;
mod prompt;
mod scene;
mod tui;
mod workspace;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{HEADLESS_HEIGHT, HEADLESS_WIDTH};
use crate::logging::LogTarget;
use crate::parser::config;

#[derive(Parser)]
#[command(
    name = "mindmap",
    about = "A terminal mind-map editor with a live force-directed layout"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create .mindmap/ with a single-root map in the current directory
    Init,
    /// Open the interactive canvas
    View {
        /// Launch with a built-in sample map (no workspace required)
        #[arg(long)]
        demo: bool,
    },
    /// Open the canvas on the settings panel
    Setup,
    /// Print the tree as an outline with ids and levels
    List,
    /// Add a child under a node (`root`, an id, or a unique id prefix)
    Add {
        parent: String,
        /// Label for the new node; prompted for when omitted
        content: Option<String>,
    },
    /// Replace a node's label
    Edit {
        node: String,
        /// New label; prompted for when omitted
        content: Option<String>,
    },
    /// Remove a node; its children move up to its parent
    Remove {
        node: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Reset the map to a single root
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Settle the layout and write the map as PNG (or SVG for a .svg path)
    Export {
        /// Destination file (default: mindmap.png next to .mindmap/)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Width of the area the layout centers in
        #[arg(long, default_value_t = HEADLESS_WIDTH)]
        width: f64,
        /// Height of the area the layout centers in
        #[arg(long, default_value_t = HEADLESS_HEIGHT)]
        height: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The canvas sets up its own file logging once it knows the workspace.
    if !matches!(cli.command, Command::View { .. } | Command::Setup) {
        logging::init(LogTarget::Stderr, &configured_log_level())?;
    }

    match cli.command {
        Command::Init => commands::init::run(),
        Command::View { demo } => commands::view::run(demo),
        Command::Setup => commands::view::run_setup(),
        Command::List => commands::list::run(),
        Command::Add { parent, content } => commands::add::run(&parent, content),
        Command::Edit { node, content } => commands::edit::run(&node, content),
        Command::Remove { node, yes } => commands::remove::run(&node, yes),
        Command::Clear { yes } => commands::clear::run(yes),
        Command::Export {
            output,
            width,
            height,
        } => commands::export::run(output, width, height),
    }
}

/// The workspace config's `log_level`, or the default outside a workspace.
fn configured_log_level() -> String {
    workspace::find_root()
        .ok()
        .and_then(|root| config::load(&workspace::config_path(&root)).ok())
        .unwrap_or_default()
        .log_level
}
