//! `mindmap add <parent> [content]`: append a child node.

use std::path::Path;

use anyhow::Result;
use crossterm::style::Stylize;

use crate::commands::{ensure_saved, headless_center, open_map, resolve_node};
use crate::graph::model::NodeId;
use crate::prompt::{Prompter, StdinPrompter};
use crate::workspace;

pub fn run(parent: &str, content: Option<String>) -> Result<()> {
    let root = workspace::find_root()?;
    run_in(&root, parent, content, &mut StdinPrompter::new())?;
    Ok(())
}

/// Blank or missing content adds nothing and returns `None`.
pub fn run_in(
    root: &Path,
    parent: &str,
    content: Option<String>,
    prompter: &mut impl Prompter,
) -> Result<Option<NodeId>> {
    let (mut diagram, _) = open_map(root, headless_center())?;
    let parent_id = resolve_node(diagram.store(), parent)?;

    let content = match content {
        Some(c) => c,
        None => prompter.prompt_text("Content", None).unwrap_or_default(),
    };
    let Some(child) = diagram.add_child(&parent_id, &content) else {
        println!("  {}", "Unchanged".dark_grey());
        return Ok(None);
    };
    ensure_saved(&diagram)?;

    let parent_label = diagram
        .store()
        .node(&parent_id)
        .map(|n| n.content().to_string())
        .unwrap_or_default();
    println!(
        "  {} {} under {}",
        "Added".green().bold(),
        child.to_string().cyan(),
        parent_label.bold()
    );
    Ok(Some(child))
}
