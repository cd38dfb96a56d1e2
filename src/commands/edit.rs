//! `mindmap edit <node> [content]`: replace a node's label.

use std::path::Path;

use anyhow::Result;
use crossterm::style::Stylize;

use crate::commands::{ensure_saved, headless_center, open_map, resolve_node};
use crate::prompt::{Prompter, StdinPrompter};
use crate::workspace;

pub fn run(node: &str, content: Option<String>) -> Result<()> {
    let root = workspace::find_root()?;
    run_in(&root, node, content, &mut StdinPrompter::new())
}

/// Without `content` the user is prompted, with the current label as default.
pub fn run_in(
    root: &Path,
    node: &str,
    content: Option<String>,
    prompter: &mut impl Prompter,
) -> Result<()> {
    let (mut diagram, _) = open_map(root, headless_center())?;
    let id = resolve_node(diagram.store(), node)?;
    let current = diagram
        .store()
        .node(&id)
        .map(|n| n.content().to_string())
        .unwrap_or_default();

    let content = match content {
        Some(c) => c,
        None => prompter.prompt_text("Content", Some(&current)).unwrap_or_default(),
    };
    // Blank content is a no-op, same as an unchanged label.
    if content.trim() == current || !diagram.edit_content(&id, &content) {
        println!("  {} {}", "Unchanged".dark_grey(), current.bold());
        return Ok(());
    }
    ensure_saved(&diagram)?;
    println!(
        "  {} {} -> {}",
        "Edited".green().bold(),
        current.dark_grey(),
        content.trim().bold()
    );
    Ok(())
}
