//! `mindmap remove <node>`: delete a node; its children move up.

use std::path::Path;

use anyhow::Result;
use crossterm::style::Stylize;

use crate::commands::{ensure_saved, headless_center, open_map, resolve_node};
use crate::prompt::{Prompter, StdinPrompter};
use crate::workspace;

pub fn run(node: &str, yes: bool) -> Result<()> {
    let root = workspace::find_root()?;
    run_in(&root, node, yes, &mut StdinPrompter::new())
}

pub fn run_in(root: &Path, node: &str, yes: bool, prompter: &mut impl Prompter) -> Result<()> {
    let (mut diagram, cfg) = open_map(root, headless_center())?;
    let id = resolve_node(diagram.store(), node)?;

    let store = diagram.store();
    let is_root = store.node(&id).is_some_and(|n| n.is_root());
    if !yes && cfg.confirm_remove && !is_root {
        let content = store.node(&id).map(|n| n.content()).unwrap_or_default();
        let children = store.children_of(&id).count();
        let question = match children {
            0 => format!("Remove '{content}'?"),
            n => format!("Remove '{content}' and move its {n} child node(s) up?"),
        };
        if !prompter.confirm(&question) {
            println!("  {}", "Cancelled".dark_grey());
            return Ok(());
        }
    }

    let removal = diagram.remove_node(&id)?;
    ensure_saved(&diagram)?;
    println!(
        "  {} {} {}",
        "Removed".red().bold(),
        removal.removed.content().bold(),
        format!("({} child node(s) moved up)", removal.reparented.len()).dark_grey()
    );
    Ok(())
}
