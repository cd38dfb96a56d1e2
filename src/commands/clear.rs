//! `mindmap clear`: reset the map to a single root.

use std::path::Path;

use anyhow::Result;
use crossterm::style::Stylize;

use crate::commands::{ensure_saved, headless_center, open_map};
use crate::prompt::{Prompter, StdinPrompter};
use crate::workspace;

pub fn run(yes: bool) -> Result<()> {
    let root = workspace::find_root()?;
    run_in(&root, yes, &mut StdinPrompter::new())
}

pub fn run_in(root: &Path, yes: bool, prompter: &mut impl Prompter) -> Result<()> {
    let (mut diagram, cfg) = open_map(root, headless_center())?;
    let count = diagram.store().node_count();
    if !yes && cfg.confirm_clear && !prompter.confirm(&format!("Clear all {count} node(s)?")) {
        println!("  {}", "Cancelled".dark_grey());
        return Ok(());
    }
    diagram.clear();
    ensure_saved(&diagram)?;
    println!(
        "  {} {}",
        "Cleared".red().bold(),
        format!("{count} node(s); a fresh root remains").dark_grey()
    );
    Ok(())
}
