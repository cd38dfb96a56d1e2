//! `mindmap init`: create `.mindmap/` in the current directory.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use crossterm::style::Stylize;
use tracing::info;

use crate::graph::store::TreeStore;
use crate::parser::config;
use crate::persistence::{FileStorage, Storage, snapshot};
use crate::workspace;

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Entry point called from `main`.
pub fn run() -> Result<()> {
    let root = std::env::current_dir()?;
    run_in(&root)
}

/// Run init inside `root`. An existing config is left alone.
pub fn run_in(root: &Path) -> Result<()> {
    let map_path = workspace::map_path(root);
    if map_path.exists() {
        bail!(
            "a mind map already exists here ({}/map.json). Run `mindmap view` to open it.",
            workspace::DIR_NAME
        );
    }

    let dir = workspace::mindmap_dir(root);
    fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    // map.json
    let store = TreeStore::new();
    FileStorage::new(&map_path).save(&snapshot(&store))?;
    println!(
        "  {} {}/map.json {}",
        "Created".green().bold(),
        workspace::DIR_NAME,
        format!("(root {})", store.root().id()).dark_grey()
    );

    // config.mindmap
    let config_path = workspace::config_path(root);
    if !config_path.exists() {
        fs::write(&config_path, config::DEFAULT_CONTENTS)
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        println!(
            "  {} {}/config.mindmap",
            "Created".green().bold(),
            workspace::DIR_NAME
        );
    }

    info!(root = %root.display(), "initialised mind map");
    println!(
        "  {} {}",
        "Next".cyan().bold(),
        "`mindmap view` opens the canvas".dark_grey()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
