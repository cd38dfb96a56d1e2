//! Paths for the `.mindmap/` directory.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

pub const DIR_NAME: &str = ".mindmap";

/// Walk upward from `start` to find the directory containing `.mindmap/map.json`.
pub fn find_root_from(start: &Path) -> Result<PathBuf> {
    let mut dir = start;
    loop {
        if map_path(dir).exists() {
            return Ok(dir.to_path_buf());
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => bail!("no mind map found; run `mindmap init` to create one here"),
        }
    }
}

/// Walk upward from the current working directory.
pub fn find_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    find_root_from(&cwd)
}

pub fn mindmap_dir(root: &Path) -> PathBuf {
    root.join(DIR_NAME)
}

pub fn map_path(root: &Path) -> PathBuf {
    mindmap_dir(root).join("map.json")
}

pub fn config_path(root: &Path) -> PathBuf {
    mindmap_dir(root).join("config.mindmap")
}

pub fn log_path(root: &Path) -> PathBuf {
    mindmap_dir(root).join("mindmap.log")
}

pub fn default_export_path(root: &Path) -> PathBuf {
    root.join("mindmap.png")
}
