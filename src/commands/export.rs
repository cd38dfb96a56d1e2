//! `mindmap export`: settle the layout headlessly and write a PNG or SVG.

use std::path::{Path, PathBuf};

use anyhow::Result;
use crossterm::style::Stylize;
use tracing::info;

use crate::commands::open_map;
use crate::export;
use crate::layout::simulation::viewport_center;
use crate::workspace;

/// Upper bound on layout steps; the default decay cools in about 300.
const MAX_SETTLE_STEPS: usize = 1_000;

pub fn run(output: Option<PathBuf>, width: f64, height: f64) -> Result<()> {
    let root = workspace::find_root()?;
    run_in(&root, output, width, height)?;
    Ok(())
}

/// The saved map is not modified; settled positions only go to the image.
/// A `.svg` output gets a vector file, anything else a PNG.
pub fn run_in(root: &Path, output: Option<PathBuf>, width: f64, height: f64) -> Result<PathBuf> {
    let (mut diagram, _) = open_map(root, viewport_center(width, height))?;
    let steps = diagram.settle(MAX_SETTLE_STEPS);

    let path = match output {
        Some(p) if p.is_relative() => root.join(p),
        Some(p) => p,
        None => workspace::default_export_path(root),
    };
    let format = export::export(diagram.scene(), &path)?;
    info!(path = %path.display(), format = format.name(), steps, "exported map");
    println!(
        "  {} {} {}",
        "Exported".green().bold(),
        path.display(),
        format!("({} nodes)", diagram.store().node_count()).dark_grey()
    );
    Ok(path)
}
