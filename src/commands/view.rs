//! `mindmap view` and `mindmap setup`: the interactive canvas.

use anyhow::Result;
use crossterm::style::Stylize;

use crate::persistence::Storage;
use crate::tui::canvas::{self, AppState};
use crate::workspace;

/// `demo` opens an in-memory sample map instead of the workspace's.
pub fn run(demo: bool) -> Result<()> {
    open(demo, false)
}

/// Same canvas, starting on the settings panel.
pub fn run_setup() -> Result<()> {
    open(false, true)
}

fn open(demo: bool, open_settings: bool) -> Result<()> {
    if demo {
        canvas::run_app(AppState::demo(open_settings)?)?;
        println!("  {}", "Demo closed, nothing was saved".dark_grey());
        return Ok(());
    }
    let app = canvas::run_app(AppState::load_workspace(open_settings)?)?;
    print_summary(&app);
    Ok(())
}

// ---------------------------------------------------------------------------
// Exit summary
// ---------------------------------------------------------------------------

fn print_summary<S: Storage>(app: &AppState<S>) {
    let nodes = app.diagram().store().node_count();
    match app.diagram().last_save_error() {
        Some(err) => eprintln!(
            "  {} last save failed: {err}",
            "Warning".yellow().bold()
        ),
        None => {
            let target = app
                .root_dir()
                .map(|root| workspace::map_path(root).display().to_string())
                .unwrap_or_default();
            println!(
                "  {} {} {}",
                "Saved".green().bold(),
                node_summary(nodes),
                format!("to {target}").dark_grey()
            );
        }
    }
}

fn node_summary(nodes: usize) -> String {
    if nodes == 1 {
        "1 node".to_string()
    } else {
        format!("{nodes} nodes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_summary_pluralizes() {
        assert_eq!(node_summary(1), "1 node");
        assert_eq!(node_summary(4), "4 nodes");
    }
}
