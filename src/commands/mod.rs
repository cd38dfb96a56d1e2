pub mod add;
pub mod clear;
pub mod edit;
pub mod export;
pub mod init;
pub mod list;
pub mod remove;
pub mod view;

use std::path::Path;

use anyhow::{Result, bail};

use crate::diagram::Diagram;
use crate::graph::model::{NodeId, Point};
use crate::graph::store::TreeStore;
use crate::layout::simulation::viewport_center;
use crate::parser::config::{self, Config};
use crate::persistence::FileStorage;
use crate::workspace;

/// Layout area assumed by subcommands that have no terminal to measure.
pub const HEADLESS_WIDTH: f64 = 960.0;
pub const HEADLESS_HEIGHT: f64 = 600.0;

/// Open the map under `root` for a one-shot command.
pub(crate) fn open_map(root: &Path, center: Point) -> Result<(Diagram<FileStorage>, Config)> {
    let cfg = config::load(&workspace::config_path(root))?;
    let storage = FileStorage::new(workspace::map_path(root));
    let (diagram, report) = Diagram::open(storage, cfg.layout(), cfg.palette, center)?;
    if !report.is_clean() {
        tracing::warn!(?report, "map needed repair; the next save rewrites it");
    }
    Ok((diagram, cfg))
}

pub(crate) fn headless_center() -> Point {
    viewport_center(HEADLESS_WIDTH, HEADLESS_HEIGHT)
}

/// Turn a failed best-effort save into a command error.
pub(crate) fn ensure_saved(diagram: &Diagram<FileStorage>) -> Result<()> {
    if let Some(err) = diagram.last_save_error() {
        bail!("failed to save {}: {err}", diagram.storage().path().display());
    }
    Ok(())
}

/// Resolve a node argument: `root`, a full id, or a unique id prefix
/// (with or without the `node-` part).
pub fn resolve_node(store: &TreeStore, arg: &str) -> Result<NodeId> {
    let arg = arg.trim();
    if arg.eq_ignore_ascii_case("root") {
        return Ok(store.root().id().clone());
    }
    let exact = NodeId::from(arg);
    if store.contains(&exact) {
        return Ok(exact);
    }
    if arg.is_empty() {
        bail!("empty node id");
    }

    let matches: Vec<&NodeId> = store
        .nodes()
        .iter()
        .map(|n| n.id())
        .filter(|id| {
            let s = id.as_str();
            s.starts_with(arg) || s.strip_prefix("node-").is_some_and(|rest| rest.starts_with(arg))
        })
        .collect();
    match matches.as_slice() {
        [id] => Ok((*id).clone()),
        [] => bail!("no node matches `{arg}`; run `mindmap list` to see ids"),
        many => bail!("`{arg}` is ambiguous: {} nodes match", many.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::{Link, Node};

    fn store() -> TreeStore {
        let mut store = TreeStore::new();
        let root = Node::restored(NodeId::from("node-aa00"), "R", 0);
        let a = Node::restored(NodeId::from("node-ab11"), "A", 1);
        let b = Node::restored(NodeId::from("node-ab22"), "B", 1);
        let links = vec![
            Link::new(root.id().clone(), a.id().clone()),
            Link::new(root.id().clone(), b.id().clone()),
        ];
        store.load_from(vec![root, a, b], links).unwrap();
        store
    }

    #[test]
    fn resolves_root_full_ids_and_unique_prefixes() {
        let s = store();
        assert_eq!(resolve_node(&s, "root").unwrap().as_str(), "node-aa00");
        assert_eq!(resolve_node(&s, "node-ab22").unwrap().as_str(), "node-ab22");
        assert_eq!(resolve_node(&s, "ab1").unwrap().as_str(), "node-ab11");
        assert_eq!(resolve_node(&s, "node-aa").unwrap().as_str(), "node-aa00");
    }

    #[test]
    fn ambiguous_and_unknown_prefixes_fail() {
        let s = store();
        let err = resolve_node(&s, "ab").unwrap_err().to_string();
        assert!(err.contains("ambiguous"), "{err}");
        let err = resolve_node(&s, "zz").unwrap_err().to_string();
        assert!(err.contains("no node matches"), "{err}");
    }
}
