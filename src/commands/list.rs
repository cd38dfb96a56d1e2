//! `mindmap list`: print the tree as an indented outline.

use anyhow::Result;
use crossterm::style::Stylize;

use crate::commands::{headless_center, open_map};
use crate::graph::model::NodeId;
use crate::graph::store::TreeStore;
use crate::workspace;

pub fn run() -> Result<()> {
    let root = workspace::find_root()?;
    let (diagram, _) = open_map(&root, headless_center())?;
    for row in outline(diagram.store()) {
        println!(
            "  {}{}  {}",
            "  ".repeat(row.level as usize),
            row.content.bold(),
            format!("{}  L{}", row.id, row.level).dark_grey()
        );
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OutlineRow {
    id: NodeId,
    content: String,
    level: u32,
}

/// Depth-first from the root; siblings keep creation order.
fn outline(store: &TreeStore) -> Vec<OutlineRow> {
    let mut rows = Vec::with_capacity(store.node_count());
    let mut stack = vec![store.root().id().clone()];
    while let Some(id) = stack.pop() {
        let Some(node) = store.node(&id) else {
            continue;
        };
        rows.push(OutlineRow {
            id: id.clone(),
            content: node.content().to_string(),
            level: node.level(),
        });
        let children: Vec<NodeId> = store.children_of(&id).cloned().collect();
        stack.extend(children.into_iter().rev());
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_is_depth_first_in_creation_order() {
        let mut store = TreeStore::new();
        let root = store.root().id().clone();
        let a = store.add_child(&root, "A").unwrap();
        let b = store.add_child(&root, "B").unwrap();
        store.add_child(&a, "A1").unwrap();
        store.add_child(&b, "B1").unwrap();
        store.add_child(&a, "A2").unwrap();

        let rows: Vec<(String, u32)> = outline(&store)
            .into_iter()
            .map(|r| (r.content, r.level))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("root".to_string(), 0),
                ("A".to_string(), 1),
                ("A1".to_string(), 2),
                ("A2".to_string(), 2),
                ("B".to_string(), 1),
                ("B1".to_string(), 2),
            ]
        );
    }
}
