//! The canonical node/link collections and the tree-shaped mutations on them.
//!
//! Invariant kept by every public mutation: exactly one node has level 0,
//! every other node is the target of exactly one link, and walking
//! `target -> source` from any node reaches the root in `level` steps.

use std::collections::{HashMap, VecDeque};

use thiserror::Error;
use tracing::debug;

use crate::graph::model::{Link, Node, NodeId};

pub const DEFAULT_ROOT_CONTENT: &str = "root";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("cannot remove root node")]
    RootRemoval,
    #[error("unknown node '{0}'")]
    UnknownNode(NodeId),
    #[error("tree has no root node")]
    MissingRoot,
    #[error("tree has more than one root node ('{0}' and '{1}')")]
    MultipleRoots(NodeId, NodeId),
    #[error("duplicate node id '{0}'")]
    DuplicateId(NodeId),
    #[error("link references unknown node '{0}'")]
    DanglingLink(NodeId),
    #[error("node '{0}' has {1} incoming links")]
    IncomingLinks(NodeId, usize),
    #[error("node '{0}' is not reachable from the root")]
    Unreachable(NodeId),
    #[error("node '{id}' has level {stored} but sits at depth {depth}")]
    LevelMismatch { id: NodeId, stored: u32, depth: u32 },
}

/// What `remove_node` did, for callers that report or log it.
#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    pub removed: Node,
    pub new_parent: NodeId,
    /// Former children of the removed node, now children of `new_parent`.
    pub reparented: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct TreeStore {
    nodes: Vec<Node>,
    links: Vec<Link>,
    index: HashMap<NodeId, usize>,
    root: NodeId,
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeStore {
    /// A store holding only a default root node.
    pub fn new() -> Self {
        let root = Node::new(DEFAULT_ROOT_CONTENT, 0);
        let root_id = root.id.clone();
        let mut store = Self {
            nodes: vec![root],
            links: Vec::new(),
            index: HashMap::new(),
            root: root_id,
        };
        store.rebuild_index();
        store
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn root(&self) -> &Node {
        &self.nodes[self.index[&self.root]]
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.index.get(id).map(|&idx| &self.nodes[idx])
    }

    /// Mutable access for layout and dragging. Identity, content and level
    /// stay read-only outside the `graph` module.
    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.index.get(id).map(|&idx| &mut self.nodes[idx])
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn parent_of(&self, id: &NodeId) -> Option<&NodeId> {
        self.links
            .iter()
            .find(|link| &link.target == id)
            .map(|link| &link.source)
    }

    pub fn children_of<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a NodeId> + 'a {
        self.links
            .iter()
            .filter(move |link| &link.source == id)
            .map(|link| &link.target)
    }

    /// Every node strictly below `id`, breadth-first.
    pub fn descendants_of(&self, id: &NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut queue: VecDeque<&NodeId> = self.children_of(id).collect();
        while let Some(next) = queue.pop_front() {
            out.push(next.clone());
            queue.extend(self.children_of(next));
        }
        out
    }

    /// Append a child under `parent`. Blank content or an unknown parent is a no-op.
    ///
    /// The child starts at the parent's position so the layout pushes it outward.
    pub fn add_child(&mut self, parent: &NodeId, content: &str) -> Option<NodeId> {
        let content = content.trim();
        if content.is_empty() {
            return None;
        }
        let parent_node = self.node(parent)?;
        let mut child = Node::new(content, parent_node.level + 1);
        if parent_node.is_placed() {
            child.set_position(parent_node.position());
        }
        let child_id = child.id.clone();

        self.index.insert(child_id.clone(), self.nodes.len());
        self.nodes.push(child);
        self.links.push(Link::new(parent.clone(), child_id.clone()));
        debug!(parent = %parent, child = %child_id, "added child");
        Some(child_id)
    }

    /// Replace a node's label. Blank content or an unknown node is a no-op.
    pub fn edit_content(&mut self, id: &NodeId, content: &str) -> bool {
        let content = content.trim();
        if content.is_empty() {
            return false;
        }
        match self.index.get(id) {
            Some(&idx) => {
                self.nodes[idx].content = content.to_string();
                true
            }
            None => false,
        }
    }

    /// Remove a non-root node, handing its children to its parent.
    ///
    /// The whole subtree under the removed node moves up one level.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<Removal, TreeError> {
        let idx = *self
            .index
            .get(id)
            .ok_or_else(|| TreeError::UnknownNode(id.clone()))?;
        if self.nodes[idx].is_root() {
            return Err(TreeError::RootRemoval);
        }
        let incoming = self
            .links
            .iter()
            .position(|link| &link.target == id)
            .ok_or_else(|| TreeError::IncomingLinks(id.clone(), 0))?;
        let new_parent = self.links[incoming].source.clone();

        for descendant in self.descendants_of(id) {
            if let Some(&d) = self.index.get(&descendant) {
                self.nodes[d].level = self.nodes[d].level.saturating_sub(1);
            }
        }

        let mut reparented = Vec::new();
        for link in &mut self.links {
            if &link.source == id {
                link.source = new_parent.clone();
                reparented.push(link.target.clone());
            }
        }

        self.links.remove(incoming);
        let removed = self.nodes.remove(idx);
        self.rebuild_index();
        debug!(
            node = %id,
            new_parent = %new_parent,
            reparented = reparented.len(),
            "removed node"
        );
        Ok(Removal {
            removed,
            new_parent,
            reparented,
        })
    }

    /// Reset to a single fresh root and no links.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Replace the whole tree. On error the store is left untouched.
    pub fn load_from(&mut self, nodes: Vec<Node>, links: Vec<Link>) -> Result<(), TreeError> {
        let root = nodes
            .iter()
            .find(|n| n.is_root())
            .map(|n| n.id.clone())
            .ok_or(TreeError::MissingRoot)?;
        let mut candidate = Self {
            nodes,
            links,
            index: HashMap::new(),
            root,
        };
        candidate.rebuild_index();
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }

    /// Check every tree invariant.
    pub fn validate(&self) -> Result<(), TreeError> {
        let mut seen: HashMap<&NodeId, usize> = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if seen.insert(&node.id, 0).is_some() {
                return Err(TreeError::DuplicateId(node.id.clone()));
            }
        }

        let mut roots = self.nodes.iter().filter(|n| n.is_root());
        let root = roots.next().ok_or(TreeError::MissingRoot)?;
        if let Some(second) = roots.next() {
            return Err(TreeError::MultipleRoots(
                root.id.clone(),
                second.id.clone(),
            ));
        }

        for link in &self.links {
            if !seen.contains_key(&link.source) {
                return Err(TreeError::DanglingLink(link.source.clone()));
            }
            match seen.get_mut(&link.target) {
                Some(count) => *count += 1,
                None => return Err(TreeError::DanglingLink(link.target.clone())),
            }
        }
        for node in &self.nodes {
            let expected = usize::from(!node.is_root());
            let actual = seen[&node.id];
            if actual != expected {
                return Err(TreeError::IncomingLinks(node.id.clone(), actual));
            }
        }

        let mut depth: HashMap<&NodeId, u32> = HashMap::with_capacity(self.nodes.len());
        depth.insert(&root.id, 0);
        let mut queue = VecDeque::from([&root.id]);
        while let Some(current) = queue.pop_front() {
            let d = depth[current];
            for child in self.children_of(current) {
                if depth.insert(child, d + 1).is_none() {
                    queue.push_back(child);
                }
            }
        }
        for node in &self.nodes {
            match depth.get(&node.id) {
                None => return Err(TreeError::Unreachable(node.id.clone())),
                Some(&d) if d != node.level => {
                    return Err(TreeError::LevelMismatch {
                        id: node.id.clone(),
                        stored: node.level,
                        depth: d,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.id.clone(), idx))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::Point;
    use proptest::prelude::*;

    fn snapshot(store: &TreeStore) -> (Vec<(NodeId, String, u32)>, Vec<Link>) {
        (
            store
                .nodes()
                .iter()
                .map(|n| (n.id().clone(), n.content().to_string(), n.level()))
                .collect(),
            store.links().to_vec(),
        )
    }

    #[test]
    fn new_store_has_single_root() {
        let store = TreeStore::new();
        assert_eq!(store.node_count(), 1);
        assert!(store.links().is_empty());
        assert_eq!(store.root().level(), 0);
        assert_eq!(store.root().content(), DEFAULT_ROOT_CONTENT);
        store.validate().unwrap();
    }

    #[test]
    fn add_child_links_parent_and_sets_level() {
        let mut store = TreeStore::new();
        let root = store.root().id().clone();
        let a = store.add_child(&root, "  A  ").unwrap();
        let node = store.node(&a).unwrap();
        assert_eq!(node.content(), "A");
        assert_eq!(node.level(), 1);
        assert_eq!(store.parent_of(&a), Some(&root));
        store.validate().unwrap();
    }

    #[test]
    fn add_child_starts_at_parent_position() {
        let mut store = TreeStore::new();
        let root = store.root().id().clone();
        store
            .node_mut(&root)
            .unwrap()
            .set_position(Point::new(40.0, -12.0));
        let a = store.add_child(&root, "A").unwrap();
        assert_eq!(store.node(&a).unwrap().position(), Point::new(40.0, -12.0));
    }

    #[test]
    fn add_child_ignores_blank_content_and_unknown_parent() {
        let mut store = TreeStore::new();
        let root = store.root().id().clone();
        let before = snapshot(&store);
        assert_eq!(store.add_child(&root, "   "), None);
        assert_eq!(store.add_child(&NodeId::from("missing"), "A"), None);
        assert_eq!(snapshot(&store), before);
    }

    #[test]
    fn edit_content_changes_only_the_label() {
        let mut store = TreeStore::new();
        let root = store.root().id().clone();
        let a = store.add_child(&root, "A").unwrap();
        let links_before = store.links().to_vec();

        assert!(store.edit_content(&a, "Renamed"));
        let node = store.node(&a).unwrap();
        assert_eq!(node.content(), "Renamed");
        assert_eq!(node.id(), &a);
        assert_eq!(node.level(), 1);
        assert_eq!(store.links(), links_before.as_slice());

        assert!(!store.edit_content(&a, " \t "));
        assert_eq!(store.node(&a).unwrap().content(), "Renamed");

        assert!(store.edit_content(&a, "  Padded  "));
        assert_eq!(store.node(&a).unwrap().content(), "Padded");
    }

    #[test]
    fn remove_middle_node_scenario() {
        let mut store = TreeStore::new();
        let r = store.root().id().clone();
        let a = store.add_child(&r, "A").unwrap();
        let b = store.add_child(&a, "B").unwrap();

        let removal = store.remove_node(&a).unwrap();
        assert_eq!(removal.new_parent, r);
        assert_eq!(removal.reparented, vec![b.clone()]);

        let ids: Vec<_> = store.nodes().iter().map(|n| n.id().clone()).collect();
        assert_eq!(ids, vec![r.clone(), b.clone()]);
        assert_eq!(store.links(), &[Link::new(r, b.clone())]);
        assert_eq!(store.node(&b).unwrap().level(), 1);
        store.validate().unwrap();
    }

    #[test]
    fn remove_internal_node_reparents_all_children() {
        let mut store = TreeStore::new();
        let p = store.root().id().clone();
        let n = store.add_child(&p, "N").unwrap();
        let c1 = store.add_child(&n, "C1").unwrap();
        let c2 = store.add_child(&n, "C2").unwrap();
        let level_n = store.node(&n).unwrap().level();

        store.remove_node(&n).unwrap();
        assert!(!store.contains(&n));
        assert!(store.links().iter().all(|l| l.source() != &n && l.target() != &n));
        for c in [&c1, &c2] {
            assert_eq!(store.parent_of(c), Some(&p));
            assert_eq!(store.node(c).unwrap().level(), level_n);
        }
    }

    #[test]
    fn remove_relevels_the_whole_subtree() {
        let mut store = TreeStore::new();
        let r = store.root().id().clone();
        let a = store.add_child(&r, "A").unwrap();
        let b = store.add_child(&a, "B").unwrap();
        let c = store.add_child(&b, "C").unwrap();
        let d = store.add_child(&c, "D").unwrap();

        store.remove_node(&a).unwrap();
        assert_eq!(store.node(&b).unwrap().level(), 1);
        assert_eq!(store.node(&c).unwrap().level(), 2);
        assert_eq!(store.node(&d).unwrap().level(), 3);
        store.validate().unwrap();
    }

    #[test]
    fn remove_root_is_rejected_without_change() {
        let mut store = TreeStore::new();
        let r = store.root().id().clone();
        store.add_child(&r, "A").unwrap();
        let before = snapshot(&store);

        assert_eq!(store.remove_node(&r), Err(TreeError::RootRemoval));
        assert_eq!(snapshot(&store), before);
        assert_eq!(TreeError::RootRemoval.to_string(), "cannot remove root node");
    }

    #[test]
    fn remove_unknown_node_is_an_error() {
        let mut store = TreeStore::new();
        let missing = NodeId::from("missing");
        assert_eq!(
            store.remove_node(&missing),
            Err(TreeError::UnknownNode(missing))
        );
    }

    #[test]
    fn add_then_remove_leaf_restores_collections() {
        let mut store = TreeStore::new();
        let r = store.root().id().clone();
        let a = store.add_child(&r, "A").unwrap();
        store.add_child(&a, "B").unwrap();
        let before = snapshot(&store);

        let x = store.add_child(&a, "X").unwrap();
        store.remove_node(&x).unwrap();
        assert_eq!(snapshot(&store), before);
    }

    #[test]
    fn clear_leaves_one_root_and_no_links() {
        let mut store = TreeStore::new();
        let r = store.root().id().clone();
        let a = store.add_child(&r, "A").unwrap();
        store.add_child(&a, "B").unwrap();

        store.clear();
        assert_eq!(store.node_count(), 1);
        assert!(store.links().is_empty());
        assert_eq!(store.root().level(), 0);
        assert_ne!(store.root().id(), &r, "clear mints a fresh root id");
    }

    #[test]
    fn load_from_rejects_invalid_trees_and_keeps_state() {
        let mut store = TreeStore::new();
        let before = snapshot(&store);

        let two_roots = vec![
            Node::restored("a".into(), "a", 0),
            Node::restored("b".into(), "b", 0),
        ];
        assert!(matches!(
            store.load_from(two_roots, Vec::new()),
            Err(TreeError::MultipleRoots(_, _))
        ));

        let orphan = vec![
            Node::restored("r".into(), "r", 0),
            Node::restored("x".into(), "x", 1),
        ];
        assert_eq!(
            store.load_from(orphan, Vec::new()),
            Err(TreeError::IncomingLinks("x".into(), 0))
        );

        let wrong_level = vec![
            Node::restored("r".into(), "r", 0),
            Node::restored("x".into(), "x", 3),
        ];
        assert!(matches!(
            store.load_from(wrong_level, vec![Link::new("r".into(), "x".into())]),
            Err(TreeError::LevelMismatch { .. })
        ));

        assert_eq!(snapshot(&store), before);
    }

    #[test]
    fn load_from_accepts_valid_tree() {
        let mut store = TreeStore::new();
        let nodes = vec![
            Node::restored("x".into(), "child", 1),
            Node::restored("r".into(), "root", 0),
        ];
        store
            .load_from(nodes, vec![Link::new("r".into(), "x".into())])
            .unwrap();
        assert_eq!(store.root().id().as_str(), "r");
        assert_eq!(store.node_count(), 2);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(usize),
        Remove(usize),
        Edit(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => any::<usize>().prop_map(Op::Add),
            2 => any::<usize>().prop_map(Op::Remove),
            1 => any::<usize>().prop_map(Op::Edit),
        ]
    }

    proptest! {
        #[test]
        fn tree_invariant_holds_after_every_operation(ops in prop::collection::vec(op_strategy(), 1..80)) {
            let mut store = TreeStore::new();
            for op in ops {
                let count = store.node_count();
                match op {
                    Op::Add(pick) => {
                        let parent = store.nodes()[pick % count].id().clone();
                        prop_assert!(store.add_child(&parent, "n").is_some());
                    }
                    Op::Remove(pick) => {
                        let target = store.nodes()[pick % count].id().clone();
                        let was_root = store.node(&target).map(Node::is_root).unwrap_or(false);
                        let result = store.remove_node(&target);
                        prop_assert_eq!(result.is_err(), was_root);
                    }
                    Op::Edit(pick) => {
                        let target = store.nodes()[pick % count].id().clone();
                        let links = store.links().to_vec();
                        store.edit_content(&target, "edited");
                        prop_assert_eq!(store.links(), links.as_slice());
                    }
                }
                prop_assert!(store.validate().is_ok(), "{:?}", store.validate());
                prop_assert_eq!(store.nodes().iter().filter(|n| n.is_root()).count(), 1);
            }
        }
    }
}
