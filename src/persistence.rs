//! Saving and loading the tree as a JSON blob of nodes and links.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::graph::model::{Link, Node, NodeId, Point};
use crate::graph::store::{TreeError, TreeStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub content: String,
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub source: NodeId,
    pub target: NodeId,
}

/// The persisted form of a whole map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapState {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub links: Vec<LinkRecord>,
}

pub trait Storage {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<MapState>>;
    fn save(&mut self, state: &MapState) -> Result<()>;
}

/// JSON file storage, normally `.mindmap/map.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for FileStorage {
    fn load(&self) -> Result<Option<MapState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let state = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        Ok(Some(state))
    }

    fn save(&mut self, state: &MapState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, text + "\n")
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}

/// In-memory storage for demo mode and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Option<MapState>,
    saves: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: MapState) -> Self {
        Self {
            state: Some(state),
            saves: 0,
        }
    }

    pub fn state(&self) -> Option<&MapState> {
        self.state.as_ref()
    }

    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<Option<MapState>> {
        Ok(self.state.clone())
    }

    fn save(&mut self, state: &MapState) -> Result<()> {
        self.state = Some(state.clone());
        self.saves += 1;
        Ok(())
    }
}

pub fn snapshot(store: &TreeStore) -> MapState {
    MapState {
        nodes: store
            .nodes()
            .iter()
            .map(|node| {
                let position = node.is_placed().then_some(node.position());
                NodeRecord {
                    id: node.id().clone(),
                    content: node.content().to_string(),
                    level: node.level(),
                    x: position.map(|p| p.x),
                    y: position.map(|p| p.y),
                }
            })
            .collect(),
        links: store
            .links()
            .iter()
            .map(|link| LinkRecord {
                source: link.source().clone(),
                target: link.target().clone(),
            })
            .collect(),
    }
}

/// What had to be repaired while loading a saved map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub dropped_nodes: usize,
    pub dropped_links: usize,
    pub relevelled: usize,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Build a valid tree from a saved state.
///
/// Repairs rather than rejects: duplicate ids keep their first record,
/// links to unknown nodes or onto the root are dropped, a node keeps only
/// its first incoming link, nodes not reachable from the root are dropped,
/// and levels are recomputed from the links. An empty state yields a fresh
/// default root. A non-empty state with no level-0 node that lacks an
/// incoming link is an error.
pub fn rehydrate(state: &MapState) -> Result<(TreeStore, LoadReport)> {
    let mut report = LoadReport::default();
    if state.nodes.is_empty() {
        return Ok((TreeStore::new(), report));
    }

    let mut records: Vec<&NodeRecord> = Vec::with_capacity(state.nodes.len());
    let mut known: HashSet<&NodeId> = HashSet::with_capacity(state.nodes.len());
    for record in &state.nodes {
        if known.insert(&record.id) {
            records.push(record);
        } else {
            warn!(node = %record.id, "dropping duplicate node record");
            report.dropped_nodes += 1;
        }
    }

    let targeted: HashSet<&NodeId> = state
        .links
        .iter()
        .filter(|l| known.contains(&l.source) && l.source != l.target)
        .map(|l| &l.target)
        .collect();
    let root = records
        .iter()
        .find(|r| r.level == 0 && !targeted.contains(&r.id))
        .map(|r| r.id.clone())
        .ok_or(TreeError::MissingRoot)?;

    let mut has_parent: HashSet<&NodeId> = HashSet::new();
    let mut kept: Vec<&LinkRecord> = Vec::with_capacity(state.links.len());
    for link in &state.links {
        let usable = known.contains(&link.source)
            && known.contains(&link.target)
            && link.source != link.target
            && link.target != root
            && !has_parent.contains(&link.target);
        if usable {
            has_parent.insert(&link.target);
            kept.push(link);
        } else {
            warn!(source = %link.source, target = %link.target, "dropping unusable link");
            report.dropped_links += 1;
        }
    }

    let mut depth: HashMap<&NodeId, u32> = HashMap::from([(&root, 0)]);
    let mut queue = VecDeque::from([&root]);
    while let Some(current) = queue.pop_front() {
        let d = depth[current];
        for link in kept.iter().filter(|l| &l.source == current) {
            if !depth.contains_key(&link.target) {
                depth.insert(&link.target, d + 1);
                queue.push_back(&link.target);
            }
        }
    }

    let mut nodes = Vec::with_capacity(depth.len());
    for record in records {
        let Some(&level) = depth.get(&record.id) else {
            warn!(node = %record.id, "dropping node unreachable from the root");
            report.dropped_nodes += 1;
            continue;
        };
        if level != record.level {
            report.relevelled += 1;
        }
        let mut node = Node::restored(record.id.clone(), record.content.clone(), level);
        if let (Some(x), Some(y)) = (record.x, record.y) {
            node.set_position(Point::new(x, y));
        }
        nodes.push(node);
    }

    let before = kept.len();
    let links: Vec<Link> = kept
        .into_iter()
        .filter(|l| depth.contains_key(&l.source) && depth.contains_key(&l.target))
        .map(|l| Link::new(l.source.clone(), l.target.clone()))
        .collect();
    report.dropped_links += before - links.len();

    let mut store = TreeStore::new();
    store.load_from(nodes, links)?;
    Ok((store, report))
}
