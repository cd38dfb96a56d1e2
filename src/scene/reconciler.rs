//! Visual elements mirrored from the tree store.
//!
//! `reconcile` diffs the element sets against the store after a mutation;
//! `refresh` copies positions, labels and colors onto the surviving
//! elements every frame. Node elements are keyed by node id and link
//! elements by the id of the link's target.

use std::collections::HashMap;

use tracing::debug;

use crate::graph::model::{NodeId, Point};
use crate::graph::store::TreeStore;
use crate::scene::label::{TextMeasure, fit_label};
use crate::scene::palette::{Palette, Rgb, level_color};

pub const NODE_WIDTH: f64 = 120.0;
pub const NODE_HEIGHT: f64 = 40.0;
pub const LABEL_MAX_WIDTH: f64 = 80.0;
/// Top-left of the label slot, relative to the node's position.
pub const LABEL_OFFSET: Point = Point::new(8.0, 20.0);
pub const AFFORDANCE_WIDTH: f64 = 8.0;
pub const AFFORDANCE_HEIGHT: f64 = 20.0;
/// Link endpoints attach at the middle of the node box.
pub const LINK_ANCHOR: Point = Point::new(NODE_WIDTH / 2.0, NODE_HEIGHT / 2.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffordanceKind {
    AddChild,
    Edit,
    Delete,
}

impl AffordanceKind {
    pub const ALL: [Self; 3] = [Self::AddChild, Self::Edit, Self::Delete];

    pub fn glyph(self) -> char {
        match self {
            Self::AddChild => '+',
            Self::Edit => '✎',
            Self::Delete => '✕',
        }
    }

    pub fn offset(self) -> Point {
        match self {
            Self::AddChild => Point::new(96.0, 0.0),
            Self::Edit => Point::new(104.0, 0.0),
            Self::Delete => Point::new(112.0, 0.0),
        }
    }
}

/// Clickable control drawn on a node box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affordance {
    pub kind: AffordanceKind,
    pub offset: Point,
}

impl Affordance {
    fn contains(&self, local: Point) -> bool {
        local.x >= self.offset.x
            && local.x < self.offset.x + AFFORDANCE_WIDTH
            && local.y >= self.offset.y
            && local.y < self.offset.y + AFFORDANCE_HEIGHT
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hit {
    Affordance(NodeId, AffordanceKind),
    Node(NodeId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeElement {
    pub element: ElementId,
    pub node: NodeId,
    pub position: Point,
    /// Possibly truncated text shown in the box.
    pub label: String,
    /// Full content, shown on hover/focus.
    pub title: String,
    pub fill: Rgb,
    pub level: u32,
    pub affordances: [Affordance; 3],
}

impl NodeElement {
    fn enter(element: ElementId, node: NodeId) -> Self {
        Self {
            element,
            node,
            position: Point::default(),
            label: String::new(),
            title: String::new(),
            fill: Rgb(0, 0, 0),
            level: 0,
            affordances: AffordanceKind::ALL.map(|kind| Affordance {
                kind,
                offset: kind.offset(),
            }),
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.position.x
            && p.x < self.position.x + NODE_WIDTH
            && p.y >= self.position.y
            && p.y < self.position.y + NODE_HEIGHT
    }

    pub fn label_origin(&self) -> Point {
        self.position.offset(LABEL_OFFSET.x, LABEL_OFFSET.y)
    }

    fn hit(&self, p: Point) -> Option<Hit> {
        if !self.contains(p) {
            return None;
        }
        let local = Point::new(p.x - self.position.x, p.y - self.position.y);
        let hit = match self.affordances.iter().find(|a| a.contains(local)) {
            Some(a) => Hit::Affordance(self.node.clone(), a.kind),
            None => Hit::Node(self.node.clone()),
        };
        Some(hit)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkElement {
    pub element: ElementId,
    pub target: NodeId,
    pub source: NodeId,
    pub from: Point,
    pub to: Point,
}

/// Element churn for one kind of element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Churn {
    pub entered: usize,
    pub exited: usize,
    pub kept: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub nodes: Churn,
    pub links: Churn,
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: Vec<NodeElement>,
    links: Vec<LinkElement>,
    next_element: u64,
    palette: Palette,
}

impl Scene {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            ..Self::default()
        }
    }

    /// Node elements in store order; later elements draw on top.
    pub fn nodes(&self) -> &[NodeElement] {
        &self.nodes
    }

    pub fn links(&self) -> &[LinkElement] {
        &self.links
    }

    pub fn node_element(&self, id: &NodeId) -> Option<&NodeElement> {
        self.nodes.iter().find(|el| &el.node == id)
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    /// Takes effect on the next `refresh`.
    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    fn mint(&mut self) -> ElementId {
        self.next_element += 1;
        ElementId(self.next_element)
    }

    /// Enter elements for new entities, drop elements whose entity is gone,
    /// and keep the rest with their element ids.
    pub fn reconcile(&mut self, store: &TreeStore) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let mut old_nodes: HashMap<NodeId, NodeElement> = self
            .nodes
            .drain(..)
            .map(|el| (el.node.clone(), el))
            .collect();
        let mut nodes = Vec::with_capacity(store.node_count());
        for node in store.nodes() {
            match old_nodes.remove(node.id()) {
                Some(el) => {
                    report.nodes.kept += 1;
                    nodes.push(el);
                }
                None => {
                    report.nodes.entered += 1;
                    let element = self.mint();
                    nodes.push(NodeElement::enter(element, node.id().clone()));
                }
            }
        }
        report.nodes.exited = old_nodes.len();
        self.nodes = nodes;

        let mut old_links: HashMap<NodeId, LinkElement> = self
            .links
            .drain(..)
            .map(|el| (el.target.clone(), el))
            .collect();
        let mut links = Vec::with_capacity(store.links().len());
        for link in store.links() {
            match old_links.remove(link.target()) {
                Some(mut el) => {
                    report.links.kept += 1;
                    el.source = link.source().clone();
                    links.push(el);
                }
                None => {
                    report.links.entered += 1;
                    let element = self.mint();
                    links.push(LinkElement {
                        element,
                        target: link.target().clone(),
                        source: link.source().clone(),
                        from: Point::default(),
                        to: Point::default(),
                    });
                }
            }
        }
        report.links.exited = old_links.len();
        self.links = links;

        debug!(?report, "reconciled scene");
        report
    }

    /// Per-frame attribute update from the store's current state.
    pub fn refresh(&mut self, store: &TreeStore, measure: &impl TextMeasure) {
        for el in &mut self.nodes {
            let Some(node) = store.node(&el.node) else {
                continue;
            };
            el.position = node.position();
            el.level = node.level();
            el.fill = level_color(self.palette, node.level());
            if el.title != node.content() {
                el.title = node.content().to_string();
            }
            el.label = fit_label(node.content(), &el.label, LABEL_MAX_WIDTH, measure);
        }
        for el in &mut self.links {
            if let (Some(source), Some(target)) = (store.node(&el.source), store.node(&el.target)) {
                el.from = source.position().offset(LINK_ANCHOR.x, LINK_ANCHOR.y);
                el.to = target.position().offset(LINK_ANCHOR.x, LINK_ANCHOR.y);
            }
        }
    }

    /// Topmost element under `p`. Affordances win over the box they sit on.
    pub fn hit_test(&self, p: Point) -> Option<Hit> {
        self.nodes.iter().rev().find_map(|el| el.hit(p))
    }

    /// Bounding box `(min, max)` of all node boxes.
    pub fn bounds(&self) -> Option<(Point, Point)> {
        let first = self.nodes.first()?;
        let mut min = first.position;
        let mut max = first.position.offset(NODE_WIDTH, NODE_HEIGHT);
        for el in &self.nodes[1..] {
            min.x = min.x.min(el.position.x);
            min.y = min.y.min(el.position.y);
            max.x = max.x.max(el.position.x + NODE_WIDTH);
            max.y = max.y.max(el.position.y + NODE_HEIGHT);
        }
        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::label::CellMeasure;
    use crate::scene::palette::palette_color;

    const MEASURE: CellMeasure = CellMeasure { advance: 8.0 };

    fn chain() -> (TreeStore, NodeId, NodeId, NodeId) {
        let mut store = TreeStore::new();
        let r = store.root().id().clone();
        let a = store.add_child(&r, "A").unwrap();
        let b = store.add_child(&a, "B").unwrap();
        (store, r, a, b)
    }

    #[test]
    fn first_reconcile_enters_everything() {
        let (store, ..) = chain();
        let mut scene = Scene::default();
        let report = scene.reconcile(&store);
        assert_eq!(
            report.nodes,
            Churn {
                entered: 3,
                exited: 0,
                kept: 0
            }
        );
        assert_eq!(report.links.entered, 2);
        assert_eq!(scene.nodes().len(), 3);
        assert_eq!(scene.links().len(), 2);
    }

    #[test]
    fn removal_exits_only_the_vanished_elements() {
        let (mut store, r, a, b) = chain();
        let mut scene = Scene::default();
        scene.reconcile(&store);
        let b_element = scene.node_element(&b).unwrap().element;
        let b_link = scene.links().iter().find(|l| l.target == b).unwrap().element;

        store.remove_node(&a).unwrap();
        let report = scene.reconcile(&store);
        assert_eq!(report.nodes.exited, 1);
        assert_eq!(report.nodes.kept, 2);
        assert_eq!(report.nodes.entered, 0);
        assert_eq!(report.links.exited, 1);
        assert_eq!(report.links.kept, 1);

        assert_eq!(scene.node_element(&b).unwrap().element, b_element);
        let link = &scene.links()[0];
        assert_eq!(link.element, b_link, "link keyed by target survives reparenting");
        assert_eq!(link.source, r);
    }

    #[test]
    fn element_ids_are_never_reused() {
        let (mut store, r, ..) = chain();
        let mut scene = Scene::default();
        scene.reconcile(&store);
        let max_before = scene.nodes().iter().map(|e| e.element).max().unwrap();

        store.clear();
        scene.reconcile(&store);
        let root = store.root().id().clone();
        store.add_child(&root, "fresh").unwrap();
        scene.reconcile(&store);
        assert!(scene.nodes().iter().all(|e| e.element > max_before));
        assert!(scene.node_element(&r).is_none());
    }

    #[test]
    fn refresh_copies_position_label_and_fill() {
        let (mut store, r, a, _) = chain();
        store.edit_content(&a, "a rather long label");
        store
            .node_mut(&a)
            .unwrap()
            .set_position(Point::new(10.0, 30.0));
        let mut scene = Scene::new(Palette::Green);
        scene.reconcile(&store);
        scene.refresh(&store, &MEASURE);

        let el = scene.node_element(&a).unwrap();
        assert_eq!(el.position, Point::new(10.0, 30.0));
        assert_eq!(el.label, "a rather …");
        assert_eq!(el.title, "a rather long label");
        assert_eq!(el.fill, palette_color(Palette::Green, 5));
        assert_eq!(scene.node_element(&r).unwrap().fill, palette_color(Palette::Green, 6));

        let link = scene.links().iter().find(|l| l.target == a).unwrap();
        assert_eq!(link.to, Point::new(70.0, 50.0));
    }

    #[test]
    fn hit_test_prefers_affordances_and_topmost_node() {
        let (mut store, _, a, b) = chain();
        store.node_mut(&a).unwrap().set_position(Point::new(0.0, 0.0));
        store.node_mut(&b).unwrap().set_position(Point::new(50.0, 0.0));
        let mut scene = Scene::default();
        scene.reconcile(&store);
        scene.refresh(&store, &MEASURE);

        // b is drawn after a, so it wins where the boxes overlap.
        assert_eq!(scene.hit_test(Point::new(60.0, 30.0)), Some(Hit::Node(b.clone())));
        assert_eq!(scene.hit_test(Point::new(20.0, 30.0)), Some(Hit::Node(a.clone())));
        assert_eq!(
            scene.hit_test(Point::new(50.0 + 113.0, 5.0)),
            Some(Hit::Affordance(b.clone(), AffordanceKind::Delete))
        );
        assert_eq!(
            scene.hit_test(Point::new(50.0 + 97.0, 5.0)),
            Some(Hit::Affordance(b, AffordanceKind::AddChild))
        );
        assert_eq!(scene.hit_test(Point::new(-5.0, -5.0)), None);
    }
}
