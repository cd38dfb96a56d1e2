//! One editable mind map: store, layout, scene and storage together.
//!
//! Every mutation goes through here so the follow-up work happens in one
//! order: store update, scene reconcile, layout reseed, label refresh, save.

use anyhow::Result;
use tracing::{info, warn};

use crate::graph::model::{NodeId, Point};
use crate::graph::store::{Removal, TreeError, TreeStore};
use crate::layout::simulation::{DRAG_ALPHA_TARGET, LayoutConfig, Simulation, Tick};
use crate::persistence::{LoadReport, Storage, rehydrate, snapshot};
use crate::scene::label::CellMeasure;
use crate::scene::palette::Palette;
use crate::scene::reconciler::Scene;
use crate::scene::viewport::CELL_WIDTH;

#[derive(Debug)]
pub struct Diagram<S: Storage> {
    store: TreeStore,
    simulation: Simulation,
    scene: Scene,
    storage: S,
    measure: CellMeasure,
    dragging: Option<NodeId>,
    last_save_error: Option<String>,
}

impl<S: Storage> Diagram<S> {
    /// A diagram holding only a default root. Nothing is saved until the
    /// first mutation.
    pub fn new(storage: S, config: LayoutConfig, palette: Palette, center: Point) -> Self {
        let mut diagram = Self {
            store: TreeStore::new(),
            simulation: Simulation::new(config, center),
            scene: Scene::new(palette),
            storage,
            measure: CellMeasure {
                advance: CELL_WIDTH,
            },
            dragging: None,
            last_save_error: None,
        };
        diagram.relayout();
        diagram
    }

    /// Load whatever the storage holds, or start fresh when it is empty.
    pub fn open(
        storage: S,
        config: LayoutConfig,
        palette: Palette,
        center: Point,
    ) -> Result<(Self, LoadReport)> {
        let mut diagram = Self::new(storage, config, palette, center);
        let report = diagram.reload()?;
        Ok((diagram, report))
    }

    pub fn store(&self) -> &TreeStore {
        &self.store
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Error text from the most recent failed save, cleared by the next
    /// successful one.
    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    pub fn dragging(&self) -> Option<&NodeId> {
        self.dragging.as_ref()
    }

    pub fn add_child(&mut self, parent: &NodeId, content: &str) -> Option<NodeId> {
        let child = self.store.add_child(parent, content)?;
        info!(parent = %parent, child = %child, "add child");
        self.relayout();
        self.save();
        Some(child)
    }

    /// Label change only: no relayout.
    pub fn edit_content(&mut self, id: &NodeId, content: &str) -> bool {
        if !self.store.edit_content(id, content) {
            return false;
        }
        info!(node = %id, "edit content");
        self.scene.refresh(&self.store, &self.measure);
        self.save();
        true
    }

    pub fn remove_node(&mut self, id: &NodeId) -> Result<Removal, TreeError> {
        let removal = self.store.remove_node(id)?;
        info!(node = %id, reparented = removal.reparented.len(), "remove node");
        if self.dragging.as_ref() == Some(id) {
            self.dragging = None;
            self.simulation.set_alpha_target(0.0);
        }
        self.relayout();
        self.save();
        Ok(removal)
    }

    pub fn clear(&mut self) {
        self.store.clear();
        info!("clear map");
        self.dragging = None;
        self.simulation.set_alpha_target(0.0);
        self.relayout();
        self.save();
    }

    /// Replace the tree with the storage's contents. On error nothing changes.
    pub fn reload(&mut self) -> Result<LoadReport> {
        let Some(state) = self.storage.load()? else {
            return Ok(LoadReport::default());
        };
        let (store, report) = rehydrate(&state)?;
        if !report.is_clean() {
            warn!(?report, "repaired saved map while loading");
        }
        self.store = store;
        self.dragging = None;
        self.relayout();
        Ok(report)
    }

    /// Advance the layout one frame and refresh the scene.
    pub fn tick(&mut self) -> Option<Tick> {
        let tick = self.simulation.step(&mut self.store)?;
        self.scene.refresh(&self.store, &self.measure);
        Some(tick)
    }

    /// Run the layout until it cools, for headless rendering.
    pub fn settle(&mut self, max_steps: usize) -> usize {
        let steps = self.simulation.settle(&mut self.store, max_steps);
        self.scene.refresh(&self.store, &self.measure);
        steps
    }

    /// Pin `id` where it is and keep the layout warm while it is held.
    pub fn drag_start(&mut self, id: &NodeId) -> bool {
        let Some(node) = self.store.node_mut(id) else {
            return false;
        };
        let at = node.position();
        node.set_pin(Some(at));
        self.dragging = Some(id.clone());
        self.simulation.set_alpha_target(DRAG_ALPHA_TARGET);
        self.simulation.restart();
        true
    }

    /// Move the held node's pin to `to` (the node's new top-left corner).
    pub fn drag_move(&mut self, to: Point) {
        let Some(id) = &self.dragging else {
            return;
        };
        if let Some(node) = self.store.node_mut(id) {
            node.set_pin(Some(to));
            node.set_position(to);
        }
        self.scene.refresh(&self.store, &self.measure);
    }

    /// Release the held node back to the simulation.
    pub fn drag_end(&mut self) {
        if let Some(id) = self.dragging.take()
            && let Some(node) = self.store.node_mut(&id)
        {
            node.set_pin(None);
        }
        self.simulation.set_alpha_target(0.0);
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.scene.set_palette(palette);
        self.scene.refresh(&self.store, &self.measure);
    }

    /// New force parameters; the layout restarts from current positions.
    pub fn set_layout(&mut self, config: LayoutConfig) {
        self.simulation.configure(config, &mut self.store);
    }

    pub fn set_center(&mut self, center: Point) {
        self.simulation.set_center(center);
        self.simulation.reheat();
    }

    fn relayout(&mut self) {
        self.scene.reconcile(&self.store);
        self.simulation.reseed(&mut self.store);
        self.scene.refresh(&self.store, &self.measure);
    }

    fn save(&mut self) {
        match self.storage.save(&snapshot(&self.store)) {
            Ok(()) => self.last_save_error = None,
            Err(err) => {
                let message = format!("{err:#}");
                warn!(error = %message, "failed to save map");
                self.last_save_error = Some(message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MapState, MemoryStorage};
    use anyhow::bail;

    fn diagram() -> Diagram<MemoryStorage> {
        Diagram::new(
            MemoryStorage::new(),
            LayoutConfig::default(),
            Palette::default(),
            Point::new(0.0, 0.0),
        )
    }

    #[derive(Debug, Default)]
    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn load(&self) -> Result<Option<MapState>> {
            Ok(None)
        }

        fn save(&mut self, _state: &MapState) -> Result<()> {
            bail!("disk full")
        }
    }

    #[test]
    fn mutations_update_scene_and_save() {
        let mut d = diagram();
        let root = d.store().root().id().clone();
        let a = d.add_child(&root, "A").unwrap();
        assert_eq!(d.scene().nodes().len(), 2);
        assert_eq!(d.scene().links().len(), 1);
        assert_eq!(d.storage().saves(), 1);

        assert!(d.edit_content(&a, "Alpha"));
        assert_eq!(d.scene().node_element(&a).unwrap().label, "Alpha");
        assert_eq!(d.storage().saves(), 2);

        d.remove_node(&a).unwrap();
        assert_eq!(d.scene().nodes().len(), 1);
        assert!(d.scene().links().is_empty());
        assert_eq!(d.storage().state().unwrap().nodes.len(), 1);
    }

    #[test]
    fn no_op_mutations_do_not_save() {
        let mut d = diagram();
        let root = d.store().root().id().clone();
        assert_eq!(d.add_child(&root, "   "), None);
        assert!(!d.edit_content(&root, ""));
        assert_eq!(d.storage().saves(), 0);
    }

    #[test]
    fn removing_root_is_surfaced_and_changes_nothing() {
        let mut d = diagram();
        let root = d.store().root().id().clone();
        d.add_child(&root, "A").unwrap();
        let saves = d.storage().saves();

        let err = d.remove_node(&root).unwrap_err();
        assert_eq!(err.to_string(), "cannot remove root node");
        assert_eq!(d.store().node_count(), 2);
        assert_eq!(d.storage().saves(), saves);
    }

    #[test]
    fn add_child_reheats_layout() {
        let mut d = diagram();
        d.settle(10_000);
        assert!(!d.simulation().is_active());
        let root = d.store().root().id().clone();
        d.add_child(&root, "A").unwrap();
        assert!(d.simulation().is_active());
        assert!(d.tick().is_some());
    }

    #[test]
    fn reload_restores_saved_state() {
        let mut d = diagram();
        let root = d.store().root().id().clone();
        let a = d.add_child(&root, "A").unwrap();
        d.add_child(&a, "B").unwrap();
        let saved = d.storage().state().cloned().unwrap();

        let (reopened, report) = Diagram::open(
            MemoryStorage::with_state(saved),
            LayoutConfig::default(),
            Palette::default(),
            Point::new(0.0, 0.0),
        )
        .unwrap();
        assert!(report.is_clean());
        assert_eq!(reopened.store().node_count(), 3);
        assert_eq!(reopened.scene().nodes().len(), 3);
        assert_eq!(reopened.store().root().id(), &root);
    }

    #[test]
    fn failed_save_is_recorded_but_mutation_stands() {
        let mut d = Diagram::new(
            BrokenStorage,
            LayoutConfig::default(),
            Palette::default(),
            Point::new(0.0, 0.0),
        );
        let root = d.store().root().id().clone();
        let a = d.add_child(&root, "A");
        assert!(a.is_some());
        assert_eq!(d.store().node_count(), 2);
        assert_eq!(d.last_save_error(), Some("disk full"));
    }

    #[test]
    fn drag_pins_then_releases() {
        let mut d = diagram();
        let root = d.store().root().id().clone();
        let a = d.add_child(&root, "A").unwrap();
        d.settle(10_000);

        assert!(d.drag_start(&a));
        assert_eq!(d.simulation().alpha_target(), DRAG_ALPHA_TARGET);
        assert!(d.simulation().is_active());

        let to = Point::new(400.0, 300.0);
        d.drag_move(to);
        for _ in 0..5 {
            d.tick();
        }
        assert_eq!(d.store().node(&a).unwrap().position(), to);
        assert_eq!(d.scene().node_element(&a).unwrap().position, to);

        d.drag_end();
        assert_eq!(d.store().node(&a).unwrap().pin(), None);
        assert_eq!(d.simulation().alpha_target(), 0.0);
        assert!(d.dragging().is_none());
    }

    #[test]
    fn clear_resets_to_one_root() {
        let mut d = diagram();
        let root = d.store().root().id().clone();
        let a = d.add_child(&root, "A").unwrap();
        d.add_child(&a, "B").unwrap();
        d.clear();
        assert_eq!(d.store().node_count(), 1);
        assert!(d.store().links().is_empty());
        assert_eq!(d.scene().nodes().len(), 1);
        assert_eq!(d.storage().state().unwrap().links.len(), 0);
    }

    #[test]
    fn palette_change_recolors_immediately() {
        let mut d = diagram();
        d.set_palette(Palette::Orange);
        let root = d.store().root().id().clone();
        assert_eq!(
            d.scene().node_element(&root).unwrap().fill,
            crate::scene::palette::level_color(Palette::Orange, 0)
        );
    }
}
