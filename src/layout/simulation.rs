use std::collections::HashMap;
use std::f64::consts::PI;

use tracing::debug;

use crate::graph::model::{NodeId, Point};
use crate::graph::store::TreeStore;
use crate::layout::forces::{
    Body, CenterForce, CollideForce, Force, Jiggle, LinkForce, ManyBodyForce,
};

pub const DEFAULT_LINK_DISTANCE: f64 = 140.0;
pub const DEFAULT_CHARGE: f64 = -60.0;
pub const DEFAULT_COLLIDE_RADIUS: f64 = 60.0;

/// Alpha given to the simulation while a node is being dragged.
pub const DRAG_ALPHA_TARGET: f64 = 0.3;

const INITIAL_RADIUS: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub link_distance: f64,
    pub charge: f64,
    pub collide_radius: f64,
    pub alpha_min: f64,
    pub alpha_decay: f64,
    pub velocity_decay: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let alpha_min = 0.001;
        Self {
            link_distance: DEFAULT_LINK_DISTANCE,
            charge: DEFAULT_CHARGE,
            collide_radius: DEFAULT_COLLIDE_RADIUS,
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
        }
    }
}

/// The layout's centering point for a viewport of the given size.
pub fn viewport_center(width: f64, height: f64) -> Point {
    Point::new(width / 2.0 - 50.0, height / 2.0 - 20.0)
}

/// Emitted once per simulation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub index: u64,
    pub alpha: f64,
    /// Free nodes whose position changed this step.
    pub moved: usize,
}

/// Forces + integrator. Positions live in the tree store; the simulation
/// owns velocities and energy, keyed by node id.
#[derive(Debug)]
pub struct Simulation {
    config: LayoutConfig,
    center_point: Point,
    alpha: f64,
    alpha_target: f64,
    ids: Vec<NodeId>,
    velocities: HashMap<NodeId, (f64, f64)>,
    links: Vec<(usize, usize)>,
    link: LinkForce,
    charge: ManyBodyForce,
    center: CenterForce,
    collide: CollideForce,
    jiggle: Jiggle,
    ticks: u64,
}

impl Simulation {
    pub fn new(config: LayoutConfig, center: Point) -> Self {
        Self {
            link: LinkForce::new(config.link_distance),
            charge: ManyBodyForce::new(config.charge),
            center: CenterForce::new(center),
            collide: CollideForce::new(config.collide_radius),
            center_point: center,
            config,
            alpha: 1.0,
            alpha_target: 0.0,
            ids: Vec::new(),
            velocities: HashMap::new(),
            links: Vec::new(),
            jiggle: Jiggle::default(),
            ticks: 0,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f64 {
        self.alpha_target
    }

    pub fn set_alpha_target(&mut self, target: f64) {
        self.alpha_target = target;
    }

    pub fn set_center(&mut self, center: Point) {
        self.center_point = center;
        self.center.set_center(center);
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Swap the force parameters and restart the layout with them.
    pub fn configure(&mut self, config: LayoutConfig, store: &mut TreeStore) {
        self.link = LinkForce::new(config.link_distance);
        self.charge = ManyBodyForce::new(config.charge);
        self.collide = CollideForce::new(config.collide_radius);
        self.config = config;
        self.reseed(store);
    }

    /// Still moving: energy above the floor, or held up by a target.
    pub fn is_active(&self) -> bool {
        self.alpha >= self.config.alpha_min
    }

    /// Reset energy so the layout resumes moving.
    pub fn reheat(&mut self) {
        self.alpha = 1.0;
    }

    /// Like `reheat`, but keeps the current energy if it is already higher
    /// than `alpha_target` (drag start).
    pub fn restart(&mut self) {
        if !self.is_active() {
            self.alpha = self.alpha.max(self.alpha_target);
        }
    }

    /// Re-resolve the node and link sets from the store and reheat.
    ///
    /// Velocities survive for nodes that still exist. Unplaced nodes get a
    /// spiral starting position around the center.
    pub fn reseed(&mut self, store: &mut TreeStore) {
        let center = self.center_point;
        let mut unplaced = 0usize;
        for (i, node) in store.nodes_mut().enumerate() {
            if !node.is_placed() {
                let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
                let angle = i as f64 * PI * (3.0 - 5f64.sqrt());
                node.set_position(Point::new(
                    center.x + radius * angle.cos(),
                    center.y + radius * angle.sin(),
                ));
                unplaced += 1;
            }
        }

        self.ids = store.nodes().iter().map(|n| n.id().clone()).collect();
        let index: HashMap<&NodeId, usize> =
            self.ids.iter().enumerate().map(|(i, id)| (id, i)).collect();
        self.links = store
            .links()
            .iter()
            .filter_map(|link| Some((*index.get(link.source())?, *index.get(link.target())?)))
            .collect();
        self.velocities.retain(|id, _| index.contains_key(id));

        let bodies = self.gather(store);
        let Self {
            link,
            charge,
            center,
            collide,
            links,
            ..
        } = self;
        let forces: [&mut dyn Force; 4] = [link, charge, center, collide];
        for force in forces {
            force.initialize(&bodies, &links[..]);
        }
        self.reheat();
        debug!(
            nodes = self.ids.len(),
            links = self.links.len(),
            unplaced,
            "reseeded layout"
        );
    }

    /// Advance one step. Returns `None` once the layout has cooled.
    pub fn step(&mut self, store: &mut TreeStore) -> Option<Tick> {
        if !self.is_active() {
            return None;
        }
        if self.ids.len() != store.node_count() || self.ids.iter().any(|id| !store.contains(id)) {
            self.reseed(store);
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        let alpha = self.alpha;

        let mut bodies = self.gather(store);
        let Self {
            link,
            charge,
            center,
            collide,
            jiggle,
            ..
        } = self;
        let forces: [&mut dyn Force; 4] = [link, charge, center, collide];
        for force in forces {
            force.apply(&mut bodies, alpha, jiggle);
        }

        let keep = 1.0 - self.config.velocity_decay;
        let mut moved = 0;
        for (id, body) in self.ids.iter().zip(bodies.iter_mut()) {
            match body.fixed {
                Some(pin) => {
                    body.x = pin.x;
                    body.y = pin.y;
                    body.vx = 0.0;
                    body.vy = 0.0;
                }
                None => {
                    body.vx *= keep;
                    body.vy *= keep;
                    body.x += body.vx;
                    body.y += body.vy;
                    if body.vx != 0.0 || body.vy != 0.0 {
                        moved += 1;
                    }
                }
            }
            self.velocities.insert(id.clone(), (body.vx, body.vy));
            if let Some(node) = store.node_mut(id) {
                node.set_position(Point::new(body.x, body.y));
            }
        }

        self.ticks += 1;
        Some(Tick {
            index: self.ticks,
            alpha,
            moved,
        })
    }

    /// Run until cooled or `max_steps` is reached; returns steps taken.
    pub fn settle(&mut self, store: &mut TreeStore, max_steps: usize) -> usize {
        let mut steps = 0;
        while steps < max_steps && self.step(store).is_some() {
            steps += 1;
        }
        steps
    }

    fn gather(&self, store: &TreeStore) -> Vec<Body> {
        self.ids
            .iter()
            .map(|id| {
                let node = store.node(id);
                let mut body = Body::at(node.map(|n| n.position()).unwrap_or_default());
                if let Some(&(vx, vy)) = self.velocities.get(id) {
                    body.vx = vx;
                    body.vy = vy;
                }
                body.fixed = node.and_then(|n| n.pin());
                body
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distance(a: Point, b: Point) -> f64 {
        ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
    }

    fn store_with_chain() -> (TreeStore, NodeId, NodeId) {
        let mut store = TreeStore::new();
        let root = store.root().id().clone();
        let a = store.add_child(&root, "A").unwrap();
        (store, root, a)
    }

    #[test]
    fn default_alpha_decay_cools_in_about_300_steps() {
        let (mut store, _, _) = store_with_chain();
        let mut sim = Simulation::new(LayoutConfig::default(), Point::new(0.0, 0.0));
        sim.reseed(&mut store);
        let steps = sim.settle(&mut store, 10_000);
        assert!((290..=310).contains(&steps), "took {steps} steps");
        assert!(!sim.is_active());
        assert_eq!(sim.step(&mut store), None);
    }

    #[test]
    fn reseed_places_unplaced_nodes_and_reheats() {
        let (mut store, root, a) = store_with_chain();
        let mut sim = Simulation::new(LayoutConfig::default(), Point::new(100.0, 50.0));
        sim.reseed(&mut store);
        sim.settle(&mut store, 10_000);
        assert!(!sim.is_active());

        assert!(store.node(&root).unwrap().is_placed());
        assert!(store.node(&a).unwrap().is_placed());

        store.add_child(&a, "B").unwrap();
        sim.reseed(&mut store);
        assert_eq!(sim.alpha(), 1.0);
        assert!(sim.step(&mut store).is_some());
    }

    #[test]
    fn settled_link_length_approaches_target_distance() {
        let (mut store, root, a) = store_with_chain();
        let mut sim = Simulation::new(LayoutConfig::default(), Point::new(0.0, 0.0));
        sim.reseed(&mut store);
        sim.settle(&mut store, 10_000);
        let d = distance(
            store.node(&root).unwrap().position(),
            store.node(&a).unwrap().position(),
        );
        assert!((100.0..=200.0).contains(&d), "link length {d}");
    }

    #[test]
    fn configure_applies_new_link_distance() {
        let (mut store, root, a) = store_with_chain();
        let mut sim = Simulation::new(LayoutConfig::default(), Point::new(0.0, 0.0));
        sim.reseed(&mut store);
        sim.settle(&mut store, 10_000);
        let before = distance(
            store.node(&root).unwrap().position(),
            store.node(&a).unwrap().position(),
        );

        let wide = LayoutConfig {
            link_distance: 400.0,
            ..LayoutConfig::default()
        };
        sim.configure(wide, &mut store);
        assert!(sim.is_active());
        assert_eq!(sim.config().link_distance, 400.0);
        sim.settle(&mut store, 10_000);
        let after = distance(
            store.node(&root).unwrap().position(),
            store.node(&a).unwrap().position(),
        );
        assert!(after > before + 100.0, "before {before}, after {after}");
    }

    #[test]
    fn coincident_children_are_pushed_apart() {
        let mut store = TreeStore::new();
        let root = store.root().id().clone();
        store
            .node_mut(&root)
            .unwrap()
            .set_position(Point::new(0.0, 0.0));
        let a = store.add_child(&root, "A").unwrap();
        let b = store.add_child(&root, "B").unwrap();
        let mut sim = Simulation::new(LayoutConfig::default(), Point::new(0.0, 0.0));
        sim.reseed(&mut store);
        sim.settle(&mut store, 10_000);
        let d = distance(
            store.node(&a).unwrap().position(),
            store.node(&b).unwrap().position(),
        );
        assert!(d > 60.0, "siblings only {d} apart");
    }

    /// One step with the root pinned at the origin and `A` at (300, 40);
    /// returns where `A` ends up.
    fn step_beside_pinned_root(charge: f64) -> (Point, Point) {
        let (mut store, root, a) = store_with_chain();
        let pin = Point::new(0.0, 0.0);
        store.node_mut(&root).unwrap().set_position(pin);
        store.node_mut(&a).unwrap().set_position(Point::new(300.0, 40.0));
        let config = LayoutConfig {
            charge,
            ..LayoutConfig::default()
        };
        let mut sim = Simulation::new(config, Point::new(0.0, 0.0));
        sim.reseed(&mut store);
        store.node_mut(&root).unwrap().set_pin(Some(pin));
        sim.step(&mut store).unwrap();
        (
            store.node(&root).unwrap().position(),
            store.node(&a).unwrap().position(),
        )
    }

    #[test]
    fn pinned_node_stays_put_but_still_pushes_others() {
        let (root_free, a_free) = step_beside_pinned_root(0.0);
        let (root_pushing, a_pushed) = step_beside_pinned_root(DEFAULT_CHARGE);
        assert_eq!(root_free, Point::new(0.0, 0.0));
        assert_eq!(root_pushing, Point::new(0.0, 0.0));
        // Only the pinned root's repulsion differs between the two runs.
        assert!(a_pushed.x > a_free.x, "{a_pushed:?} vs {a_free:?}");
        assert!(a_pushed.y > a_free.y, "{a_pushed:?} vs {a_free:?}");
    }

    #[test]
    fn alpha_target_keeps_simulation_running() {
        let (mut store, _, _) = store_with_chain();
        let mut sim = Simulation::new(LayoutConfig::default(), Point::new(0.0, 0.0));
        sim.reseed(&mut store);
        sim.settle(&mut store, 10_000);
        assert!(!sim.is_active());

        sim.set_alpha_target(DRAG_ALPHA_TARGET);
        sim.restart();
        for _ in 0..1000 {
            assert!(sim.step(&mut store).is_some());
        }
        assert!((sim.alpha() - DRAG_ALPHA_TARGET).abs() < 0.01);

        sim.set_alpha_target(0.0);
        assert!(sim.settle(&mut store, 10_000) > 0);
        assert!(!sim.is_active());
    }

    #[test]
    fn step_reseeds_when_store_changed_underneath() {
        let (mut store, root, _) = store_with_chain();
        let mut sim = Simulation::new(LayoutConfig::default(), Point::new(0.0, 0.0));
        sim.reseed(&mut store);
        store.add_child(&root, "late").unwrap();
        assert!(sim.step(&mut store).is_some());
        assert!(store.nodes().iter().all(|n| n.is_placed()));
    }
}
