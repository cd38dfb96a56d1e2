//! The four forces the simulation composes each step.
//!
//! Forces only touch velocities, except centering which translates positions
//! directly. Each force sees the same `alpha` for a step.

use crate::graph::model::Point;

/// Kinematic state of one node for the duration of a step.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub fixed: Option<Point>,
}

impl Body {
    pub fn at(position: Point) -> Self {
        Self {
            x: position.x,
            y: position.y,
            vx: 0.0,
            vy: 0.0,
            fixed: None,
        }
    }
}

/// Deterministic source for the tiny offsets that separate coincident nodes.
#[derive(Debug, Clone)]
pub struct Jiggle {
    state: u64,
}

impl Default for Jiggle {
    fn default() -> Self {
        Self { state: 1 }
    }
}

impl Jiggle {
    const A: u64 = 1_664_525;
    const C: u64 = 1_013_904_223;
    const M: u64 = 1 << 32;

    fn next_unit(&mut self) -> f64 {
        self.state = (Self::A * self.state + Self::C) % Self::M;
        self.state as f64 / Self::M as f64
    }

    pub fn next(&mut self) -> f64 {
        (self.next_unit() - 0.5) * 1e-6
    }
}

/// A force re-initialized on every reseed and applied on every step.
pub trait Force: std::fmt::Debug {
    /// Called when the node/link set changes. `links` are (source, target)
    /// indices into `bodies`.
    fn initialize(&mut self, bodies: &[Body], links: &[(usize, usize)]);

    fn apply(&mut self, bodies: &mut [Body], alpha: f64, jiggle: &mut Jiggle);
}

/// Spring along each link toward a fixed separation.
#[derive(Debug, Clone)]
pub struct LinkForce {
    distance: f64,
    links: Vec<(usize, usize)>,
    strengths: Vec<f64>,
    bias: Vec<f64>,
}

impl LinkForce {
    pub fn new(distance: f64) -> Self {
        Self {
            distance,
            links: Vec::new(),
            strengths: Vec::new(),
            bias: Vec::new(),
        }
    }
}

impl Force for LinkForce {
    fn initialize(&mut self, bodies: &[Body], links: &[(usize, usize)]) {
        let mut count = vec![0usize; bodies.len()];
        for &(s, t) in links {
            count[s] += 1;
            count[t] += 1;
        }
        self.links = links.to_vec();
        self.bias = links
            .iter()
            .map(|&(s, t)| count[s] as f64 / (count[s] + count[t]) as f64)
            .collect();
        self.strengths = links
            .iter()
            .map(|&(s, t)| 1.0 / count[s].min(count[t]) as f64)
            .collect();
    }

    fn apply(&mut self, bodies: &mut [Body], alpha: f64, jiggle: &mut Jiggle) {
        for (i, &(s, t)) in self.links.iter().enumerate() {
            let (source, target) = (&bodies[s], &bodies[t]);
            let mut x = target.x + target.vx - source.x - source.vx;
            let mut y = target.y + target.vy - source.y - source.vy;
            if x == 0.0 {
                x = jiggle.next();
            }
            if y == 0.0 {
                y = jiggle.next();
            }
            let mut l = (x * x + y * y).sqrt();
            l = (l - self.distance) / l * alpha * self.strengths[i];
            x *= l;
            y *= l;

            let b = self.bias[i];
            bodies[t].vx -= x * b;
            bodies[t].vy -= y * b;
            bodies[s].vx += x * (1.0 - b);
            bodies[s].vy += y * (1.0 - b);
        }
    }
}

/// Charge-like interaction between every pair of nodes. Negative strength repels.
#[derive(Debug, Clone)]
pub struct ManyBodyForce {
    strength: f64,
    distance_min2: f64,
}

impl ManyBodyForce {
    pub fn new(strength: f64) -> Self {
        Self {
            strength,
            distance_min2: 1.0,
        }
    }
}

impl Force for ManyBodyForce {
    fn initialize(&mut self, _bodies: &[Body], _links: &[(usize, usize)]) {}

    fn apply(&mut self, bodies: &mut [Body], alpha: f64, jiggle: &mut Jiggle) {
        let n = bodies.len();
        let mut dv = vec![(0.0, 0.0); n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let mut x = bodies[j].x - bodies[i].x;
                let mut y = bodies[j].y - bodies[i].y;
                if x == 0.0 {
                    x = jiggle.next();
                }
                if y == 0.0 {
                    y = jiggle.next();
                }
                let mut l = x * x + y * y;
                if l < self.distance_min2 {
                    l = (self.distance_min2 * l).sqrt();
                }
                let w = self.strength * alpha / l;
                dv[i].0 += x * w;
                dv[i].1 += y * w;
            }
        }
        for (body, (dx, dy)) in bodies.iter_mut().zip(dv) {
            body.vx += dx;
            body.vy += dy;
        }
    }
}

/// Translates the layout so its mean position sits on `center`.
#[derive(Debug, Clone)]
pub struct CenterForce {
    center: Point,
    strength: f64,
}

impl CenterForce {
    pub fn new(center: Point) -> Self {
        Self {
            center,
            strength: 1.0,
        }
    }

    pub fn set_center(&mut self, center: Point) {
        self.center = center;
    }
}

impl Force for CenterForce {
    fn initialize(&mut self, _bodies: &[Body], _links: &[(usize, usize)]) {}

    fn apply(&mut self, bodies: &mut [Body], _alpha: f64, _jiggle: &mut Jiggle) {
        if bodies.is_empty() {
            return;
        }
        let n = bodies.len() as f64;
        let (sx, sy) = bodies
            .iter()
            .fold((0.0, 0.0), |(sx, sy), b| (sx + b.x, sy + b.y));
        let dx = (sx / n - self.center.x) * self.strength;
        let dy = (sy / n - self.center.y) * self.strength;
        for body in bodies {
            body.x -= dx;
            body.y -= dy;
        }
    }
}

/// Keeps node centers at least two radii apart, using predicted positions.
#[derive(Debug, Clone)]
pub struct CollideForce {
    radius: f64,
    strength: f64,
}

impl CollideForce {
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            strength: 1.0,
        }
    }
}

impl Force for CollideForce {
    fn initialize(&mut self, _bodies: &[Body], _links: &[(usize, usize)]) {}

    fn apply(&mut self, bodies: &mut [Body], _alpha: f64, jiggle: &mut Jiggle) {
        let n = bodies.len();
        let r = self.radius * 2.0;
        for i in 0..n {
            let xi = bodies[i].x + bodies[i].vx;
            let yi = bodies[i].y + bodies[i].vy;
            for j in (i + 1)..n {
                let mut x = xi - (bodies[j].x + bodies[j].vx);
                let mut y = yi - (bodies[j].y + bodies[j].vy);
                let mut l = x * x + y * y;
                if l >= r * r {
                    continue;
                }
                if x == 0.0 {
                    x = jiggle.next();
                    l += x * x;
                }
                if y == 0.0 {
                    y = jiggle.next();
                    l += y * y;
                }
                l = l.sqrt();
                l = (r - l) / l * self.strength;
                x *= l;
                y *= l;
                // Equal radii: each side takes half of the correction.
                bodies[i].vx += x * 0.5;
                bodies[i].vy += y * 0.5;
                bodies[j].vx -= x * 0.5;
                bodies[j].vy -= y * 0.5;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(x: f64, y: f64) -> Body {
        Body::at(Point::new(x, y))
    }

    #[test]
    fn jiggle_is_deterministic_and_tiny() {
        let mut a = Jiggle::default();
        let mut b = Jiggle::default();
        for _ in 0..10 {
            let v = a.next();
            assert_eq!(v, b.next());
            assert!(v.abs() <= 0.5e-6);
        }
    }

    #[test]
    fn link_force_pulls_stretched_pair_together() {
        let mut bodies = vec![body(0.0, 0.0), body(400.0, 0.0)];
        let mut force = LinkForce::new(140.0);
        force.initialize(&bodies, &[(0, 1)]);
        force.apply(&mut bodies, 1.0, &mut Jiggle::default());
        assert!(bodies[0].vx > 0.0, "source moves toward target");
        assert!(bodies[1].vx < 0.0, "target moves toward source");
    }

    #[test]
    fn link_force_pushes_compressed_pair_apart() {
        let mut bodies = vec![body(0.0, 0.0), body(20.0, 0.0)];
        let mut force = LinkForce::new(140.0);
        force.initialize(&bodies, &[(0, 1)]);
        force.apply(&mut bodies, 1.0, &mut Jiggle::default());
        assert!(bodies[0].vx < 0.0);
        assert!(bodies[1].vx > 0.0);
    }

    #[test]
    fn many_body_repels() {
        let mut bodies = vec![body(0.0, 0.0), body(10.0, 0.0)];
        let mut force = ManyBodyForce::new(-60.0);
        force.apply(&mut bodies, 1.0, &mut Jiggle::default());
        assert!(bodies[0].vx < 0.0);
        assert!(bodies[1].vx > 0.0);
    }

    #[test]
    fn center_moves_mean_onto_center() {
        let mut bodies = vec![body(0.0, 0.0), body(10.0, 20.0)];
        let mut force = CenterForce::new(Point::new(100.0, 100.0));
        force.apply(&mut bodies, 1.0, &mut Jiggle::default());
        let mx = (bodies[0].x + bodies[1].x) / 2.0;
        let my = (bodies[0].y + bodies[1].y) / 2.0;
        assert!((mx - 100.0).abs() < 1e-9);
        assert!((my - 100.0).abs() < 1e-9);
    }

    #[test]
    fn collide_separates_overlapping_nodes_only() {
        let mut close = vec![body(0.0, 0.0), body(30.0, 0.0)];
        let mut force = CollideForce::new(60.0);
        force.apply(&mut close, 1.0, &mut Jiggle::default());
        assert!(close[0].vx < 0.0 && close[1].vx > 0.0);

        let mut far = vec![body(0.0, 0.0), body(500.0, 0.0)];
        force.apply(&mut far, 1.0, &mut Jiggle::default());
        assert_eq!(far[0].vx, 0.0);
        assert_eq!(far[1].vx, 0.0);
    }
}
