//! Pan/zoom transform between world units and terminal cells.

use crate::graph::model::Point;

/// World units covered by one terminal column at zoom 1.
pub const CELL_WIDTH: f64 = 8.0;
/// World units covered by one terminal row at zoom 1.
pub const CELL_HEIGHT: f64 = 20.0;

pub const MIN_ZOOM: f64 = 0.25;
pub const MAX_ZOOM: f64 = 4.0;
pub const ZOOM_STEP: f64 = 1.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// World position shown at the top-left cell of the canvas.
    pub origin: Point,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            origin: Point::default(),
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn units_per_col(&self) -> f64 {
        CELL_WIDTH / self.zoom
    }

    pub fn units_per_row(&self) -> f64 {
        CELL_HEIGHT / self.zoom
    }

    /// World position under a canvas cell (fractional cells allowed).
    pub fn to_world(&self, col: f64, row: f64) -> Point {
        Point::new(
            self.origin.x + col * self.units_per_col(),
            self.origin.y + row * self.units_per_row(),
        )
    }

    /// Canvas cell (fractional) for a world position.
    pub fn to_screen(&self, p: Point) -> (f64, f64) {
        (
            (p.x - self.origin.x) / self.units_per_col(),
            (p.y - self.origin.y) / self.units_per_row(),
        )
    }

    /// World size of a canvas of `cols` × `rows` cells.
    pub fn world_size(&self, cols: u16, rows: u16) -> (f64, f64) {
        (
            f64::from(cols) * self.units_per_col(),
            f64::from(rows) * self.units_per_row(),
        )
    }

    pub fn pan_cells(&mut self, dcols: f64, drows: f64) {
        self.origin.x += dcols * self.units_per_col();
        self.origin.y += drows * self.units_per_row();
    }

    /// Scale by `factor`, keeping the world point under (`col`, `row`) fixed.
    pub fn zoom_at(&mut self, factor: f64, col: f64, row: f64) {
        let anchor = self.to_world(col, row);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.origin = Point::new(
            anchor.x - col * self.units_per_col(),
            anchor.y - row * self.units_per_row(),
        );
    }

    /// Put `p` at the middle of a `cols` × `rows` canvas.
    pub fn center_on(&mut self, p: Point, cols: u16, rows: u16) {
        let (w, h) = self.world_size(cols, rows);
        self.origin = Point::new(p.x - w / 2.0, p.y - h / 2.0);
    }
}
