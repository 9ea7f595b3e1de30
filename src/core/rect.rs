//! Axis-aligned rectangles in tile units.
//!
//! Every collision query in the simulation reduces to rectangle overlap.
//! Touching edges do not count as overlap.

use serde::{Serialize, Deserialize};

/// Slack used when snapping rectangle edges to tile boundaries.
const SNAP: f64 = 1e-9;

/// Axis-aligned rectangle. `(x, y)` is the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub w: f64,
    /// Height
    pub h: f64,
}

impl Rect {
    /// Create a rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// The unit rectangle covering tile `(tx, ty)`.
    #[inline]
    pub fn tile(tx: i32, ty: i32) -> Self {
        Self::new(tx as f64, ty as f64, 1.0, 1.0)
    }

    /// Right edge.
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    /// Bottom edge.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Centre point.
    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Same rectangle moved by `(dx, dy)`.
    #[inline]
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    /// Strict overlap test: shared edges are not an intersection.
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Overlap of the two rectangles along each axis, measured from their
    /// centres. Positive on both axes iff they intersect.
    #[inline]
    pub fn center_overlap(&self, other: &Rect) -> (f64, f64) {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        let ox = (self.w + other.w) / 2.0 - (ax - bx).abs();
        let oy = (self.h + other.h) / 2.0 - (ay - by).abs();
        (ox, oy)
    }

    /// Tiles lying entirely inside this rectangle, row-major.
    pub fn full_tiles(&self) -> impl Iterator<Item = (i32, i32)> {
        let x0 = (self.x - SNAP).ceil() as i32;
        let x1 = (self.right() + SNAP).floor() as i32;
        let y0 = (self.y - SNAP).ceil() as i32;
        let y1 = (self.bottom() + SNAP).floor() as i32;
        (y0..y1).flat_map(move |ty| (x0..x1).map(move |tx| (tx, ty)))
    }

    /// Does this rectangle fully cover at least one tile?
    pub fn has_full_tile(&self) -> bool {
        self.full_tiles().next().is_some()
    }
}

/// Tile index containing the coordinate `v`.
#[inline]
pub fn tile_of(v: f64) -> i32 {
    v.floor() as i32
}

/// Tile index of the last tile touched by an edge at `v` extending in the
/// negative direction, i.e. the tile just before a trailing boundary.
#[inline]
pub fn tile_before(v: f64) -> i32 {
    (v - SNAP).ceil() as i32 - 1
}

/// Tile index containing a leading edge at `v` extending in the positive
/// direction, snapping exact boundaries forward.
#[inline]
pub fn tile_at_edge(v: f64) -> i32 {
    (v + SNAP).floor() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touching_edges_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 1.0, 1.0);
        let b = Rect::new(1.0, 0.0, 1.0, 1.0);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&b.translated(-0.125, 0.0)));
    }

    #[test]
    fn test_center_overlap() {
        let a = Rect::new(0.0, 0.0, 1.0, 1.0);
        let b = Rect::new(0.75, 0.5, 1.0, 1.0);
        let (ox, oy) = a.center_overlap(&b);
        assert_eq!(ox, 0.25);
        assert_eq!(oy, 0.5);
    }

    #[test]
    fn test_full_tiles_excludes_partial_tiles() {
        let wall = Rect::new(5.0, 3.0, 1.0, 2.375);
        let tiles: Vec<_> = wall.full_tiles().collect();
        assert_eq!(tiles, vec![(5, 3), (5, 4)]);

        let up = Rect::new(5.0, 1.875, 1.0, 2.125);
        let tiles: Vec<_> = up.full_tiles().collect();
        assert_eq!(tiles, vec![(5, 2), (5, 3)]);

        assert!(!Rect::new(5.0, 3.0, 1.0, 0.875).has_full_tile());
    }

    #[test]
    fn test_edge_tiles() {
        assert_eq!(tile_before(4.0), 3);
        assert_eq!(tile_before(4.125), 4);
        assert_eq!(tile_at_edge(4.0), 4);
        assert_eq!(tile_at_edge(3.875), 3);
        assert_eq!(tile_of(-0.5), -1);
    }
}
