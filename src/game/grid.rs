//! Tile Grid
//!
//! Fixed-size tile array. The outer ring is always `Border`; interior
//! tiles are `Free` until a wall materializes over them or an enclosure
//! fill captures them.

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::rect::Rect;

/// Classification of a single tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Tile {
    /// Open play area
    #[default]
    Free = 0,
    /// Outer ring, never changes
    Border = 1,
    /// Materialized wall or captured territory
    Wall = 2,
    /// Flood-fill marker, never visible outside a fill
    Temp = 3,
}

impl Tile {
    /// Solid for balls and wall tips.
    #[inline]
    pub fn is_solid(self) -> bool {
        !matches!(self, Tile::Free)
    }
}

/// The play field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Create a freshly initialized grid.
    pub fn new(width: u32, height: u32) -> Self {
        let mut grid = Self {
            width,
            height,
            tiles: vec![Tile::Free; width as usize * height as usize],
        };
        grid.reset();
        grid
    }

    /// Border on the outer ring, `Free` everywhere else.
    pub fn reset(&mut self) {
        for y in 0..self.height {
            for x in 0..self.width {
                let edge = x == 0 || y == 0 || x == self.width - 1 || y == self.height - 1;
                self.tiles[(y * self.width + x) as usize] = if edge { Tile::Border } else { Tile::Free };
            }
        }
    }

    /// Width in tiles.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in tiles.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Is `(x, y)` inside the grid?
    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Is `(x, y)` inside the border ring?
    #[inline]
    pub fn is_interior(&self, x: i32, y: i32) -> bool {
        x >= 1 && y >= 1 && (x as u32) < self.width - 1 && (y as u32) < self.height - 1
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        self.in_bounds(x, y).then(|| (y as u32 * self.width + x as u32) as usize)
    }

    /// Tile at `(x, y)`. Anything outside the grid is `Border`.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Tile {
        self.index(x, y).map_or(Tile::Border, |i| self.tiles[i])
    }

    /// Is `(x, y)` open play area?
    #[inline]
    pub fn is_free(&self, x: i32, y: i32) -> bool {
        self.get(x, y) == Tile::Free
    }

    /// Overwrite an interior tile. The border ring is immutable, so writes
    /// to it (or outside the grid) are refused.
    pub(crate) fn set(&mut self, x: i32, y: i32, tile: Tile) -> bool {
        if !self.is_interior(x, y) {
            return false;
        }
        match self.index(x, y) {
            Some(i) => {
                self.tiles[i] = tile;
                true
            }
            None => false,
        }
    }

    /// Convert every `Free` tile fully covered by `rect` into `Wall`,
    /// optionally leaving one tile untouched. Tiles overlapping any
    /// `keep_out` rectangle stay `Free`. Returns the number converted.
    pub(crate) fn materialize(
        &mut self,
        rect: Rect,
        skip: Option<(i32, i32)>,
        keep_out: &[Rect],
    ) -> u32 {
        let mut changed = 0;
        for (x, y) in rect.full_tiles() {
            if Some((x, y)) == skip {
                continue;
            }
            let tile = Rect::tile(x, y);
            if keep_out.iter().any(|k| k.intersects(&tile)) {
                continue;
            }
            if self.get(x, y) == Tile::Free && self.set(x, y, Tile::Wall) {
                changed += 1;
            }
        }
        changed
    }

    /// Number of interior tiles.
    pub fn interior_area(&self) -> u32 {
        (self.width - 2) * (self.height - 2)
    }

    /// Count interior tiles of a given kind.
    pub fn count_interior(&self, kind: Tile) -> u32 {
        let mut count = 0;
        for y in 1..self.height as i32 - 1 {
            for x in 1..self.width as i32 - 1 {
                if self.get(x, y) == kind {
                    count += 1;
                }
            }
        }
        count
    }

    /// `floor(100 × interior walls / interior area)`.
    pub fn fill_percent(&self) -> u32 {
        let area = self.interior_area();
        if area == 0 {
            return 0;
        }
        (self.count_interior(Tile::Wall) as u64 * 100 / area as u64) as u32
    }

    /// Row-major tile slice.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub(crate) fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    /// Rows top to bottom, for renderers.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[Tile]> {
        self.tiles.chunks(self.width as usize)
    }

    /// World rectangle of tile `(x, y)`.
    #[inline]
    pub fn tile_rect(&self, x: i32, y: i32) -> Rect {
        Rect::tile(x, y)
    }

    /// Hash every tile in row-major order.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.width);
        hasher.update_u32(self.height);
        for tile in &self.tiles {
            hasher.update_u8(*tile as u8);
        }
    }
}
