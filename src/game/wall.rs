//! Wall Entities
//!
//! A wall starts as its single start tile and grows in one direction,
//! trailing edge fixed, until it finishes (materializes into the grid) or
//! dies. Placements that start two walls from one tile create a pair.

use serde::{Serialize, Deserialize};

use crate::core::arena::Handle;
use crate::core::hash::StateHasher;
use crate::core::rect::{tile_at_edge, tile_before, Rect};

/// Stable wall identifier.
pub type WallId = Handle<Wall>;

/// Growth direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    /// Towards row 0
    Up = 0,
    /// Towards the last row
    Down = 1,
    /// Towards column 0
    Left = 2,
    /// Towards the last column
    Right = 3,
}

impl Direction {
    /// Growth along the y axis?
    #[inline]
    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    /// Reverse direction.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Direction on the other axis used for L-shaped second halves
    /// (`Up ↔ Left`, `Down ↔ Right`).
    pub fn corresponding(self) -> Self {
        match self {
            Direction::Up => Direction::Left,
            Direction::Left => Direction::Up,
            Direction::Down => Direction::Right,
            Direction::Right => Direction::Down,
        }
    }

    /// The two directions a fresh placement grows in.
    pub fn pair_for(vertical: bool) -> [Direction; 2] {
        if vertical {
            [Direction::Up, Direction::Down]
        } else {
            [Direction::Left, Direction::Right]
        }
    }
}

/// A growing (or finished) wall.
#[derive(Clone, Debug, PartialEq)]
pub struct Wall {
    /// Stable handle
    pub id: WallId,
    /// Start tile column
    pub start_x: i32,
    /// Start tile row
    pub start_y: i32,
    /// Growth direction
    pub direction: Direction,
    /// Still growing?
    pub building: bool,
    /// Current bounding rectangle
    pub rect: Rect,
}

impl Wall {
    /// A new building wall covering only its start tile.
    pub fn new(id: WallId, start_x: i32, start_y: i32, direction: Direction) -> Self {
        Self {
            id,
            start_x,
            start_y,
            direction,
            building: true,
            rect: Rect::tile(start_x, start_y),
        }
    }

    /// Start tile coordinates.
    #[inline]
    pub fn start_tile(&self) -> (i32, i32) {
        (self.start_x, self.start_y)
    }

    /// Extent along the growth axis.
    #[inline]
    pub fn length(&self) -> f64 {
        if self.direction.is_vertical() {
            self.rect.h
        } else {
            self.rect.w
        }
    }

    /// Paired walls share a start tile and grow in opposite directions.
    pub fn is_paired_with(&self, other: &Wall) -> bool {
        self.id != other.id
            && self.start_tile() == other.start_tile()
            && self.direction == other.direction.opposite()
    }

    /// The tile containing the leading edge.
    pub fn tip_tile(&self) -> (i32, i32) {
        let r = &self.rect;
        match self.direction {
            Direction::Up => (self.start_x, tile_at_edge(r.y)),
            Direction::Down => (self.start_x, tile_before(r.bottom())),
            Direction::Left => (tile_at_edge(r.x), self.start_y),
            Direction::Right => (tile_before(r.right()), self.start_y),
        }
    }

    /// Has the tip advanced past the start tile?
    #[inline]
    pub fn tip_left_start(&self) -> bool {
        self.tip_tile() != self.start_tile()
    }

    /// The leading one-tile strip of the rectangle.
    pub fn tip_rect(&self) -> Rect {
        let r = self.rect;
        match self.direction {
            Direction::Up => Rect::new(r.x, r.y, r.w, 1.0),
            Direction::Down => Rect::new(r.x, r.bottom() - 1.0, r.w, 1.0),
            Direction::Left => Rect::new(r.x, r.y, 1.0, r.h),
            Direction::Right => Rect::new(r.right() - 1.0, r.y, 1.0, r.h),
        }
    }

    /// Rectangle minus its tip strip; `None` while the wall is one tile long.
    pub fn inner_rect(&self) -> Option<Rect> {
        let len = self.length() - 1.0;
        if len <= 0.0 {
            return None;
        }
        let r = self.rect;
        Some(match self.direction {
            Direction::Up => Rect::new(r.x, r.y + 1.0, r.w, len),
            Direction::Down => Rect::new(r.x, r.y, r.w, len),
            Direction::Left => Rect::new(r.x + 1.0, r.y, len, r.h),
            Direction::Right => Rect::new(r.x, r.y, len, r.h),
        })
    }

    /// The rectangle this wall finishes with when a ball clips its tip.
    /// Only available once the shortened wall still covers a full tile.
    pub fn shortened_rect(&self) -> Option<Rect> {
        self.inner_rect().filter(Rect::has_full_tile)
    }

    /// Extend the leading edge by `speed`.
    pub fn grow(&mut self, speed: f64) {
        match self.direction {
            Direction::Up => {
                self.rect.y -= speed;
                self.rect.h += speed;
            }
            Direction::Down => self.rect.h += speed,
            Direction::Left => {
                self.rect.x -= speed;
                self.rect.w += speed;
            }
            Direction::Right => self.rect.w += speed,
        }
    }

    /// Creation record reported in tick results.
    pub fn creation(&self) -> NewWall {
        NewWall {
            id: self.id,
            start_x: self.start_x,
            start_y: self.start_y,
            direction: self.direction,
        }
    }

    /// Current bounds reported in tick results.
    pub fn active(&self) -> ActiveWall {
        ActiveWall {
            id: self.id,
            bounds: self.rect,
        }
    }

    /// Hash this wall's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.id.index());
        hasher.update_i32(self.start_x);
        hasher.update_i32(self.start_y);
        hasher.update_u8(self.direction as u8);
        hasher.update_bool(self.building);
        hasher.update_rect(self.rect);
    }
}

/// A wall created this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWall {
    /// Wall handle
    pub id: WallId,
    /// Start column
    pub start_x: i32,
    /// Start row
    pub start_y: i32,
    /// Growth direction
    pub direction: Direction,
}

/// A building wall's current rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveWall {
    /// Wall handle
    pub id: WallId,
    /// Current bounds
    pub bounds: Rect,
}
