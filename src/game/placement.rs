//! Wall Placement Intake
//!
//! Decides whether a placement request starts walls, and in which
//! directions. At most two walls may be building at once.

use serde::{Serialize, Deserialize};

use crate::core::rect::Rect;
use crate::game::grid::Grid;
use crate::game::wall::{Direction, Wall};

/// Most walls that may be building at the same time.
pub const MAX_BUILDING_WALLS: usize = 2;

/// A request to start walls from tile `(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacementRequest {
    /// Tile column
    pub x: i32,
    /// Tile row
    pub y: i32,
    /// Vertical (`Up`/`Down`) rather than horizontal
    pub vertical: bool,
}

impl PlacementRequest {
    /// Vertical placement at `(x, y)`.
    pub const fn vertical(x: i32, y: i32) -> Self {
        Self { x, y, vertical: true }
    }

    /// Horizontal placement at `(x, y)`.
    pub const fn horizontal(x: i32, y: i32) -> Self {
        Self { x, y, vertical: false }
    }
}

/// Why a request was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    /// Outside the grid
    OutOfBounds,
    /// Start tile is border or wall
    TileNotFree,
    /// Start tile overlaps a wall that is still growing
    InsideBuildingWall,
    /// Both wall slots are taken
    SlotsFull,
}

/// Walls an accepted request starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Two paired walls growing apart from the start tile
    Pair([Direction; 2]),
    /// One wall alongside the wall still building
    Single(Direction),
}

impl Placement {
    /// Directions to create, in creation order.
    pub fn directions(&self) -> &[Direction] {
        match self {
            Placement::Pair(dirs) => dirs,
            Placement::Single(dir) => std::slice::from_ref(dir),
        }
    }
}

/// Check a request against the grid and the walls currently building.
pub fn plan_placement(
    grid: &Grid,
    building: &[&Wall],
    request: &PlacementRequest,
) -> Result<Placement, Rejection> {
    let PlacementRequest { x, y, vertical } = *request;

    if !grid.in_bounds(x, y) {
        return Err(Rejection::OutOfBounds);
    }
    if !grid.is_free(x, y) {
        return Err(Rejection::TileNotFree);
    }
    let tile = Rect::tile(x, y);
    if building.iter().any(|w| w.rect.intersects(&tile)) {
        return Err(Rejection::InsideBuildingWall);
    }

    match building {
        [] => Ok(Placement::Pair(Direction::pair_for(vertical))),
        [existing] => {
            let dir = if existing.direction.is_vertical() == vertical {
                existing.direction.opposite()
            } else {
                existing.direction.corresponding()
            };
            Ok(Placement::Single(dir))
        }
        _ => Err(Rejection::SlotsFull),
    }
}
