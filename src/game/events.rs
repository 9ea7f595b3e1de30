//! Simulation Events
//!
//! Per-tick records of what happened: ball collisions and wall outcomes.
//! They are reported in `TickResult` and never fed back into the state.

use serde::{Serialize, Deserialize};

use crate::core::rect::Rect;
use crate::game::ball::BallId;
use crate::game::collision::Normal;
use crate::game::wall::WallId;

/// What a ball collided with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionKind {
    /// A solid tile (border or materialized wall)
    Tile,
    /// A building wall
    Wall {
        /// Wall struck
        wall: WallId,
    },
    /// Another ball
    Ball {
        /// Ball struck
        other: BallId,
    },
}

/// A ball collision and the normal applied to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallCollision {
    /// Ball that collided
    pub ball: BallId,

    /// What it hit
    pub kind: CollisionKind,

    /// Reflection normal for this ball
    pub normal: Normal,
}

impl BallCollision {
    /// Hit against the grid.
    pub fn tile(ball: BallId, normal: Normal) -> Self {
        Self {
            ball,
            kind: CollisionKind::Tile,
            normal,
        }
    }

    /// Hit against a building wall.
    pub fn wall(ball: BallId, wall: WallId, normal: Normal) -> Self {
        Self {
            ball,
            kind: CollisionKind::Wall { wall },
            normal,
        }
    }

    /// Hit against another ball.
    pub fn ball(ball: BallId, other: BallId, normal: Normal) -> Self {
        Self {
            ball,
            kind: CollisionKind::Ball { other },
            normal,
        }
    }
}

/// How a wall stopped building.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum WallEventKind {
    /// Materialized into the grid with these bounds
    Finish {
        /// Final rectangle
        bounds: Rect,
        /// Cut back by one tile after a ball clipped its tip
        shortened: bool,
    },

    /// A ball struck the wall's body
    Die {
        /// Ball that struck it
        ball: BallId,
    },

    /// Died together with its pair
    DiePaired {
        /// Wall whose death took this one down
        partner: WallId,
    },
}

/// A wall that stopped building this tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WallEvent {
    /// Wall concerned
    pub wall: WallId,

    /// Outcome
    pub kind: WallEventKind,
}

impl WallEvent {
    /// Wall finished at full length.
    pub fn finish(wall: WallId, bounds: Rect) -> Self {
        Self {
            wall,
            kind: WallEventKind::Finish {
                bounds,
                shortened: false,
            },
        }
    }

    /// Wall finished one tile short.
    pub fn finish_shortened(wall: WallId, bounds: Rect) -> Self {
        Self {
            wall,
            kind: WallEventKind::Finish {
                bounds,
                shortened: true,
            },
        }
    }

    /// Wall killed by a ball.
    pub fn die(wall: WallId, ball: BallId) -> Self {
        Self {
            wall,
            kind: WallEventKind::Die { ball },
        }
    }

    /// Wall killed because its pair died.
    pub fn die_paired(wall: WallId, partner: WallId) -> Self {
        Self {
            wall,
            kind: WallEventKind::DiePaired { partner },
        }
    }

    /// Did the wall materialize?
    #[inline]
    pub fn is_finish(&self) -> bool {
        matches!(self.kind, WallEventKind::Finish { .. })
    }
}
