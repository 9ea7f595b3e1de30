//! Ball Entities
//!
//! Kinematic squares bouncing around the grid. A ball's velocity is fixed
//! at creation to `±speed` or `0` per axis; collisions only ever flip the
//! sign of a component.

use serde::{Serialize, Deserialize};

use crate::core::arena::Handle;
use crate::core::hash::StateHasher;
use crate::core::rect::Rect;

/// Stable ball identifier.
pub type BallId = Handle<Ball>;

/// A ball. `(x, y)` is the top-left corner of its bounding square.
#[derive(Clone, Debug, PartialEq)]
pub struct Ball {
    /// Stable handle
    pub id: BallId,
    /// Left edge, tiles
    pub x: f64,
    /// Top edge, tiles
    pub y: f64,
    /// Horizontal velocity, tiles per tick
    pub vx: f64,
    /// Vertical velocity, tiles per tick
    pub vy: f64,
}

/// Scale a direction component to `±speed`, keeping only its sign.
#[inline]
pub fn axis_velocity(direction: f64, speed: f64) -> f64 {
    if direction > 0.0 {
        speed
    } else if direction < 0.0 {
        -speed
    } else {
        0.0
    }
}

impl Ball {
    /// Create a ball with its direction normalized to `speed`.
    pub fn new(id: BallId, x: f64, y: f64, dir_x: f64, dir_y: f64, speed: f64) -> Self {
        Self {
            id,
            x,
            y,
            vx: axis_velocity(dir_x, speed),
            vy: axis_velocity(dir_y, speed),
        }
    }

    /// Current bounding rectangle.
    #[inline]
    pub fn rect(&self, size: f64) -> Rect {
        Rect::new(self.x, self.y, size, size)
    }

    /// Bounding rectangle after one unobstructed step.
    #[inline]
    pub fn next_rect(&self, size: f64) -> Rect {
        self.rect(size).translated(self.vx, self.vy)
    }

    /// Advance by one tick.
    #[inline]
    pub fn step(&mut self) {
        self.x += self.vx;
        self.y += self.vy;
    }

    /// Value copy for tick results.
    pub fn snapshot(&self) -> BallSnapshot {
        BallSnapshot {
            id: self.id,
            x: self.x,
            y: self.y,
            vx: self.vx,
            vy: self.vy,
        }
    }

    /// Kinematic state without identity, as stored in replays.
    pub fn kinematics(&self) -> BallKinematics {
        BallKinematics {
            x: self.x,
            y: self.y,
            vx: self.vx,
            vy: self.vy,
        }
    }

    /// Hash this ball's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.id.index());
        hasher.update_f64(self.x);
        hasher.update_f64(self.y);
        hasher.update_f64(self.vx);
        hasher.update_f64(self.vy);
    }
}

/// Ball state reported to callers each tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BallSnapshot {
    /// Ball handle
    pub id: BallId,
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Horizontal velocity
    pub vx: f64,
    /// Vertical velocity
    pub vy: f64,
}

/// Position and velocity of one ball, as recorded in replay checkpoints.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BallKinematics {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Horizontal velocity
    pub vx: f64,
    /// Vertical velocity
    pub vy: f64,
}
