//! Simulation State
//!
//! One `Simulation` owns everything about a level: grid, balls, walls and
//! the tick counter. Instances are fully independent, so a live game and a
//! replay validator can run side by side.

use thiserror::Error;

use crate::config::SimConfig;
use crate::core::arena::Arena;
use crate::core::hash::{compute_state_hash, StateHash};
use crate::game::ball::{Ball, BallId, BallKinematics, BallSnapshot};
use crate::game::grid::Grid;
use crate::game::level::BallSpawn;
use crate::game::wall::{Wall, WallId};
use crate::SIM_VERSION;

/// Misuse of the simulation API.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    /// Ball handle not issued by this level.
    #[error("unknown ball {0}")]
    UnknownBall(BallId),

    /// Wall handle not issued by this level.
    #[error("unknown wall {0}")]
    UnknownWall(WallId),

    /// Position or direction contains NaN or infinity.
    #[error("non-finite ball parameters ({x}, {y})")]
    NonFinite {
        /// Left edge given
        x: f64,
        /// Top edge given
        y: f64,
    },

    /// Ball would not fit inside the grid.
    #[error("ball at ({x}, {y}) lies outside the grid")]
    OutOfGrid {
        /// Left edge given
        x: f64,
        /// Top edge given
        y: f64,
    },

    /// Ball would never move.
    #[error("ball direction is zero on both axes")]
    ZeroDirection,
}

// =============================================================================
// SIMULATION
// =============================================================================

/// Complete state of one level.
#[derive(Clone, Debug)]
pub struct Simulation {
    /// Rules this level runs under
    pub(crate) config: SimConfig,

    /// Tile grid
    pub(crate) grid: Grid,

    /// Balls, indexed by handle
    pub(crate) balls: Arena<Ball>,

    /// Every wall created this level, building or not
    pub(crate) walls: Arena<Wall>,

    /// Ticks run since `init`
    pub(crate) tick: u32,

    /// Last computed fill percentage
    pub(crate) fill_percent: u32,

    /// Fill target reached?
    pub(crate) level_complete: bool,
}

impl Simulation {
    /// Create an initialized simulation. The config is trusted; validate
    /// untrusted configs with [`SimConfig::validate`] first.
    ///
    /// Ids restart from the same values in every new simulation. Use ids
    /// only with the simulation that issued them.
    pub fn new(config: SimConfig) -> Self {
        let grid = Grid::new(config.grid_width, config.grid_height);
        Self {
            config,
            grid,
            balls: Arena::new(),
            walls: Arena::new(),
            tick: 0,
            fill_percent: 0,
            level_complete: false,
        }
    }

    /// Reset to an empty level. Handles issued before the reset are
    /// rejected afterwards. Returns the simulation version.
    pub fn init(&mut self) -> u32 {
        self.grid.reset();
        self.balls.clear();
        self.walls.clear();
        self.tick = 0;
        self.fill_percent = 0;
        self.level_complete = false;
        SIM_VERSION
    }

    /// Add a ball at `(x, y)` moving along `(dir_x, dir_y)`.
    pub fn add_ball(&mut self, x: f64, y: f64, dir_x: f64, dir_y: f64) -> Result<BallId, SimError> {
        if ![x, y, dir_x, dir_y].iter().all(|v| v.is_finite()) {
            return Err(SimError::NonFinite { x, y });
        }
        let size = self.config.ball_size;
        if x < 0.0
            || y < 0.0
            || x + size > self.grid.width() as f64
            || y + size > self.grid.height() as f64
        {
            return Err(SimError::OutOfGrid { x, y });
        }
        if dir_x == 0.0 && dir_y == 0.0 {
            return Err(SimError::ZeroDirection);
        }

        let speed = self.config.ball_speed;
        Ok(self
            .balls
            .insert_with(|id| Ball::new(id, x, y, dir_x, dir_y, speed)))
    }

    /// Add a ball from a level spawn.
    pub fn spawn(&mut self, spawn: &BallSpawn) -> Result<BallId, SimError> {
        self.add_ball(spawn.x, spawn.y, spawn.dir_x, spawn.dir_y)
    }

    /// Look up a ball.
    pub fn ball(&self, id: BallId) -> Result<&Ball, SimError> {
        self.balls.get(id).ok_or(SimError::UnknownBall(id))
    }

    /// Look up a wall.
    pub fn wall(&self, id: WallId) -> Result<&Wall, SimError> {
        self.walls.get(id).ok_or(SimError::UnknownWall(id))
    }

    /// All balls in id order.
    pub fn balls(&self) -> &[Ball] {
        self.balls.as_slice()
    }

    /// All walls created this level, in id order.
    pub fn walls(&self) -> &[Wall] {
        self.walls.as_slice()
    }

    /// Walls still growing, in id order.
    pub fn building_walls(&self) -> impl Iterator<Item = &Wall> {
        self.walls.iter().filter(|w| w.building)
    }

    /// Read-only grid.
    pub fn tiles(&self) -> &Grid {
        &self.grid
    }

    /// Rules in effect.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Ticks run since `init`.
    pub fn tick_count(&self) -> u32 {
        self.tick
    }

    /// Current fill percentage.
    pub fn fill_percent(&self) -> u32 {
        self.fill_percent
    }

    /// Has the fill target been reached?
    pub fn level_complete(&self) -> bool {
        self.level_complete
    }

    /// Snapshot of every ball.
    pub fn ball_snapshots(&self) -> Vec<BallSnapshot> {
        self.balls.iter().map(Ball::snapshot).collect()
    }

    /// Kinematic state of every ball, as checkpointed in replays.
    pub fn ball_kinematics(&self) -> Vec<BallKinematics> {
        self.balls.iter().map(Ball::kinematics).collect()
    }

    /// Hash of the full state, bit-exact over floats.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, SIM_VERSION, |hasher| {
            self.grid.hash_into(hasher);

            hasher.update_u32(self.balls.len() as u32);
            for ball in self.balls.iter() {
                ball.hash_into(hasher);
            }

            hasher.update_u32(self.walls.len() as u32);
            for wall in self.walls.iter() {
                wall.hash_into(hasher);
            }

            hasher.update_u32(self.fill_percent);
            hasher.update_bool(self.level_complete);
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
