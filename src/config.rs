//! Simulation configuration.
//!
//! Defaults reproduce the reference game. A config is embedded in every
//! replay so that validation always re-simulates under the rules the level
//! was played with.

use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Default grid width in tiles.
pub const DEFAULT_GRID_WIDTH: u32 = 32;
/// Default grid height in tiles.
pub const DEFAULT_GRID_HEIGHT: u32 = 20;
/// Ball side length as a fraction of a tile.
pub const DEFAULT_BALL_SIZE: f64 = 0.8;
/// Ball speed per axis, tiles per tick.
pub const DEFAULT_BALL_SPEED: f64 = 0.125;
/// Wall growth, tiles per tick.
pub const DEFAULT_WALL_SPEED: f64 = 0.125;
/// Fill percentage that completes a level.
pub const DEFAULT_FILL_TARGET: u32 = 75;
/// Ticks between replay checkpoints.
pub const DEFAULT_CHECKPOINT_INTERVAL: u32 = 60;
/// Sampled states kept for mismatch diagnostics.
pub const DEFAULT_TRACE_LEN: usize = 20;
/// Allowed checkpoint position drift, in tiles.
pub const DEFAULT_POSITION_TOLERANCE: f64 = 0.01;
/// Broad-phase cell size for ball-vs-ball checks, in tiles.
pub const DEFAULT_SPATIAL_CELL: f64 = 4.0;

/// Largest accepted grid side, in tiles.
pub const MAX_GRID_DIM: u32 = 1024;
/// Largest accepted diagnostic trace.
pub const MAX_TRACE_LEN: usize = 1024;

/// Simulation rules and recorder settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Grid width in tiles, border included
    pub grid_width: u32,
    /// Grid height in tiles, border included
    pub grid_height: u32,
    /// Ball side length in tiles
    pub ball_size: f64,
    /// Per-axis ball speed in tiles per tick
    pub ball_speed: f64,
    /// Wall growth in tiles per tick
    pub wall_speed: f64,
    /// Fill percentage at which the level completes
    pub fill_target_percent: u32,
    /// Ticks between replay checkpoints
    pub checkpoint_interval: u32,
    /// Trailing states kept by the validator
    pub trace_len: usize,
    /// Checkpoint position tolerance in tiles
    pub position_tolerance: f64,
    /// Spatial hash cell size for ball-vs-ball
    pub spatial_cell: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_width: DEFAULT_GRID_WIDTH,
            grid_height: DEFAULT_GRID_HEIGHT,
            ball_size: DEFAULT_BALL_SIZE,
            ball_speed: DEFAULT_BALL_SPEED,
            wall_speed: DEFAULT_WALL_SPEED,
            fill_target_percent: DEFAULT_FILL_TARGET,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            trace_len: DEFAULT_TRACE_LEN,
            position_tolerance: DEFAULT_POSITION_TOLERANCE,
            spatial_cell: DEFAULT_SPATIAL_CELL,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for `SimConfig`.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds a value the simulation cannot run with.
    #[error("invalid config field `{field}`: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: &'static str,
    },
}

impl SimConfig {
    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject values that would break the collision model.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: &'static str) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid { field, reason })
        }

        if self.grid_width < 3 {
            return invalid("grid_width", "must leave at least one interior column");
        }
        if self.grid_height < 3 {
            return invalid("grid_height", "must leave at least one interior row");
        }
        if self.grid_width > MAX_GRID_DIM {
            return invalid("grid_width", "exceeds MAX_GRID_DIM");
        }
        if self.grid_height > MAX_GRID_DIM {
            return invalid("grid_height", "exceeds MAX_GRID_DIM");
        }
        if !(self.ball_size > 0.0 && self.ball_size <= 1.0) {
            return invalid("ball_size", "must be in (0, 1]");
        }
        // Anything faster than a tile per tick can tunnel through a wall.
        if !(self.ball_speed > 0.0 && self.ball_speed <= 1.0) {
            return invalid("ball_speed", "must be in (0, 1]");
        }
        if !(self.wall_speed > 0.0 && self.wall_speed <= 1.0) {
            return invalid("wall_speed", "must be in (0, 1]");
        }
        if self.fill_target_percent == 0 || self.fill_target_percent > 100 {
            return invalid("fill_target_percent", "must be in 1..=100");
        }
        if self.checkpoint_interval == 0 {
            return invalid("checkpoint_interval", "must be positive");
        }
        if self.trace_len > MAX_TRACE_LEN {
            return invalid("trace_len", "exceeds MAX_TRACE_LEN");
        }
        if !(self.position_tolerance >= 0.0) {
            return invalid("position_tolerance", "must be non-negative");
        }
        if !(self.spatial_cell > 0.0) {
            return invalid("spatial_cell", "must be positive");
        }
        Ok(())
    }

    /// Number of interior (non-border) tiles.
    pub fn interior_area(&self) -> u32 {
        (self.grid_width - 2) * (self.grid_height - 2)
    }
}
