//! Replay Recording Format
//!
//! Everything needed to re-simulate a level: the rules, the initial balls,
//! every accepted placement tagged with the tick it took effect, and
//! periodic ball checkpoints to compare against.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::config::SimConfig;
use crate::core::hash::StateHash;
use crate::game::ball::BallKinematics;
use crate::game::level::BallSpawn;
use crate::game::placement::PlacementRequest;

/// Complete record of one played level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    /// Simulation version returned by `init` when recording.
    pub version: u32,

    /// Rules the level was played with.
    pub config: SimConfig,

    /// Seed the initial balls were drawn from.
    pub seed: u64,

    /// Initial ball states, in the order they were added.
    pub balls: Vec<BallSpawn>,

    /// Accepted placements, in tick order.
    pub actions: Vec<ReplayAction>,

    /// Ball states every `checkpoint_interval` ticks.
    pub checkpoints: Vec<Checkpoint>,

    /// Final outcome; `None` while still recording.
    pub result: Option<LevelResult>,

    /// Informational only, never validated.
    #[serde(default)]
    pub metadata: ReplayMetadata,
}

/// A placement that took effect on tick `t`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayAction {
    /// Tick produced by the `tick` call that accepted it
    pub t: u32,
    /// Tile column
    pub x: i32,
    /// Tile row
    pub y: i32,
    /// Vertical placement?
    pub vertical: bool,
}

impl ReplayAction {
    /// Tag a request with its tick.
    pub fn new(t: u32, request: &PlacementRequest) -> Self {
        Self {
            t,
            x: request.x,
            y: request.y,
            vertical: request.vertical,
        }
    }

    /// The request to inject.
    pub fn request(&self) -> PlacementRequest {
        PlacementRequest {
            x: self.x,
            y: self.y,
            vertical: self.vertical,
        }
    }
}

/// Ball states after tick `t`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Tick number
    pub t: u32,
    /// One entry per ball, in id order
    pub balls: Vec<BallKinematics>,
}

/// Final outcome of a recorded level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelResult {
    /// Last tick played
    pub final_tick: u32,
    /// Fill percentage at the end
    pub fill_percent: u32,
    /// Was the fill target reached?
    pub level_complete: bool,
    /// Hash of the final simulation state
    #[serde(with = "hex_hash")]
    pub state_hash: StateHash,
}

/// Recording metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayMetadata {
    /// When recording finished
    pub recorded_at: Option<DateTime<Utc>>,
    /// Free-form label
    pub label: Option<String>,
}

/// Errors reading or writing replays.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// JSON encoding failed.
    #[error("replay json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary encoding failed.
    #[error("replay binary error: {0}")]
    Binary(#[from] bincode::Error),

    /// File could not be read or written.
    #[error("replay io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Replay {
    /// Start an empty replay.
    pub fn new(version: u32, config: SimConfig, seed: u64, balls: Vec<BallSpawn>) -> Self {
        Self {
            version,
            config,
            seed,
            balls,
            actions: Vec::new(),
            checkpoints: Vec::new(),
            result: None,
            metadata: ReplayMetadata::default(),
        }
    }

    /// Append an accepted placement.
    pub fn record_action(&mut self, t: u32, request: &PlacementRequest) {
        self.actions.push(ReplayAction::new(t, request));
    }

    /// Append a checkpoint.
    pub fn add_checkpoint(&mut self, t: u32, balls: Vec<BallKinematics>) {
        self.checkpoints.push(Checkpoint { t, balls });
    }

    /// Set the final outcome.
    pub fn finalize(&mut self, result: LevelResult) {
        self.result = Some(result);
    }

    /// Has a result been written?
    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    /// Actions grouped by the tick they take effect on, in recorded order.
    pub fn actions_by_tick(&self) -> BTreeMap<u32, Vec<PlacementRequest>> {
        let mut by_tick: BTreeMap<u32, Vec<PlacementRequest>> = BTreeMap::new();
        for action in &self.actions {
            by_tick.entry(action.t).or_default().push(action.request());
        }
        by_tick
    }

    /// Pretty JSON encoding.
    pub fn to_json(&self) -> Result<String, ReplayError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode JSON.
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Compact bincode encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ReplayError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode bincode.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ReplayError> {
        Ok(bincode::deserialize(data)?)
    }

    /// Write JSON to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ReplayError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read JSON from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

/// State hashes as hex strings.
mod hex_hash {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use crate::core::hash::StateHash;

    pub fn serialize<S: Serializer>(hash: &StateHash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<StateHash, D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = hex::decode(&text).map_err(D::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| D::Error::custom("state hash must be 32 bytes"))
    }
}
