//! Replay Validation
//!
//! Verify a level by deterministic re-simulation. Nothing in a submitted
//! replay is trusted: its config must equal the server's, its balls must be
//! exactly the spawns its seed generates, and only then is a fresh
//! `Simulation` run with the recorded placements injected on their tick and
//! compared at every checkpoint.
//!
//! Whether `replay.seed` is the seed the server issued for the level is the
//! caller's check.

use std::collections::VecDeque;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::SimConfig;
use crate::game::ball::BallKinematics;
use crate::game::level::LevelSetup;
use crate::game::state::Simulation;
use crate::replay::transcript::Replay;
use crate::SIM_VERSION;

/// Ball states after one tick, kept for mismatch diagnostics.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TraceSample {
    /// Tick number
    pub t: u32,
    /// Ball states in id order
    pub balls: Vec<BallKinematics>,
}

/// Why a replay failed validation.
#[derive(Clone, Debug, Error, PartialEq, Serialize)]
pub enum ValidationError {
    /// Recorded with a different simulation version.
    #[error("version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Version of this build
        expected: u32,
        /// Version in the replay
        got: u32,
    },

    /// The replay has no result.
    #[error("replay is incomplete")]
    Incomplete,

    /// The server's config is unusable.
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// What is wrong
        reason: String,
    },

    /// The replay was recorded under different rules.
    #[error("replay config differs from the server config")]
    ConfigMismatch,

    /// Wrong number of initial balls for the level.
    #[error("level has {expected} balls, replay has {actual}")]
    SpawnCountMismatch {
        /// Balls the level is played with
        expected: usize,
        /// Balls in the replay
        actual: usize,
    },

    /// An initial ball is not the one the replay's seed generates.
    #[error("initial ball {index} does not match seed {seed}")]
    SpawnMismatch {
        /// Position in the spawn list
        index: usize,
        /// Seed recorded in the replay
        seed: u64,
    },

    /// An initial ball could not be added.
    #[error("invalid initial ball {index}: {reason}")]
    InvalidSpawn {
        /// Position in the spawn list
        index: usize,
        /// What is wrong
        reason: String,
    },

    /// A checkpoint lies beyond the final tick or out of order.
    #[error("checkpoint at tick {tick} is never reached (final tick {final_tick})")]
    UnreachedCheckpoint {
        /// Checkpoint tick
        tick: u32,
        /// Recorded final tick
        final_tick: u32,
    },

    /// Different number of balls at a checkpoint.
    #[error("ball count mismatch at tick {tick}: expected {expected}, got {actual}")]
    BallCountMismatch {
        /// Checkpoint tick
        tick: u32,
        /// Recorded count
        expected: usize,
        /// Simulated count
        actual: usize,
        /// Trailing sampled states
        trace: Vec<TraceSample>,
    },

    /// A ball drifted beyond tolerance.
    #[error("position mismatch at tick {tick} for ball {ball}: expected {expected:?}, got {actual:?}")]
    PositionMismatch {
        /// Checkpoint tick
        tick: u32,
        /// Ball index
        ball: usize,
        /// Recorded position
        expected: (f64, f64),
        /// Simulated position
        actual: (f64, f64),
        /// Trailing sampled states
        trace: Vec<TraceSample>,
    },

    /// A ball's velocity differs.
    #[error("velocity mismatch at tick {tick} for ball {ball}: expected {expected:?}, got {actual:?}")]
    VelocityMismatch {
        /// Checkpoint tick
        tick: u32,
        /// Ball index
        ball: usize,
        /// Recorded velocity
        expected: (f64, f64),
        /// Simulated velocity
        actual: (f64, f64),
        /// Trailing sampled states
        trace: Vec<TraceSample>,
    },

    /// Fill or completion differs from the recorded result.
    #[error("result mismatch: expected {expected:?}, got {actual:?}")]
    ResultMismatch {
        /// Recorded (fill percent, level complete)
        expected: (u32, bool),
        /// Simulated (fill percent, level complete)
        actual: (u32, bool),
    },

    /// Final state hash differs.
    #[error("final state hash mismatch: expected {expected}, got {actual}")]
    FinalStateMismatch {
        /// Recorded hash, hex
        expected: String,
        /// Simulated hash, hex
        actual: String,
    },
}

impl ValidationError {
    /// Tick the failure was detected at, if tied to one.
    pub fn tick(&self) -> Option<u32> {
        match self {
            Self::UnreachedCheckpoint { tick, .. }
            | Self::BallCountMismatch { tick, .. }
            | Self::PositionMismatch { tick, .. }
            | Self::VelocityMismatch { tick, .. } => Some(*tick),
            _ => None,
        }
    }

    /// Trailing states leading up to the failure.
    pub fn trace(&self) -> &[TraceSample] {
        match self {
            Self::BallCountMismatch { trace, .. }
            | Self::PositionMismatch { trace, .. }
            | Self::VelocityMismatch { trace, .. } => trace,
            _ => &[],
        }
    }
}

/// Outcome of validating a replay.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Did the replay reproduce?
    pub valid: bool,
    /// First failure, if any
    pub error: Option<ValidationError>,
    /// Checkpoints compared before stopping
    pub checkpoints_checked: usize,
    /// Tick the re-simulation reached
    pub final_tick: u32,
}

/// Validate a replay by full re-simulation under `config`, for a level
/// played with `ball_count` balls.
pub fn validate_level(replay: &Replay, config: &SimConfig, ball_count: usize) -> ValidationReport {
    let mut progress = Progress::default();

    match run_validation(replay, config, ball_count, &mut progress) {
        Ok(()) => {
            debug!(
                ticks = progress.tick,
                checkpoints = progress.checkpoints,
                "replay validated"
            );
            ValidationReport {
                valid: true,
                error: None,
                checkpoints_checked: progress.checkpoints,
                final_tick: progress.tick,
            }
        }
        Err(error) => {
            warn!(tick = ?error.tick(), %error, "replay validation failed");
            ValidationReport {
                valid: false,
                error: Some(error),
                checkpoints_checked: progress.checkpoints,
                final_tick: progress.tick,
            }
        }
    }
}

#[derive(Default)]
struct Progress {
    tick: u32,
    checkpoints: usize,
}

/// Bounded ring of recent states.
struct Trace {
    samples: VecDeque<TraceSample>,
    capacity: usize,
}

impl Trace {
    fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::new(),
            capacity,
        }
    }

    fn push(&mut self, sim: &Simulation) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(TraceSample {
            t: sim.tick_count(),
            balls: sim.ball_kinematics(),
        });
    }

    fn snapshot(&self) -> Vec<TraceSample> {
        self.samples.iter().cloned().collect()
    }
}

fn run_validation(
    replay: &Replay,
    config: &SimConfig,
    ball_count: usize,
    progress: &mut Progress,
) -> Result<(), ValidationError> {
    if replay.version != SIM_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: SIM_VERSION,
            got: replay.version,
        });
    }
    let result = replay.result.as_ref().ok_or(ValidationError::Incomplete)?;
    config
        .validate()
        .map_err(|e| ValidationError::InvalidConfig { reason: e.to_string() })?;
    if replay.config != *config {
        return Err(ValidationError::ConfigMismatch);
    }

    if replay.balls.len() != ball_count {
        return Err(ValidationError::SpawnCountMismatch {
            expected: ball_count,
            actual: replay.balls.len(),
        });
    }
    let setup = LevelSetup::generate(replay.seed, ball_count, config);
    if let Some(index) = (0..ball_count).find(|&i| setup.balls.get(i) != replay.balls.get(i)) {
        return Err(ValidationError::SpawnMismatch {
            index,
            seed: replay.seed,
        });
    }

    // Checkpoints must be strictly increasing and reachable.
    let mut last = 0;
    for checkpoint in &replay.checkpoints {
        if checkpoint.t <= last || checkpoint.t > result.final_tick {
            return Err(ValidationError::UnreachedCheckpoint {
                tick: checkpoint.t,
                final_tick: result.final_tick,
            });
        }
        last = checkpoint.t;
    }

    let mut sim = Simulation::new(config.clone());
    sim.init();
    for (index, spawn) in replay.balls.iter().enumerate() {
        sim.spawn(spawn)
            .map_err(|e| ValidationError::InvalidSpawn { index, reason: e.to_string() })?;
    }

    let actions = replay.actions_by_tick();
    let mut checkpoints = replay.checkpoints.iter().peekable();
    let mut trace = Trace::new(config.trace_len);

    while sim.tick_count() < result.final_tick {
        let next = sim.tick_count() + 1;
        let requests = actions.get(&next).map(Vec::as_slice).unwrap_or(&[]);
        sim.tick(requests);
        progress.tick = sim.tick_count();
        trace.push(&sim);

        if let Some(checkpoint) = checkpoints.next_if(|c| c.t == sim.tick_count()) {
            compare_checkpoint(
                checkpoint.t,
                &checkpoint.balls,
                &sim.ball_kinematics(),
                config.position_tolerance,
                &trace,
            )?;
            progress.checkpoints += 1;
        }
    }

    let expected = (result.fill_percent, result.level_complete);
    let actual = (sim.fill_percent(), sim.level_complete());
    if expected != actual {
        return Err(ValidationError::ResultMismatch { expected, actual });
    }

    let hash = sim.compute_hash();
    if hash != result.state_hash {
        return Err(ValidationError::FinalStateMismatch {
            expected: hex::encode(result.state_hash),
            actual: hex::encode(hash),
        });
    }

    Ok(())
}

fn compare_checkpoint(
    tick: u32,
    expected: &[BallKinematics],
    actual: &[BallKinematics],
    tolerance: f64,
    trace: &Trace,
) -> Result<(), ValidationError> {
    if expected.len() != actual.len() {
        return Err(ValidationError::BallCountMismatch {
            tick,
            expected: expected.len(),
            actual: actual.len(),
            trace: trace.snapshot(),
        });
    }

    for (ball, (e, a)) in expected.iter().zip(actual).enumerate() {
        if (e.x - a.x).abs() > tolerance || (e.y - a.y).abs() > tolerance {
            return Err(ValidationError::PositionMismatch {
                tick,
                ball,
                expected: (e.x, e.y),
                actual: (a.x, a.y),
                trace: trace.snapshot(),
            });
        }
        if e.vx != a.vx || e.vy != a.vy {
            return Err(ValidationError::VelocityMismatch {
                tick,
                ball,
                expected: (e.vx, e.vy),
                actual: (a.vx, a.vy),
                trace: trace.snapshot(),
            });
        }
    }

    Ok(())
}
