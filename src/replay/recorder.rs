//! Replay Recorder
//!
//! Wraps a live `Simulation` and records what the validator needs to
//! reproduce it.

use chrono::Utc;
use tracing::debug;

use crate::config::SimConfig;
use crate::game::level::LevelSetup;
use crate::game::placement::PlacementRequest;
use crate::game::state::{SimError, Simulation};
use crate::game::tick::TickResult;
use crate::replay::transcript::{LevelResult, Replay};

/// A simulation that records itself.
#[derive(Clone, Debug)]
pub struct ReplayRecorder {
    sim: Simulation,
    replay: Replay,
}

impl ReplayRecorder {
    /// Initialize a level from `setup` and start recording.
    pub fn new(config: SimConfig, setup: &LevelSetup) -> Result<Self, SimError> {
        let mut sim = Simulation::new(config.clone());
        let version = sim.init();
        for spawn in &setup.balls {
            sim.spawn(spawn)?;
        }

        Ok(Self {
            sim,
            replay: Replay::new(version, config, setup.seed, setup.balls.clone()),
        })
    }

    /// Attach a label to the replay metadata.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.replay.metadata.label = Some(label.into());
    }

    /// Run one tick, logging accepted placements and checkpoints.
    pub fn tick(&mut self, actions: &[PlacementRequest]) -> TickResult {
        let result = self.sim.tick(actions);

        for request in &result.accepted {
            self.replay.record_action(result.tick, request);
        }

        if result.tick % self.sim.config().checkpoint_interval == 0 {
            self.replay
                .add_checkpoint(result.tick, self.sim.ball_kinematics());
        }

        result
    }

    /// The live simulation.
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// The replay so far.
    pub fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Stop recording and write the result.
    pub fn finish(mut self) -> Replay {
        let result = LevelResult {
            final_tick: self.sim.tick_count(),
            fill_percent: self.sim.fill_percent(),
            level_complete: self.sim.level_complete(),
            state_hash: self.sim.compute_hash(),
        };
        debug!(
            final_tick = result.final_tick,
            fill = result.fill_percent,
            actions = self.replay.actions.len(),
            checkpoints = self.replay.checkpoints.len(),
            hash = %hex::encode(&result.state_hash[..8]),
            "replay finished"
        );

        self.replay.finalize(result);
        self.replay.metadata.recorded_at = Some(Utc::now());
        self.replay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> ReplayRecorder {
        let config = SimConfig::default();
        let setup = LevelSetup::generate(42, 3, &config);
        ReplayRecorder::new(config, &setup).unwrap()
    }

    #[test]
    fn test_records_initial_state() {
        let rec = recorder();
        assert_eq!(rec.replay().balls.len(), 3);
        assert_eq!(rec.replay().seed, 42);
        assert_eq!(rec.simulation().balls().len(), 3);
        assert_eq!(rec.replay().version, crate::SIM_VERSION);
    }

    #[test]
    fn test_records_only_accepted_actions() {
        let mut rec = recorder();
        rec.tick(&[]);
        rec.tick(&[
            PlacementRequest::vertical(0, 0),
            PlacementRequest::horizontal(15, 10),
        ]);

        let actions = &rec.replay().actions;
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].t, 2);
        assert_eq!(actions[0].request(), PlacementRequest::horizontal(15, 10));
    }

    #[test]
    fn test_checkpoint_interval() {
        let mut rec = recorder();
        for _ in 0..125 {
            rec.tick(&[]);
        }
        let ticks: Vec<u32> = rec.replay().checkpoints.iter().map(|c| c.t).collect();
        assert_eq!(ticks, vec![60, 120]);
        assert_eq!(rec.replay().checkpoints[0].balls.len(), 3);
    }

    #[test]
    fn test_finish_writes_result() {
        let mut rec = recorder();
        for _ in 0..10 {
            rec.tick(&[]);
        }
        let hash = rec.simulation().compute_hash();
        let replay = rec.finish();

        let result = replay.result.as_ref().unwrap();
        assert_eq!(result.final_tick, 10);
        assert_eq!(result.state_hash, hash);
        assert!(replay.metadata.recorded_at.is_some());
    }
}
