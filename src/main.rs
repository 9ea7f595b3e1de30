//! Enclosure Simulation Driver
//!
//! Plays a scripted level headlessly, records it, then validates the
//! replay by re-simulation.
//!
//! Usage: `enclosure-sim [config.json]`

use anyhow::{bail, Context};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use enclosure::{
    game::events::WallEventKind, validate_level, LevelSetup, PlacementRequest, Replay,
    ReplayRecorder, SimConfig, SIM_VERSION, TICK_RATE, VERSION,
};

/// Level seed for the demo.
const DEMO_SEED: u64 = 12345;

/// Balls in the demo level.
const DEMO_BALLS: usize = 3;

/// Give up after two minutes of play.
const MAX_TICKS: u32 = 120 * TICK_RATE;

/// Ticks between scripted placements.
const PLACEMENT_PERIOD: u32 = 45;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Enclosure Core v{} (sim version {})", VERSION, SIM_VERSION);

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::load(&path).with_context(|| format!("loading config {path}"))?,
        None => SimConfig::default(),
    };
    info!(
        "Grid {}x{}, fill target {}%",
        config.grid_width, config.grid_height, config.fill_target_percent
    );

    let replay = play_demo_level(config.clone())?;
    verify_demo_replay(&replay, &config)
}

/// Sweep placements across the board until the level completes.
fn scripted_placement(tick: u32, config: &SimConfig) -> Option<PlacementRequest> {
    if tick == 0 || tick % PLACEMENT_PERIOD != 0 {
        return None;
    }
    let n = (tick / PLACEMENT_PERIOD) as i32;
    let cols = config.grid_width as i32 - 2;
    let rows = config.grid_height as i32 - 2;
    Some(if n % 2 == 0 {
        PlacementRequest::vertical(1 + (n * 3) % cols, 1 + (n * 5) % rows)
    } else {
        PlacementRequest::horizontal(1 + (n * 7) % cols, 1 + (n * 2) % rows)
    })
}

/// Play and record the demo level.
fn play_demo_level(config: SimConfig) -> anyhow::Result<Replay> {
    info!("=== Playing Demo Level ===");

    let setup = LevelSetup::generate(DEMO_SEED, DEMO_BALLS, &config);
    for (i, ball) in setup.balls.iter().enumerate() {
        info!("Ball {} at ({:.2}, {:.2})", i, ball.x, ball.y);
    }

    let mut recorder = ReplayRecorder::new(config.clone(), &setup)
        .context("spawning demo balls")?;
    recorder.set_label("demo");

    for t in 1..=MAX_TICKS {
        let actions: Vec<_> = scripted_placement(t, &config).into_iter().collect();
        let result = recorder.tick(&actions);

        for event in &result.wall_events {
            match event.kind {
                WallEventKind::Finish { bounds, shortened } => info!(
                    "Tick {}: wall {} finished at ({}, {}) {}x{}{}",
                    result.tick,
                    event.wall,
                    bounds.x,
                    bounds.y,
                    bounds.w,
                    bounds.h,
                    if shortened { " (shortened)" } else { "" }
                ),
                WallEventKind::Die { ball } => {
                    info!("Tick {}: wall {} destroyed by ball {}", result.tick, event.wall, ball)
                }
                WallEventKind::DiePaired { partner } => {
                    info!("Tick {}: wall {} lost with wall {}", result.tick, event.wall, partner)
                }
            }
        }

        if result.captured > 0 {
            info!(
                "Tick {}: captured {} tiles, fill {}%",
                result.tick, result.captured, result.fill_percent
            );
        }

        if result.level_complete {
            info!("Level complete at tick {}", result.tick);
            break;
        }
    }

    let replay = recorder.finish();
    if let Some(result) = &replay.result {
        info!(
            "Final: tick {}, fill {}%, complete {}",
            result.final_tick, result.fill_percent, result.level_complete
        );
        info!("Final State Hash: {}", hex::encode(result.state_hash));
    }
    Ok(replay)
}

/// Round-trip the replay through both encodings and validate it against
/// the config the level was served with.
fn verify_demo_replay(replay: &Replay, config: &SimConfig) -> anyhow::Result<()> {
    info!("=== Validating Replay ===");

    let json = replay.to_json()?;
    let bytes = replay.to_bytes()?;
    info!(
        "Replay: {} actions, {} checkpoints, {} bytes json, {} bytes bincode",
        replay.actions.len(),
        replay.checkpoints.len(),
        json.len(),
        bytes.len()
    );

    let decoded = Replay::from_bytes(&bytes)?;
    if decoded.seed != DEMO_SEED {
        bail!("replay seed {} was not issued for this level", decoded.seed);
    }
    let report = validate_level(&decoded, config, DEMO_BALLS);

    if report.valid {
        info!(
            "REPLAY VERIFIED: {} checkpoints matched over {} ticks",
            report.checkpoints_checked, report.final_tick
        );
        Ok(())
    } else {
        if let Some(error) = &report.error {
            warn!("REPLAY FAILED: {}", error);
        }
        bail!("demo replay did not validate")
    }
}
