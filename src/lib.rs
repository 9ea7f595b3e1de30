//! # Enclosure Core
//!
//! Deterministic simulation core for a tile-based enclosure game: balls
//! bounce around a grid while the player grows walls to fence off territory.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ENCLOSURE CORE                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                 │
//! │  ├── rect.rs     - Axis-aligned rectangles, tile snapping   │
//! │  ├── arena.rs    - Generation-checked entity handles        │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG          │
//! │  └── hash.rs     - State hashing for verification           │
//! │                                                             │
//! │  config.rs       - Simulation rules (JSON loadable)         │
//! │                                                             │
//! │  game/           - Simulation (deterministic)               │
//! │  ├── grid.rs     - Tile grid                                │
//! │  ├── ball.rs     - Balls                                    │
//! │  ├── wall.rs     - Growing walls                            │
//! │  ├── collision.rs- Collision detection                      │
//! │  ├── placement.rs- Wall placement intake                    │
//! │  ├── fill.rs     - Enclosure flood fill                     │
//! │  ├── level.rs    - Seeded ball spawns                       │
//! │  ├── state.rs    - Owned simulation state                   │
//! │  └── tick.rs     - Authoritative simulation loop            │
//! │                                                             │
//! │  replay/         - Anti-cheat verification                  │
//! │  ├── transcript.rs - Replay format                          │
//! │  ├── recorder.rs - Live recording                           │
//! │  └── verify.rs   - Validation by re-simulation              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! `core/` and `game/` are deterministic:
//! - Floats see only correctly rounded IEEE-754 operations (no fused
//!   multiply-add, no transcendental functions), so every platform rounds
//!   them identically. Positions are not exact binary fractions: the spawn
//!   inset `(1.0 - 0.8) / 2.0` is already rounded, and so is every position
//!   derived from it
//! - No HashMap (BTreeMap for sorted iteration)
//! - No system time
//! - Randomness only in level setup, from a recorded seed
//!
//! Given identical config, initial balls and placements, two runs produce
//! bit-identical states.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;
pub mod replay;

// Re-export commonly used types
pub use config::{ConfigError, SimConfig};
pub use core::rng::DeterministicRng;
pub use game::level::{BallSpawn, LevelSetup};
pub use game::placement::PlacementRequest;
pub use game::state::{SimError, Simulation};
pub use game::tick::TickResult;
pub use replay::{validate_level, Replay, ReplayRecorder, ValidationReport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation version returned by `Simulation::init` and stored in replays.
/// Bump whenever a rule change would alter trajectories.
pub const SIM_VERSION: u32 = 1;

/// Physics tick rate (Hz)
pub const TICK_RATE: u32 = 60;
