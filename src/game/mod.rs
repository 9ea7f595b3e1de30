//! Game Logic Module
//!
//! All simulation code. 100% deterministic.
//!
//! ## Module Structure
//!
//! - `grid`: Tile grid and classification
//! - `ball`: Ball entities
//! - `wall`: Wall entities and growth
//! - `collision`: Collision detection (pure functions)
//! - `placement`: Wall placement intake
//! - `fill`: Enclosure flood fill
//! - `events`: Per-tick collision and wall events
//! - `level`: Seeded ball spawns
//! - `state`: The owned `Simulation`
//! - `tick`: Authoritative simulation loop

pub mod grid;
pub mod ball;
pub mod wall;
pub mod collision;
pub mod placement;
pub mod fill;
pub mod events;
pub mod level;
pub mod state;
pub mod tick;

// Re-export key types
pub use grid::{Grid, Tile};
pub use ball::{Ball, BallId, BallKinematics, BallSnapshot};
pub use wall::{ActiveWall, Direction, NewWall, Wall, WallId};
pub use collision::Normal;
pub use placement::PlacementRequest;
pub use events::{BallCollision, CollisionKind, WallEvent, WallEventKind};
pub use level::{BallSpawn, LevelSetup};
pub use state::{SimError, Simulation};
pub use tick::TickResult;
