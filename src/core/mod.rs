//! Core deterministic primitives.
//!
//! Geometry, entity storage, seeded randomness and state hashing. Nothing
//! in here knows about balls or walls.

pub mod arena;
pub mod hash;
pub mod rect;
pub mod rng;

// Re-export core types
pub use arena::{Arena, Handle};
pub use hash::{compute_state_hash, StateHash, StateHasher};
pub use rect::Rect;
pub use rng::DeterministicRng;
