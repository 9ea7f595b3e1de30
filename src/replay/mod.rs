//! Replay System
//!
//! Anti-cheat verification by deterministic re-simulation:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    REPLAY SYSTEM                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  transcript.rs   - Replay format (JSON / bincode)           │
//! │  recorder.rs     - Records a live simulation                │
//! │  verify.rs       - Validation by re-simulation              │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod transcript;
pub mod recorder;
pub mod verify;

// Re-export key types
pub use transcript::{
    Checkpoint, LevelResult, Replay, ReplayAction, ReplayError, ReplayMetadata,
};
pub use recorder::ReplayRecorder;
pub use verify::{validate_level, TraceSample, ValidationError, ValidationReport};
