//! Stratagem Hero - A directional-input reflex minigame engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (matcher, round timer, state machine, arrows)
//! - `game`: Single-threaded owner tying the simulation to settings and scores
//! - `engine`: Actor thread with a command queue and published snapshots
//! - `platform`: Clock, asset loader and peer channel abstractions
//! - `highscores` / `persistence` / `sync`: Ledger, storage and cross-device merge
//! - `tuning`: Data-driven round timings and scoring

pub mod catalog;
pub mod engine;
pub mod error;
pub mod game;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod preload;
pub mod settings;
pub mod sim;
pub mod sync;
pub mod tuning;

pub use catalog::{Direction, Stratagem, StratagemCatalog};
pub use engine::{Command, EngineHandle, EngineParts};
pub use error::{ConfigError, EngineError};
pub use game::{Game, Snapshot};
pub use highscores::HighScores;
pub use settings::Settings;
pub use tuning::Tuning;

/// Engine constants that are not worth tuning
pub mod consts {
    /// Longest step the engine clock may take in one tick (seconds).
    /// A stalled thread loses time instead of expiring rounds at once.
    pub const MAX_FRAME_SECS: f32 = 0.5;

    /// Pending events kept for a slow consumer before new ones are dropped
    pub const EVENT_QUEUE_CAPACITY: usize = 256;
}
