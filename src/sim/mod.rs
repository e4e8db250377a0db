//! Deterministic game simulation
//!
//! All gameplay rules live here. This module must stay pure:
//! - Time only arrives as an explicit `dt`
//! - Seeded RNG only
//! - No threads, I/O or platform dependencies

pub mod arrows;
pub mod matcher;
pub mod scoring;
pub mod state;
pub mod tick;
pub mod timer;

pub use arrows::{ArrowEvent, ArrowId, ArrowPhase, ArrowQueue, ArrowTiming, ArrowTone};
pub use matcher::{InputMatcher, MatchOutcome};
pub use scoring::{LinearScoring, RoundBonus, ScoringStrategy};
pub use state::{GameEvent, GamePhase, GameSession, RoundOutcome};
pub use tick::{TickContext, TickInput, advance, begin, stop, submit, tick};
pub use timer::RoundTimer;
