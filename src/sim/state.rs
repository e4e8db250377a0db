//! Game session state
//!
//! Everything the state machine mutates lives here. Presentation code only
//! ever sees snapshots of it.

use std::collections::VecDeque;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::matcher::{InputMatcher, MatchOutcome};
use super::scoring::RoundBonus;
use super::timer::RoundTimer;
use crate::catalog::Direction;
use crate::preload::SoundCue;

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the first input
    NotStarted,
    /// Round announcement countdown
    RoundStarting,
    /// Active play, round timer running
    Started,
    /// Bonus tally between rounds
    RoundEnded,
    /// Run ended; any input starts a new one
    GameOver,
}

/// How the last round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Completed,
    TimedOut,
}

/// Things that happened during a tick, in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    GameStarted,
    RoundStarted {
        round: u32,
        stratagem_id: u32,
    },
    InputAccepted {
        direction: Direction,
        outcome: MatchOutcome,
    },
    RoundCompleted {
        round: u32,
        bonus: RoundBonus,
        score: u64,
    },
    RoundTimedOut {
        round: u32,
    },
    /// Run over; the score goes to the ledger
    GameOver {
        score: u64,
        round: u32,
    },
    /// Run stopped from outside; the score still goes to the ledger
    RunAbandoned {
        score: u64,
        round: u32,
    },
    /// The ledger accepted a run score above the previous best
    NewHighScore {
        score: u64,
    },
}

impl GameEvent {
    /// Sound a front end would play for this event
    pub fn sound_cue(&self) -> Option<SoundCue> {
        match self {
            GameEvent::RoundStarted { .. } => Some(SoundCue::RoundStart),
            GameEvent::InputAccepted {
                outcome: MatchOutcome::Mismatch,
                ..
            } => Some(SoundCue::Mismatch),
            GameEvent::InputAccepted { .. } => Some(SoundCue::Press),
            GameEvent::RoundCompleted { .. } => Some(SoundCue::RoundComplete),
            GameEvent::GameOver { .. } => Some(SoundCue::GameOver),
            GameEvent::NewHighScore { .. } => Some(SoundCue::HighScore),
            GameEvent::GameStarted
            | GameEvent::RoundTimedOut { .. }
            | GameEvent::RunAbandoned { .. } => None,
        }
    }
}

/// Complete session state for one player
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Current phase
    pub phase: GamePhase,
    /// Current round (1-based)
    pub round: u32,
    /// Accumulated score for this run
    pub score: u64,
    /// Bonus breakdown of the last ended round
    pub bonus: RoundBonus,
    /// How the last round ended
    pub last_outcome: Option<RoundOutcome>,
    /// Consecutive rounds completed without a mismatch
    pub perfect_streak: u32,
    /// Mismatches during the current round
    pub round_mistakes: u32,
    /// Round countdown
    pub timer: RoundTimer,
    /// Live input buffer
    pub matcher: InputMatcher,
    /// Catalog index of the stratagem being entered
    pub active: Option<usize>,
    /// Catalog indices queued after the active one
    pub upcoming: VecDeque<usize>,
    /// Recent picks, newest last
    pub recent: VecDeque<usize>,
    /// Red flash after a mismatch
    pub error: bool,
    /// Seconds left on the red flash
    pub error_remaining: f32,
    /// Mismatch counter the front end animates shake from
    pub shake: u32,
    /// Seconds left in RoundStarting / RoundEnded
    pub phase_remaining: f32,
    /// The current run already went to the ledger
    pub run_recorded: bool,
    rng: Pcg32,
}

impl GameSession {
    pub fn new(seed: u64, round_budget: f32) -> Self {
        Self {
            phase: GamePhase::NotStarted,
            round: 1,
            score: 0,
            bonus: RoundBonus::default(),
            last_outcome: None,
            perfect_streak: 0,
            round_mistakes: 0,
            timer: RoundTimer::new(round_budget),
            matcher: InputMatcher::new(),
            active: None,
            upcoming: VecDeque::new(),
            recent: VecDeque::new(),
            error: false,
            error_remaining: 0.0,
            shake: 0,
            phase_remaining: 0.0,
            run_recorded: true,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Reset for a new run. The RNG keeps running so runs differ.
    pub fn reset_run(&mut self) {
        self.clear_run();
        self.run_recorded = false;
    }

    /// Drop every per-run field. Leaves `phase` and `run_recorded` alone.
    pub fn clear_run(&mut self) {
        self.round = 1;
        self.score = 0;
        self.bonus = RoundBonus::default();
        self.last_outcome = None;
        self.perfect_streak = 0;
        self.round_mistakes = 0;
        self.timer.reset();
        self.matcher.clear();
        self.active = None;
        self.upcoming.clear();
        self.recent.clear();
        self.error = false;
        self.error_remaining = 0.0;
        self.shake = 0;
        self.phase_remaining = 0.0;
    }

    /// True while a run is underway and not yet recorded
    pub fn run_in_progress(&self) -> bool {
        !self.run_recorded
            && matches!(
                self.phase,
                GamePhase::RoundStarting | GamePhase::Started | GamePhase::RoundEnded
            )
    }

    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }
}
