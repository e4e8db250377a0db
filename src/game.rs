//! Single-threaded game owner
//!
//! Wraps the pure simulation with the pieces it deliberately knows nothing
//! about: settings, the arrow overlay, the high score ledger and its store.
//! The engine actor drives one of these; tests drive it directly.

use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;

use crate::catalog::{Direction, Stratagem, StratagemCatalog};
use crate::highscores::{HighScores, LeaderboardEntry, LedgerSnapshot, RunRecord};
use crate::persistence::LedgerStore;
use crate::settings::Settings;
use crate::sim::{
    self, ArrowEvent, ArrowQueue, ArrowTiming, ArrowTone, GameEvent, GamePhase, GameSession,
    LinearScoring, MatchOutcome, RoundBonus, RoundOutcome, ScoringStrategy, TickContext,
    TickInput,
};
use crate::tuning::Tuning;

/// Everything a front end needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub round: u32,
    pub score: u64,
    /// Breakdown of the last ended round
    pub bonus: RoundBonus,
    pub last_outcome: Option<RoundOutcome>,
    pub remaining_time: f32,
    pub round_budget: f32,
    /// Remaining time as a 0..=1 fraction, for the timer bar
    pub time_fraction: f32,
    pub active: Option<Stratagem>,
    pub upcoming: Vec<Stratagem>,
    /// Symbols of the active sequence entered so far
    pub input_len: usize,
    pub error: bool,
    pub shake: u32,
    pub shake_enabled: bool,
    pub perfect_streak: u32,
    pub arrows: Vec<ArrowEvent>,
    pub preload_ready: bool,
    pub sound_enabled: bool,
    pub start_allowed: bool,
    pub best_score: u64,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub last_run: Option<RunRecord>,
}

pub struct Game {
    catalog: Arc<StratagemCatalog>,
    tuning: Tuning,
    scoring: Box<dyn ScoringStrategy>,
    settings: Settings,
    session: GameSession,
    arrows: ArrowQueue,
    ledger: HighScores,
    store: Box<dyn LedgerStore>,
    preload_ready: bool,
    last_run: Option<RunRecord>,
    /// A local run changed the ledger since the last sync
    ledger_dirty: bool,
    events: Vec<GameEvent>,
}

impl Game {
    /// `tuning` is expected to be validated already.
    pub fn new(
        catalog: Arc<StratagemCatalog>,
        tuning: Tuning,
        settings: Settings,
        store: Box<dyn LedgerStore>,
        seed: u64,
    ) -> Self {
        let ledger = match store.load() {
            Ok(Some(snapshot)) => HighScores::from_snapshot(snapshot),
            Ok(None) => HighScores::new(),
            Err(e) => {
                warn!("High scores unreadable, starting fresh: {e}");
                HighScores::new()
            }
        };

        let timing = ArrowTiming {
            move_secs: tuning.arrow_move_secs,
            fade_secs: tuning.arrow_fade_secs,
            travel: tuning.arrow_travel,
        };
        let mut arrows = ArrowQueue::new(timing, tuning.arrow_capacity);
        if settings.reduced_motion {
            arrows.set_travel(0.0);
        }

        Self {
            scoring: Box::new(LinearScoring::new(tuning.scoring.clone())),
            session: GameSession::new(seed, tuning.round_budget_secs),
            catalog,
            tuning,
            settings,
            arrows,
            ledger,
            store,
            preload_ready: false,
            last_run: None,
            ledger_dirty: false,
            events: Vec::new(),
        }
    }

    /// Swap the scoring formula
    pub fn with_scoring(mut self, scoring: Box<dyn ScoringStrategy>) -> Self {
        self.scoring = scoring;
        self
    }

    /// Assets are ready, or there is nothing to wait for
    pub fn start_allowed(&self) -> bool {
        self.preload_ready || !self.settings.needs_sound_assets()
    }

    /// Feed one direction. `None` when no round was active to take it.
    pub fn submit_input(&mut self, direction: Direction) -> Option<MatchOutcome> {
        self.with_context(|session, ctx, events| sim::submit(session, ctx, direction, events))
    }

    /// Explicit start. Returns true if the phase changed.
    pub fn start(&mut self) -> bool {
        self.with_context(|session, ctx, events| sim::begin(session, ctx, events))
    }

    /// Back to `NotStarted`, recording any unfinished run
    pub fn stop(&mut self) {
        self.arrows.clear();
        self.with_context(|session, _, events| sim::stop(session, events));
    }

    /// Advance game and arrow clocks by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        self.apply(&TickInput::default(), dt);
    }

    /// Apply a batch of queued commands, then advance time
    pub fn apply(&mut self, input: &TickInput, dt: f32) {
        if input.stop {
            self.arrows.clear();
        }
        self.with_context(|session, ctx, events| sim::tick(session, ctx, input, dt, events));
        self.arrows.advance(dt.max(0.0));
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.settings.sound_enabled = enabled;
        info!("Sound {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn set_preload_ready(&mut self) {
        self.preload_ready = true;
    }

    /// Fold in the paired device's ledger. Saves when anything changed.
    pub fn merge_remote(&mut self, remote: &LedgerSnapshot) -> bool {
        let changed = self.ledger.merge(remote);
        if changed {
            info!(
                "Merged remote scores, best is now {}",
                self.ledger.best_score()
            );
            self.persist();
        }
        changed
    }

    /// Drain events produced since the last call
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// True once per local ledger change
    pub fn take_ledger_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.ledger_dirty, false)
    }

    pub fn ledger(&self) -> &HighScores {
        &self.ledger
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn catalog(&self) -> &StratagemCatalog {
        &self.catalog
    }

    pub fn snapshot(&self) -> Snapshot {
        let session = &self.session;
        let lookup = |index: usize| self.catalog.get(index).cloned();
        Snapshot {
            phase: session.phase,
            round: session.round,
            score: session.score,
            bonus: session.bonus,
            last_outcome: session.last_outcome,
            remaining_time: session.timer.remaining(),
            round_budget: session.timer.budget(),
            time_fraction: session.timer.fraction(),
            active: session.active.and_then(lookup),
            upcoming: session.upcoming.iter().filter_map(|&i| lookup(i)).collect(),
            input_len: session.matcher.len(),
            error: session.error,
            shake: session.shake,
            shake_enabled: self.settings.effective_screen_shake(),
            perfect_streak: session.perfect_streak,
            arrows: self.arrows.iter().cloned().collect(),
            preload_ready: self.preload_ready,
            sound_enabled: self.settings.sound_enabled,
            start_allowed: self.start_allowed(),
            best_score: self.ledger.best_score(),
            leaderboard: self.ledger.entries().to_vec(),
            last_run: self.last_run,
        }
    }

    /// Run a simulation step, then react to whatever it emitted
    fn with_context<R>(
        &mut self,
        step: impl FnOnce(&mut GameSession, &TickContext<'_>, &mut Vec<GameEvent>) -> R,
    ) -> R {
        let first_new = self.events.len();
        let ctx = TickContext {
            catalog: &self.catalog,
            tuning: &self.tuning,
            scoring: self.scoring.as_ref(),
            start_allowed: self.preload_ready || !self.settings.needs_sound_assets(),
        };
        let result = step(&mut self.session, &ctx, &mut self.events);
        self.handle_events(first_new);
        result
    }

    fn handle_events(&mut self, mut index: usize) {
        while index < self.events.len() {
            match self.events[index].clone() {
                GameEvent::InputAccepted { direction, outcome } => {
                    let tone = if outcome.is_correct() {
                        ArrowTone::Correct
                    } else {
                        ArrowTone::Wrong
                    };
                    self.arrows.spawn(direction, tone);
                }
                GameEvent::GameOver { score, .. } | GameEvent::RunAbandoned { score, .. } => {
                    self.record_run(score);
                }
                _ => {}
            }
            index += 1;
        }
    }

    fn record_run(&mut self, score: u64) {
        let record = self.ledger.record_run(&self.settings.player_name, score);
        self.last_run = Some(record);
        if record.is_new_high_score {
            info!("New high score: {score}");
            self.events.push(GameEvent::NewHighScore { score });
        }
        if record.is_new_high_score || record.rank.is_some() {
            self.ledger_dirty = true;
            self.persist();
        }
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.ledger.snapshot()) {
            warn!("Failed to save high scores: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::sim::ArrowPhase;

    use Direction::{Down, Left, Right, Up};

    const RESUPPLY: [Direction; 4] = [Down, Down, Up, Right];

    fn single_catalog() -> Arc<StratagemCatalog> {
        Arc::new(
            StratagemCatalog::new(vec![Stratagem {
                id: 9,
                name: "Resupply".to_string(),
                sequence: RESUPPLY.to_vec(),
                asset_key: "resupply".to_string(),
            }])
            .unwrap(),
        )
    }

    fn quiet_settings() -> Settings {
        Settings {
            sound_enabled: false,
            ..Settings::default()
        }
    }

    fn game_with(settings: Settings, store: Box<dyn LedgerStore>) -> Game {
        Game::new(single_catalog(), Tuning::default(), settings, store, 3)
    }

    fn game() -> Game {
        game_with(quiet_settings(), Box::new(MemoryStore::new()))
    }

    /// Start and run the announcement down to an active round
    fn play(game: &mut Game) {
        if game.session().phase != GamePhase::RoundStarting {
            assert!(game.start());
        }
        let wait = game.tuning().round_start_secs;
        game.tick(wait);
        assert_eq!(game.session().phase, GamePhase::Started);
    }

    fn count_outcomes(events: &[GameEvent], wanted: MatchOutcome) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::InputAccepted { outcome, .. } if *outcome == wanted))
            .count()
    }

    #[test]
    fn test_full_sequence_completes_round() {
        let mut game = game();
        play(&mut game);
        game.take_events();

        for d in RESUPPLY {
            game.submit_input(d);
        }
        let events = game.take_events();
        assert_eq!(count_outcomes(&events, MatchOutcome::Completed), 1);
        assert_eq!(count_outcomes(&events, MatchOutcome::Mismatch), 0);

        let snapshot = game.snapshot();
        assert_eq!(snapshot.phase, GamePhase::RoundEnded);
        assert!(snapshot.bonus.perfect > 0);
    }

    #[test]
    fn test_quick_perfect_round_scores_all_bonuses() {
        let mut game = game();
        play(&mut game);
        for _ in 0..3 {
            game.tick(1.0);
        }
        for d in RESUPPLY {
            game.submit_input(d);
        }

        let snapshot = game.snapshot();
        assert_eq!(snapshot.bonus.round, 75);
        assert_eq!(snapshot.bonus.time, 70);
        assert_eq!(snapshot.bonus.perfect, 100);
        assert_eq!(snapshot.score, 245);
        assert_eq!(snapshot.round, 2);
    }

    #[test]
    fn test_mismatch_forfeits_perfect_bonus() {
        let mut game = game();
        play(&mut game);

        assert_eq!(game.submit_input(Left), Some(MatchOutcome::Mismatch));
        assert!(game.snapshot().error);
        for d in RESUPPLY {
            game.submit_input(d);
        }

        let snapshot = game.snapshot();
        assert_eq!(snapshot.phase, GamePhase::RoundEnded);
        assert_eq!(snapshot.bonus.perfect, 0);
        assert!(snapshot.bonus.round > 0);
        assert!(snapshot.bonus.time > 0);
        assert_eq!(snapshot.perfect_streak, 0);
    }

    #[test]
    fn test_timeout_records_new_high_score() {
        let store = Arc::new(MemoryStore::new());
        let mut game = game_with(quiet_settings(), Box::new(store.clone()));
        play(&mut game);
        for d in RESUPPLY {
            game.submit_input(d);
        }
        let earned = game.snapshot().score;

        // Next round: enter half the sequence and let the clock run out
        game.tick(game.tuning().round_end_secs);
        play(&mut game);
        game.submit_input(Down);
        game.submit_input(Down);
        game.tick(game.tuning().round_budget_secs);

        let snapshot = game.snapshot();
        assert_eq!(snapshot.phase, GamePhase::RoundEnded);
        assert_eq!(snapshot.bonus, RoundBonus::default());
        assert_eq!(snapshot.input_len, 0);

        game.tick(game.tuning().round_end_secs);
        let snapshot = game.snapshot();
        assert_eq!(snapshot.phase, GamePhase::GameOver);
        let run = snapshot.last_run.unwrap();
        assert!(run.is_new_high_score);
        assert_eq!(run.score, earned);
        assert_eq!(snapshot.best_score, earned);
        assert!(
            game.take_events()
                .contains(&GameEvent::NewHighScore { score: earned })
        );
        assert!(game.take_ledger_dirty());
        assert!(!game.take_ledger_dirty());

        // The store saw it too
        assert_eq!(store.load().unwrap().unwrap().best_score, earned);
    }

    #[test]
    fn test_sound_off_needs_no_preload() {
        let mut game = game();
        assert!(!game.snapshot().preload_ready);
        assert!(game.start());
        assert_eq!(game.session().phase, GamePhase::RoundStarting);
    }

    #[test]
    fn test_sound_on_waits_for_preload() {
        let mut game = game_with(Settings::default(), Box::new(MemoryStore::new()));
        assert!(!game.start_allowed());
        assert!(!game.start());
        assert_eq!(game.submit_input(Up), None);
        assert_eq!(game.session().phase, GamePhase::NotStarted);

        game.set_preload_ready();
        assert!(game.start());

        let mut muted = game_with(Settings::default(), Box::new(MemoryStore::new()));
        muted.set_sound_enabled(false);
        assert!(muted.start());
    }

    #[test]
    fn test_every_input_spawns_an_arrow() {
        let mut game = game();
        play(&mut game);
        game.submit_input(Left);
        game.submit_input(Down);

        let arrows = game.snapshot().arrows;
        assert_eq!(arrows.len(), 2);
        assert_eq!(arrows[0].tone, ArrowTone::Wrong);
        assert_eq!(arrows[1].tone, ArrowTone::Correct);
        assert_eq!(arrows[1].phase, ArrowPhase::Spawned);

        // Arrows keep fading after the round ends
        for d in &RESUPPLY[1..] {
            game.submit_input(*d);
        }
        assert_eq!(game.session().phase, GamePhase::RoundEnded);
        game.tick(1.0);
        assert!(game.snapshot().arrows.is_empty());
    }

    #[test]
    fn test_stop_records_run_and_clears_arrows() {
        let mut game = game();
        play(&mut game);
        game.submit_input(Left);
        for d in RESUPPLY {
            game.submit_input(d);
        }
        let score = game.snapshot().score;
        assert!(score > 0);
        game.stop();

        let snapshot = game.snapshot();
        assert_eq!(snapshot.phase, GamePhase::NotStarted);
        assert!(snapshot.arrows.is_empty());
        assert_eq!(snapshot.best_score, score);
        assert_eq!(snapshot.leaderboard[0].name, quiet_settings().player_name);

        // The abandoned run is gone from the session
        assert_eq!((snapshot.score, snapshot.round, snapshot.shake), (0, 1, 0));
        assert_eq!(snapshot.bonus, RoundBonus::default());
        assert_eq!(snapshot.last_outcome, None);
        assert_eq!(snapshot.perfect_streak, 0);
    }

    #[test]
    fn test_restart_does_not_record_twice() {
        let mut game = game();
        play(&mut game);
        game.tick(game.tuning().round_budget_secs);
        game.tick(game.tuning().round_end_secs);
        assert_eq!(game.session().phase, GamePhase::GameOver);

        let game_overs = |events: &[GameEvent]| {
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::GameOver { .. }))
                .count()
        };
        assert_eq!(game_overs(&game.take_events()), 1);

        assert!(game.start());
        game.stop();
        assert_eq!(game_overs(&game.take_events()), 0);
    }

    #[test]
    fn test_merge_remote_updates_ledger() {
        let store = Arc::new(MemoryStore::new());
        let mut game = game_with(quiet_settings(), Box::new(store.clone()));
        let remote = LedgerSnapshot {
            best_score: 900,
            entries: vec![LeaderboardEntry {
                rank: 1,
                name: "Watch".to_string(),
                score: 900,
            }],
        };
        assert!(game.merge_remote(&remote));
        assert!(!game.merge_remote(&remote));
        assert_eq!(game.snapshot().best_score, 900);
        assert_eq!(store.load().unwrap(), Some(remote));
        assert!(!game.take_ledger_dirty(), "remote merges are not re-synced");
    }

    #[test]
    fn test_loads_stored_ledger() {
        let mut ledger = HighScores::new();
        ledger.record_run("Saved", 480);
        let store = MemoryStore::with_snapshot(ledger.snapshot());
        let game = game_with(quiet_settings(), Box::new(store));
        assert_eq!(game.snapshot().best_score, 480);
    }

    #[test]
    fn test_reduced_motion_pins_arrows() {
        let settings = Settings {
            reduced_motion: true,
            ..quiet_settings()
        };
        let mut game = game_with(settings, Box::new(MemoryStore::new()));
        play(&mut game);
        game.submit_input(Down);
        game.tick(0.1);
        let arrow = &game.snapshot().arrows[0];
        assert_eq!(arrow.offset, glam::Vec2::ZERO);
        assert!(!game.snapshot().shake_enabled);
    }
}
