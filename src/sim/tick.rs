//! State machine transitions
//!
//! All transitions are plain functions of (session, event). Unexpected
//! events are ignored, never errors.

use super::matcher::MatchOutcome;
use super::scoring::{RoundBonus, ScoringStrategy};
use super::state::{GameEvent, GamePhase, GameSession, RoundOutcome};
use crate::catalog::{Direction, StratagemCatalog};
use crate::tuning::Tuning;

/// Read-only inputs the transitions need besides the session itself
pub struct TickContext<'a> {
    pub catalog: &'a StratagemCatalog,
    pub tuning: &'a Tuning,
    pub scoring: &'a dyn ScoringStrategy,
    /// Assets are ready, or sound is off
    pub start_allowed: bool,
}

/// Commands collected since the last tick, applied in this order:
/// stop, start, directions (FIFO), then time.
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub stop: bool,
    pub start: bool,
    pub directions: Vec<Direction>,
}

/// Apply queued commands, then advance time by `dt` seconds
pub fn tick(
    session: &mut GameSession,
    ctx: &TickContext<'_>,
    input: &TickInput,
    dt: f32,
    events: &mut Vec<GameEvent>,
) {
    if input.stop {
        stop(session, events);
    }
    if input.start {
        begin(session, ctx, events);
    }
    // Inputs land before the clock moves, so a finishing input queued in
    // the same tick as expiry still wins the round.
    for &direction in &input.directions {
        submit(session, ctx, direction, events);
    }
    advance(session, ctx, dt, events);
}

/// "Any input" / explicit start.
///
/// Returns true if the phase changed.
pub fn begin(session: &mut GameSession, ctx: &TickContext<'_>, events: &mut Vec<GameEvent>) -> bool {
    match session.phase {
        GamePhase::NotStarted | GamePhase::GameOver => new_game(session, ctx, events),
        GamePhase::RoundEnded => match session.last_outcome {
            Some(RoundOutcome::Completed) => {
                enter_round_starting(session, ctx);
                true
            }
            _ => {
                finish_run(session, events);
                new_game(session, ctx, events);
                true
            }
        },
        GamePhase::RoundStarting | GamePhase::Started => false,
    }
}

/// Feed one direction to the game.
///
/// Outside of `Started` this acts as `begin` and returns `None`.
pub fn submit(
    session: &mut GameSession,
    ctx: &TickContext<'_>,
    direction: Direction,
    events: &mut Vec<GameEvent>,
) -> Option<MatchOutcome> {
    if session.phase != GamePhase::Started {
        if !begin(session, ctx, events) {
            log::debug!("Ignoring {direction} in {:?}", session.phase);
        }
        return None;
    }

    let stratagem = session.active.and_then(|i| ctx.catalog.get(i))?;
    let outcome = session.matcher.submit(&stratagem.sequence, direction);
    events.push(GameEvent::InputAccepted { direction, outcome });

    match outcome {
        MatchOutcome::Continuing => {}
        MatchOutcome::Mismatch => {
            session.error = true;
            session.error_remaining = ctx.tuning.error_flash_secs;
            session.round_mistakes += 1;
            session.shake = session.shake.wrapping_add(1);
        }
        MatchOutcome::Completed => {
            session.error = false;
            complete_round(session, ctx, events);
        }
    }
    Some(outcome)
}

/// Advance phase clocks by `dt` seconds
pub fn advance(session: &mut GameSession, ctx: &TickContext<'_>, dt: f32, events: &mut Vec<GameEvent>) {
    let dt = dt.max(0.0);

    if session.error {
        session.error_remaining -= dt;
        if session.error_remaining <= 0.0 {
            session.error = false;
            session.error_remaining = 0.0;
        }
    }

    match session.phase {
        GamePhase::RoundStarting => {
            session.phase_remaining -= dt;
            if session.phase_remaining <= 0.0 {
                enter_started(session, ctx, events);
            }
        }
        GamePhase::Started => {
            if session.timer.tick(dt) {
                time_out_round(session, ctx, events);
            }
        }
        GamePhase::RoundEnded => {
            session.phase_remaining -= dt;
            if session.phase_remaining <= 0.0 {
                match session.last_outcome {
                    Some(RoundOutcome::Completed) => enter_round_starting(session, ctx),
                    _ => finish_run(session, events),
                }
            }
        }
        GamePhase::NotStarted | GamePhase::GameOver => {}
    }
}

/// Abrupt reset to `NotStarted`, dropping the whole run.
///
/// A run still in progress is reported first so its score reaches the ledger.
pub fn stop(session: &mut GameSession, events: &mut Vec<GameEvent>) {
    if session.phase == GamePhase::NotStarted {
        return;
    }
    if session.run_in_progress() {
        session.run_recorded = true;
        events.push(GameEvent::RunAbandoned {
            score: session.score,
            round: session.round,
        });
    }
    log::debug!("Stopped from {:?}", session.phase);
    session.clear_run();
    session.run_recorded = true;
    session.phase = GamePhase::NotStarted;
}

fn new_game(session: &mut GameSession, ctx: &TickContext<'_>, events: &mut Vec<GameEvent>) -> bool {
    if !ctx.start_allowed {
        log::debug!("Start blocked until assets finish loading");
        return false;
    }
    session.reset_run();
    fill_lookahead(session, ctx);
    events.push(GameEvent::GameStarted);
    log::info!("Game started");
    enter_round_starting(session, ctx);
    true
}

fn enter_round_starting(session: &mut GameSession, ctx: &TickContext<'_>) {
    session.phase = GamePhase::RoundStarting;
    session.phase_remaining = ctx.tuning.round_start_secs;
}

fn enter_started(session: &mut GameSession, ctx: &TickContext<'_>, events: &mut Vec<GameEvent>) {
    fill_lookahead(session, ctx);
    session.active = session.upcoming.pop_front();
    fill_lookahead(session, ctx);

    session.phase = GamePhase::Started;
    session.phase_remaining = 0.0;
    session.timer.reset();
    session.matcher.clear();
    session.error = false;
    session.error_remaining = 0.0;
    session.round_mistakes = 0;

    let stratagem_id = session
        .active
        .and_then(|i| ctx.catalog.get(i))
        .map(|s| s.id)
        .unwrap_or_default();
    log::debug!("Round {} started with stratagem {stratagem_id}", session.round);
    events.push(GameEvent::RoundStarted {
        round: session.round,
        stratagem_id,
    });
}

fn complete_round(session: &mut GameSession, ctx: &TickContext<'_>, events: &mut Vec<GameEvent>) {
    let perfect = session.round_mistakes == 0;
    let bonus = ctx.scoring.score_round(
        session.round,
        session.timer.remaining(),
        session.timer.budget(),
        perfect,
    );
    session.score = session.score.saturating_add(bonus.total());
    session.bonus = bonus;
    session.perfect_streak = if perfect {
        session.perfect_streak + 1
    } else {
        0
    };
    events.push(GameEvent::RoundCompleted {
        round: session.round,
        bonus,
        score: session.score,
    });
    log::debug!(
        "Round {} complete: +{} (round {}, time {}, perfect {})",
        session.round,
        bonus.total(),
        bonus.round,
        bonus.time,
        bonus.perfect
    );

    session.round += 1;
    session.last_outcome = Some(RoundOutcome::Completed);
    session.phase = GamePhase::RoundEnded;
    session.phase_remaining = ctx.tuning.round_end_secs;
}

fn time_out_round(session: &mut GameSession, ctx: &TickContext<'_>, events: &mut Vec<GameEvent>) {
    session.bonus = RoundBonus::default();
    session.perfect_streak = 0;
    session.matcher.clear();
    session.last_outcome = Some(RoundOutcome::TimedOut);
    session.phase = GamePhase::RoundEnded;
    session.phase_remaining = ctx.tuning.round_end_secs;
    events.push(GameEvent::RoundTimedOut {
        round: session.round,
    });
    log::debug!("Round {} timed out", session.round);
}

fn finish_run(session: &mut GameSession, events: &mut Vec<GameEvent>) {
    session.phase = GamePhase::GameOver;
    session.phase_remaining = 0.0;
    if !session.run_recorded {
        session.run_recorded = true;
        events.push(GameEvent::GameOver {
            score: session.score,
            round: session.round,
        });
        log::info!(
            "Game over at round {} with {} points",
            session.round,
            session.score
        );
    }
}

/// Keep `lookahead` stratagems queued, avoiding recent picks
fn fill_lookahead(session: &mut GameSession, ctx: &TickContext<'_>) {
    let exclusion = ctx
        .tuning
        .recent_exclusion
        .min(ctx.catalog.len().saturating_sub(1));
    while session.upcoming.len() < ctx.tuning.lookahead {
        let recent: Vec<usize> = session.recent.iter().copied().collect();
        let index = ctx.catalog.next_index(session.rng(), &recent);
        session.upcoming.push_back(index);
        session.recent.push_back(index);
        while session.recent.len() > exclusion {
            session.recent.pop_front();
        }
    }
}
