//! Stratagem Hero entry point
//!
//! Headless demo: spawns the engine with a simulated paired device, lets an
//! autoplayer clear a few rounds, then waits for the round timer to end the
//! run and prints the result.
//!
//! Usage: stratagem-hero [--catalog FILE] [--tuning FILE] [--settings FILE]
//!                       [--scores FILE] [--rounds N] [--seed N]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use stratagem_hero::error::SyncError;
use stratagem_hero::highscores::{HighScores, LedgerSnapshot};
use stratagem_hero::persistence::{JsonFileStore, LedgerStore, MemoryStore};
use stratagem_hero::platform::{LoopbackPeer, PeerChannel, SimulatedLoader};
use stratagem_hero::sim::{GameEvent, GamePhase};
use stratagem_hero::{Direction, EngineHandle, EngineParts, Settings, StratagemCatalog, Tuning};

/// Demo options
#[derive(Debug, Default)]
struct Options {
    catalog: Option<PathBuf>,
    tuning: Option<PathBuf>,
    settings: Option<PathBuf>,
    scores: Option<PathBuf>,
    rounds: Option<u32>,
    seed: Option<u64>,
}

impl Options {
    fn parse() -> Result<Self, String> {
        let mut options = Options::default();
        let mut args = std::env::args().skip(1);
        while let Some(flag) = args.next() {
            let value = args
                .next()
                .ok_or_else(|| format!("missing value for {flag}"))?;
            match flag.as_str() {
                "--catalog" => options.catalog = Some(value.into()),
                "--tuning" => options.tuning = Some(value.into()),
                "--settings" => options.settings = Some(value.into()),
                "--scores" => options.scores = Some(value.into()),
                "--rounds" => {
                    options.rounds = Some(value.parse().map_err(|e| format!("--rounds: {e}"))?)
                }
                "--seed" => options.seed = Some(value.parse().map_err(|e| format!("--seed: {e}"))?),
                other => return Err(format!("unknown option {other}")),
            }
        }
        Ok(options)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    log::info!("Stratagem Hero (native) starting...");

    let options = Options::parse()?;
    let catalog = match &options.catalog {
        Some(path) => StratagemCatalog::load(path)?,
        None => StratagemCatalog::builtin(),
    };
    let tuning = match &options.tuning {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };
    let settings = options
        .settings
        .as_ref()
        .map(Settings::load)
        .unwrap_or_default();
    let store: Box<dyn LedgerStore> = match &options.scores {
        Some(path) => Box::new(JsonFileStore::new(path)),
        None => Box::new(MemoryStore::new()),
    };
    let seed = options.seed.unwrap_or_else(rand::random);

    let (phone, watch) = LoopbackPeer::pair();
    spawn_watch(watch);

    let parts = EngineParts::new(Arc::new(catalog))
        .with_tuning(tuning)
        .with_settings(settings)
        .with_loader(Arc::new(
            SimulatedLoader::new().with_sound_delay(Duration::from_millis(10)),
        ))
        .with_peer(Arc::new(phone))
        .with_store(store)
        .with_seed(seed);
    let engine = EngineHandle::spawn(parts)?;

    autoplay(&engine, options.rounds.unwrap_or(3), seed);
    engine.shutdown();
    Ok(())
}

/// A pretend watch with its own ledger, answering every sync
fn spawn_watch(watch: LoopbackPeer) {
    let mut ledger = HighScores::new();
    ledger.record_run("Watch", 640);
    let spawned = std::thread::Builder::new()
        .name("watch".to_string())
        .spawn(move || {
            loop {
                match watch.receive(Duration::from_millis(250)) {
                    Ok(Some(bytes)) => {
                        if let Ok(remote) = LedgerSnapshot::decode(&bytes) {
                            ledger.merge(&remote);
                        }
                        let reply = match ledger.snapshot().encode() {
                            Ok(reply) => reply,
                            Err(e) => {
                                log::warn!("Watch: {e}");
                                continue;
                            }
                        };
                        if watch.send(reply).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(SyncError::Unreachable) => break,
                    Err(e) => log::warn!("Watch: {e}"),
                }
            }
        });
    if let Err(e) = spawned {
        log::warn!("Failed to spawn watch thread: {e}");
    }
}

/// Clear `rounds` rounds with the occasional fumble, then stand idle
fn autoplay(engine: &EngineHandle, rounds: u32, seed: u64) {
    let mut rng = Pcg32::seed_from_u64(seed ^ 0x5EED);
    let events = engine.events();
    let poll = Duration::from_millis(20);

    engine.preload_assets();
    while !engine.snapshot().start_allowed {
        std::thread::sleep(poll);
    }
    engine.sync_remote();
    engine.start();

    let mut entered_round = 0;
    loop {
        for event in events.try_iter() {
            report(&event);
        }

        let snapshot = engine.snapshot();
        match snapshot.phase {
            GamePhase::Started if snapshot.round <= rounds && snapshot.round != entered_round => {
                entered_round = snapshot.round;
                if let Some(stratagem) = snapshot.active {
                    println!("Round {}: {}", snapshot.round, stratagem.name);
                    // A wrong arrow resets the attempt, so only fumble the opener
                    if let Some(&opener) = stratagem.sequence.first() {
                        if rng.random_bool(0.25) {
                            engine.submit_input(fumble(opener));
                        }
                    }
                    for direction in stratagem.sequence {
                        engine.submit_input(direction);
                        std::thread::sleep(Duration::from_millis(rng.random_range(60..140)));
                    }
                }
            }
            GamePhase::GameOver => break,
            _ => {}
        }
        std::thread::sleep(poll);
    }

    // Give the post-run sync a moment to land
    std::thread::sleep(Duration::from_millis(300));
    for event in events.try_iter() {
        report(&event);
    }
    let snapshot = engine.snapshot();
    println!(
        "\nFinal score {} (best {}) after {} rounds",
        snapshot.score,
        snapshot.best_score,
        snapshot.round - 1
    );
    for entry in &snapshot.leaderboard {
        println!("{:>2}. {:<12} {}", entry.rank, entry.name, entry.score);
    }
}

fn fumble(direction: Direction) -> Direction {
    match direction {
        Direction::Up => Direction::Down,
        Direction::Down => Direction::Up,
        Direction::Left => Direction::Right,
        Direction::Right => Direction::Left,
    }
}

fn report(event: &GameEvent) {
    match event {
        GameEvent::RoundCompleted { round, bonus, score } => println!(
            "  round {round} clear: +{} (round {}, time {}, perfect {}) = {score}",
            bonus.total(),
            bonus.round,
            bonus.time,
            bonus.perfect
        ),
        GameEvent::RoundTimedOut { round } => println!("  round {round}: out of time"),
        GameEvent::NewHighScore { score } => println!("  new high score: {score}"),
        _ => log::debug!("{event:?}"),
    }
}
