//! Engine actor
//!
//! One thread owns the [`Game`]. Everything else talks to it through a
//! command channel and reads back a published [`Snapshot`] plus a stream of
//! [`GameEvent`]s. A fixed-rate ticker drives the clocks; commands queued
//! before a tick are always applied before that tick advances time.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, select, unbounded};
use log::{debug, info, warn};
use parking_lot::RwLock;

use crate::catalog::{Direction, StratagemCatalog};
use crate::consts::{EVENT_QUEUE_CAPACITY, MAX_FRAME_SECS};
use crate::error::{CatalogError, EngineError, SyncError};
use crate::game::{Game, Snapshot};
use crate::highscores::LedgerSnapshot;
use crate::persistence::{LedgerStore, MemoryStore};
use crate::platform::{
    AssetLoader, AssetRequest, Clock, OfflinePeer, PeerChannel, SimulatedLoader, SystemClock,
};
use crate::preload::{AssetPreloader, PreloadReport, asset_requests};
use crate::settings::Settings;
use crate::sim::GameEvent;
use crate::sync::spawn_sync;
use crate::tuning::Tuning;

/// Messages processed by the engine thread, in arrival order
#[derive(Debug)]
pub enum Command {
    Input(Direction),
    Start,
    Stop,
    PreloadAssets,
    SetSoundEnabled(bool),
    /// Exchange ledgers with the paired device
    SyncRemote,
    PreloadFinished(PreloadReport),
    SyncFinished(Result<LedgerSnapshot, SyncError>),
    Shutdown,
}

/// Collaborators and configuration for [`EngineHandle::spawn`]
pub struct EngineParts {
    pub catalog: Arc<StratagemCatalog>,
    pub tuning: Tuning,
    pub settings: Settings,
    pub loader: Arc<dyn AssetLoader>,
    pub peer: Arc<dyn PeerChannel>,
    pub store: Box<dyn LedgerStore>,
    pub clock: Arc<dyn Clock>,
    pub seed: u64,
}

impl EngineParts {
    /// Offline, in-memory defaults around `catalog`
    pub fn new(catalog: Arc<StratagemCatalog>) -> Self {
        Self {
            catalog,
            tuning: Tuning::default(),
            settings: Settings::default(),
            loader: Arc::new(SimulatedLoader::new()),
            peer: Arc::new(OfflinePeer),
            store: Box::new(MemoryStore::new()),
            clock: Arc::new(SystemClock::new()),
            seed: rand::random(),
        }
    }

    pub fn with_tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn AssetLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_peer(mut self, peer: Arc<dyn PeerChannel>) -> Self {
        self.peer = peer;
        self
    }

    pub fn with_store(mut self, store: Box<dyn LedgerStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Owner's side of a running engine. Dropping it shuts the engine down.
pub struct EngineHandle {
    commands: Sender<Command>,
    snapshot: Arc<RwLock<Snapshot>>,
    events: Receiver<GameEvent>,
    thread: Option<JoinHandle<()>>,
}

impl EngineHandle {
    /// Validate configuration and start the engine thread
    pub fn spawn(parts: EngineParts) -> Result<Self, EngineError> {
        parts.tuning.validate()?;
        if parts.catalog.is_empty() {
            return Err(CatalogError::Empty.into());
        }

        let EngineParts {
            catalog,
            tuning,
            settings,
            loader,
            peer,
            store,
            clock,
            seed,
        } = parts;

        let requests = asset_requests(&catalog);
        let game = Game::new(catalog, tuning, settings, store, seed);
        let snapshot = Arc::new(RwLock::new(game.snapshot()));
        let (commands, command_rx) = unbounded();
        let (events_tx, events) = bounded(EVENT_QUEUE_CAPACITY);

        let actor = Actor {
            last_tick: clock.now(),
            game,
            commands: command_rx,
            loopback: commands.clone(),
            snapshot: snapshot.clone(),
            events: events_tx,
            preloader: AssetPreloader::new(loader),
            requests,
            peer,
            clock,
            sync_in_flight: false,
        };

        let thread = std::thread::Builder::new()
            .name("stratagem-engine".to_string())
            .spawn(move || actor.run())
            .map_err(EngineError::Spawn)?;
        info!("Engine started");

        Ok(Self {
            commands,
            snapshot,
            events,
            thread: Some(thread),
        })
    }

    pub fn submit_input(&self, direction: Direction) {
        self.send(Command::Input(direction));
    }

    pub fn start(&self) {
        self.send(Command::Start);
    }

    pub fn stop(&self) {
        self.send(Command::Stop);
    }

    pub fn preload_assets(&self) {
        self.send(Command::PreloadAssets);
    }

    pub fn set_sound_enabled(&self, enabled: bool) {
        self.send(Command::SetSoundEnabled(enabled));
    }

    pub fn sync_remote(&self) {
        self.send(Command::SyncRemote);
    }

    /// Latest published state
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.read().clone()
    }

    /// Event stream. Events are dropped while the queue is full.
    pub fn events(&self) -> Receiver<GameEvent> {
        self.events.clone()
    }

    /// Stop the engine and wait for its thread
    pub fn shutdown(mut self) {
        self.join();
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("Engine is gone, dropping command");
        }
    }

    fn join(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        let _ = self.commands.send(Command::Shutdown);
        if thread.join().is_err() {
            warn!("Engine thread panicked");
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.join();
    }
}

struct Actor {
    game: Game,
    commands: Receiver<Command>,
    /// Lets background work report back into the queue
    loopback: Sender<Command>,
    snapshot: Arc<RwLock<Snapshot>>,
    events: Sender<GameEvent>,
    preloader: AssetPreloader,
    requests: Vec<AssetRequest>,
    peer: Arc<dyn PeerChannel>,
    clock: Arc<dyn Clock>,
    last_tick: Duration,
    sync_in_flight: bool,
}

impl Actor {
    fn run(mut self) {
        let ticker = crossbeam_channel::tick(self.game.tuning().tick_interval());
        let commands = self.commands.clone();
        let mut running = true;
        while running {
            select! {
                recv(commands) -> command => {
                    running = match command {
                        Ok(command) => self.handle(command),
                        Err(_) => false,
                    };
                }
                recv(ticker) -> _ => {
                    // Everything queued so far lands before the clock moves
                    while running {
                        match commands.try_recv() {
                            Ok(command) => running = self.handle(command),
                            Err(_) => break,
                        }
                    }
                    if running {
                        self.advance();
                    }
                }
            }
            self.publish();
        }
        info!("Engine stopped");
    }

    /// Returns false on shutdown
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Input(direction) => {
                self.game.submit_input(direction);
            }
            Command::Start => {
                self.game.start();
            }
            Command::Stop => self.game.stop(),
            Command::PreloadAssets => self.start_preload(),
            Command::SetSoundEnabled(enabled) => self.game.set_sound_enabled(enabled),
            Command::SyncRemote => self.start_sync(),
            Command::PreloadFinished(report) => {
                debug!("Preload report: {report:?}");
                self.game.set_preload_ready();
            }
            Command::SyncFinished(result) => {
                self.sync_in_flight = false;
                if let Ok(remote) = result {
                    self.game.merge_remote(&remote);
                }
            }
            Command::Shutdown => return false,
        }
        true
    }

    fn advance(&mut self) {
        let now = self.clock.now();
        let dt = now
            .saturating_sub(self.last_tick)
            .as_secs_f32()
            .min(MAX_FRAME_SECS);
        self.last_tick = now;
        self.game.tick(dt);
    }

    /// Push state out and follow up on finished runs
    fn publish(&mut self) {
        for event in self.game.take_events() {
            match self.events.try_send(event) {
                Ok(()) | Err(TrySendError::Disconnected(_)) => {}
                Err(TrySendError::Full(event)) => debug!("Event queue full, dropped {event:?}"),
            }
        }
        if self.game.take_ledger_dirty() && self.game.tuning().sync_after_run {
            self.start_sync();
        }
        *self.snapshot.write() = self.game.snapshot();
    }

    fn start_preload(&mut self) {
        if self.preloader.is_ready() {
            self.game.set_preload_ready();
            return;
        }
        let loopback = self.loopback.clone();
        let started = self.preloader.preload(self.requests.clone(), move |report| {
            let _ = loopback.send(Command::PreloadFinished(report));
        });
        if started {
            info!("Preloading {} assets", self.requests.len());
        }
    }

    fn start_sync(&mut self) {
        if self.sync_in_flight {
            debug!("Ledger sync already running");
            return;
        }
        let loopback = self.loopback.clone();
        self.sync_in_flight = spawn_sync(
            self.peer.clone(),
            self.game.ledger().snapshot(),
            self.game.tuning().sync_timeout(),
            move |result| {
                let _ = loopback.send(Command::SyncFinished(result));
            },
        );
    }
}
