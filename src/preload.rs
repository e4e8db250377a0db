//! Asset preloading
//!
//! Runs on a background thread. Failed assets are logged and skipped; the
//! ready flag goes up once every asset has been attempted.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::catalog::StratagemCatalog;
use crate::platform::{AssetLoader, AssetRequest};

/// Sound effect slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Correct arrow entered
    Press,
    /// Wrong arrow entered
    Mismatch,
    /// Round announcement
    RoundStart,
    /// Stratagem finished
    RoundComplete,
    /// Run over
    GameOver,
    /// New personal best
    HighScore,
}

impl SoundCue {
    pub const ALL: [SoundCue; 6] = [
        SoundCue::Press,
        SoundCue::Mismatch,
        SoundCue::RoundStart,
        SoundCue::RoundComplete,
        SoundCue::GameOver,
        SoundCue::HighScore,
    ];

    /// Asset key handed to the loader
    pub fn key(&self) -> &'static str {
        match self {
            SoundCue::Press => "sfx_press",
            SoundCue::Mismatch => "sfx_mismatch",
            SoundCue::RoundStart => "sfx_round_start",
            SoundCue::RoundComplete => "sfx_round_complete",
            SoundCue::GameOver => "sfx_game_over",
            SoundCue::HighScore => "sfx_high_score",
        }
    }
}

/// Every image and sound the game uses
pub fn asset_requests(catalog: &StratagemCatalog) -> Vec<AssetRequest> {
    let images = catalog
        .all()
        .iter()
        .map(|s| AssetRequest::image(s.asset_key.clone()));
    let sounds = SoundCue::ALL.iter().map(|cue| AssetRequest::sound(cue.key()));
    images.chain(sounds).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreloadReport {
    pub loaded: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

/// Loads assets off the game thread and tracks readiness
#[derive(Clone)]
pub struct AssetPreloader {
    loader: Arc<dyn AssetLoader>,
    ready: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
}

impl AssetPreloader {
    pub fn new(loader: Arc<dyn AssetLoader>) -> Self {
        Self {
            loader,
            ready: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Start loading in the background.
    ///
    /// `on_done` runs on the loader thread after the ready flag is set.
    /// Returns false if a preload is already running or the thread could
    /// not be spawned.
    pub fn preload<F>(&self, requests: Vec<AssetRequest>, on_done: F) -> bool
    where
        F: FnOnce(PreloadReport) + Send + 'static,
    {
        if self.running.swap(true, Ordering::AcqRel) {
            return false;
        }
        let this = self.clone();
        let spawned = std::thread::Builder::new()
            .name("asset-preload".to_string())
            .spawn(move || {
                let report = this.preload_blocking(&requests);
                on_done(report);
            });
        match spawned {
            Ok(_) => true,
            Err(e) => {
                warn!("Failed to spawn asset preload thread: {e}");
                self.running.store(false, Ordering::Release);
                false
            }
        }
    }

    /// Load everything on the calling thread
    pub fn preload_blocking(&self, requests: &[AssetRequest]) -> PreloadReport {
        self.running.store(true, Ordering::Release);
        let started = Instant::now();
        let mut loaded = 0usize;
        let mut failed = 0usize;
        for request in requests {
            match self.loader.load(request) {
                Ok(()) => loaded += 1,
                Err(e) => {
                    failed += 1;
                    warn!("Asset preload skipped: {e}");
                }
            }
        }
        let elapsed = started.elapsed();
        self.ready.store(true, Ordering::Release);
        self.running.store(false, Ordering::Release);
        info!(
            "Asset preload finished: {} loaded, {} failed in {:.2}s",
            loaded,
            failed,
            elapsed.as_secs_f64()
        );
        PreloadReport {
            loaded,
            failed,
            elapsed,
        }
    }
}
