//! Asset loading collaborator

use std::collections::HashSet;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::AssetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Image,
    Sound,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetRequest {
    pub key: String,
    pub kind: AssetKind,
}

impl AssetRequest {
    pub fn image(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: AssetKind::Image,
        }
    }

    pub fn sound(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: AssetKind::Sound,
        }
    }
}

/// Loads (decodes, caches) one asset. May block.
pub trait AssetLoader: Send + Sync {
    fn load(&self, request: &AssetRequest) -> Result<(), AssetError>;
}

/// Loader that pretends to work: sleeps per sound, fails on chosen keys
#[derive(Debug, Default)]
pub struct SimulatedLoader {
    sound_delay: Duration,
    failing: HashSet<String>,
    loaded: Mutex<Vec<String>>,
}

impl SimulatedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sounds are the slow part; images load instantly
    pub fn with_sound_delay(mut self, delay: Duration) -> Self {
        self.sound_delay = delay;
        self
    }

    pub fn failing<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failing.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Keys loaded successfully so far
    pub fn loaded(&self) -> Vec<String> {
        self.loaded.lock().clone()
    }
}

impl AssetLoader for SimulatedLoader {
    fn load(&self, request: &AssetRequest) -> Result<(), AssetError> {
        if request.kind == AssetKind::Sound && !self.sound_delay.is_zero() {
            std::thread::sleep(self.sound_delay);
        }
        if self.failing.contains(&request.key) {
            return Err(AssetError {
                key: request.key.clone(),
                reason: "simulated failure".to_string(),
            });
        }
        self.loaded.lock().push(request.key.clone());
        Ok(())
    }
}
