//! Ledger persistence
//!
//! Features:
//! - Versioned JSON envelope
//! - Atomic replace (write tmp, then rename over the save)
//! - Corruption detection; the game falls back to an empty ledger

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;
use crate::highscores::LedgerSnapshot;

/// Current on-disk format version
pub const STORE_VERSION: u32 = 1;

/// Where the ledger lives between sessions
pub trait LedgerStore: Send {
    /// `Ok(None)` when nothing has been saved yet
    fn load(&self) -> Result<Option<LedgerSnapshot>, PersistenceError>;

    fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), PersistenceError>;
}

/// Keeps the ledger for the life of the process only
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Mutex<Option<LedgerSnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            saved: Mutex::new(Some(snapshot)),
        }
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<Option<LedgerSnapshot>, PersistenceError> {
        Ok(self.saved.lock().clone())
    }

    fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), PersistenceError> {
        *self.saved.lock() = Some(snapshot.clone());
        Ok(())
    }
}

impl<T: LedgerStore + Sync + ?Sized> LedgerStore for std::sync::Arc<T> {
    fn load(&self) -> Result<Option<LedgerSnapshot>, PersistenceError> {
        (**self).load()
    }

    fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), PersistenceError> {
        (**self).save(snapshot)
    }
}

#[derive(Serialize, Deserialize)]
struct FileEnvelope {
    version: u32,
    ledger: LedgerSnapshot,
}

/// JSON file on local disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> Result<Option<LedgerSnapshot>, PersistenceError> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let envelope: FileEnvelope = serde_json::from_str(&json)?;
        if envelope.version != STORE_VERSION {
            return Err(PersistenceError::Version(envelope.version));
        }
        log::info!(
            "Loaded {} high scores from {}",
            envelope.ledger.entries.len(),
            self.path.display()
        );
        Ok(Some(envelope.ledger))
    }

    fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), PersistenceError> {
        let envelope = FileEnvelope {
            version: STORE_VERSION,
            ledger: snapshot.clone(),
        };
        let json = serde_json::to_string_pretty(&envelope)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let tmp = self.tmp_path();
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        log::info!("High scores saved ({} entries)", snapshot.entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::HighScores;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "stratagem_hero_{}_{}.json",
            name,
            std::process::id()
        ))
    }

    #[test]
    fn test_missing_file_is_empty() {
        let store = JsonFileStore::new(temp_path("missing"));
        let _ = std::fs::remove_file(store.path());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let store = JsonFileStore::new(temp_path("ledger"));
        let mut ledger = HighScores::new();
        ledger.record_run("A", 320);
        ledger.record_run("B", 90);

        store.save(&ledger.snapshot()).unwrap();
        assert_eq!(store.load().unwrap(), Some(ledger.snapshot()));
        assert!(!store.tmp_path().exists());
        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let store = JsonFileStore::new(temp_path("corrupt"));
        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(matches!(store.load(), Err(PersistenceError::Corrupt(_))));
        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());
        let snapshot = LedgerSnapshot {
            best_score: 10,
            entries: Vec::new(),
        };
        store.save(&snapshot).unwrap();
        assert_eq!(store.load().unwrap(), Some(snapshot));
    }
}
