//! Error types
//!
//! Only catalog and configuration errors abort startup. Everything else is
//! absorbed by the engine and logged.

use std::io;

use thiserror::Error;

/// Fatal catalog problems, detected when the catalog is built.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The catalog has no stratagems at all.
    #[error("stratagem catalog is empty")]
    Empty,

    /// A stratagem with no input sequence can never be completed.
    #[error("stratagem {id} ({name}) has an empty input sequence")]
    EmptySequence {
        /// Offending stratagem id.
        id: u32,
        /// Offending stratagem name.
        name: String,
    },

    /// Two stratagems share an id.
    #[error("duplicate stratagem id {0}")]
    DuplicateId(u32),

    /// Catalog file could not be read.
    #[error("failed to read catalog: {0}")]
    Io(#[from] io::Error),

    /// Catalog file is not valid JSON for a catalog.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Problems loading tuning or settings files.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value parsed fine but makes no sense (zero tick rate, negative budget).
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// A single asset failed to load. The preloader skips it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to load asset `{key}`: {reason}")]
pub struct AssetError {
    pub key: String,
    pub reason: String,
}

/// Cross-device ledger sync failures. Never surfaced to the player.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("peer is not reachable")]
    Unreachable,

    #[error("peer did not answer within {0} ms")]
    Timeout(u64),

    #[error("failed to encode local snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("peer sent an unreadable snapshot: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("peer snapshot has unsupported version {0}")]
    Version(u32),
}

/// Ledger store failures. The ledger keeps running in memory.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("ledger store I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("ledger store contents are corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("ledger store has unsupported version {0}")]
    Version(u32),
}

/// Errors that prevent the engine from starting.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to spawn engine thread: {0}")]
    Spawn(io::Error),
}
