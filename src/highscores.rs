//! High score ledger
//!
//! Personal best plus a top-10 leaderboard, shared with the paired device.

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// Version tag for serialized snapshots
pub const SNAPSHOT_VERSION: u32 = 1;

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: usize,
    pub name: String,
    pub score: u64,
}

/// Result of submitting a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub score: u64,
    pub is_new_high_score: bool,
    /// Leaderboard rank achieved, if it qualified
    pub rank: Option<usize>,
}

/// Serializable view of the ledger, exchanged with the paired device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub best_score: u64,
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u32,
    ledger: LedgerSnapshot,
}

impl LedgerSnapshot {
    /// Versioned JSON payload for the peer channel
    pub fn encode(&self) -> Result<Vec<u8>, SyncError> {
        let envelope = Envelope {
            version: SNAPSHOT_VERSION,
            ledger: self.clone(),
        };
        serde_json::to_vec(&envelope).map_err(SyncError::Encode)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SyncError> {
        let envelope: Envelope = serde_json::from_slice(bytes)?;
        if envelope.version != SNAPSHOT_VERSION {
            return Err(SyncError::Version(envelope.version));
        }
        Ok(envelope.ledger)
    }
}

/// High score ledger
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighScores {
    best_score: u64,
    entries: Vec<LeaderboardEntry>,
}

impl HighScores {
    /// Create empty ledger
    pub fn new() -> Self {
        Self {
            best_score: 0,
            entries: Vec::new(),
        }
    }

    /// Rebuild from a stored or received snapshot, repairing order and ranks
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        let mut ledger = Self::new();
        ledger.merge(&snapshot);
        ledger
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            best_score: self.best_score,
            entries: self.entries.clone(),
        }
    }

    pub fn best_score(&self) -> u64 {
        self.best_score
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Submit a finished run.
    ///
    /// The personal best only ever moves up.
    pub fn record_run(&mut self, name: &str, score: u64) -> RunRecord {
        let is_new_high_score = score > self.best_score;
        if is_new_high_score {
            self.best_score = score;
        }

        let duplicate = self
            .entries
            .iter()
            .any(|e| e.score == score && e.name == name);
        let rank = if duplicate {
            None
        } else {
            self.insert(name, score)
        };

        RunRecord {
            score,
            is_new_high_score,
            rank,
        }
    }

    /// Merge a snapshot from the paired device.
    ///
    /// Best score is the max of both sides. Leaderboard is the union keyed
    /// by (name, score), re-sorted and trimmed. Returns true if anything
    /// changed.
    pub fn merge(&mut self, remote: &LedgerSnapshot) -> bool {
        let before = self.clone();

        self.best_score = self.best_score.max(remote.best_score);

        let mut union: Vec<(String, u64)> = self
            .entries
            .iter()
            .chain(remote.entries.iter())
            .filter(|e| e.score > 0)
            .map(|e| (e.name.clone(), e.score))
            .collect();
        // Highest score first, name breaks ties so both devices agree
        union.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        union.dedup();
        union.truncate(MAX_HIGH_SCORES);

        self.entries = union
            .into_iter()
            .enumerate()
            .map(|(i, (name, score))| LeaderboardEntry {
                rank: i + 1,
                name,
                score,
            })
            .collect();

        // Entries may carry scores the remote best never saw
        if let Some(top) = self.top_score() {
            self.best_score = self.best_score.max(top);
        }

        *self != before
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    fn insert(&mut self, name: &str, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        // Same order as `merge`: score descending, then name
        let index = self
            .entries
            .iter()
            .position(|e| score > e.score || (score == e.score && name < e.name.as_str()))
            .unwrap_or(self.entries.len());
        let rank = index + 1;
        self.entries.insert(
            rank - 1,
            LeaderboardEntry {
                rank,
                name: name.to_string(),
                score,
            },
        );

        // Trim to max size
        self.entries.truncate(MAX_HIGH_SCORES);
        self.rerank();
        Some(rank)
    }

    fn rerank(&mut self) {
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.rank = i + 1;
        }
    }
}
