//! Data-driven game balance
//!
//! Every field has a default so a tuning file only needs the values it
//! overrides.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Score constants for the default linear scoring strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTuning {
    /// Round bonus for round 1
    pub round_base: u64,
    /// Extra round bonus per subsequent round
    pub round_step: u64,
    /// Time bonus for finishing with the full budget left
    pub time_max: u64,
    /// Flat bonus for a round with no mismatches
    pub perfect: u64,
}

impl Default for ScoringTuning {
    fn default() -> Self {
        Self {
            round_base: 75,
            round_step: 25,
            time_max: 100,
            perfect: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Round flow ===
    /// Seconds allowed per round
    pub round_budget_secs: f32,
    /// Announcement delay before a round goes live
    pub round_start_secs: f32,
    /// Tally display after a round ends
    pub round_end_secs: f32,
    /// How long the red error flash stays up after a mismatch
    pub error_flash_secs: f32,

    // === Scheduling ===
    /// Engine ticks per second
    pub tick_rate: u32,

    // === Stratagem selection ===
    /// Upcoming stratagems kept queued behind the active one
    pub lookahead: usize,
    /// Recent picks excluded from the next selection
    pub recent_exclusion: usize,

    // === Arrow feedback ===
    pub arrow_move_secs: f32,
    pub arrow_fade_secs: f32,
    /// Distance an arrow travels while moving (screen units)
    pub arrow_travel: f32,
    /// Maximum live arrows; oldest are dropped beyond this
    pub arrow_capacity: usize,

    // === Ledger sync ===
    pub sync_timeout_ms: u64,
    /// Push the ledger to the paired device after every finished run
    pub sync_after_run: bool,

    pub scoring: ScoringTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            round_budget_secs: 10.0,
            round_start_secs: 1.5,
            round_end_secs: 2.0,
            error_flash_secs: 0.3,

            tick_rate: 20,

            lookahead: 4,
            recent_exclusion: 2,

            arrow_move_secs: 0.2,
            arrow_fade_secs: 0.2,
            arrow_travel: 40.0,
            arrow_capacity: 32,

            sync_timeout_ms: 2000,
            sync_after_run: true,

            scoring: ScoringTuning::default(),
        }
    }
}

impl Tuning {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json_str(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    /// Reject values the state machine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("round_budget_secs", self.round_budget_secs),
            ("arrow_move_secs", self.arrow_move_secs),
            ("arrow_fade_secs", self.arrow_fade_secs),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be > 0, got {value}"),
                });
            }
        }
        let non_negative = [
            ("round_start_secs", self.round_start_secs),
            ("round_end_secs", self.round_end_secs),
            ("error_flash_secs", self.error_flash_secs),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be >= 0, got {value}"),
                });
            }
        }
        if self.tick_rate == 0 {
            return Err(ConfigError::Invalid {
                field: "tick_rate",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.lookahead == 0 {
            return Err(ConfigError::Invalid {
                field: "lookahead",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.arrow_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "arrow_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Fixed tick interval for the engine scheduler
    pub fn tick_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.tick_rate.max(1)))
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_millis(self.sync_timeout_ms)
    }
}
