//! Round scoring
//!
//! The formula sits behind a trait so a front end can swap in its own.

use serde::{Deserialize, Serialize};

use crate::tuning::ScoringTuning;

/// Bonus breakdown for one ended round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundBonus {
    pub round: u64,
    pub time: u64,
    pub perfect: u64,
}

impl RoundBonus {
    pub fn total(&self) -> u64 {
        self.round
            .saturating_add(self.time)
            .saturating_add(self.perfect)
    }
}

pub trait ScoringStrategy: Send + Sync {
    /// Bonus for finishing `round` (1-based). Must not decrease with `round`.
    fn round_bonus(&self, round: u32) -> u64;

    /// Bonus for the time left on the clock
    fn time_bonus(&self, remaining: f32, budget: f32) -> u64;

    /// Bonus for a round with no mismatches
    fn perfect_bonus(&self) -> u64;

    fn score_round(&self, round: u32, remaining: f32, budget: f32, perfect: bool) -> RoundBonus {
        RoundBonus {
            round: self.round_bonus(round),
            time: self.time_bonus(remaining, budget),
            perfect: if perfect { self.perfect_bonus() } else { 0 },
        }
    }
}

/// round = base + step * (round - 1), time proportional to time left
#[derive(Debug, Clone)]
pub struct LinearScoring {
    tuning: ScoringTuning,
}

impl LinearScoring {
    pub fn new(tuning: ScoringTuning) -> Self {
        Self { tuning }
    }
}

impl Default for LinearScoring {
    fn default() -> Self {
        Self::new(ScoringTuning::default())
    }
}

impl ScoringStrategy for LinearScoring {
    fn round_bonus(&self, round: u32) -> u64 {
        let extra = u64::from(round.saturating_sub(1));
        self.tuning
            .round_base
            .saturating_add(self.tuning.round_step.saturating_mul(extra))
    }

    fn time_bonus(&self, remaining: f32, budget: f32) -> u64 {
        if budget <= 0.0 || remaining <= 0.0 {
            return 0;
        }
        let share = (remaining / budget).clamp(0.0, 1.0) as f64;
        (share * self.tuning.time_max as f64).round() as u64
    }

    fn perfect_bonus(&self) -> u64 {
        self.tuning.perfect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_bonus_grows() {
        let s = LinearScoring::default();
        assert_eq!(s.round_bonus(1), 75);
        assert_eq!(s.round_bonus(2), 100);
        assert_eq!(s.round_bonus(5), 175);
        assert!(s.round_bonus(u32::MAX) >= s.round_bonus(1000));
    }

    #[test]
    fn test_time_bonus_proportional() {
        let s = LinearScoring::default();
        assert_eq!(s.time_bonus(10.0, 10.0), 100);
        assert_eq!(s.time_bonus(7.0, 10.0), 70);
        assert_eq!(s.time_bonus(0.0, 10.0), 0);
        assert_eq!(s.time_bonus(5.0, 0.0), 0);
    }

    #[test]
    fn test_perfect_only_when_clean() {
        let s = LinearScoring::default();
        let clean = s.score_round(1, 7.0, 10.0, true);
        assert_eq!(clean, RoundBonus { round: 75, time: 70, perfect: 100 });
        assert_eq!(clean.total(), 245);

        let sloppy = s.score_round(1, 7.0, 10.0, false);
        assert_eq!(sloppy.perfect, 0);
        assert_eq!(sloppy.total(), 145);
    }

    #[test]
    fn test_huge_tuning_saturates() {
        let tuning = crate::tuning::Tuning::from_json_str(
            r#"{"scoring": {"round_base": 18446744073709551615}}"#,
        )
        .unwrap();
        let s = LinearScoring::new(tuning.scoring);
        let bonus = s.score_round(1, 5.0, 10.0, true);
        assert_eq!(bonus.round, u64::MAX);
        assert_eq!(bonus.total(), u64::MAX);
    }
}
