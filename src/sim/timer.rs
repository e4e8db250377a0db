//! Per-round countdown

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundTimer {
    budget: f32,
    remaining: f32,
}

impl RoundTimer {
    pub fn new(budget: f32) -> Self {
        Self {
            budget,
            remaining: budget,
        }
    }

    /// Refill to the full budget
    pub fn reset(&mut self) {
        self.remaining = self.budget;
    }

    /// Count down by `dt` seconds.
    ///
    /// Returns true only on the tick that reaches zero.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.remaining <= 0.0 {
            return false;
        }
        self.remaining = (self.remaining - dt.max(0.0)).max(0.0);
        self.remaining == 0.0
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn budget(&self) -> f32 {
        self.budget
    }

    /// Remaining share of the budget, for the countdown bar
    pub fn fraction(&self) -> f32 {
        if self.budget <= 0.0 {
            0.0
        } else {
            (self.remaining / self.budget).clamp(0.0, 1.0)
        }
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_expires_once() {
        let mut t = RoundTimer::new(1.0);
        assert!(!t.tick(0.5));
        assert!(t.tick(0.75));
        assert_eq!(t.remaining(), 0.0);
        assert!(t.is_expired());
        assert!(!t.tick(0.1));
    }

    #[test]
    fn test_reset_restores_exact_budget() {
        let mut t = RoundTimer::new(10.0);
        t.tick(3.3);
        t.reset();
        assert_eq!(t.remaining(), 10.0);
        assert_eq!(t.fraction(), 1.0);
    }

    proptest! {
        #[test]
        fn prop_never_negative_and_non_increasing(steps in prop::collection::vec(0.0f32..2.0, 0..64)) {
            let mut t = RoundTimer::new(10.0);
            let mut last = t.remaining();
            for dt in steps {
                t.tick(dt);
                prop_assert!(t.remaining() >= 0.0);
                prop_assert!(t.remaining() <= last);
                last = t.remaining();
            }
        }
    }
}
