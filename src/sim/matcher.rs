//! Input sequence matching against the active stratagem

use serde::{Deserialize, Serialize};

use crate::catalog::Direction;

/// Result of submitting one symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// Correct so far, more symbols needed
    Continuing,
    /// Last symbol of the sequence entered correctly
    Completed,
    /// Wrong symbol; buffer was reset
    Mismatch,
}

impl MatchOutcome {
    pub fn is_correct(&self) -> bool {
        !matches!(self, MatchOutcome::Mismatch)
    }
}

/// Live input buffer for the current attempt
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputMatcher {
    buffer: Vec<Direction>,
}

impl InputMatcher {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Compare `symbol` with the expected symbol at the current position.
    ///
    /// The buffer never grows past `expected.len()`: a completed or failed
    /// attempt clears it.
    pub fn submit(&mut self, expected: &[Direction], symbol: Direction) -> MatchOutcome {
        let pos = self.buffer.len();
        match expected.get(pos) {
            Some(&want) if want == symbol => {
                if pos + 1 == expected.len() {
                    self.buffer.clear();
                    MatchOutcome::Completed
                } else {
                    self.buffer.push(symbol);
                    MatchOutcome::Continuing
                }
            }
            _ => {
                self.buffer.clear();
                MatchOutcome::Mismatch
            }
        }
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn buffer(&self) -> &[Direction] {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    use Direction::{Down, Left, Right, Up};

    #[test]
    fn test_complete_sequence() {
        let seq = [Up, Down, Right, Up];
        let mut m = InputMatcher::new();
        assert_eq!(m.submit(&seq, Up), MatchOutcome::Continuing);
        assert_eq!(m.submit(&seq, Down), MatchOutcome::Continuing);
        assert_eq!(m.submit(&seq, Right), MatchOutcome::Continuing);
        assert_eq!(m.len(), 3);
        assert_eq!(m.submit(&seq, Up), MatchOutcome::Completed);
        assert!(m.is_empty());
    }

    #[test]
    fn test_mismatch_resets_buffer() {
        let seq = [Up, Down, Right];
        let mut m = InputMatcher::new();
        m.submit(&seq, Up);
        assert_eq!(m.submit(&seq, Left), MatchOutcome::Mismatch);
        assert!(m.is_empty());
        // Starting over from the top works
        assert_eq!(m.submit(&seq, Up), MatchOutcome::Continuing);
    }

    #[test]
    fn test_empty_expected_is_always_mismatch() {
        let mut m = InputMatcher::new();
        assert_eq!(m.submit(&[], Up), MatchOutcome::Mismatch);
    }

    fn direction() -> impl Strategy<Value = Direction> {
        prop_oneof![Just(Up), Just(Down), Just(Left), Just(Right)]
    }

    proptest! {
        #[test]
        fn prop_exact_stream_completes_once(seq in prop::collection::vec(direction(), 1..10)) {
            let mut m = InputMatcher::new();
            let outcomes: Vec<_> = seq.iter().map(|&d| m.submit(&seq, d)).collect();
            prop_assert_eq!(outcomes.iter().filter(|o| **o == MatchOutcome::Completed).count(), 1);
            prop_assert_eq!(outcomes.iter().filter(|o| **o == MatchOutcome::Mismatch).count(), 0);
            prop_assert_eq!(*outcomes.last().unwrap(), MatchOutcome::Completed);
        }

        #[test]
        fn prop_wrong_symbol_raises_mismatch(
            seq in prop::collection::vec(direction(), 1..10),
            at in any::<prop::sample::Index>(),
            offset in 1usize..4,
        ) {
            let at = at.index(seq.len());
            let wrong = Direction::ALL[(Direction::ALL.iter().position(|d| *d == seq[at]).unwrap() + offset) % 4];
            let mut stream = seq[..at].to_vec();
            stream.push(wrong);

            let mut m = InputMatcher::new();
            let mut saw_mismatch = false;
            for d in stream {
                if m.submit(&seq, d) == MatchOutcome::Mismatch {
                    saw_mismatch = true;
                }
                prop_assert!(m.len() <= seq.len());
            }
            prop_assert!(saw_mismatch);
        }

        #[test]
        fn prop_buffer_never_exceeds_sequence(
            seq in prop::collection::vec(direction(), 1..8),
            stream in prop::collection::vec(direction(), 0..40),
        ) {
            let mut m = InputMatcher::new();
            for d in stream {
                m.submit(&seq, d);
                prop_assert!(m.len() < seq.len());
            }
        }
    }
}
