//! Deterministic `Rng` implementations.

use quizwire_core::rng::Rng;

/// Always picks index 0. For tests that do not care which question comes up.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroRng;

impl Rng for ZeroRng {
    fn pick(&mut self, _len: usize) -> usize {
        0
    }
}

/// Picks from a scripted sequence of indices; each value is taken modulo
/// the candidate count so scripts stay valid as the pool shrinks. Panics
/// when the script runs out.
#[derive(Debug)]
pub struct SequenceRng {
    picks: Vec<usize>,
    index: usize,
}

impl SequenceRng {
    /// Creates a scripted picker.
    #[must_use]
    pub fn new(picks: Vec<usize>) -> Self {
        Self { picks, index: 0 }
    }
}

impl Rng for SequenceRng {
    fn pick(&mut self, len: usize) -> usize {
        let value = self.picks[self.index];
        self.index += 1;
        value % len
    }
}
