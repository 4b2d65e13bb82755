//! Randomness seam.
//!
//! The only random decision in the protocol is the uniform question draw,
//! so the trait is deliberately narrow: pick an index. Tests inject a
//! scripted implementation; production delegates to `rand`.

/// Uniform index selection.
pub trait Rng: Send {
    /// Returns an index uniformly distributed in `0..len`.
    ///
    /// # Panics
    ///
    /// Implementations may panic when `len` is zero; callers check for an
    /// empty candidate set before drawing.
    fn pick(&mut self, len: usize) -> usize;
}

/// Production RNG backed by the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRng;

impl Rng for SystemRng {
    fn pick(&mut self, len: usize) -> usize {
        use rand::Rng as _;
        rand::rng().random_range(0..len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_rng_stays_in_range() {
        let mut rng = SystemRng;
        for _ in 0..100 {
            assert!(rng.pick(7) < 7);
        }
    }

    #[test]
    fn test_system_rng_single_element() {
        let mut rng = SystemRng;
        assert_eq!(rng.pick(1), 0);
    }
}
