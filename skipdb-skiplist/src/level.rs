use rand::{Rng, SeedableRng, rngs::StdRng};

pub mod prelude {
    pub use super::{LevelGenerator, RandomLevel};
}

/// Picks the height of a freshly inserted node.
pub trait LevelGenerator {
    /// Returns a level in `[1, max_level]`.
    fn random_level(&mut self, max_level: usize) -> usize;
}

/// Coin-flip levels: starting at 1, keep going up with probability 1/2,
/// so `P(level = k)` is about `2^-k` and the tail folds into `max_level`.
#[derive(Debug, Clone)]
pub struct RandomLevel<R> {
    rng: R,
}

impl<R: Rng> RandomLevel<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomLevel<StdRng> {
    pub fn from_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl Default for RandomLevel<StdRng> {
    fn default() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> LevelGenerator for RandomLevel<R> {
    // [1, max_level]
    fn random_level(&mut self, max_level: usize) -> usize {
        let mut level = 1;
        while level < max_level && self.rng.random::<bool>() {
            level += 1;
        }
        level
    }
}

impl<G: LevelGenerator + ?Sized> LevelGenerator for Box<G> {
    fn random_level(&mut self, max_level: usize) -> usize {
        (**self).random_level(max_level)
    }
}
