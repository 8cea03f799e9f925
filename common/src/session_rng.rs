use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::map::Extent;
use crate::vec2::Vec2;

/// Seeded source of randomness for map setup, so a given seed always
/// produces the same layout.
pub struct SessionRng {
    rng: StdRng,
    seed: u64,
}

impl SessionRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn from_random() -> Self {
        let seed: u64 = rand::rng().random();
        Self::new(seed)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn random_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distr::uniform::SampleUniform,
        R: rand::distr::uniform::SampleRange<T>,
    {
        self.rng.random_range(range)
    }

    pub fn random_position(&mut self, extent: Extent) -> Vec2 {
        Vec2::new(
            self.random_range(0..extent.width),
            self.random_range(0..extent.height),
        )
    }
}
