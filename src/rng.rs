use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seeded random source for synthetic metagames.
///
/// The seed is kept so a generated metagame can be reported and regenerated.
#[derive(Clone)]
pub struct MetaRng {
    rng: ChaCha8Rng,
    seed: u64,
}

impl MetaRng {
    /// Seed from `seed`, or draw a fresh seed from the thread RNG
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
        MetaRng {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform draw in [0, 1), used for deck strengths, coverage and matchup noise
    pub fn random(&mut self) -> f64 {
        self.rng.gen()
    }

    /// Uniform index in [0, max)
    pub fn random_range(&mut self, max: usize) -> usize {
        self.rng.gen_range(0..max)
    }

    /// Two distinct indices in [0, max), e.g. the two components of a deck group
    pub fn distinct_pair(&mut self, max: usize) -> (usize, usize) {
        let first = self.random_range(max);
        let mut second = self.random_range(max - 1);
        if second >= first {
            second += 1;
        }
        (first, second)
    }
}
