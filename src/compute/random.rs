//! Random number sources for partitioning, selection and mutation.

use rand::prelude::*;

/// Draws needed by the coevolution substrate.
///
/// Implemented for every [`Rng`], so a seeded [`StdRng`] works directly. The
/// trait is object safe; operators take `&mut dyn RandomSource`.
pub trait RandomSource {
    /// Uniform real in `[lo, hi)`.
    fn uniform_real(&mut self, lo: f64, hi: f64) -> f64;

    /// Uniform integer in `[lo, hi)`. Requires `lo < hi`.
    fn uniform_index(&mut self, lo: usize, hi: usize) -> usize;

    /// Uniform signed integer in `[lo, hi]`.
    fn uniform_value(&mut self, lo: i32, hi: i32) -> i32;

    /// True with probability `p`.
    fn bernoulli(&mut self, p: f64) -> bool;

    /// Uniform random permutation of `0..n`.
    fn permutation(&mut self, n: usize) -> Vec<usize>;

    /// Shuffle a slice of ids in place (Fisher-Yates).
    fn shuffle_ids(&mut self, ids: &mut [usize]);
}

impl<R: Rng> RandomSource for R {
    #[inline]
    fn uniform_real(&mut self, lo: f64, hi: f64) -> f64 {
        self.gen_range(lo..hi)
    }

    #[inline]
    fn uniform_index(&mut self, lo: usize, hi: usize) -> usize {
        self.gen_range(lo..hi)
    }

    #[inline]
    fn uniform_value(&mut self, lo: i32, hi: i32) -> i32 {
        self.gen_range(lo..=hi)
    }

    #[inline]
    fn bernoulli(&mut self, p: f64) -> bool {
        // gen_bool panics outside [0, 1]
        self.gen_bool(p.clamp(0.0, 1.0))
    }

    fn permutation(&mut self, n: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(self);
        order
    }

    fn shuffle_ids(&mut self, ids: &mut [usize]) {
        ids.shuffle(self);
    }
}

/// Seeded generator for a coevolution run.
///
/// Besides serving draws itself, it hands out seeds for child streams so
/// work split across threads stays reproducible.
pub struct CoevoRng {
    rng: StdRng,
}

impl CoevoRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Generate next u64 for seeding child RNGs.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.r#gen()
    }

    /// Child stream for one unit of parallel work.
    pub fn fork(&mut self) -> StdRng {
        StdRng::seed_from_u64(self.next_seed())
    }

    /// `count` child streams, drawn in order.
    pub fn fork_many(&mut self, count: usize) -> Vec<StdRng> {
        (0..count).map(|_| self.fork()).collect()
    }
}

impl RngCore for CoevoRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}
