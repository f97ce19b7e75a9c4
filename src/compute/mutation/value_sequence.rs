//! Site substitution and inversion for fixed-length value sequences.

use crate::schema::{ConfigError, ValueSequenceGenome, ValueSequenceMutatorConfig};

use super::Mutator;
use crate::compute::random::RandomSource;

#[derive(Debug, Clone)]
pub struct ValueSequenceMutator {
    config: ValueSequenceMutatorConfig,
}

impl ValueSequenceMutator {
    /// Create a mutator, rejecting inverted value bounds and rates outside
    /// `[0, 1]`.
    pub fn new(config: ValueSequenceMutatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ValueSequenceMutatorConfig {
        &self.config
    }
}

impl Mutator<ValueSequenceGenome> for ValueSequenceMutator {
    /// Substitutes sites with the per-site rate, then inverts a random
    /// closed span once per sequence with the inversion rate. Lengths never
    /// change.
    fn mutate(&self, rng: &mut dyn RandomSource, genome: &mut ValueSequenceGenome) -> usize {
        let c = &self.config;
        let mut count = 0;

        for sequence in &mut genome.sequences {
            for site in sequence.iter_mut() {
                if rng.bernoulli(c.site_substitution_rate) {
                    *site = if c.bit_mode {
                        i32::from(*site == 0)
                    } else {
                        rng.uniform_value(c.min_value, c.max_value)
                    };
                    count += 1;
                }
            }

            if sequence.is_empty() {
                continue;
            }
            if rng.bernoulli(c.inversion_rate) {
                let mut p0 = rng.uniform_index(0, sequence.len());
                let mut p1 = rng.uniform_index(0, sequence.len());
                if p1 < p0 {
                    std::mem::swap(&mut p0, &mut p1);
                }
                sequence[p0..=p1].reverse();
                if c.count_inversions {
                    count += 1;
                }
            }
        }

        count
    }
}
