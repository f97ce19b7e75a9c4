//! Invariant-preserving genome mutation operators.

mod pair_sequence;
mod value_sequence;

pub use pair_sequence::PairSequenceMutator;
pub use value_sequence::ValueSequenceMutator;

use super::random::RandomSource;

/// Mutates a genome in place and reports how many mutations were applied.
///
/// Mutation never fails: every operator keeps its genome inside the
/// configured bounds by construction.
pub trait Mutator<G>: Send + Sync {
    fn mutate(&self, rng: &mut dyn RandomSource, genome: &mut G) -> usize;
}

/// Mutator that leaves genomes untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMutation;

impl<G> Mutator<G> for NoMutation {
    #[inline]
    fn mutate(&self, _rng: &mut dyn RandomSource, _genome: &mut G) -> usize {
        0
    }
}
