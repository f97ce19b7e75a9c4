//! Sorting networks coevolving against input sequences.
//!
//! A network is a [`PairSequenceGenome`] of compare-exchange gates `(i, j)`:
//! when `v[j] < v[i]` the two values swap. A test is a
//! [`ValueSequenceGenome`] holding one or more sequences to be sorted.

use crate::compute::{
    CoevolutionEngine, CoevolutionError, Evaluator, PairSequenceMutator, RandomSource,
    ValueSequenceMutator,
};
use crate::schema::{PairSequenceGenome, SortingExperimentConfig, ValueSequenceGenome};

/// Run `network` over a copy of `sequence` and report whether the result is
/// non-decreasing. Gates indexing past the sequence fail the sort.
pub fn sorts(network: &PairSequenceGenome, sequence: &[i32]) -> bool {
    let mut values = sequence.to_vec();
    for &[i, j] in &network.genes {
        if i >= values.len() || j >= values.len() {
            return false;
        }
        if values[j] < values[i] {
            values.swap(i, j);
        }
    }
    values.is_sorted()
}

/// Check a network on all `2^input_size` binary inputs.
///
/// By the 0-1 principle this decides whether it sorts every input of that
/// size. Sizes above 24 are too large to enumerate and return `None`.
pub fn sorts_all_binary(network: &PairSequenceGenome, input_size: usize) -> Option<bool> {
    if input_size > 24 {
        return None;
    }
    Some((0u32..1 << input_size).all(|bits| {
        let sequence: Vec<i32> = (0..input_size).map(|k| ((bits >> k) & 1) as i32).collect();
        sorts(network, &sequence)
    }))
}

/// Scores a network by the fraction of a test's sequences it sorts.
#[derive(Debug, Clone, Copy)]
pub struct SortingNetworkEvaluator {
    pub input_size: usize,
}

impl SortingNetworkEvaluator {
    pub fn new(input_size: usize) -> Self {
        Self { input_size }
    }
}

impl Evaluator for SortingNetworkEvaluator {
    type Solution = PairSequenceGenome;
    type Test = ValueSequenceGenome;

    fn evaluate(&self, network: &PairSequenceGenome, test: &ValueSequenceGenome) -> f64 {
        if test.sequences.is_empty() {
            return 0.0;
        }
        let passes = test
            .sequences
            .iter()
            .filter(|sequence| sorts(network, sequence))
            .count();
        passes as f64 / test.sequences.len() as f64
    }
}

/// Random network with length uniform in `[min_len, max_len]`.
pub fn random_network(
    rng: &mut dyn RandomSource,
    input_size: usize,
    min_len: usize,
    max_len: usize,
) -> PairSequenceGenome {
    let len = rng.uniform_index(min_len, max_len + 1);
    (0..len)
        .map(|_| {
            [
                rng.uniform_index(0, input_size),
                rng.uniform_index(0, input_size),
            ]
        })
        .collect::<Vec<_>>()
        .into()
}

/// Random test of `sequences` sequences with values in `[min_value, max_value]`.
pub fn random_test(
    rng: &mut dyn RandomSource,
    input_size: usize,
    sequences: usize,
    min_value: i32,
    max_value: i32,
) -> ValueSequenceGenome {
    ValueSequenceGenome::new(
        (0..sequences)
            .map(|_| {
                (0..input_size)
                    .map(|_| rng.uniform_value(min_value, max_value))
                    .collect()
            })
            .collect(),
    )
}

/// Build an engine for the experiment with randomly initialized populations.
pub fn build_engine(
    config: &SortingExperimentConfig,
) -> Result<CoevolutionEngine<SortingNetworkEvaluator>, CoevolutionError> {
    config.validate()?;

    let input_size = config.input_size();
    let network = config.network_mutation.clone();
    let test = config.test_mutation.clone();
    let sequences = config.sequences_per_test;

    let mut engine = CoevolutionEngine::new(
        config.coevolution.clone(),
        SortingNetworkEvaluator::new(input_size),
        PairSequenceMutator::new(network.clone())?,
        ValueSequenceMutator::new(test.clone())?,
    )?;
    engine.initialize_with(
        |rng| random_network(rng, input_size, network.min_len, network.max_len),
        |rng| random_test(rng, input_size, sequences, test.min_value, test.max_value),
    );
    Ok(engine)
}
