//! Compute module - Partitioning, evaluation, selection and mutation for coevolution.

mod cohort;
mod engine;
mod evaluation;
mod population;
mod random;
mod selection;

pub mod mutation;

pub use cohort::*;
pub use engine::*;
pub use evaluation::*;
pub use mutation::{Mutator, NoMutation, PairSequenceMutator, ValueSequenceMutator};
pub use population::*;
pub use random::*;
pub use selection::*;
