//! Cohort coevolution - Solutions and tests evolving against each other.
//!
//! This crate provides a coevolution substrate for two populations: candidate
//! solutions (for example sorting networks) and the tests they are scored on.
//! Each generation the populations are evaluated against each other, parents
//! are chosen by lexicase selection over per-test outcomes, and offspring are
//! mutated under length and value invariants.
//!
//! # Architecture
//!
//! The crate is split into three modules:
//!
//! - `schema`: Configuration, genome and progress types
//! - `compute`: Cohorts, evaluation, selection, mutation and the engine
//! - `sorting`: The sorting-network experiment built on top of `compute`
//!
//! # Example
//!
//! ```rust,no_run
//! use cohort_coevo::{schema::SortingExperimentConfig, sorting::build_engine};
//!
//! let config = SortingExperimentConfig::default();
//! let mut engine = build_engine(&config).unwrap();
//! let result = engine.run().unwrap();
//!
//! println!(
//!     "Best network passed {} tests after {} generations",
//!     result.stats.best_passes, result.stats.generations
//! );
//! ```

pub mod compute;
pub mod schema;
pub mod sorting;

// Re-export commonly used types
pub use compute::{CoevolutionEngine, EvaluationOrchestrator, Evaluator};
pub use schema::{CoevolutionConfig, PairSequenceGenome, ValueSequenceGenome};
