//! Schema module - Configuration, genome and progress types for coevolution runs.

mod config;
mod genome;
mod mutation;
mod progress;
mod sorting;

pub use config::*;
pub use genome::*;
pub use mutation::*;
pub use progress::*;
pub use sorting::*;
