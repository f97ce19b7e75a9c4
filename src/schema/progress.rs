//! Progress and result types for coevolution runs.

use serde::{Deserialize, Serialize};

/// Per-generation summary taken after evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationSummary {
    /// Generation the summary belongs to.
    pub generation: usize,
    /// Population id of the dominant solution.
    pub dominant_solution: usize,
    /// Passes achieved by the dominant solution.
    pub dominant_solution_passes: f64,
    /// Population id of the dominant test.
    pub dominant_test: usize,
    /// Failures induced by the dominant test.
    pub dominant_test_fails: f64,
    /// Mean passes across the solution population.
    pub mean_solution_passes: f64,
    /// Mean failures across the test population.
    pub mean_test_fails: f64,
    /// Evaluator calls made this generation.
    pub evaluations: u64,
    /// Mutations applied to solution offspring.
    pub solution_mutations: usize,
    /// Mutations applied to test offspring.
    pub test_mutations: usize,
}

/// History for plotting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoevolutionHistory {
    /// Dominant solution passes per generation.
    pub best_passes: Vec<f64>,
    /// Mean solution passes per generation.
    pub mean_passes: Vec<f64>,
    /// Dominant test failures per generation.
    pub best_test_fails: Vec<f64>,
    /// Mean test failures per generation.
    pub mean_test_fails: Vec<f64>,
}

impl CoevolutionHistory {
    /// Append one generation.
    pub fn record(&mut self, summary: &GenerationSummary) {
        self.best_passes.push(summary.dominant_solution_passes);
        self.mean_passes.push(summary.mean_solution_passes);
        self.best_test_fails.push(summary.dominant_test_fails);
        self.mean_test_fails.push(summary.mean_test_fails);
    }

    /// Number of recorded generations.
    pub fn len(&self) -> usize {
        self.best_passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best_passes.is_empty()
    }
}

/// Current phase of a generation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CoevolutionPhase {
    /// Populations not yet created.
    #[default]
    Initializing,
    /// Scoring solutions against tests.
    Evaluating,
    /// Choosing parents.
    Selecting,
    /// Mutating offspring.
    Mutating,
    /// Run complete.
    Complete,
    /// Run stopped early.
    Stopped,
}

/// Progress update passed to run callbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoevolutionProgress {
    /// Current generation number.
    pub generation: usize,
    /// Total generations planned.
    pub total_generations: usize,
    /// Current phase.
    pub phase: CoevolutionPhase,
    /// Most recent generation summary.
    pub latest: Option<GenerationSummary>,
    /// Best dominant-solution passes seen so far.
    pub best_passes: f64,
}

/// Snapshot of an extremal individual.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DominantSnapshot<G> {
    /// Population id at the time of the snapshot.
    pub id: usize,
    /// Generation the snapshot was taken in.
    pub generation: usize,
    /// Passes (solutions) or failures induced (tests).
    pub score: f64,
    /// Genome copy.
    pub genome: G,
}

/// Final result of a coevolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoevolutionResult<S, T> {
    /// Best solution seen across the run.
    pub best_solution: Option<DominantSnapshot<S>>,
    /// Dominant test of the final evaluated generation.
    pub final_test: Option<DominantSnapshot<T>>,
    /// Run statistics.
    pub stats: CoevolutionStats,
    /// Full history.
    pub history: CoevolutionHistory,
}

/// Statistics from a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoevolutionStats {
    /// Generations completed.
    pub generations: usize,
    /// Total evaluator calls.
    pub total_evaluations: u64,
    /// Best dominant-solution passes.
    pub best_passes: f64,
    /// Wall-clock seconds.
    pub elapsed_seconds: f64,
    /// Evaluator calls per second.
    pub evaluations_per_second: f64,
    /// Why the run ended.
    pub stop_reason: StopReason,
}

/// Reason a run stopped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Reached maximum generations.
    MaxGenerations,
    /// Dominant solution reached the target.
    TargetReached,
    /// Cancelled through the cancel handle.
    Cancelled,
}
