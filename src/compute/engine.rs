//! Generation loop driving two coevolving populations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::schema::{
    CoevolutionConfig, CoevolutionHistory, CoevolutionPhase, CoevolutionProgress,
    CoevolutionResult, CoevolutionStats, ConfigError, DominantSnapshot, GenerationSummary,
    SelectionMethod, StopReason,
};

use super::cohort::CohortPartitioner;
use super::evaluation::{EvaluationError, EvaluationOrchestrator, Evaluator};
use super::mutation::Mutator;
use super::population::{Population, PopulationError};
use super::random::{CoevoRng, RandomSource};
use super::selection::{
    CohortLexicaseSelector, FitnessTable, LexicaseSelector, Objective, SelectionError,
    TournamentSelector,
};

/// Errors raised by the coevolution engine.
#[derive(Debug, thiserror::Error)]
pub enum CoevolutionError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),
    #[error("Selection failed: {0}")]
    Selection(#[from] SelectionError),
    #[error("Population error: {0}")]
    Population(#[from] PopulationError),
    #[error("Populations must be initialized before running")]
    NotInitialized,
    #[error("Cohort lexicase selection requires cohort evaluation")]
    MissingCohorts,
}

/// Coevolution engine: evaluate, select, mutate, advance.
pub struct CoevolutionEngine<E: Evaluator> {
    config: CoevolutionConfig,
    evaluator: E,
    solution_mutator: Box<dyn Mutator<E::Solution>>,
    test_mutator: Box<dyn Mutator<E::Test>>,
    rng: CoevoRng,
    orchestrator: EvaluationOrchestrator,
    solutions: Population<E::Solution>,
    tests: Population<E::Test>,
    history: CoevolutionHistory,
    latest: Option<GenerationSummary>,
    best_solution: Option<DominantSnapshot<E::Solution>>,
    final_test: Option<DominantSnapshot<E::Test>>,
    generation: usize,
    total_evaluations: u64,
    phase: CoevolutionPhase,
    cancelled: Arc<AtomicBool>,
}

impl<E> CoevolutionEngine<E>
where
    E: Evaluator,
    E::Solution: Clone,
    E::Test: Clone,
{
    /// Create an engine with empty populations.
    pub fn new(
        config: CoevolutionConfig,
        evaluator: E,
        solution_mutator: impl Mutator<E::Solution> + 'static,
        test_mutator: impl Mutator<E::Test> + 'static,
    ) -> Result<Self, CoevolutionError> {
        config.validate()?;

        let seed = config.random_seed.unwrap_or_else(rand::random);
        let orchestrator = EvaluationOrchestrator::new(
            config.evaluation,
            config.solution_population.size,
            config.test_population.size,
        )?;

        log::info!(
            "coevolution: {} solutions x {} tests, {:?} evaluation, seed {seed}",
            config.solution_population.size,
            config.test_population.size,
            config.evaluation
        );

        Ok(Self {
            solutions: Population::new(config.solution_population.size),
            tests: Population::new(config.test_population.size),
            config,
            evaluator,
            solution_mutator: Box::new(solution_mutator),
            test_mutator: Box::new(test_mutator),
            rng: CoevoRng::new(seed),
            orchestrator,
            history: CoevolutionHistory::default(),
            latest: None,
            best_solution: None,
            final_test: None,
            generation: 0,
            total_evaluations: 0,
            phase: CoevolutionPhase::Initializing,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get cancellation handle.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Fill both populations with generated genomes.
    pub fn initialize_with<FS, FT>(&mut self, mut make_solution: FS, mut make_test: FT)
    where
        FS: FnMut(&mut dyn RandomSource) -> E::Solution,
        FT: FnMut(&mut dyn RandomSource) -> E::Test,
    {
        self.reset();
        let solutions = (0..self.solutions.capacity())
            .map(|_| make_solution(&mut self.rng))
            .collect();
        let tests = (0..self.tests.capacity())
            .map(|_| make_test(&mut self.rng))
            .collect();
        self.solutions = fill(self.solutions.capacity(), solutions);
        self.tests = fill(self.tests.capacity(), tests);
        log::info!(
            "initialized {} solutions and {} tests",
            self.solutions.len(),
            self.tests.len()
        );
    }

    /// Start from explicit genomes. Populations may be left partially empty
    /// in full evaluation mode.
    pub fn seed_populations(
        &mut self,
        solutions: Vec<E::Solution>,
        tests: Vec<E::Test>,
    ) -> Result<(), CoevolutionError> {
        self.reset();
        self.solutions = Population::from_genomes(self.solutions.capacity(), solutions)?;
        self.tests = Population::from_genomes(self.tests.capacity(), tests)?;
        Ok(())
    }

    fn reset(&mut self) {
        self.history = CoevolutionHistory::default();
        self.latest = None;
        self.best_solution = None;
        self.final_test = None;
        self.generation = 0;
        self.total_evaluations = 0;
        self.phase = CoevolutionPhase::Initializing;
    }

    /// Run one generation.
    pub fn step(&mut self) -> Result<GenerationSummary, CoevolutionError> {
        if self.solutions.is_empty() || self.tests.is_empty() {
            return Err(CoevolutionError::NotInitialized);
        }

        self.phase = CoevolutionPhase::Evaluating;
        let evaluation = self.orchestrator.evaluate(
            &self.evaluator,
            &mut self.solutions,
            &mut self.tests,
            &mut self.rng,
        )?;
        self.total_evaluations += evaluation.evaluations;

        let dominant_solution = evaluation.dominant_solution.unwrap_or(0);
        let dominant_test = evaluation.dominant_test.unwrap_or(0);
        if self
            .best_solution
            .as_ref()
            .is_none_or(|best| evaluation.dominant_solution_passes > best.score)
        {
            self.best_solution = Some(DominantSnapshot {
                id: dominant_solution,
                generation: self.generation,
                score: evaluation.dominant_solution_passes,
                genome: self.solutions.genome_at(dominant_solution)?,
            });
        }
        self.final_test = Some(DominantSnapshot {
            id: dominant_test,
            generation: self.generation,
            score: evaluation.dominant_test_fails,
            genome: self.tests.genome_at(dominant_test)?,
        });

        self.phase = CoevolutionPhase::Selecting;
        reproduce(
            &mut self.solutions,
            self.config.solution_selection,
            self.orchestrator.solution_cohorts(),
            Objective::Passes,
            &mut self.rng,
        )?;
        reproduce(
            &mut self.tests,
            self.config.test_selection,
            self.orchestrator.test_cohorts(),
            Objective::Fails,
            &mut self.rng,
        )?;

        self.phase = CoevolutionPhase::Mutating;
        let solution_mutations =
            mutate_offspring(&mut self.solutions, &*self.solution_mutator, &mut self.rng);
        let test_mutations = mutate_offspring(&mut self.tests, &*self.test_mutator, &mut self.rng);

        self.solutions.advance();
        self.tests.advance();

        let summary = GenerationSummary {
            generation: self.generation,
            dominant_solution,
            dominant_solution_passes: evaluation.dominant_solution_passes,
            dominant_test,
            dominant_test_fails: evaluation.dominant_test_fails,
            mean_solution_passes: evaluation.mean_solution_passes,
            mean_test_fails: evaluation.mean_test_fails,
            evaluations: evaluation.evaluations,
            solution_mutations,
            test_mutations,
        };
        log::debug!(
            "generation {}: best passes {:.1} (mean {:.2}), best test fails {:.1}, \
             {} + {} mutations",
            summary.generation,
            summary.dominant_solution_passes,
            summary.mean_solution_passes,
            summary.dominant_test_fails,
            solution_mutations,
            test_mutations
        );

        self.history.record(&summary);
        self.latest = Some(summary.clone());
        self.generation += 1;
        Ok(summary)
    }

    /// Best dominant-solution passes seen so far.
    pub fn best_passes(&self) -> f64 {
        self.best_solution
            .as_ref()
            .map_or(f64::NEG_INFINITY, |best| best.score)
    }

    /// Get current progress.
    pub fn progress(&self) -> CoevolutionProgress {
        CoevolutionProgress {
            generation: self.generation,
            total_generations: self.config.max_generations,
            phase: self.phase,
            latest: self.latest.clone(),
            best_passes: self.best_passes().max(0.0),
        }
    }

    /// Check if the run should stop.
    fn should_stop(&self) -> Option<StopReason> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Some(StopReason::Cancelled);
        }

        if self.generation >= self.config.max_generations {
            return Some(StopReason::MaxGenerations);
        }

        if let Some(target) = self.config.target_passes
            && self.best_passes() >= target
        {
            return Some(StopReason::TargetReached);
        }

        None
    }

    /// Run generations until a stop condition holds, reporting progress after
    /// each one.
    pub fn run_with_callback<F>(
        &mut self,
        mut callback: F,
    ) -> Result<CoevolutionResult<E::Solution, E::Test>, CoevolutionError>
    where
        F: FnMut(&CoevolutionProgress),
    {
        if self.solutions.is_empty() || self.tests.is_empty() {
            return Err(CoevolutionError::NotInitialized);
        }

        let start_time = std::time::Instant::now();
        callback(&self.progress());

        let stop_reason = loop {
            if let Some(reason) = self.should_stop() {
                break reason;
            }
            self.step()?;
            callback(&self.progress());
        };

        self.phase = match stop_reason {
            StopReason::Cancelled => CoevolutionPhase::Stopped,
            _ => CoevolutionPhase::Complete,
        };
        callback(&self.progress());

        let elapsed = start_time.elapsed().as_secs_f64();
        log::info!(
            "stopped after {} generations ({stop_reason:?}), best passes {:.1}",
            self.generation,
            self.best_passes().max(0.0)
        );

        Ok(CoevolutionResult {
            best_solution: self.best_solution.clone(),
            final_test: self.final_test.clone(),
            stats: CoevolutionStats {
                generations: self.generation,
                total_evaluations: self.total_evaluations,
                best_passes: self.best_passes().max(0.0),
                elapsed_seconds: elapsed,
                evaluations_per_second: if elapsed > 0.0 {
                    self.total_evaluations as f64 / elapsed
                } else {
                    0.0
                },
                stop_reason,
            },
            history: self.history.clone(),
        })
    }

    /// Run (blocking).
    pub fn run(&mut self) -> Result<CoevolutionResult<E::Solution, E::Test>, CoevolutionError> {
        self.run_with_callback(|_| {})
    }

    #[inline]
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn config(&self) -> &CoevolutionConfig {
        &self.config
    }

    pub fn solutions(&self) -> &Population<E::Solution> {
        &self.solutions
    }

    pub fn tests(&self) -> &Population<E::Test> {
        &self.tests
    }

    pub fn history(&self) -> &CoevolutionHistory {
        &self.history
    }

    pub fn orchestrator(&self) -> &EvaluationOrchestrator {
        &self.orchestrator
    }
}

fn fill<G>(capacity: usize, genomes: Vec<G>) -> Population<G> {
    let mut population = Population::new(capacity);
    for genome in genomes {
        if population.inject(genome).is_err() {
            break;
        }
    }
    population
}

/// Queue a full next generation chosen by `method`.
fn reproduce<G: Clone + Send + Sync>(
    population: &mut Population<G>,
    method: SelectionMethod,
    cohorts: Option<&CohortPartitioner>,
    objective: Objective,
    rng: &mut CoevoRng,
) -> Result<(), CoevolutionError> {
    let births = population.capacity();
    match method {
        SelectionMethod::Lexicase { max_funs } => {
            let candidates = population.occupied_ids();
            let num_slots = candidates
                .iter()
                .filter_map(|&id| population.get(id))
                .map(|ind| ind.phenotype.results.len())
                .max()
                .unwrap_or(0);
            let table = FitnessTable::from_results(population, &candidates, num_slots, objective)?;
            LexicaseSelector::new(max_funs).select(population, &table, births, rng)?;
        }
        SelectionMethod::CohortLexicase { max_funs } => {
            let cohorts = cohorts.ok_or(CoevolutionError::MissingCohorts)?;
            CohortLexicaseSelector::new(max_funs).select(population, cohorts, objective, rng)?;
        }
        SelectionMethod::Tournament { size } => {
            TournamentSelector::new(size).select(population, objective, births, rng)?;
        }
    }
    Ok(())
}

/// Mutate every queued offspring in parallel; slot `i` draws from the `i`-th
/// stream forked from `rng`, so results do not depend on thread count.
fn mutate_offspring<G: Send>(
    population: &mut Population<G>,
    mutator: &dyn Mutator<G>,
    rng: &mut CoevoRng,
) -> usize {
    let streams = rng.fork_many(population.capacity());
    population
        .offspring_mut()
        .par_iter_mut()
        .zip(streams)
        .map(|(slot, mut stream)| match slot {
            Some(child) => mutator.mutate(&mut stream, &mut child.genome),
            None => 0,
        })
        .sum()
}
