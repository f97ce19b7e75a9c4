//! Pairwise scoring of solutions against tests.
//!
//! Scores are computed in parallel into per-row (full mode) or per-cohort
//! (cohort mode) blocks, then scattered into phenotypes on the calling
//! thread. Every phenotype write is committed before [`EvaluationOrchestrator::evaluate`]
//! returns.

use std::marker::PhantomData;

use rayon::prelude::*;

use crate::schema::EvaluationMode;

use super::cohort::{CohortError, CohortPartitioner};
use super::population::{Phenotype, Population};
use super::random::RandomSource;

/// Scores one solution against one test.
///
/// Implementations must be deterministic for identical genomes and must not
/// fail: runaway evaluations are converted to a worst-case score before
/// returning.
pub trait Evaluator: Send + Sync {
    /// Solution genome type.
    type Solution: Send + Sync;
    /// Test genome type.
    type Test: Send + Sync;

    /// Score of `solution` on `test` (commonly 0.0 fail / 1.0 pass).
    fn evaluate(&self, solution: &Self::Solution, test: &Self::Test) -> f64;
}

/// [`Evaluator`] backed by a closure.
pub struct FnEvaluator<S, T, F> {
    f: F,
    _marker: PhantomData<fn(&S, &T)>,
}

/// Wrap a closure as an [`Evaluator`].
pub fn evaluator_fn<S, T, F>(f: F) -> FnEvaluator<S, T, F>
where
    S: Send + Sync,
    T: Send + Sync,
    F: Fn(&S, &T) -> f64 + Send + Sync,
{
    FnEvaluator {
        f,
        _marker: PhantomData,
    }
}

impl<S, T, F> Evaluator for FnEvaluator<S, T, F>
where
    S: Send + Sync,
    T: Send + Sync,
    F: Fn(&S, &T) -> f64 + Send + Sync,
{
    type Solution = S;
    type Test = T;

    #[inline]
    fn evaluate(&self, solution: &S, test: &T) -> f64 {
        (self.f)(solution, test)
    }
}

/// Evaluation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    #[error("Cohort setup failed: {0}")]
    Cohort(#[from] CohortError),
    #[error("{population} population capacity {capacity} does not match cohort partition size {expected}")]
    CapacityMismatch {
        population: &'static str,
        capacity: usize,
        expected: usize,
    },
    #[error("{population} slot {id} is empty during cohort evaluation")]
    Unoccupied { population: &'static str, id: usize },
}

/// Outcome of one evaluation round.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationSummary {
    /// Solution with the most passes (first in population order on ties).
    pub dominant_solution: Option<usize>,
    pub dominant_solution_passes: f64,
    /// Test inducing the most failures (first in population order on ties).
    pub dominant_test: Option<usize>,
    pub dominant_test_fails: f64,
    pub mean_solution_passes: f64,
    pub mean_test_fails: f64,
    /// Evaluator calls made.
    pub evaluations: u64,
}

/// Drives pairwise scoring between a solution and a test population.
#[derive(Debug, Clone)]
pub struct EvaluationOrchestrator {
    mode: EvaluationMode,
    cohorts: Option<(CohortPartitioner, CohortPartitioner)>,
}

impl EvaluationOrchestrator {
    /// Create an orchestrator for populations of the given capacities.
    ///
    /// Cohort mode requires both capacities to divide evenly into cohorts and
    /// to yield the same cohort count.
    pub fn new(
        mode: EvaluationMode,
        solution_capacity: usize,
        test_capacity: usize,
    ) -> Result<Self, EvaluationError> {
        let cohorts = match mode {
            EvaluationMode::Full => None,
            EvaluationMode::Cohort { cohort_size } => {
                let solutions = CohortPartitioner::setup(solution_capacity, cohort_size)?;
                let tests = CohortPartitioner::setup(test_capacity, cohort_size)?;
                solutions.check_paired(&tests)?;
                Some((solutions, tests))
            }
        };
        Ok(Self { mode, cohorts })
    }

    #[inline]
    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    /// Solution cohorts of the most recent round (cohort mode only).
    pub fn solution_cohorts(&self) -> Option<&CohortPartitioner> {
        self.cohorts.as_ref().map(|(s, _)| s)
    }

    /// Test cohorts of the most recent round (cohort mode only).
    pub fn test_cohorts(&self) -> Option<&CohortPartitioner> {
        self.cohorts.as_ref().map(|(_, t)| t)
    }

    /// Reset phenotypes, score every pairing of this round and aggregate.
    pub fn evaluate<E: Evaluator>(
        &mut self,
        evaluator: &E,
        solutions: &mut Population<E::Solution>,
        tests: &mut Population<E::Test>,
        rng: &mut dyn RandomSource,
    ) -> Result<EvaluationSummary, EvaluationError> {
        let evaluations = match self.cohorts.as_mut() {
            None => evaluate_full(evaluator, solutions, tests),
            Some((solution_cohorts, test_cohorts)) => {
                // Independent draws: pairings must not persist across rounds.
                solution_cohorts.randomize(rng);
                test_cohorts.randomize(rng);
                evaluate_cohorts(evaluator, solutions, tests, solution_cohorts, test_cohorts)?
            }
        };

        let (dominant_solution, dominant_solution_passes, mean_solution_passes) =
            aggregate(solutions, |p| p.num_passes);
        let (dominant_test, dominant_test_fails, mean_test_fails) =
            aggregate(tests, |p| p.num_fails);

        log::debug!(
            "evaluated {evaluations} pairs: dominant solution {dominant_solution:?} \
             ({dominant_solution_passes} passes), dominant test {dominant_test:?} \
             ({dominant_test_fails} fails)"
        );

        Ok(EvaluationSummary {
            dominant_solution,
            dominant_solution_passes,
            dominant_test,
            dominant_test_fails,
            mean_solution_passes,
            mean_test_fails,
            evaluations,
        })
    }
}

/// Every solution against every test; local slot = antagonist population id.
fn evaluate_full<E: Evaluator>(
    evaluator: &E,
    solutions: &mut Population<E::Solution>,
    tests: &mut Population<E::Test>,
) -> u64 {
    solutions.reset_phenotypes(tests.capacity());
    tests.reset_phenotypes(solutions.capacity());

    let solution_ids = solutions.occupied_ids();
    let test_ids = tests.occupied_ids();

    let rows: Vec<Vec<f64>> = {
        let solution_genomes: Vec<&E::Solution> =
            solutions.iter().map(|(_, ind)| &ind.genome).collect();
        let test_genomes: Vec<&E::Test> = tests.iter().map(|(_, ind)| &ind.genome).collect();

        solution_genomes
            .par_iter()
            .map(|&solution| {
                test_genomes
                    .iter()
                    .map(|&test| evaluator.evaluate(solution, test))
                    .collect()
            })
            .collect()
    };

    for (&s, row) in solution_ids.iter().zip(&rows) {
        for (&t, &score) in test_ids.iter().zip(row) {
            record(solutions, s, t, score);
            record(tests, t, s, score);
        }
    }

    (solution_ids.len() * test_ids.len()) as u64
}

/// Block-diagonal scoring: cohort `c` of solutions against cohort `c` of tests.
fn evaluate_cohorts<E: Evaluator>(
    evaluator: &E,
    solutions: &mut Population<E::Solution>,
    tests: &mut Population<E::Test>,
    solution_cohorts: &CohortPartitioner,
    test_cohorts: &CohortPartitioner,
) -> Result<u64, EvaluationError> {
    check_cohort_population("Solution", solutions, solution_cohorts)?;
    check_cohort_population("Test", tests, test_cohorts)?;

    let cohort_size = solution_cohorts.cohort_size();
    solutions.reset_phenotypes(cohort_size);
    tests.reset_phenotypes(cohort_size);

    // blocks[c][p * cohort_size + t]
    let blocks: Vec<Vec<f64>> = {
        // Populations are full, so position in these tables equals slot id.
        let solution_genomes: Vec<&E::Solution> =
            solutions.iter().map(|(_, ind)| &ind.genome).collect();
        let test_genomes: Vec<&E::Test> = tests.iter().map(|(_, ind)| &ind.genome).collect();

        (0..solution_cohorts.num_cohorts())
            .into_par_iter()
            .map(|c| {
                let mut block = Vec::with_capacity(cohort_size * cohort_size);
                for &s in solution_cohorts.cohort(c) {
                    for &t in test_cohorts.cohort(c) {
                        block.push(evaluator.evaluate(solution_genomes[s], test_genomes[t]));
                    }
                }
                block
            })
            .collect()
    };

    for (c, block) in blocks.iter().enumerate() {
        for p in 0..cohort_size {
            let s = solution_cohorts.world_id(c, p);
            for t_slot in 0..cohort_size {
                let t = test_cohorts.world_id(c, t_slot);
                let score = block[p * cohort_size + t_slot];
                record(solutions, s, t_slot, score);
                record(tests, t, p, score);
            }
        }
    }

    Ok((blocks.len() * cohort_size * cohort_size) as u64)
}

fn check_cohort_population<G>(
    population: &'static str,
    members: &Population<G>,
    cohorts: &CohortPartitioner,
) -> Result<(), EvaluationError> {
    if members.capacity() != cohorts.pop_size() {
        return Err(EvaluationError::CapacityMismatch {
            population,
            capacity: members.capacity(),
            expected: cohorts.pop_size(),
        });
    }
    match (0..members.capacity()).find(|&id| !members.is_occupied(id)) {
        Some(id) => Err(EvaluationError::Unoccupied { population, id }),
        None => Ok(()),
    }
}

#[inline]
fn record<G>(population: &mut Population<G>, id: usize, slot: usize, score: f64) {
    if let Some(individual) = population.get_mut(id) {
        individual.phenotype.results[slot] = score;
    }
}

/// Aggregate every phenotype; returns `(argmax id, max, mean)` of `key`.
fn aggregate<G>(
    population: &mut Population<G>,
    key: impl Fn(&Phenotype) -> f64,
) -> (Option<usize>, f64, f64) {
    let mut best: Option<(usize, f64)> = None;
    let mut total = 0.0;
    let mut count = 0usize;

    for (id, individual) in population.iter_mut() {
        individual.phenotype.aggregate();
        let value = key(&individual.phenotype);
        total += value;
        count += 1;
        // Strict comparison keeps the first id on ties.
        if best.is_none_or(|(_, b)| value > b) {
            best = Some((id, value));
        }
    }

    let mean = if count > 0 { total / count as f64 } else { 0.0 };
    match best {
        Some((id, value)) => (Some(id), value, mean),
        None => (None, 0.0, mean),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::random::CoevoRng;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ids(n: usize) -> Population<usize> {
        Population::from_genomes(n, (0..n).collect()).unwrap()
    }

    #[test]
    fn test_full_mode_dominant_solution() {
        // Solution 0 passes every test, the rest pass none.
        let evaluator = evaluator_fn(|s: &usize, _t: &usize| if *s == 0 { 1.0 } else { 0.0 });
        let mut solutions = ids(3);
        let mut tests = ids(2);
        let mut orchestrator = EvaluationOrchestrator::new(EvaluationMode::Full, 3, 2).unwrap();
        let mut rng = CoevoRng::new(1);

        let summary = orchestrator
            .evaluate(&evaluator, &mut solutions, &mut tests, &mut rng)
            .unwrap();

        assert_eq!(summary.evaluations, 6);
        assert_eq!(solutions.get(0).unwrap().phenotype.num_passes, 2.0);
        assert_eq!(solutions.get(1).unwrap().phenotype.num_passes, 0.0);
        assert_eq!(solutions.get(2).unwrap().phenotype.num_passes, 0.0);
        assert_eq!(summary.dominant_solution, Some(0));
        assert_eq!(summary.dominant_solution_passes, 2.0);

        // Each test is passed by one of three solutions.
        for t in 0..2 {
            let phenotype = &tests.get(t).unwrap().phenotype;
            assert_eq!(phenotype.results, vec![1.0, 0.0, 0.0]);
            assert_eq!(phenotype.num_fails, 2.0);
        }
        assert_eq!(summary.dominant_test, Some(0));
        assert_eq!(summary.dominant_test_fails, 2.0);
    }

    #[test]
    fn test_full_mode_records_symmetric_scores() {
        let evaluator = evaluator_fn(|s: &usize, t: &usize| (s * 10 + t) as f64);
        let mut solutions = ids(3);
        let mut tests = ids(4);
        let mut orchestrator = EvaluationOrchestrator::new(EvaluationMode::Full, 3, 4).unwrap();
        orchestrator
            .evaluate(&evaluator, &mut solutions, &mut tests, &mut CoevoRng::new(0))
            .unwrap();

        for s in 0..3 {
            for t in 0..4 {
                let expected = (s * 10 + t) as f64;
                assert_eq!(solutions.get(s).unwrap().phenotype.results[t], expected);
                assert_eq!(tests.get(t).unwrap().phenotype.results[s], expected);
            }
        }
    }

    #[test]
    fn test_dominant_ties_break_to_first() {
        let evaluator = evaluator_fn(|s: &usize, _t: &usize| if *s >= 1 { 1.0 } else { 0.0 });
        let mut solutions = ids(3);
        let mut tests = ids(2);
        let mut orchestrator = EvaluationOrchestrator::new(EvaluationMode::Full, 3, 2).unwrap();
        let summary = orchestrator
            .evaluate(&evaluator, &mut solutions, &mut tests, &mut CoevoRng::new(0))
            .unwrap();
        assert_eq!(summary.dominant_solution, Some(1));
        assert_eq!(summary.dominant_test, Some(0));
    }

    #[test]
    fn test_cohort_mode_pair_counts() {
        let calls = AtomicUsize::new(0);
        let evaluator = evaluator_fn(|_s: &usize, _t: &usize| {
            calls.fetch_add(1, Ordering::Relaxed);
            1.0
        });
        let mut solutions = ids(4);
        let mut tests = ids(4);
        let mut orchestrator =
            EvaluationOrchestrator::new(EvaluationMode::Cohort { cohort_size: 2 }, 4, 4).unwrap();

        let summary = orchestrator
            .evaluate(&evaluator, &mut solutions, &mut tests, &mut CoevoRng::new(9))
            .unwrap();

        assert_eq!(orchestrator.solution_cohorts().unwrap().num_cohorts(), 2);
        assert_eq!(calls.load(Ordering::Relaxed), 8);
        assert_eq!(summary.evaluations, 8);
        for (_, individual) in solutions.iter() {
            assert_eq!(individual.phenotype.results.len(), 2);
            assert_eq!(individual.phenotype.num_passes, 2.0);
        }
    }

    #[test]
    fn test_cohort_mode_slot_correspondence() {
        let pairs = Mutex::new(Vec::new());
        let evaluator = evaluator_fn(|s: &usize, t: &usize| {
            pairs.lock().unwrap().push((*s, *t));
            (s * 100 + t) as f64
        });
        let mut solutions = ids(12);
        let mut tests = ids(12);
        let mut orchestrator =
            EvaluationOrchestrator::new(EvaluationMode::Cohort { cohort_size: 3 }, 12, 12).unwrap();
        let mut rng = CoevoRng::new(21);

        for _ in 0..3 {
            pairs.lock().unwrap().clear();
            orchestrator
                .evaluate(&evaluator, &mut solutions, &mut tests, &mut rng)
                .unwrap();

            let sc = orchestrator.solution_cohorts().unwrap();
            let tc = orchestrator.test_cohorts().unwrap();

            // Only same-cohort pairings were scored, each exactly once.
            let mut seen = pairs.lock().unwrap().clone();
            assert_eq!(seen.len(), 4 * 3 * 3);
            for &(s, t) in &seen {
                assert_eq!(sc.cohort_of(s).0, tc.cohort_of(t).0);
            }
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), 4 * 3 * 3);

            // Local slot k of a solution holds the score against test slot k.
            for c in 0..sc.num_cohorts() {
                for p in 0..3 {
                    let s = sc.world_id(c, p);
                    for k in 0..3 {
                        let t = tc.world_id(c, k);
                        let expected = (s * 100 + t) as f64;
                        assert_eq!(solutions.get(s).unwrap().phenotype.results[k], expected);
                        assert_eq!(tests.get(t).unwrap().phenotype.results[p], expected);
                    }
                }
            }
        }
    }

    #[test]
    fn test_cohort_mode_rejects_bad_setup() {
        assert_eq!(
            EvaluationOrchestrator::new(EvaluationMode::Cohort { cohort_size: 3 }, 10, 9)
                .unwrap_err(),
            EvaluationError::Cohort(CohortError::Indivisible {
                pop_size: 10,
                cohort_size: 3
            })
        );
        assert_eq!(
            EvaluationOrchestrator::new(EvaluationMode::Cohort { cohort_size: 2 }, 4, 8)
                .unwrap_err(),
            EvaluationError::Cohort(CohortError::MismatchedCounts {
                solutions: 2,
                tests: 4
            })
        );
    }

    #[test]
    fn test_cohort_mode_rejects_sparse_population() {
        let evaluator = evaluator_fn(|_s: &usize, _t: &usize| 0.0);
        let mut solutions = Population::from_genomes(4, vec![0, 1, 2]).unwrap();
        let mut tests = ids(4);
        let mut orchestrator =
            EvaluationOrchestrator::new(EvaluationMode::Cohort { cohort_size: 2 }, 4, 4).unwrap();
        let err = orchestrator
            .evaluate(&evaluator, &mut solutions, &mut tests, &mut CoevoRng::new(0))
            .unwrap_err();
        assert_eq!(
            err,
            EvaluationError::Unoccupied {
                population: "Solution",
                id: 3
            }
        );
    }

    #[test]
    fn test_full_mode_skips_empty_slots() {
        let evaluator = evaluator_fn(|_s: &usize, _t: &usize| 1.0);
        let mut solutions = Population::from_genomes(3, vec![0, 1]).unwrap();
        let mut tests = ids(2);
        let mut orchestrator = EvaluationOrchestrator::new(EvaluationMode::Full, 3, 2).unwrap();
        let summary = orchestrator
            .evaluate(&evaluator, &mut solutions, &mut tests, &mut CoevoRng::new(0))
            .unwrap();
        assert_eq!(summary.evaluations, 4);
        // Test phenotypes keep a zero in the empty solution slot.
        assert_eq!(tests.get(0).unwrap().phenotype.results, vec![1.0, 1.0, 0.0]);
    }
}
