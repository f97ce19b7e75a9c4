//! Lexicase, cohort lexicase and tournament selection.
//!
//! Selection reads the phenotypes written by the last evaluation and queues
//! offspring through the population's birth primitives. The current
//! generation is never modified, so every fitness value can be computed
//! once up front into a [`FitnessTable`].

use rayon::prelude::*;

use super::cohort::CohortPartitioner;
use super::population::{Individual, Phenotype, Population, PopulationError};
use super::random::{CoevoRng, RandomSource};

/// Selection errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("Lexicase selection requires at least one fitness function")]
    NoFunctions,
    #[error("No candidates available for selection")]
    NoCandidates,
    #[error("Cohort partition covers {cohorts} ids but population capacity is {capacity}")]
    CohortMismatch { cohorts: usize, capacity: usize },
    #[error(transparent)]
    Population(#[from] PopulationError),
}

/// What a population is rewarded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// Maximize scores (solutions: passed tests).
    Passes,
    /// Maximize failures induced in antagonists (tests).
    Fails,
}

impl Objective {
    /// Fitness contributed by one result slot.
    #[inline]
    pub fn fitness(self, score: f64) -> f64 {
        match self {
            Self::Passes => score,
            Self::Fails => -score,
        }
    }

    /// Aggregate fitness of a phenotype.
    #[inline]
    pub fn aggregate(self, phenotype: &Phenotype) -> f64 {
        match self {
            Self::Passes => phenotype.num_passes,
            Self::Fails => phenotype.num_fails,
        }
    }
}

/// Fitness values of a fixed candidate set, stored function-major.
#[derive(Debug, Clone)]
pub struct FitnessTable {
    candidates: Vec<usize>,
    num_functions: usize,
    values: Vec<f64>,
}

impl FitnessTable {
    /// Evaluate every function on every candidate.
    pub fn from_functions<G, F>(
        population: &Population<G>,
        candidates: &[usize],
        functions: &[F],
    ) -> Result<Self, SelectionError>
    where
        F: Fn(&Individual<G>) -> f64,
    {
        let members = candidates
            .iter()
            .map(|&id| population.individual(id))
            .collect::<Result<Vec<_>, _>>()?;

        let mut values = Vec::with_capacity(functions.len() * candidates.len());
        for function in functions {
            values.extend(members.iter().map(|&member| function(member)));
        }

        Ok(Self {
            candidates: candidates.to_vec(),
            num_functions: functions.len(),
            values,
        })
    }

    /// One function per phenotype result slot `0..num_slots`.
    ///
    /// Slots missing from a phenotype read as `0.0`.
    pub fn from_results<G>(
        population: &Population<G>,
        candidates: &[usize],
        num_slots: usize,
        objective: Objective,
    ) -> Result<Self, SelectionError> {
        let members = candidates
            .iter()
            .map(|&id| population.individual(id))
            .collect::<Result<Vec<_>, _>>()?;

        let mut values = Vec::with_capacity(num_slots * candidates.len());
        for slot in 0..num_slots {
            values.extend(members.iter().map(|member| {
                let score = member.phenotype.results.get(slot).copied().unwrap_or(0.0);
                objective.fitness(score)
            }));
        }

        Ok(Self {
            candidates: candidates.to_vec(),
            num_functions: num_slots,
            values,
        })
    }

    #[inline]
    pub fn num_functions(&self) -> usize {
        self.num_functions
    }

    /// Population ids of the candidates, in column order.
    #[inline]
    pub fn candidates(&self) -> &[usize] {
        &self.candidates
    }

    /// Values of one function across all candidates.
    #[inline]
    pub fn row(&self, function: usize) -> &[f64] {
        let n = self.candidates.len();
        &self.values[function * n..(function + 1) * n]
    }
}

/// Record of one lexicase reproduction event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEvent {
    /// Population id of the selected parent.
    pub winner: usize,
    /// Function indices in the order they were drawn (after truncation).
    pub criteria: Vec<usize>,
    /// Number of criteria applied before a single survivor remained.
    pub depth: usize,
}

// NaN never compares equal, which would empty the survivor set.
#[inline]
fn rank(value: f64) -> f64 {
    if value.is_nan() { f64::NEG_INFINITY } else { value }
}

/// Plain lexicase selection over a candidate set.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicaseSelector {
    /// Criteria per event; 0 uses every function.
    pub max_funs: usize,
}

impl LexicaseSelector {
    pub fn new(max_funs: usize) -> Self {
        Self { max_funs }
    }

    /// Run one lexicase event against a precomputed table.
    pub fn select_one(
        &self,
        table: &FitnessTable,
        rng: &mut dyn RandomSource,
    ) -> Result<SelectionEvent, SelectionError> {
        let num_functions = table.num_functions();
        if num_functions == 0 {
            return Err(SelectionError::NoFunctions);
        }
        let num_candidates = table.candidates().len();
        if num_candidates == 0 {
            return Err(SelectionError::NoCandidates);
        }

        let mut criteria = rng.permutation(num_functions);
        if self.max_funs > 0 && self.max_funs < num_functions {
            criteria.truncate(self.max_funs);
        }

        let mut survivors: Vec<usize> = (0..num_candidates).collect();
        let mut depth = 0;
        for &function in &criteria {
            if survivors.len() == 1 {
                break;
            }
            depth += 1;
            let row = table.row(function);
            let best = survivors
                .iter()
                .map(|&k| rank(row[k]))
                .fold(f64::NEG_INFINITY, f64::max);
            survivors.retain(|&k| rank(row[k]) == best);
        }

        let pick = if survivors.len() == 1 {
            survivors[0]
        } else {
            survivors[rng.uniform_index(0, survivors.len())]
        };

        Ok(SelectionEvent {
            winner: table.candidates()[pick],
            criteria,
            depth,
        })
    }

    /// Run `n_selections` independent events.
    pub fn select_events(
        &self,
        table: &FitnessTable,
        n_selections: usize,
        rng: &mut dyn RandomSource,
    ) -> Result<Vec<SelectionEvent>, SelectionError> {
        (0..n_selections).map(|_| self.select_one(table, rng)).collect()
    }

    /// Select `n_selections` parents and queue a copy of each as offspring.
    pub fn select<G: Clone>(
        &self,
        population: &mut Population<G>,
        table: &FitnessTable,
        n_selections: usize,
        rng: &mut dyn RandomSource,
    ) -> Result<Vec<SelectionEvent>, SelectionError> {
        let events = self.select_events(table, n_selections, rng)?;
        for event in &events {
            let genome = population.genome_at(event.winner)?;
            population.do_birth(genome, event.winner)?;
        }
        Ok(events)
    }
}

/// Lexicase run independently inside each cohort.
///
/// Fitness functions are the cohort-local result slots; each cohort refills
/// its own population ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct CohortLexicaseSelector {
    pub max_funs: usize,
}

impl CohortLexicaseSelector {
    pub fn new(max_funs: usize) -> Self {
        Self { max_funs }
    }

    /// Select a full replacement for every cohort member.
    ///
    /// Cohorts run in parallel, each on its own stream forked from `rng` in
    /// cohort order. Returned events are ordered by cohort then member slot.
    pub fn select<G: Clone + Send + Sync>(
        &self,
        population: &mut Population<G>,
        cohorts: &CohortPartitioner,
        objective: Objective,
        rng: &mut CoevoRng,
    ) -> Result<Vec<SelectionEvent>, SelectionError> {
        if cohorts.pop_size() != population.capacity() {
            return Err(SelectionError::CohortMismatch {
                cohorts: cohorts.pop_size(),
                capacity: population.capacity(),
            });
        }

        let lexicase = LexicaseSelector::new(self.max_funs);
        let cohort_size = cohorts.cohort_size();
        let streams = rng.fork_many(cohorts.num_cohorts());

        let per_cohort: Vec<Vec<SelectionEvent>> = {
            let members = &*population;
            streams
                .into_par_iter()
                .enumerate()
                .map(|(c, mut stream)| {
                    let table = FitnessTable::from_results(
                        members,
                        cohorts.cohort(c),
                        cohort_size,
                        objective,
                    )?;
                    lexicase.select_events(&table, cohort_size, &mut stream)
                })
                .collect::<Result<_, _>>()?
        };

        for (c, events) in per_cohort.iter().enumerate() {
            for (member, event) in events.iter().enumerate() {
                let genome = population.genome_at(event.winner)?;
                population.do_birth_at(cohorts.world_id(c, member), genome, event.winner)?;
            }
        }

        log::trace!(
            "cohort lexicase: {} events over {} cohorts",
            per_cohort.iter().map(Vec::len).sum::<usize>(),
            per_cohort.len()
        );
        Ok(per_cohort.into_iter().flatten().collect())
    }
}

/// Tournament selection on aggregate fitness.
#[derive(Debug, Clone, Copy)]
pub struct TournamentSelector {
    pub size: usize,
}

impl TournamentSelector {
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    /// Winner of one tournament drawn with replacement from `candidates`.
    pub fn select_one<G>(
        &self,
        population: &Population<G>,
        candidates: &[usize],
        objective: Objective,
        rng: &mut dyn RandomSource,
    ) -> Result<usize, SelectionError> {
        if candidates.is_empty() {
            return Err(SelectionError::NoCandidates);
        }

        let mut best_id = candidates[0];
        let mut best_fitness = f64::NEG_INFINITY;
        for _ in 0..self.size.max(1) {
            let id = candidates[rng.uniform_index(0, candidates.len())];
            let fitness = rank(objective.aggregate(&population.individual(id)?.phenotype));
            if fitness > best_fitness {
                best_fitness = fitness;
                best_id = id;
            }
        }
        Ok(best_id)
    }

    /// Select `n_selections` parents and queue a copy of each as offspring.
    pub fn select<G: Clone>(
        &self,
        population: &mut Population<G>,
        objective: Objective,
        n_selections: usize,
        rng: &mut dyn RandomSource,
    ) -> Result<Vec<usize>, SelectionError> {
        let candidates = population.occupied_ids();
        let mut winners = Vec::with_capacity(n_selections);
        for _ in 0..n_selections {
            let winner = self.select_one(population, &candidates, objective, rng)?;
            let genome = population.genome_at(winner)?;
            population.do_birth(genome, winner)?;
            winners.push(winner);
        }
        Ok(winners)
    }
}
