//! Configuration types for coevolution runs.

use serde::{Deserialize, Serialize};

/// Top-level configuration for a coevolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoevolutionConfig {
    /// Solution population settings.
    #[serde(default)]
    pub solution_population: PopulationConfig,
    /// Test population settings.
    #[serde(default)]
    pub test_population: PopulationConfig,
    /// How solutions and tests are paired for scoring.
    #[serde(default)]
    pub evaluation: EvaluationMode,
    /// Selection scheme for the solution population.
    #[serde(default)]
    pub solution_selection: SelectionMethod,
    /// Selection scheme for the test population.
    #[serde(default)]
    pub test_selection: SelectionMethod,
    /// Maximum number of generations.
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,
    /// Stop early once the dominant solution reaches this many passes.
    #[serde(default)]
    pub target_passes: Option<f64>,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for CoevolutionConfig {
    fn default() -> Self {
        Self {
            solution_population: PopulationConfig::default(),
            test_population: PopulationConfig::default(),
            evaluation: EvaluationMode::default(),
            solution_selection: SelectionMethod::default(),
            test_selection: SelectionMethod::default(),
            max_generations: default_max_generations(),
            target_passes: None,
            random_seed: None,
        }
    }
}

fn default_max_generations() -> usize {
    10_000
}

/// Population size settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of individuals (population capacity).
    #[serde(default = "default_population_size")]
    pub size: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
        }
    }
}

fn default_population_size() -> usize {
    1024
}

/// Pairing scheme used during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum EvaluationMode {
    /// Every solution is scored against every test.
    Full,
    /// Populations are split into random cohorts each generation and
    /// solutions only face the tests of the matching cohort.
    Cohort {
        #[serde(default = "default_cohort_size")]
        cohort_size: usize,
    },
}

impl Default for EvaluationMode {
    fn default() -> Self {
        Self::Cohort {
            cohort_size: default_cohort_size(),
        }
    }
}

fn default_cohort_size() -> usize {
    32
}

/// Selection scheme for one population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum SelectionMethod {
    /// Lexicase over the whole population, one criterion per antagonist.
    Lexicase {
        /// Maximum criteria per selection event (0 = all).
        #[serde(default)]
        max_funs: usize,
    },
    /// Lexicase run independently inside each cohort.
    CohortLexicase {
        /// Maximum criteria per selection event (0 = all).
        #[serde(default)]
        max_funs: usize,
    },
    /// Tournament on aggregate score.
    Tournament {
        #[serde(default = "default_tournament_size")]
        size: usize,
    },
}

impl Default for SelectionMethod {
    fn default() -> Self {
        Self::CohortLexicase { max_funs: 0 }
    }
}

fn default_tournament_size() -> usize {
    4
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{population} population size must be non-zero")]
    EmptyPopulation { population: &'static str },
    #[error("Cohort size must be non-zero")]
    InvalidCohortSize,
    #[error("{population} population size {size} is not divisible by cohort size {cohort_size}")]
    IndivisiblePopulation {
        population: &'static str,
        size: usize,
        cohort_size: usize,
    },
    #[error("Solution and test cohort counts differ ({solutions} vs {tests})")]
    MismatchedCohortCounts { solutions: usize, tests: usize },
    #[error("Cohort lexicase selection requires cohort evaluation")]
    CohortSelectionWithoutCohorts,
    #[error("Population-wide lexicase cannot rank cohort-local results; use cohort lexicase")]
    LexicaseAcrossCohorts,
    #[error("Tournament size must be non-zero")]
    InvalidTournamentSize,
    #[error("Probability {name} = {value} is outside [0, 1]")]
    InvalidProbability { name: &'static str, value: f64 },
    #[error("Length bounds invalid: min ({min}) > max ({max})")]
    InvalidLengthBounds { min: usize, max: usize },
    #[error("Index domain must be non-zero")]
    EmptyDomain,
    #[error("Value bounds invalid: min ({min}) > max ({max})")]
    InvalidValueBounds { min: i32, max: i32 },
    #[error("Sequence length and sequence count must be non-zero")]
    EmptySequences,
}

impl CoevolutionConfig {
    /// Number of cohorts per population, if running in cohort mode.
    pub fn num_cohorts(&self) -> Option<usize> {
        match self.evaluation {
            EvaluationMode::Cohort { cohort_size } if cohort_size > 0 => {
                Some(self.solution_population.size / cohort_size)
            }
            _ => None,
        }
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.solution_population.size == 0 {
            return Err(ConfigError::EmptyPopulation {
                population: "Solution",
            });
        }
        if self.test_population.size == 0 {
            return Err(ConfigError::EmptyPopulation { population: "Test" });
        }

        if let EvaluationMode::Cohort { cohort_size } = self.evaluation {
            if cohort_size == 0 {
                return Err(ConfigError::InvalidCohortSize);
            }
            for (population, size) in [
                ("Solution", self.solution_population.size),
                ("Test", self.test_population.size),
            ] {
                if size % cohort_size != 0 {
                    return Err(ConfigError::IndivisiblePopulation {
                        population,
                        size,
                        cohort_size,
                    });
                }
            }
            let solutions = self.solution_population.size / cohort_size;
            let tests = self.test_population.size / cohort_size;
            if solutions != tests {
                return Err(ConfigError::MismatchedCohortCounts { solutions, tests });
            }
        }

        for method in [self.solution_selection, self.test_selection] {
            match method {
                SelectionMethod::CohortLexicase { .. }
                    if self.evaluation == EvaluationMode::Full =>
                {
                    return Err(ConfigError::CohortSelectionWithoutCohorts);
                }
                // Result slot k names a different antagonist in every cohort.
                SelectionMethod::Lexicase { .. }
                    if matches!(self.evaluation, EvaluationMode::Cohort { .. }) =>
                {
                    return Err(ConfigError::LexicaseAcrossCohorts);
                }
                SelectionMethod::Tournament { size: 0 } => {
                    return Err(ConfigError::InvalidTournamentSize);
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// Check that a probability lies in `[0, 1]`.
pub(crate) fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { name, value })
    }
}
