//! Configuration for the sorting-network coevolution experiment.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{CoevolutionConfig, ConfigError, PairSequenceMutatorConfig, ValueSequenceMutatorConfig};

/// Sorting networks coevolving against sets of input sequences.
///
/// The network mutator's `domain_size` doubles as the number of inputs a
/// network sorts, so gene indices and test sequence length always agree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortingExperimentConfig {
    /// Population, evaluation and selection settings.
    #[serde(default)]
    pub coevolution: CoevolutionConfig,
    /// Network mutation settings.
    #[serde(default)]
    pub network_mutation: PairSequenceMutatorConfig,
    /// Test mutation settings.
    #[serde(default)]
    pub test_mutation: ValueSequenceMutatorConfig,
    /// Number of input sequences held by each test.
    #[serde(default = "default_sequences_per_test")]
    pub sequences_per_test: usize,
}

impl Default for SortingExperimentConfig {
    fn default() -> Self {
        Self {
            coevolution: CoevolutionConfig::default(),
            network_mutation: PairSequenceMutatorConfig::default(),
            test_mutation: ValueSequenceMutatorConfig::default(),
            sequences_per_test: default_sequences_per_test(),
        }
    }
}

fn default_sequences_per_test() -> usize {
    1
}

/// Errors raised while loading an experiment configuration.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Could not read config: {0}")]
    Io(#[from] io::Error),
    #[error("Could not parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(#[from] ConfigError),
}

impl SortingExperimentConfig {
    /// Number of values each network sorts.
    #[inline]
    pub fn input_size(&self) -> usize {
        self.network_mutation.domain_size
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.coevolution.validate()?;
        self.network_mutation.validate()?;
        self.test_mutation.validate()?;
        if self.sequences_per_test == 0 {
            return Err(ConfigError::EmptySequences);
        }
        Ok(())
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_valid() {
        let config = SortingExperimentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.input_size(), 4);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "coevolution": {{
                    "solution_population": {{"size": 16}},
                    "test_population": {{"size": 16}},
                    "evaluation": {{"mode": "Cohort", "cohort_size": 4}},
                    "max_generations": 5
                }},
                "network_mutation": {{"domain_size": 6, "max_len": 20}},
                "sequences_per_test": 3
            }}"#
        )
        .unwrap();

        let config = SortingExperimentConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.input_size(), 6);
        assert_eq!(config.sequences_per_test, 3);
        assert_eq!(config.coevolution.num_cohorts(), Some(4));
        assert_eq!(config.network_mutation.min_len, 1);
    }

    #[test]
    fn test_load_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"coevolution": {{"solution_population": {{"size": 10}},
                "test_population": {{"size": 10}},
                "evaluation": {{"mode": "Cohort", "cohort_size": 3}}}}}}"#
        )
        .unwrap();

        let err = SortingExperimentConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Invalid(ConfigError::IndivisiblePopulation { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = SortingExperimentConfig::from_json_file("/nonexistent/config.json").unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }
}
