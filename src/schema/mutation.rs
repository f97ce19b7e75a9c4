//! Mutation operator settings.

use serde::{Deserialize, Serialize};

use super::config::{ConfigError, check_probability};

/// Settings for the variable-length pair sequence mutator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairSequenceMutatorConfig {
    /// Size of the index domain; gene components lie in `[0, domain_size)`.
    #[serde(default = "default_domain_size")]
    pub domain_size: usize,
    /// Minimum genome length.
    #[serde(default = "default_min_len")]
    pub min_len: usize,
    /// Maximum genome length.
    #[serde(default = "default_max_len")]
    pub max_len: usize,
    /// Per-component index substitution probability.
    #[serde(default = "default_pair_rate")]
    pub index_substitution_rate: f64,
    /// Per-gene duplication probability.
    #[serde(default = "default_pair_rate")]
    pub duplication_rate: f64,
    /// Per-gene random insertion probability.
    #[serde(default = "default_pair_rate")]
    pub insertion_rate: f64,
    /// Per-gene deletion probability.
    #[serde(default = "default_pair_rate")]
    pub deletion_rate: f64,
    /// Per-gene swap probability.
    #[serde(default = "default_pair_rate")]
    pub swap_rate: f64,
}

impl Default for PairSequenceMutatorConfig {
    fn default() -> Self {
        Self {
            domain_size: default_domain_size(),
            min_len: default_min_len(),
            max_len: default_max_len(),
            index_substitution_rate: default_pair_rate(),
            duplication_rate: default_pair_rate(),
            insertion_rate: default_pair_rate(),
            deletion_rate: default_pair_rate(),
            swap_rate: default_pair_rate(),
        }
    }
}

fn default_domain_size() -> usize {
    4
}
fn default_min_len() -> usize {
    1
}
fn default_max_len() -> usize {
    64
}
fn default_pair_rate() -> f64 {
    0.001
}

impl PairSequenceMutatorConfig {
    /// Configuration with every probability set to zero.
    pub fn frozen(domain_size: usize, min_len: usize, max_len: usize) -> Self {
        Self {
            domain_size,
            min_len,
            max_len,
            index_substitution_rate: 0.0,
            duplication_rate: 0.0,
            insertion_rate: 0.0,
            deletion_rate: 0.0,
            swap_rate: 0.0,
        }
    }

    /// Validate bounds and probabilities.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.domain_size == 0 {
            return Err(ConfigError::EmptyDomain);
        }
        if self.min_len > self.max_len {
            return Err(ConfigError::InvalidLengthBounds {
                min: self.min_len,
                max: self.max_len,
            });
        }
        check_probability("index_substitution_rate", self.index_substitution_rate)?;
        check_probability("duplication_rate", self.duplication_rate)?;
        check_probability("insertion_rate", self.insertion_rate)?;
        check_probability("deletion_rate", self.deletion_rate)?;
        check_probability("swap_rate", self.swap_rate)?;
        Ok(())
    }
}

/// Settings for the fixed-length value sequence mutator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueSequenceMutatorConfig {
    /// Treat sites as booleans: substitution flips instead of redrawing.
    #[serde(default = "default_bit_mode")]
    pub bit_mode: bool,
    /// Smallest value a redrawn site may take.
    #[serde(default)]
    pub min_value: i32,
    /// Largest value a redrawn site may take.
    #[serde(default = "default_max_value")]
    pub max_value: i32,
    /// Per-site substitution probability.
    #[serde(default = "default_site_rate")]
    pub site_substitution_rate: f64,
    /// Per-sequence inversion probability.
    #[serde(default = "default_inversion_rate")]
    pub inversion_rate: f64,
    /// Include inversions in the returned mutation count.
    #[serde(default)]
    pub count_inversions: bool,
}

impl Default for ValueSequenceMutatorConfig {
    fn default() -> Self {
        Self {
            bit_mode: default_bit_mode(),
            min_value: 0,
            max_value: default_max_value(),
            site_substitution_rate: default_site_rate(),
            inversion_rate: default_inversion_rate(),
            count_inversions: false,
        }
    }
}

fn default_bit_mode() -> bool {
    true
}
fn default_max_value() -> i32 {
    1
}
fn default_site_rate() -> f64 {
    0.001
}
fn default_inversion_rate() -> f64 {
    0.01
}

impl ValueSequenceMutatorConfig {
    /// Validate bounds and probabilities.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_value > self.max_value {
            return Err(ConfigError::InvalidValueBounds {
                min: self.min_value,
                max: self.max_value,
            });
        }
        check_probability("site_substitution_rate", self.site_substitution_rate)?;
        check_probability("inversion_rate", self.inversion_rate)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        assert!(PairSequenceMutatorConfig::default().validate().is_ok());
        assert!(ValueSequenceMutatorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_bounds() {
        let config = PairSequenceMutatorConfig {
            min_len: 8,
            max_len: 4,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidLengthBounds { min: 8, max: 4 })
        );

        let config = ValueSequenceMutatorConfig {
            min_value: 3,
            max_value: 1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValueBounds { min: 3, max: 1 })
        ));
    }

    #[test]
    fn test_invalid_probability() {
        let config = PairSequenceMutatorConfig {
            swap_rate: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidProbability {
                name: "swap_rate",
                ..
            })
        ));
    }
}
