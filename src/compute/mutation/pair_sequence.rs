//! Mutation and crossover for variable-length pair sequences.

use crate::schema::{ConfigError, Gene, PairSequenceGenome, PairSequenceMutatorConfig};

use super::Mutator;
use crate::compute::random::RandomSource;

/// Per-gene deletion, insertion, duplication, index substitution and swaps.
///
/// Length stays within `[min_len, max_len]` and every component within
/// `[0, domain_size)`, given an input genome that already satisfies both.
#[derive(Debug, Clone)]
pub struct PairSequenceMutator {
    config: PairSequenceMutatorConfig,
}

impl PairSequenceMutator {
    /// Create a mutator, rejecting empty domains, inverted length bounds
    /// and rates outside `[0, 1]`.
    pub fn new(config: PairSequenceMutatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PairSequenceMutatorConfig {
        &self.config
    }

    #[inline]
    fn random_index(&self, rng: &mut dyn RandomSource) -> usize {
        rng.uniform_index(0, self.config.domain_size)
    }

    fn random_gene(&self, rng: &mut dyn RandomSource) -> Gene {
        [self.random_index(rng), self.random_index(rng)]
    }

    /// One-point crossover: children swap tails after a cut below the
    /// shorter parent's length.
    ///
    /// Each child keeps the length of the parent whose tail it receives, so
    /// length bounds carry over from the parents. Parents shorter than two
    /// genes are left unchanged.
    pub fn crossover_one_point(
        &self,
        rng: &mut dyn RandomSource,
        a: &mut PairSequenceGenome,
        b: &mut PairSequenceGenome,
    ) {
        let shorter = a.len().min(b.len());
        if shorter < 2 {
            return;
        }
        let cut = rng.uniform_index(0, shorter);
        let tail_a = a.genes.split_off(cut);
        let tail_b = b.genes.split_off(cut);
        a.genes.extend(tail_b);
        b.genes.extend(tail_a);
    }

    /// Two-point crossover producing `ABA` and `BAB` children.
    ///
    /// Cut points are drawn as fractions of each parent's length, so segments
    /// may differ in size. A child replaces its parent only when its length
    /// is within bounds.
    pub fn crossover_two_point(
        &self,
        rng: &mut dyn RandomSource,
        a: &mut PairSequenceGenome,
        b: &mut PairSequenceGenome,
    ) {
        let mut pct1 = rng.uniform_real(0.0, 1.0);
        let mut pct2 = rng.uniform_real(0.0, 1.0);
        if pct2 < pct1 {
            std::mem::swap(&mut pct1, &mut pct2);
        }

        let cut = |len: usize, pct: f64| ((len as f64 * pct) as usize).min(len);
        let (a1, a2) = (cut(a.len(), pct1), cut(a.len(), pct2));
        let (b1, b2) = (cut(b.len(), pct1), cut(b.len(), pct2));

        let aba_len = a1 + (b2 - b1) + (a.len() - a2);
        let bab_len = b1 + (a2 - a1) + (b.len() - b2);
        let bounds = self.config.min_len..=self.config.max_len;

        let aba = bounds.contains(&aba_len).then(|| {
            let mut genes = Vec::with_capacity(aba_len);
            genes.extend_from_slice(&a.genes[..a1]);
            genes.extend_from_slice(&b.genes[b1..b2]);
            genes.extend_from_slice(&a.genes[a2..]);
            genes
        });
        let bab = bounds.contains(&bab_len).then(|| {
            let mut genes = Vec::with_capacity(bab_len);
            genes.extend_from_slice(&b.genes[..b1]);
            genes.extend_from_slice(&a.genes[a1..a2]);
            genes.extend_from_slice(&b.genes[b2..]);
            genes
        });

        if let Some(genes) = aba {
            a.genes = genes;
        }
        if let Some(genes) = bab {
            b.genes = genes;
        }
    }
}

impl Mutator<PairSequenceGenome> for PairSequenceMutator {
    fn mutate(&self, rng: &mut dyn RandomSource, genome: &mut PairSequenceGenome) -> usize {
        let c = &self.config;
        let mut genes: Vec<Gene> = Vec::with_capacity(genome.len() + 4);
        let mut expected_size = genome.len();
        let mut count = 0;

        for &gene in &genome.genes {
            if rng.bernoulli(c.deletion_rate) && expected_size > c.min_len {
                expected_size -= 1;
                count += 1;
                continue;
            }

            let copy = genes.len();
            genes.push(gene);

            if rng.bernoulli(c.insertion_rate) && expected_size < c.max_len {
                genes.push(self.random_gene(rng));
                expected_size += 1;
                count += 1;
            }

            if rng.bernoulli(c.duplication_rate) && expected_size < c.max_len {
                genes.push(gene);
                expected_size += 1;
                count += 1;
            }

            // Substitution touches the copied gene only, never the inserted
            // or duplicated ones.
            for component in 0..2 {
                if rng.bernoulli(c.index_substitution_rate) {
                    genes[copy][component] = self.random_index(rng);
                    count += 1;
                }
            }
        }

        if c.swap_rate > 0.0 {
            let len = genes.len();
            for g in 0..len {
                if rng.bernoulli(c.swap_rate) {
                    let pos = rng.uniform_index(0, len);
                    if pos != g {
                        genes.swap(g, pos);
                        count += 1;
                    }
                }
            }
        }

        debug_assert_eq!(genes.len(), expected_size);
        genome.genes = genes;
        debug_assert!(
            genome.is_valid(c.domain_size, c.min_len, c.max_len),
            "mutated genome left bounds: len {}",
            genome.len()
        );
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::random::CoevoRng;
    use proptest::prelude::*;

    fn network(len: usize, domain: usize) -> PairSequenceGenome {
        (0..len)
            .map(|i| [i % domain, (i + 1) % domain])
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_zero_rates_leave_genome_unchanged() {
        let mutator =
            PairSequenceMutator::new(PairSequenceMutatorConfig::frozen(4, 1, 64)).unwrap();
        let mut rng = CoevoRng::new(0);
        let original = network(10, 4);
        let mut genome = original.clone();
        for _ in 0..100 {
            assert_eq!(mutator.mutate(&mut rng, &mut genome), 0);
        }
        assert_eq!(genome, original);
    }

    #[test]
    fn test_full_substitution_counts_every_component() {
        let config = PairSequenceMutatorConfig {
            index_substitution_rate: 1.0,
            ..PairSequenceMutatorConfig::frozen(4, 1, 64)
        };
        let mutator = PairSequenceMutator::new(config).unwrap();
        let mut rng = CoevoRng::new(3);
        let mut genome = network(12, 4);
        assert_eq!(mutator.mutate(&mut rng, &mut genome), 24);
        assert_eq!(genome.len(), 12);
        assert!(genome.is_valid(4, 1, 64));
    }

    #[test]
    fn test_deletion_stops_at_min_len() {
        let config = PairSequenceMutatorConfig {
            deletion_rate: 1.0,
            ..PairSequenceMutatorConfig::frozen(4, 3, 64)
        };
        let mutator = PairSequenceMutator::new(config).unwrap();
        let mut genome = network(10, 4);
        let count = mutator.mutate(&mut CoevoRng::new(1), &mut genome);
        assert_eq!(genome.len(), 3);
        assert_eq!(count, 7);
        // The last three genes survive, in order.
        assert_eq!(genome.genes, network(10, 4).genes[7..].to_vec());
    }

    #[test]
    fn test_growth_stops_at_max_len() {
        let config = PairSequenceMutatorConfig {
            insertion_rate: 1.0,
            duplication_rate: 1.0,
            ..PairSequenceMutatorConfig::frozen(4, 1, 8)
        };
        let mutator = PairSequenceMutator::new(config).unwrap();
        let mut genome = network(5, 4);
        let count = mutator.mutate(&mut CoevoRng::new(1), &mut genome);
        assert_eq!(genome.len(), 8);
        assert_eq!(count, 3);
    }

    #[test]
    fn test_insertion_alone_grows_one_per_gene() {
        let config = PairSequenceMutatorConfig {
            insertion_rate: 1.0,
            ..PairSequenceMutatorConfig::frozen(4, 1, 64)
        };
        let mutator = PairSequenceMutator::new(config).unwrap();
        let original = network(6, 4);
        let mut genome = original.clone();
        assert_eq!(mutator.mutate(&mut CoevoRng::new(2), &mut genome), 6);
        assert_eq!(genome.len(), 12);
        assert!(genome.is_valid(4, 1, 64));
        // Originals keep their even positions; inserts follow each one.
        let kept: Vec<Gene> = genome.genes.iter().step_by(2).copied().collect();
        assert_eq!(kept, original.genes);
    }

    #[test]
    fn test_insertion_alone_at_max_len_is_noop() {
        let config = PairSequenceMutatorConfig {
            insertion_rate: 1.0,
            ..PairSequenceMutatorConfig::frozen(4, 1, 8)
        };
        let mutator = PairSequenceMutator::new(config).unwrap();
        let original = network(8, 4);
        let mut genome = original.clone();
        assert_eq!(mutator.mutate(&mut CoevoRng::new(2), &mut genome), 0);
        assert_eq!(genome, original);
    }

    #[test]
    fn test_insertion_alone_fills_to_max_len() {
        let config = PairSequenceMutatorConfig {
            insertion_rate: 1.0,
            ..PairSequenceMutatorConfig::frozen(4, 1, 8)
        };
        let mutator = PairSequenceMutator::new(config).unwrap();
        let mut genome = network(5, 4);
        assert_eq!(mutator.mutate(&mut CoevoRng::new(2), &mut genome), 3);
        assert_eq!(genome.len(), 8);
        assert!(genome.is_valid(4, 1, 8));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(matches!(
            PairSequenceMutator::new(PairSequenceMutatorConfig::frozen(4, 5, 2)),
            Err(ConfigError::InvalidLengthBounds { min: 5, max: 2 })
        ));

        let empty_domain = PairSequenceMutatorConfig {
            insertion_rate: 1.0,
            ..PairSequenceMutatorConfig::frozen(0, 0, 8)
        };
        assert!(matches!(
            PairSequenceMutator::new(empty_domain),
            Err(ConfigError::EmptyDomain)
        ));

        let bad_rate = PairSequenceMutatorConfig {
            deletion_rate: -0.5,
            ..PairSequenceMutatorConfig::frozen(4, 1, 8)
        };
        assert!(matches!(
            PairSequenceMutator::new(bad_rate),
            Err(ConfigError::InvalidProbability {
                name: "deletion_rate",
                ..
            })
        ));
    }

    #[test]
    fn test_duplication_copies_original_gene() {
        let config = PairSequenceMutatorConfig {
            duplication_rate: 1.0,
            ..PairSequenceMutatorConfig::frozen(4, 1, 64)
        };
        let mutator = PairSequenceMutator::new(config).unwrap();
        let mut genome = PairSequenceGenome::new(vec![[0, 1], [2, 3]]);
        assert_eq!(mutator.mutate(&mut CoevoRng::new(1), &mut genome), 2);
        assert_eq!(genome.genes, vec![[0, 1], [0, 1], [2, 3], [2, 3]]);
    }

    #[test]
    fn test_swap_with_self_not_counted() {
        let config = PairSequenceMutatorConfig {
            swap_rate: 1.0,
            ..PairSequenceMutatorConfig::frozen(4, 1, 64)
        };
        let mutator = PairSequenceMutator::new(config).unwrap();
        let mut genome = PairSequenceGenome::new(vec![[1, 2]]);
        assert_eq!(mutator.mutate(&mut CoevoRng::new(1), &mut genome), 0);
        assert_eq!(genome.genes, vec![[1, 2]]);
    }

    #[test]
    fn test_swaps_permute_genes() {
        let config = PairSequenceMutatorConfig {
            swap_rate: 1.0,
            ..PairSequenceMutatorConfig::frozen(16, 1, 64)
        };
        let mutator = PairSequenceMutator::new(config).unwrap();
        let original = network(16, 16);
        let mut genome = original.clone();
        mutator.mutate(&mut CoevoRng::new(8), &mut genome);

        let mut before = original.genes.clone();
        let mut after = genome.genes.clone();
        before.sort_unstable();
        after.sort_unstable();
        assert_eq!(before, after);
    }

    #[test]
    fn test_crossover_one_point_keeps_lengths() {
        let mutator =
            PairSequenceMutator::new(PairSequenceMutatorConfig::frozen(4, 1, 64)).unwrap();
        let mut rng = CoevoRng::new(5);
        for _ in 0..50 {
            let mut a = PairSequenceGenome::new(vec![[0, 0]; 6]);
            let mut b = PairSequenceGenome::new(vec![[1, 1]; 9]);
            mutator.crossover_one_point(&mut rng, &mut a, &mut b);
            assert_eq!(a.len(), 9);
            assert_eq!(b.len(), 6);
            // Heads keep their parent, tails come from the other one.
            assert_eq!(a.genes.last(), Some(&[1, 1]));
            assert_eq!(b.genes.last(), Some(&[0, 0]));
        }
    }

    #[test]
    fn test_crossover_two_point_respects_bounds() {
        let mutator =
            PairSequenceMutator::new(PairSequenceMutatorConfig::frozen(4, 4, 10)).unwrap();
        let mut rng = CoevoRng::new(13);
        for _ in 0..200 {
            let mut a = PairSequenceGenome::new(vec![[0, 1]; 4]);
            let mut b = PairSequenceGenome::new(vec![[2, 3]; 10]);
            mutator.crossover_two_point(&mut rng, &mut a, &mut b);
            assert!(a.is_valid(4, 4, 10));
            assert!(b.is_valid(4, 4, 10));
            // Total material is conserved when both children are built.
            if a.genes.contains(&[2, 3]) && b.genes.contains(&[0, 1]) {
                assert_eq!(a.len() + b.len(), 14);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_mutation_preserves_bounds(
            seed in any::<u64>(),
            domain in 1usize..8,
            min_len in 0usize..6,
            extra in 0usize..20,
            start in 0usize..30,
            rates in prop::array::uniform5(0.0f64..=1.0),
        ) {
            let max_len = min_len + extra;
            let len = min_len + start % (extra + 1);
            let config = PairSequenceMutatorConfig {
                domain_size: domain,
                min_len,
                max_len,
                index_substitution_rate: rates[0],
                duplication_rate: rates[1],
                insertion_rate: rates[2],
                deletion_rate: rates[3],
                swap_rate: rates[4],
            };
            let mutator = PairSequenceMutator::new(config).unwrap();
            let mut rng = CoevoRng::new(seed);
            let mut genome = network(len, domain);
            for _ in 0..5 {
                mutator.mutate(&mut rng, &mut genome);
                prop_assert!(genome.is_valid(domain, min_len, max_len));
            }
        }
    }
}
