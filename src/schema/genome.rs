//! Genome representations shared by both coevolving populations.

use serde::{Deserialize, Serialize};

/// A single gene: a pair of indices into a fixed domain `[0, N)`.
///
/// For sorting networks this is a compare-exchange gate `(i, j)`.
pub type Gene = [usize; 2];

/// Variable-length sequence of index pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PairSequenceGenome {
    /// Ordered genes.
    pub genes: Vec<Gene>,
}

impl PairSequenceGenome {
    /// Create from a list of genes.
    pub fn new(genes: Vec<Gene>) -> Self {
        Self { genes }
    }

    /// Number of genes.
    #[inline]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// True if the genome has no genes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Check length bounds and that every component lies in `[0, domain)`.
    pub fn is_valid(&self, domain: usize, min_len: usize, max_len: usize) -> bool {
        (min_len..=max_len).contains(&self.genes.len())
            && self.genes.iter().all(|g| g[0] < domain && g[1] < domain)
    }
}

impl From<Vec<Gene>> for PairSequenceGenome {
    fn from(genes: Vec<Gene>) -> Self {
        Self { genes }
    }
}

/// One or more equal-length sequences of bounded integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ValueSequenceGenome {
    /// The sequences. All share the same length.
    pub sequences: Vec<Vec<i32>>,
}

impl ValueSequenceGenome {
    /// Create from a set of sequences.
    pub fn new(sequences: Vec<Vec<i32>>) -> Self {
        debug_assert!(
            sequences.windows(2).all(|w| w[0].len() == w[1].len()),
            "value sequences must share one length"
        );
        Self { sequences }
    }

    /// Create `count` sequences of `length` zeros.
    pub fn zeros(length: usize, count: usize) -> Self {
        Self {
            sequences: vec![vec![0; length]; count],
        }
    }

    /// Number of sequences.
    #[inline]
    pub fn num_sequences(&self) -> usize {
        self.sequences.len()
    }

    /// Length shared by every sequence (0 when there are none).
    #[inline]
    pub fn sequence_len(&self) -> usize {
        self.sequences.first().map_or(0, Vec::len)
    }

    /// Check that every site lies in `[min_value, max_value]`.
    pub fn is_within(&self, min_value: i32, max_value: i32) -> bool {
        self.sequences
            .iter()
            .flatten()
            .all(|v| (min_value..=max_value).contains(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_genome_validity() {
        let genome = PairSequenceGenome::new(vec![[0, 1], [2, 3]]);
        assert!(genome.is_valid(4, 1, 4));
        assert!(!genome.is_valid(3, 1, 4));
        assert!(!genome.is_valid(4, 3, 4));
        assert!(!PairSequenceGenome::default().is_valid(4, 1, 4));
    }

    #[test]
    fn test_value_genome_shape() {
        let genome = ValueSequenceGenome::zeros(5, 3);
        assert_eq!(genome.num_sequences(), 3);
        assert_eq!(genome.sequence_len(), 5);
        assert!(genome.is_within(0, 1));
        assert_eq!(ValueSequenceGenome::default().sequence_len(), 0);
    }
}
