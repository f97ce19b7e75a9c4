//! Random cohort partitioning of a population's index space.

use std::fmt;

use super::random::RandomSource;

/// Cohort setup errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CohortError {
    #[error("Cohort size must be non-zero")]
    ZeroCohortSize,
    #[error("Population size {pop_size} is not divisible by cohort size {cohort_size}")]
    Indivisible { pop_size: usize, cohort_size: usize },
    #[error("Cohort counts differ between populations ({solutions} vs {tests})")]
    MismatchedCounts { solutions: usize, tests: usize },
}

/// Splits `0..pop_size` into equal-size disjoint cohorts.
///
/// Assignment is stored as one shuffled id list; cohort `c` is the contiguous
/// slice `[c * cohort_size, (c + 1) * cohort_size)` of it.
#[derive(Debug, Clone)]
pub struct CohortPartitioner {
    /// Shuffled population ids.
    ids: Vec<usize>,
    /// Reverse lookup: position of each id in `ids`.
    positions: Vec<usize>,
    cohort_size: usize,
    num_cohorts: usize,
}

impl CohortPartitioner {
    /// Build the identity partition.
    pub fn setup(pop_size: usize, cohort_size: usize) -> Result<Self, CohortError> {
        if cohort_size == 0 {
            return Err(CohortError::ZeroCohortSize);
        }
        if pop_size % cohort_size != 0 {
            return Err(CohortError::Indivisible {
                pop_size,
                cohort_size,
            });
        }

        let ids: Vec<usize> = (0..pop_size).collect();
        Ok(Self {
            positions: ids.clone(),
            ids,
            cohort_size,
            num_cohorts: pop_size / cohort_size,
        })
    }

    /// Reassign every id to a fresh uniformly random cohort slot.
    pub fn randomize(&mut self, rng: &mut dyn RandomSource) {
        rng.shuffle_ids(&mut self.ids);
        for (position, &id) in self.ids.iter().enumerate() {
            self.positions[id] = position;
        }
        log::trace!("cohorts randomized:\n{self}");
    }

    /// Number of cohorts.
    #[inline]
    pub fn num_cohorts(&self) -> usize {
        self.num_cohorts
    }

    /// Members per cohort.
    #[inline]
    pub fn cohort_size(&self) -> usize {
        self.cohort_size
    }

    /// Population size covered by the partition.
    #[inline]
    pub fn pop_size(&self) -> usize {
        self.ids.len()
    }

    /// Population ids of one cohort, ordered by member slot.
    pub fn cohort(&self, cohort: usize) -> &[usize] {
        debug_assert!(cohort < self.num_cohorts);
        let start = cohort * self.cohort_size;
        &self.ids[start..start + self.cohort_size]
    }

    /// Iterate over all cohorts in order.
    pub fn cohorts(&self) -> impl Iterator<Item = &[usize]> {
        self.ids.chunks_exact(self.cohort_size)
    }

    /// Population id at a cohort member slot.
    #[inline]
    pub fn world_id(&self, cohort: usize, member: usize) -> usize {
        debug_assert!(cohort < self.num_cohorts && member < self.cohort_size);
        self.ids[cohort * self.cohort_size + member]
    }

    /// `(cohort, member)` slot currently holding a population id.
    #[inline]
    pub fn cohort_of(&self, world_id: usize) -> (usize, usize) {
        let position = self.positions[world_id];
        (position / self.cohort_size, position % self.cohort_size)
    }

    /// Check that two partitions can be paired cohort-for-cohort.
    pub fn check_paired(&self, other: &CohortPartitioner) -> Result<(), CohortError> {
        if self.num_cohorts != other.num_cohorts {
            return Err(CohortError::MismatchedCounts {
                solutions: self.num_cohorts,
                tests: other.num_cohorts,
            });
        }
        Ok(())
    }
}

impl fmt::Display for CohortPartitioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (c, members) in self.cohorts().enumerate() {
            if c > 0 {
                writeln!(f)?;
            }
            write!(f, "Cohort[{c}]: {members:?}")?;
        }
        Ok(())
    }
}
