//! Slot-indexed populations with a synchronous next-generation buffer.

use serde::{Deserialize, Serialize};

/// Per-generation record of evaluation outcomes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Phenotype {
    /// Score against the antagonist in each local slot of the current round.
    pub results: Vec<f64>,
    /// Sum of `results`.
    pub num_passes: f64,
    /// `results.len() - num_passes`.
    pub num_fails: f64,
}

impl Phenotype {
    /// Resize to `size` zeroed slots and clear aggregates.
    pub fn reset(&mut self, size: usize) {
        self.results.clear();
        self.results.resize(size, 0.0);
        self.num_passes = 0.0;
        self.num_fails = 0.0;
    }

    /// Recompute `num_passes` and `num_fails` from `results`.
    pub fn aggregate(&mut self) {
        self.num_passes = self.results.iter().sum();
        self.num_fails = self.results.len() as f64 - self.num_passes;
    }
}

/// A population member.
#[derive(Debug, Clone)]
pub struct Individual<G> {
    /// The genome.
    pub genome: G,
    /// Evaluation outcomes for the current generation.
    pub phenotype: Phenotype,
    /// Population id of the parent, if born from selection.
    pub parent: Option<usize>,
    /// Generation the individual was born in.
    pub generation: usize,
}

impl<G> Individual<G> {
    fn new(genome: G, parent: Option<usize>, generation: usize) -> Self {
        Self {
            genome,
            phenotype: Phenotype::default(),
            parent,
            generation,
        }
    }
}

/// Population errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PopulationError {
    #[error("Population is full (capacity {capacity})")]
    Full { capacity: usize },
    #[error("Slot {id} is outside population capacity {capacity}")]
    OutOfRange { id: usize, capacity: usize },
    #[error("Slot {0} is not occupied")]
    Unoccupied(usize),
}

/// Fixed-capacity population with stable slot ids.
///
/// Births never touch the current generation: offspring collect in a
/// separate buffer and replace their slots on [`Population::advance`], so
/// selection can keep reading phenotypes while it reproduces.
#[derive(Debug, Clone)]
pub struct Population<G> {
    slots: Vec<Option<Individual<G>>>,
    offspring: Vec<Option<Individual<G>>>,
    /// Next offspring slot tried by `do_birth`.
    birth_cursor: usize,
    generation: usize,
}

impl<G> Population<G> {
    /// Create an empty population.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            offspring: (0..capacity).map(|_| None).collect(),
            birth_cursor: 0,
            generation: 0,
        }
    }

    /// Maximum number of individuals.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// True when every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Generations advanced so far.
    #[inline]
    pub fn generation(&self) -> usize {
        self.generation
    }

    #[inline]
    pub fn is_occupied(&self, id: usize) -> bool {
        matches!(self.slots.get(id), Some(Some(_)))
    }

    #[inline]
    pub fn get(&self, id: usize) -> Option<&Individual<G>> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    #[inline]
    pub fn get_mut(&mut self, id: usize) -> Option<&mut Individual<G>> {
        self.slots.get_mut(id).and_then(Option::as_mut)
    }

    /// Individual at `id`, or an error naming the empty slot.
    pub fn individual(&self, id: usize) -> Result<&Individual<G>, PopulationError> {
        self.get(id).ok_or(PopulationError::Unoccupied(id))
    }

    /// Ids of occupied slots in ascending order.
    pub fn occupied_ids(&self) -> Vec<usize> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Iterate over `(id, individual)` for occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Individual<G>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|ind| (id, ind)))
    }

    /// Iterate mutably over `(id, individual)` for occupied slots.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut Individual<G>)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_mut().map(|ind| (id, ind)))
    }

    /// Place a genome in the first empty slot of the current generation.
    pub fn inject(&mut self, genome: G) -> Result<usize, PopulationError> {
        let capacity = self.capacity();
        let id = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(PopulationError::Full { capacity })?;
        self.slots[id] = Some(Individual::new(genome, None, self.generation));
        Ok(id)
    }

    /// Reset every occupied phenotype to `size` result slots.
    pub fn reset_phenotypes(&mut self, size: usize) {
        for (_, individual) in self.iter_mut() {
            individual.phenotype.reset(size);
        }
    }

    /// Queue an offspring in the next free slot of the next generation.
    pub fn do_birth(&mut self, genome: G, parent: usize) -> Result<usize, PopulationError> {
        let capacity = self.capacity();
        while self.birth_cursor < capacity && self.offspring[self.birth_cursor].is_some() {
            self.birth_cursor += 1;
        }
        if self.birth_cursor >= capacity {
            return Err(PopulationError::Full { capacity });
        }

        let id = self.birth_cursor;
        self.offspring[id] = Some(Individual::new(genome, Some(parent), self.generation + 1));
        self.birth_cursor += 1;
        Ok(id)
    }

    /// Queue an offspring to replace slot `id` in the next generation.
    pub fn do_birth_at(&mut self, id: usize, genome: G, parent: usize) -> Result<(), PopulationError> {
        let capacity = self.capacity();
        let slot = self
            .offspring
            .get_mut(id)
            .ok_or(PopulationError::OutOfRange { id, capacity })?;
        *slot = Some(Individual::new(genome, Some(parent), self.generation + 1));
        Ok(())
    }

    /// Number of queued offspring.
    pub fn num_offspring(&self) -> usize {
        self.offspring.iter().filter(|s| s.is_some()).count()
    }

    /// Queued offspring by slot; `None` where no birth is pending.
    pub fn offspring_mut(&mut self) -> &mut [Option<Individual<G>>] {
        &mut self.offspring
    }

    /// Commit queued offspring: each replaces the occupant of its slot.
    /// Slots without a pending birth keep their current occupant.
    ///
    /// Returns the number of replaced slots.
    pub fn advance(&mut self) -> usize {
        let mut replaced = 0;
        for (slot, pending) in self.slots.iter_mut().zip(self.offspring.iter_mut()) {
            if let Some(child) = pending.take() {
                *slot = Some(child);
                replaced += 1;
            }
        }
        self.birth_cursor = 0;
        self.generation += 1;
        replaced
    }
}

impl<G: Clone> Population<G> {
    /// Fill an empty population from genomes, one slot each.
    pub fn from_genomes(capacity: usize, genomes: Vec<G>) -> Result<Self, PopulationError> {
        let mut population = Self::new(capacity);
        for genome in genomes {
            population.inject(genome)?;
        }
        Ok(population)
    }

    /// Clone a member's genome.
    pub fn genome_at(&self, id: usize) -> Result<G, PopulationError> {
        self.individual(id).map(|ind| ind.genome.clone())
    }
}
