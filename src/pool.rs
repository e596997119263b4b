//! Exhaustion-safe sampling over a finite set of seed values.

use crate::error::PathGenError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// A reusable, shuffle-on-exhaustion source of candidate values.
///
/// The pool holds a shuffled copy of its seed values and a cursor. Within
/// one pass (from one shuffle to the next) no value is yielded twice; when
/// the cursor reaches the end the pool reshuffles and keeps drawing, so
/// repeats across passes are expected. A single [`take`](CandidatePool::take)
/// call may span a reshuffle boundary.
#[derive(Debug, Clone)]
pub struct CandidatePool<T: Clone> {
    values: Vec<T>,
    cursor: usize,
    rng: StdRng,
}

impl<T: Clone> CandidatePool<T> {
    /// Create a pool from a seed set, shuffled with the given seed.
    ///
    /// Fails with [`PathGenError::InsufficientSeedData`] if the seed set is
    /// empty.
    pub fn new(name: &str, values: Vec<T>, seed: u64) -> Result<Self, PathGenError> {
        Self::with_min_distinct(name, values, 1, seed)
    }

    /// Create a pool that will be asked for at least `min_distinct` values
    /// within a single pass.
    ///
    /// This is the precheck that lets a run fail before any network call
    /// when a seed file is too small for the requested quota.
    pub fn with_min_distinct(
        name: &str,
        mut values: Vec<T>,
        min_distinct: usize,
        seed: u64,
    ) -> Result<Self, PathGenError> {
        if values.is_empty() || values.len() < min_distinct {
            return Err(PathGenError::InsufficientSeedData {
                source_name: name.to_string(),
                available: values.len(),
                needed: min_distinct.max(1),
            });
        }
        let mut rng = StdRng::seed_from_u64(seed);
        values.shuffle(&mut rng);
        Ok(Self {
            values,
            cursor: 0,
            rng,
        })
    }

    /// Number of seed values in the pool.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the pool is empty. Construction forbids this; kept for
    /// API completeness.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Draw the next value, reshuffling first if the current pass is
    /// exhausted.
    pub fn next_value(&mut self) -> T {
        if self.cursor >= self.values.len() {
            self.values.shuffle(&mut self.rng);
            self.cursor = 0;
        }
        let value = self.values[self.cursor].clone();
        self.cursor += 1;
        value
    }

    /// Draw `n` values, spanning reshuffle boundaries as needed.
    pub fn take(&mut self, n: usize) -> Vec<T> {
        (0..n).map(|_| self.next_value()).collect()
    }
}
