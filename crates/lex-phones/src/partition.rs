//! Deduplication, sampling and train/validation/test partitioning.
//!
//! Partitioning uses two sequential random binary splits driven by the same
//! generator: the first holds out `1 - train` of the rows, the second divides
//! the held-out pool between validation and test. Callers own the generator,
//! so a run is reproducible when it is seeded once up front.
//!
//! Split sizes for `n` rows:
//!
//! - `train = floor(n * train_ratio)`
//! - `pool = n - train`
//! - `test = ceil(pool * test_ratio / (validation_ratio + test_ratio))`
//! - `validation = pool - test`

use crate::config::SplitRatios;
use crate::error::{PhonesError, Result};
use crate::types::{Record, RecordSet, SplitKind};
use rand::Rng;
use rand::seq::{SliceRandom, index};
use std::collections::HashSet;
use tracing::debug;

/// Tolerance so that products such as `10 * 0.8` are not pushed across an
/// integer boundary by float error.
const ROUNDING_EPSILON: f64 = 1e-9;

/// Number of rows in each split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitSizes {
    pub train: usize,
    pub validation: usize,
    pub test: usize,
}

impl SplitSizes {
    pub fn for_len(n: usize, ratios: &SplitRatios) -> Self {
        let train = (((n as f64) * ratios.train + ROUNDING_EPSILON).floor() as usize).min(n);
        let pool = n - train;
        let test = (((pool as f64) * ratios.test_share_of_holdout() - ROUNDING_EPSILON).ceil()
            as usize)
            .min(pool);
        Self {
            train,
            validation: pool - test,
            test,
        }
    }

    pub fn total(&self) -> usize {
        self.train + self.validation + self.test
    }
}

/// Row indices assigned to each split, in shuffled order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitAssignment {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
    pub test: Vec<usize>,
}

impl SplitAssignment {
    /// Shuffle `0..n` and carve out the three splits.
    pub fn assign<R: Rng + ?Sized>(n: usize, ratios: &SplitRatios, rng: &mut R) -> Self {
        let sizes = SplitSizes::for_len(n, ratios);

        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(rng);
        let mut holdout = indices.split_off(sizes.train);

        holdout.shuffle(rng);
        let test = holdout.split_off(sizes.validation);

        Self {
            train: indices,
            validation: holdout,
            test,
        }
    }

    pub fn sizes(&self) -> SplitSizes {
        SplitSizes {
            train: self.train.len(),
            validation: self.validation.len(),
            test: self.test.len(),
        }
    }
}

/// Materialized train/validation/test record sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub train: RecordSet,
    pub validation: RecordSet,
    pub test: RecordSet,
}

impl Partition {
    /// Move records into the splits described by `assignment`.
    ///
    /// `assignment` must cover every index of `records` exactly once.
    pub(crate) fn from_assignment(records: RecordSet, assignment: &SplitAssignment) -> Self {
        let mut slots: Vec<Option<Record>> = records.into_iter().map(Some).collect();
        let mut take = |indices: &[usize]| -> RecordSet {
            indices
                .iter()
                .filter_map(|&i| slots.get_mut(i).and_then(Option::take))
                .collect()
        };

        Self {
            train: take(&assignment.train),
            validation: take(&assignment.validation),
            test: take(&assignment.test),
        }
    }

    pub fn get(&self, kind: SplitKind) -> &RecordSet {
        match kind {
            SplitKind::Train => &self.train,
            SplitKind::Val => &self.validation,
            SplitKind::Test => &self.test,
        }
    }

    pub fn get_mut(&mut self, kind: SplitKind) -> &mut RecordSet {
        match kind {
            SplitKind::Train => &mut self.train,
            SplitKind::Val => &mut self.validation,
            SplitKind::Test => &mut self.test,
        }
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split `records` into train, validation and test.
pub fn partition<R: Rng + ?Sized>(
    records: RecordSet,
    ratios: &SplitRatios,
    rng: &mut R,
) -> Partition {
    let assignment = SplitAssignment::assign(records.len(), ratios, rng);
    let sizes = assignment.sizes();
    debug!(
        "Partitioned {} records: train={}, val={}, test={}",
        records.len(),
        sizes.train,
        sizes.validation,
        sizes.test
    );
    Partition::from_assignment(records, &assignment)
}

/// Keep the first record for each source, preserving input order.
pub fn dedupe_by_source(records: RecordSet) -> RecordSet {
    let before = records.len();
    let mut seen = HashSet::with_capacity(records.len());
    let deduped: RecordSet = records
        .into_iter()
        .filter(|record| seen.insert(record.source.clone()))
        .collect();

    debug!("Removed {} duplicate sources", before - deduped.len());
    deduped
}

/// Draw exactly `n` records uniformly without replacement.
pub fn sample<R: Rng + ?Sized>(records: RecordSet, n: usize, rng: &mut R) -> Result<RecordSet> {
    if n > records.len() {
        return Err(PhonesError::InsufficientRecords {
            requested: n,
            available: records.len(),
        });
    }

    let chosen = index::sample(rng, records.len(), n);
    let mut slots: Vec<Option<Record>> = records.into_iter().map(Some).collect();
    Ok(chosen.into_iter().filter_map(|i| slots[i].take()).collect())
}
