//! Result aggregation
//!
//! Collects what happened to each index as the engine works through its
//! passes and finalises it into one outcome per index, in batch order.

use crate::cache::Record;
use crate::state::{Batch, Disposition, ItemIndex};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Final result for one batch index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub index: ItemIndex,
    pub disposition: Disposition,

    /// The resolved record, present only for cache hits and fetches
    pub record: Option<Record>,
}

/// Number of outcomes in each disposition bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispositionCounts {
    pub cache_hit: usize,
    pub fetched: usize,
    pub not_found: usize,
    pub unresolved: usize,
    pub not_attempted: usize,
}

impl DispositionCounts {
    /// Tallies a set of outcomes
    pub fn from_outcomes(outcomes: &[Outcome]) -> Self {
        let mut counts = Self::default();
        for outcome in outcomes {
            counts.add(outcome.disposition);
        }
        counts
    }

    pub fn add(&mut self, disposition: Disposition) {
        match disposition {
            Disposition::CacheHit => self.cache_hit += 1,
            Disposition::Fetched => self.fetched += 1,
            Disposition::NotFound => self.not_found += 1,
            Disposition::Unresolved => self.unresolved += 1,
            Disposition::NotAttempted => self.not_attempted += 1,
        }
    }

    pub fn get(&self, disposition: Disposition) -> usize {
        match disposition {
            Disposition::CacheHit => self.cache_hit,
            Disposition::Fetched => self.fetched,
            Disposition::NotFound => self.not_found,
            Disposition::Unresolved => self.unresolved,
            Disposition::NotAttempted => self.not_attempted,
        }
    }

    pub fn total(&self) -> usize {
        Disposition::all().iter().map(|d| self.get(*d)).sum()
    }

    /// Items that produced a record
    pub fn resolved(&self) -> usize {
        self.cache_hit + self.fetched
    }

    /// Items that could still succeed on a later run; NotFound is excluded
    pub fn pending(&self) -> usize {
        self.unresolved + self.not_attempted
    }
}

/// Accumulates per-index results during a resolve
///
/// Indices that were never settled are classified on `finish`: those the
/// adapter was invoked for at least once become Unresolved, the rest
/// NotAttempted.
#[derive(Debug)]
pub struct Aggregator {
    order: Vec<ItemIndex>,
    settled: HashMap<ItemIndex, (Disposition, Option<Record>)>,
    attempted: HashSet<ItemIndex>,
}

impl Aggregator {
    /// Creates an aggregator covering every index of the batch
    pub fn new(batch: &Batch) -> Self {
        Self {
            order: batch.indices().cloned().collect(),
            settled: HashMap::with_capacity(batch.len()),
            attempted: HashSet::new(),
        }
    }

    pub fn record_cache_hit(&mut self, index: &ItemIndex, record: Record) {
        self.settle(index, Disposition::CacheHit, Some(record));
    }

    pub fn record_fetched(&mut self, index: &ItemIndex, record: Record) {
        self.attempted.insert(index.clone());
        self.settle(index, Disposition::Fetched, Some(record));
    }

    pub fn record_not_found(&mut self, index: &ItemIndex) {
        self.attempted.insert(index.clone());
        self.settle(index, Disposition::NotFound, None);
    }

    /// Notes a failed attempt that leaves the index open for another pass
    pub fn record_attempt(&mut self, index: &ItemIndex) {
        self.attempted.insert(index.clone());
    }

    pub fn is_settled(&self, index: &ItemIndex) -> bool {
        self.settled.contains_key(index)
    }

    /// Number of indices with a terminal disposition so far
    pub fn settled_count(&self) -> usize {
        self.settled.len()
    }

    /// Produces exactly one outcome per batch index, in batch order
    pub fn finish(mut self) -> Vec<Outcome> {
        let attempted = &self.attempted;
        let settled = &mut self.settled;

        self.order
            .iter()
            .map(|index| {
                let (disposition, record) = settled.remove(index).unwrap_or_else(|| {
                    if attempted.contains(index) {
                        (Disposition::Unresolved, None)
                    } else {
                        (Disposition::NotAttempted, None)
                    }
                });

                Outcome {
                    index: index.clone(),
                    disposition,
                    record,
                }
            })
            .collect()
    }

    fn settle(&mut self, index: &ItemIndex, disposition: Disposition, record: Option<Record>) {
        if self.settled.insert(index.clone(), (disposition, record)).is_some() {
            tracing::warn!("Index {} settled more than once", index);
        }
    }
}
