//! Collector implementations for gathering ordered candidates into hits.

use std::fmt::Debug;

use ahash::AHashMap;

use crate::candidate::{Candidate, ValueSlot};
use crate::page::Hit;

/// Trait for collecting ordered candidates.
///
/// Candidates must be fed in final display order; collectors never reorder.
pub trait Collector: Debug {
    /// Collect the next candidate.
    fn collect(&mut self, candidate: Candidate);

    /// Get the number of hits that survived collection.
    fn total_hits(&self) -> usize;

    /// Get the number of candidates fed to the collector.
    fn collected(&self) -> u64;
}

/// A collector that keeps the first candidate per value of a collapse slot.
///
/// Later candidates sharing that value are counted against the survivor.
/// Candidates with no value in the slot are never grouped together; an empty
/// stored value counts as no value. Without a slot every candidate survives.
#[derive(Debug)]
pub struct CollapseCollector {
    /// Slot to collapse on.
    slot: Option<ValueSlot>,
    /// Surviving hits, in collection order.
    hits: Vec<Hit>,
    /// Collapse value to index into `hits`.
    groups: AHashMap<Vec<u8>, usize>,
    /// Total number of candidates processed.
    collected: u64,
}

impl CollapseCollector {
    /// Create a collector collapsing on `slot`.
    pub fn new(slot: Option<ValueSlot>) -> Self {
        CollapseCollector {
            slot,
            hits: Vec::new(),
            groups: AHashMap::new(),
            collected: 0,
        }
    }

    /// Create a collector with room for `capacity` hits.
    pub fn with_capacity(slot: Option<ValueSlot>, capacity: usize) -> Self {
        CollapseCollector {
            slot,
            hits: Vec::with_capacity(capacity),
            groups: AHashMap::with_capacity(if slot.is_some() { capacity } else { 0 }),
            collected: 0,
        }
    }

    /// Consume the collector, returning the surviving hits.
    pub fn into_hits(self) -> Vec<Hit> {
        self.hits
    }
}

impl Collector for CollapseCollector {
    fn collect(&mut self, candidate: Candidate) {
        self.collected += 1;

        let key = self
            .slot
            .and_then(|slot| candidate.value(slot))
            .filter(|value| !value.is_empty())
            .map(<[u8]>::to_vec);

        match key {
            Some(key) => {
                if let Some(&index) = self.groups.get(&key) {
                    self.hits[index].collapse_count += 1;
                } else {
                    self.groups.insert(key, self.hits.len());
                    self.hits.push(Hit::new(candidate));
                }
            }
            None => self.hits.push(Hit::new(candidate)),
        }
    }

    fn total_hits(&self) -> usize {
        self.hits.len()
    }

    fn collected(&self) -> u64 {
        self.collected
    }
}
