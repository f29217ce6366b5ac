//! Candidates produced by the retrieval engine and the collaborators that
//! deliver them.
//!
//! The engine itself is out of reach of this crate; it is modelled by two
//! narrow traits. A [`CandidateSource`] yields candidates in descending
//! relevance order, and a [`ValueAccessor`] maps `(doc_id, slot)` to the raw
//! stored value bytes used for sorting and collapsing.

use std::collections::{BTreeMap, VecDeque};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Document identifier, unique within one collection.
pub type DocId = u64;

/// Number of a per-document stored value slot.
pub type ValueSlot = u32;

/// One retrieved item prior to display formatting.
///
/// Candidates are never mutated by the selector: it only reorders, groups
/// or drops them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// The document ID.
    pub doc_id: DocId,
    /// The relevance score (higher is more relevant).
    pub score: f64,
    /// Stored value fields keyed by slot number.
    #[serde(default)]
    pub values: BTreeMap<ValueSlot, Vec<u8>>,
}

impl Candidate {
    /// Create a candidate without any stored values.
    pub fn new(doc_id: DocId, score: f64) -> Self {
        Candidate {
            doc_id,
            score,
            values: BTreeMap::new(),
        }
    }

    /// Attach a stored value to a slot.
    pub fn with_value<V: Into<Vec<u8>>>(mut self, slot: ValueSlot, value: V) -> Self {
        self.values.insert(slot, value.into());
        self
    }

    /// Get the stored value for a slot.
    pub fn value(&self, slot: ValueSlot) -> Option<&[u8]> {
        self.values.get(&slot).map(Vec::as_slice)
    }

    /// Get the stored value for a slot, treating a missing value as empty.
    pub fn sort_value(&self, slot: ValueSlot) -> &[u8] {
        self.value(slot).unwrap_or(&[])
    }

    /// Check if the candidate has a value in a slot.
    pub fn has_value(&self, slot: ValueSlot) -> bool {
        self.values.contains_key(&slot)
    }
}

/// A stream of candidates in descending relevance order.
pub trait CandidateSource {
    /// Pull the next candidate, or `None` once the stream is exhausted.
    fn next_candidate(&mut self) -> Option<Candidate>;

    /// Check if at least one more candidate can be pulled.
    fn has_more(&self) -> bool;

    /// Hint for the number of remaining candidates.
    fn size_hint(&self) -> usize {
        0
    }
}

/// A materialised candidate stream.
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    candidates: VecDeque<Candidate>,
}

impl VecSource {
    /// Create a source over already-retrieved candidates.
    pub fn new(candidates: Vec<Candidate>) -> Self {
        VecSource {
            candidates: candidates.into(),
        }
    }

    /// Get the number of candidates left in the stream.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Check if the stream is exhausted.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl From<Vec<Candidate>> for VecSource {
    fn from(candidates: Vec<Candidate>) -> Self {
        VecSource::new(candidates)
    }
}

impl CandidateSource for VecSource {
    fn next_candidate(&mut self) -> Option<Candidate> {
        self.candidates.pop_front()
    }

    fn has_more(&self) -> bool {
        !self.candidates.is_empty()
    }

    fn size_hint(&self) -> usize {
        self.candidates.len()
    }
}

impl<S: CandidateSource + ?Sized> CandidateSource for &mut S {
    fn next_candidate(&mut self) -> Option<Candidate> {
        (**self).next_candidate()
    }

    fn has_more(&self) -> bool {
        (**self).has_more()
    }

    fn size_hint(&self) -> usize {
        (**self).size_hint()
    }
}

/// Access to stored document values by slot.
pub trait ValueAccessor {
    /// Get the raw bytes stored in `slot` for `doc_id`.
    fn value(&self, doc_id: DocId, slot: ValueSlot) -> Option<Vec<u8>>;
}

/// In-memory value storage.
#[derive(Debug, Clone, Default)]
pub struct ValueStore {
    values: AHashMap<DocId, BTreeMap<ValueSlot, Vec<u8>>>,
}

impl ValueStore {
    /// Create an empty store.
    pub fn new() -> Self {
        ValueStore {
            values: AHashMap::new(),
        }
    }

    /// Store a value for a document.
    pub fn insert<V: Into<Vec<u8>>>(&mut self, doc_id: DocId, slot: ValueSlot, value: V) {
        self.values
            .entry(doc_id)
            .or_default()
            .insert(slot, value.into());
    }

    /// Get the number of documents with at least one stored value.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ValueAccessor for ValueStore {
    fn value(&self, doc_id: DocId, slot: ValueSlot) -> Option<Vec<u8>> {
        self.values
            .get(&doc_id)
            .and_then(|slots| slots.get(&slot))
            .cloned()
    }
}

/// A source that fills in requested value slots from an accessor.
///
/// Values already carried by a candidate take precedence over the accessor.
#[derive(Debug)]
pub struct HydratedSource<S, A> {
    inner: S,
    accessor: A,
    slots: Vec<ValueSlot>,
}

impl<S: CandidateSource, A: ValueAccessor> HydratedSource<S, A> {
    /// Wrap `inner`, loading `slots` for every candidate it yields.
    pub fn new(inner: S, accessor: A, slots: Vec<ValueSlot>) -> Self {
        let mut slots = slots;
        slots.sort_unstable();
        slots.dedup();
        HydratedSource {
            inner,
            accessor,
            slots,
        }
    }

    /// The slots loaded for each candidate.
    pub fn slots(&self) -> &[ValueSlot] {
        &self.slots
    }
}

impl<S: CandidateSource, A: ValueAccessor> CandidateSource for HydratedSource<S, A> {
    fn next_candidate(&mut self) -> Option<Candidate> {
        let mut candidate = self.inner.next_candidate()?;
        for &slot in &self.slots {
            if candidate.has_value(slot) {
                continue;
            }
            if let Some(value) = self.accessor.value(candidate.doc_id, slot) {
                candidate.values.insert(slot, value);
            }
        }
        Some(candidate)
    }

    fn has_more(&self) -> bool {
        self.inner.has_more()
    }

    fn size_hint(&self) -> usize {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_values() {
        let candidate = Candidate::new(7, 1.5).with_value(0, "2024-01-01");

        assert_eq!(candidate.value(0), Some(&b"2024-01-01"[..]));
        assert_eq!(candidate.value(1), None);
        assert_eq!(candidate.sort_value(1), b"");
        assert!(candidate.has_value(0));
        assert!(!candidate.has_value(1));
    }

    #[test]
    fn test_vec_source_drains_in_order() {
        let mut source = VecSource::new(vec![Candidate::new(1, 3.0), Candidate::new(2, 2.0)]);

        assert!(source.has_more());
        assert_eq!(source.size_hint(), 2);
        assert_eq!(source.next_candidate().map(|c| c.doc_id), Some(1));
        assert_eq!(source.next_candidate().map(|c| c.doc_id), Some(2));
        assert!(!source.has_more());
        assert!(source.next_candidate().is_none());
    }

    #[test]
    fn test_value_store() {
        let mut store = ValueStore::new();
        store.insert(1, 0, "x");
        store.insert(1, 2, "y");

        assert_eq!(store.len(), 1);
        assert_eq!(store.value(1, 0), Some(b"x".to_vec()));
        assert_eq!(store.value(1, 1), None);
        assert_eq!(store.value(2, 0), None);
    }

    #[test]
    fn test_hydrated_source_fills_missing_slots() {
        let mut store = ValueStore::new();
        store.insert(1, 0, "stored");
        store.insert(1, 1, "category");
        store.insert(2, 1, "other");

        let source = VecSource::new(vec![
            Candidate::new(1, 2.0).with_value(0, "carried"),
            Candidate::new(2, 1.0),
        ]);
        let mut hydrated = HydratedSource::new(source, store, vec![1, 0, 1]);

        assert_eq!(hydrated.slots(), &[0, 1]);

        let first = hydrated.next_candidate().unwrap();
        assert_eq!(first.value(0), Some(&b"carried"[..]));
        assert_eq!(first.value(1), Some(&b"category"[..]));

        let second = hydrated.next_candidate().unwrap();
        assert_eq!(second.value(0), None);
        assert_eq!(second.value(1), Some(&b"other"[..]));

        assert!(!hydrated.has_more());
    }
}
