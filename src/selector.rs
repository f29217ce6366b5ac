//! The result selector: turns a relevance-ranked candidate stream into one
//! page of results.
//!
//! Selection runs in fixed stages over a single query's candidates:
//!
//! 1. relevance cutoff, when [`ThresholdStage::BeforeSort`];
//! 2. stable reorder by descending score or by value slots, with the
//!    document ID tie-break last;
//! 3. relevance cutoff, when [`ThresholdStage::AfterSort`];
//! 4. collapse on the collapse slot, keeping the best-ordered candidate per
//!    value;
//! 5. slice the requested page and report whether more results remain;
//! 6. check the surviving count against the requested minimum.
//!
//! Only invalid controls produce errors, and they are reported before any
//! candidate is pulled from the source.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::candidate::{Candidate, CandidateSource, ValueSlot};
use crate::collector::{CollapseCollector, Collector};
use crate::error::{Result, SieveError};
use crate::page::{Hit, PageRequest, ResultPage};
use crate::sort::{SortSpec, ThresholdStage};

/// Default number of value slots a collection is assumed to have.
///
/// The last slot number is reserved as "no slot", so every other slot is
/// addressable.
pub const DEFAULT_VALUE_SLOTS: ValueSlot = ValueSlot::MAX;

/// Collapsing control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CollapseSpec {
    /// Slot to collapse on, or `None` to disable collapsing.
    pub slot: Option<ValueSlot>,
}

impl CollapseSpec {
    /// Collapsing disabled.
    pub fn none() -> Self {
        CollapseSpec { slot: None }
    }

    /// Collapse on `slot`.
    pub fn on(slot: ValueSlot) -> Self {
        CollapseSpec { slot: Some(slot) }
    }

    /// Check if collapsing is enabled.
    pub fn is_active(&self) -> bool {
        self.slot.is_some()
    }

    /// Check the collapse control against a collection with `slot_limit` value slots.
    pub fn validate(&self, slot_limit: ValueSlot) -> Result<()> {
        match self.slot {
            Some(slot) if slot >= slot_limit => Err(SieveError::invalid_config(format!(
                "collapse slot {slot} is outside the {slot_limit} configured value slots"
            ))),
            _ => Ok(()),
        }
    }
}

/// Applies sort, collapse and pagination controls to candidate streams.
///
/// A selector holds no per-query state and can be shared between threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultSelector {
    /// Number of value slots configured for the collection.
    slot_limit: ValueSlot,
}

impl Default for ResultSelector {
    fn default() -> Self {
        ResultSelector::new(DEFAULT_VALUE_SLOTS)
    }
}

impl ResultSelector {
    /// Create a selector for a collection with `slot_limit` value slots.
    pub fn new(slot_limit: ValueSlot) -> Self {
        ResultSelector { slot_limit }
    }

    /// Get the number of value slots.
    pub fn slot_limit(&self) -> ValueSlot {
        self.slot_limit
    }

    /// Check that a set of controls is usable with this collection.
    pub fn validate(&self, sort: &SortSpec, collapse: &CollapseSpec) -> Result<()> {
        sort.validate(self.slot_limit)?;
        collapse.validate(self.slot_limit)
    }

    /// Select one page of results from `source`.
    pub fn select<S: CandidateSource>(
        &self,
        mut source: S,
        sort: &SortSpec,
        collapse: &CollapseSpec,
        request: &PageRequest,
    ) -> Result<ResultPage> {
        self.validate(sort, collapse)?;

        let mut candidates = Vec::with_capacity(source.size_hint());
        while let Some(candidate) = source.next_candidate() {
            candidates.push(candidate);
        }

        let pulled = candidates.len();
        if pulled == 0 {
            debug!("No candidates to select from");
            return Ok(ResultPage::empty(request));
        }

        let max_score = candidates
            .iter()
            .map(|candidate| candidate.score)
            .fold(f64::NEG_INFINITY, f64::max);
        let cutoff = sort.threshold.map(|threshold| threshold.cutoff(max_score));

        if sort.threshold_stage == ThresholdStage::BeforeSort {
            apply_cutoff(&mut candidates, cutoff);
        }

        candidates.sort_by(|a, b| sort.compare(a, b));

        if sort.threshold_stage == ThresholdStage::AfterSort {
            apply_cutoff(&mut candidates, cutoff);
        }

        let mut collector = CollapseCollector::with_capacity(collapse.slot, candidates.len());
        for candidate in candidates {
            collector.collect(candidate);
        }
        let total_hits = collector.total_hits();
        debug!(
            "Selected from {pulled} candidates: {} above cutoff, {total_hits} after collapse",
            collector.collected()
        );
        let hits = collector.into_hits();

        Ok(paginate(hits, total_hits, max_score, request))
    }
}

/// Select one page with a selector that accepts every slot number.
pub fn select<S: CandidateSource>(
    source: S,
    sort: &SortSpec,
    collapse: &CollapseSpec,
    request: &PageRequest,
) -> Result<ResultPage> {
    ResultSelector::default().select(source, sort, collapse, request)
}

fn apply_cutoff(candidates: &mut Vec<Candidate>, cutoff: Option<f64>) {
    let Some(cutoff) = cutoff else {
        return;
    };
    candidates.retain(|candidate| {
        let keep = candidate.score >= cutoff;
        if !keep {
            trace!(
                "Dropping doc {} with score {} below cutoff {cutoff}",
                candidate.doc_id, candidate.score
            );
        }
        keep
    });
}

fn paginate(hits: Vec<Hit>, total_hits: usize, max_score: f64, request: &PageRequest) -> ResultPage {
    let page: Vec<Hit> = hits
        .into_iter()
        .skip(request.offset)
        .take(request.page_size)
        .collect();
    let more_results = request.offset.saturating_add(page.len()) < total_hits;

    ResultPage {
        hits: page,
        total_hits,
        more_results,
        min_hits_met: total_hits >= request.min_hits,
        offset: request.offset,
        page_size: request.page_size,
        max_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::VecSource;
    use crate::sort::{DocidOrder, SortKey, Threshold};

    fn scored(scores: &[f64]) -> VecSource {
        scores
            .iter()
            .enumerate()
            .map(|(i, &score)| Candidate::new(i as u64 + 1, score))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_relevance_first_page() {
        let page = select(
            scored(&[9.0, 8.0, 7.0, 6.0, 5.0]),
            &SortSpec::relevance(),
            &CollapseSpec::none(),
            &PageRequest::new(0, 2),
        )
        .unwrap();

        assert_eq!(page.doc_ids(), vec![1, 2]);
        assert_eq!(page.total_hits, 5);
        assert!(page.more_results);
        assert_eq!(page.max_score, 9.0);
    }

    #[test]
    fn test_threshold_before_sort() {
        let page = select(
            scored(&[9.0, 7.0, 5.0, 3.0]),
            &SortSpec::relevance().threshold(Threshold::Score(6.0)),
            &CollapseSpec::none(),
            &PageRequest::new(0, 10),
        )
        .unwrap();

        assert_eq!(page.doc_ids(), vec![1, 2]);
        assert_eq!(page.total_hits, 2);
        assert!(!page.more_results);
    }

    #[test]
    fn test_percent_threshold() {
        let page = select(
            scored(&[10.0, 6.0, 4.0, 1.0]),
            &SortSpec::relevance().threshold(Threshold::Percent(40)),
            &CollapseSpec::none(),
            &PageRequest::new(0, 10),
        )
        .unwrap();

        assert_eq!(page.doc_ids(), vec![1, 2, 3]);
    }

    #[test]
    fn test_threshold_after_sort_keeps_value_order() {
        let source = VecSource::new(vec![
            Candidate::new(1, 9.0).with_value(0, "c"),
            Candidate::new(2, 7.0).with_value(0, "a"),
            Candidate::new(3, 5.0).with_value(0, "b"),
            Candidate::new(4, 3.0).with_value(0, "a"),
        ]);
        let sort = SortSpec::by_value(0)
            .threshold(Threshold::Score(5.0))
            .sort_after(true);

        let page = select(source, &sort, &CollapseSpec::none(), &PageRequest::new(0, 10)).unwrap();

        assert_eq!(page.doc_ids(), vec![2, 3, 1]);
    }

    #[test]
    fn test_sort_then_collapse_picks_representative_by_sort_order() {
        let candidates = vec![
            Candidate::new(1, 9.0).with_value(0, "x").with_value(1, "2024"),
            Candidate::new(2, 5.0).with_value(0, "x").with_value(1, "2025"),
            Candidate::new(3, 7.0).with_value(0, "y").with_value(1, "2023"),
        ];

        let by_relevance = select(
            VecSource::new(candidates.clone()),
            &SortSpec::relevance(),
            &CollapseSpec::on(0),
            &PageRequest::new(0, 10),
        )
        .unwrap();
        assert_eq!(by_relevance.doc_ids(), vec![1, 3]);

        let newest_first = select(
            VecSource::new(candidates),
            &SortSpec::by_values(vec![SortKey::reversed(1)]),
            &CollapseSpec::on(0),
            &PageRequest::new(0, 10),
        )
        .unwrap();
        assert_eq!(newest_first.doc_ids(), vec![2, 3]);
        assert_eq!(newest_first.hits[0].collapse_count, 1);
    }

    #[test]
    fn test_docid_tie_break() {
        let candidates = vec![
            Candidate::new(4, 5.0).with_value(0, "x"),
            Candidate::new(9, 5.0).with_value(0, "x"),
            Candidate::new(2, 5.0).with_value(0, "x"),
        ];

        let descending = select(
            VecSource::new(candidates.clone()),
            &SortSpec::by_value(0),
            &CollapseSpec::none(),
            &PageRequest::new(0, 10),
        )
        .unwrap();
        assert_eq!(descending.doc_ids(), vec![9, 4, 2]);

        let ascending = select(
            VecSource::new(candidates),
            &SortSpec::by_value(0).docid_order(DocidOrder::Ascending),
            &CollapseSpec::none(),
            &PageRequest::new(0, 10),
        )
        .unwrap();
        assert_eq!(ascending.doc_ids(), vec![2, 4, 9]);
    }

    #[test]
    fn test_relevance_docid_tie_break() {
        let tied = |ids: &[u64]| {
            VecSource::new(ids.iter().map(|&id| Candidate::new(id, 5.0)).collect())
        };

        let descending = select(
            tied(&[2, 4, 9]),
            &SortSpec::relevance(),
            &CollapseSpec::none(),
            &PageRequest::new(0, 10),
        )
        .unwrap();
        assert_eq!(descending.doc_ids(), vec![9, 4, 2]);

        let ascending = select(
            tied(&[9, 4, 2]),
            &SortSpec::relevance().docid_order(DocidOrder::Ascending),
            &CollapseSpec::none(),
            &PageRequest::new(0, 10),
        )
        .unwrap();
        assert_eq!(ascending.doc_ids(), vec![2, 4, 9]);
    }

    #[test]
    fn test_relevance_sort_orders_by_score() {
        let source = VecSource::new(vec![
            Candidate::new(1, 2.0),
            Candidate::new(2, 8.0),
            Candidate::new(3, 5.0),
        ]);

        let page = select(
            source,
            &SortSpec::relevance(),
            &CollapseSpec::none(),
            &PageRequest::new(0, 10),
        )
        .unwrap();
        assert_eq!(page.doc_ids(), vec![2, 3, 1]);
    }

    #[test]
    fn test_percent_threshold_keeps_best_negative_score() {
        let page = select(
            scored(&[-10.0, -12.0, -30.0]),
            &SortSpec::relevance().threshold(Threshold::Percent(50)),
            &CollapseSpec::none(),
            &PageRequest::new(0, 10),
        )
        .unwrap();

        assert_eq!(page.doc_ids(), vec![1]);
        assert_eq!(page.max_score, -10.0);
    }

    #[test]
    fn test_invalid_slots_fail_before_pulling() {
        let selector = ResultSelector::new(4);
        let mut source = scored(&[1.0, 2.0]);

        let err = selector
            .select(
                &mut source,
                &SortSpec::by_value(4),
                &CollapseSpec::none(),
                &PageRequest::default(),
            )
            .unwrap_err();
        assert!(matches!(err, SieveError::InvalidConfiguration(_)));
        assert_eq!(source.len(), 2);

        let err = selector
            .select(
                &mut source,
                &SortSpec::relevance(),
                &CollapseSpec::on(7),
                &PageRequest::default(),
            )
            .unwrap_err();
        assert!(matches!(err, SieveError::InvalidConfiguration(_)));
        assert_eq!(source.len(), 2);
    }

    #[test]
    fn test_zero_page_size() {
        let page = select(
            scored(&[3.0, 2.0]),
            &SortSpec::relevance(),
            &CollapseSpec::none(),
            &PageRequest::new(0, 0).min_hits(2),
        )
        .unwrap();

        assert!(page.is_empty());
        assert!(page.more_results);
        assert!(page.min_hits_met);
        assert_eq!(page.total_hits, 2);
    }

    #[test]
    fn test_empty_source() {
        let page = select(
            VecSource::default(),
            &SortSpec::relevance(),
            &CollapseSpec::on(0),
            &PageRequest::new(0, 10).min_hits(1),
        )
        .unwrap();

        assert!(page.is_empty());
        assert!(!page.more_results);
        assert!(!page.min_hits_met);
        assert_eq!(page.total_hits, 0);
    }
}
