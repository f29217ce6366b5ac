//! Ordering controls for the result selector.
//!
//! A [`SortSpec`] decides how surviving candidates are ordered, which
//! relevance cutoff applies and whether that cutoff runs before or after the
//! reorder.

use std::cmp::Ordering;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::candidate::{Candidate, ValueSlot};
use crate::error::{Result, SieveError};

/// Sort order for a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum SortOrder {
    /// Ascending order (lowest to highest).
    #[default]
    Asc,
    /// Descending order (highest to lowest).
    Desc,
}

impl SortOrder {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }

    fn flip(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// One component of a composite value sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    /// Value slot to compare.
    pub slot: ValueSlot,
    /// Reverse this key relative to the aggregate direction.
    #[serde(default)]
    pub reverse: bool,
}

impl SortKey {
    /// Ascending key on `slot`.
    pub fn new(slot: ValueSlot) -> Self {
        SortKey {
            slot,
            reverse: false,
        }
    }

    /// Descending key on `slot`.
    pub fn reversed(slot: ValueSlot) -> Self {
        SortKey {
            slot,
            reverse: true,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.reverse { '-' } else { '+' };
        write!(f, "{sign}{}", self.slot)
    }
}

/// What to order surviving candidates by.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Keep the relevance order delivered by the engine (default).
    #[default]
    Relevance,
    /// Order by one or more value slots, first key most significant.
    Values(Vec<SortKey>),
}

/// Tie-break order on document identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DocidOrder {
    /// Lower document IDs first.
    #[value(aliases = ["a", "asc"])]
    Ascending,
    /// Higher document IDs first.
    #[default]
    #[value(aliases = ["d", "desc"])]
    Descending,
}

/// Relevance cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Threshold {
    /// Absolute minimum score.
    Score(f64),
    /// Minimum score as a percentage of the best score in the pass.
    Percent(u8),
}

impl Threshold {
    /// Resolve to an absolute cutoff given the best score in the pass.
    ///
    /// A percentage cutoff never exceeds `max_score`, so the best candidate
    /// always survives it even when scores are negative.
    pub fn cutoff(&self, max_score: f64) -> f64 {
        match *self {
            Threshold::Score(score) => score,
            Threshold::Percent(percent) => {
                (max_score * f64::from(percent) / 100.0).min(max_score)
            }
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            Threshold::Score(score) if score.is_nan() => Err(SieveError::invalid_config(
                "threshold score must be a number",
            )),
            Threshold::Percent(percent) if percent > 100 => Err(SieveError::invalid_config(
                format!("threshold percentage {percent} exceeds 100"),
            )),
            _ => Ok(()),
        }
    }
}

/// When the relevance cutoff is applied relative to the reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdStage {
    /// Cut on raw relevance before reordering (default).
    #[default]
    BeforeSort,
    /// Cut after reordering; relative order is unaffected.
    AfterSort,
}

impl ThresholdStage {
    /// Stage selected by a "sort after" flag.
    pub fn from_sort_after(sort_after: bool) -> Self {
        if sort_after {
            ThresholdStage::AfterSort
        } else {
            ThresholdStage::BeforeSort
        }
    }
}

/// Ordering and cutoff controls.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SortSpec {
    /// Relevance or value-slot ordering.
    pub sort_by: SortBy,
    /// Reverse the whole composite key.
    pub reverse: bool,
    /// Optional relevance cutoff.
    pub threshold: Option<Threshold>,
    /// Whether the cutoff runs before or after the reorder.
    pub threshold_stage: ThresholdStage,
    /// Tie-break order for candidates that compare fully equal.
    pub docid_order: DocidOrder,
}

impl SortSpec {
    /// Relevance ordering with no cutoff.
    pub fn relevance() -> Self {
        SortSpec::default()
    }

    /// Value ordering on the given keys.
    pub fn by_values(keys: Vec<SortKey>) -> Self {
        SortSpec {
            sort_by: SortBy::Values(keys),
            ..SortSpec::default()
        }
    }

    /// Value ordering on a single ascending slot.
    pub fn by_value(slot: ValueSlot) -> Self {
        SortSpec::by_values(vec![SortKey::new(slot)])
    }

    /// Set the aggregate reverse flag.
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Set the relevance cutoff.
    pub fn threshold(mut self, threshold: Threshold) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Apply the cutoff after reordering.
    pub fn sort_after(mut self, sort_after: bool) -> Self {
        self.threshold_stage = ThresholdStage::from_sort_after(sort_after);
        self
    }

    /// Set the document ID tie-break order.
    pub fn docid_order(mut self, docid_order: DocidOrder) -> Self {
        self.docid_order = docid_order;
        self
    }

    /// Slots referenced by the sort keys.
    pub fn slots(&self) -> Vec<ValueSlot> {
        match &self.sort_by {
            SortBy::Relevance => Vec::new(),
            SortBy::Values(keys) => keys.iter().map(|key| key.slot).collect(),
        }
    }

    /// Check the sort controls against a collection with `slot_limit` value slots.
    pub fn validate(&self, slot_limit: ValueSlot) -> Result<()> {
        if let SortBy::Values(keys) = &self.sort_by {
            if keys.is_empty() {
                return Err(SieveError::invalid_config(
                    "value sort requires at least one slot",
                ));
            }
            for key in keys {
                if key.slot >= slot_limit {
                    return Err(SieveError::invalid_config(format!(
                        "sort slot {} is outside the {slot_limit} configured value slots",
                        key.slot
                    )));
                }
            }
        }
        if let Some(threshold) = &self.threshold {
            threshold.validate()?;
        }
        Ok(())
    }

    /// Compare two candidates in display order.
    ///
    /// Value keys are compared as raw bytes, missing values as the empty
    /// string. Relevance order and fully equal keys fall back to descending
    /// score and then to the document ID tie-break.
    pub fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
        if let SortBy::Values(keys) = &self.sort_by {
            for key in keys {
                let mut order = if key.reverse {
                    SortOrder::Desc
                } else {
                    SortOrder::Asc
                };
                if self.reverse {
                    order = order.flip();
                }
                let ordering = order.apply(a.sort_value(key.slot).cmp(b.sort_value(key.slot)));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }

        b.score
            .total_cmp(&a.score)
            .then_with(|| self.compare_docids(a, b))
    }

    fn compare_docids(&self, a: &Candidate, b: &Candidate) -> Ordering {
        match self.docid_order {
            DocidOrder::Ascending => a.doc_id.cmp(&b.doc_id),
            DocidOrder::Descending => b.doc_id.cmp(&a.doc_id),
        }
    }
}
