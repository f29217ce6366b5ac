//! Page requests and the result pages handed back to the caller.

use serde::{Deserialize, Serialize};

use crate::candidate::{Candidate, DocId};
use crate::error::{Result, SieveError};

/// Default number of hits per page.
pub const DEFAULT_HITS_PER_PAGE: usize = 10;

/// Which window of the surviving candidates to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Zero-based index of the first hit on the page.
    pub offset: usize,
    /// Maximum number of hits on the page.
    pub page_size: usize,
    /// Number of surviving candidates needed for `min_hits_met`.
    pub min_hits: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            offset: 0,
            page_size: DEFAULT_HITS_PER_PAGE,
            min_hits: 0,
        }
    }
}

impl PageRequest {
    /// Create a page request.
    pub fn new(offset: usize, page_size: usize) -> Self {
        PageRequest {
            offset,
            page_size,
            min_hits: 0,
        }
    }

    /// Build a request from signed values as received from a caller.
    ///
    /// Negative values are rejected with [`SieveError::InvalidRequest`].
    pub fn try_new(offset: i64, page_size: i64, min_hits: i64) -> Result<Self> {
        Ok(PageRequest {
            offset: non_negative("offset", offset)?,
            page_size: non_negative("page size", page_size)?,
            min_hits: non_negative("minimum hits", min_hits)?,
        })
    }

    /// Set the minimum hit count.
    pub fn min_hits(mut self, min_hits: usize) -> Self {
        self.min_hits = min_hits;
        self
    }
}

fn non_negative(name: &str, value: i64) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| SieveError::invalid_request(format!("{name} must not be negative, got {value}")))
}

/// A surviving candidate on a result page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// The surviving candidate.
    pub candidate: Candidate,
    /// Number of candidates collapsed into this one.
    pub collapse_count: u64,
}

impl Hit {
    /// Wrap a candidate that represents only itself.
    pub fn new(candidate: Candidate) -> Self {
        Hit {
            candidate,
            collapse_count: 0,
        }
    }

    /// The document ID.
    pub fn doc_id(&self) -> DocId {
        self.candidate.doc_id
    }

    /// The relevance score.
    pub fn score(&self) -> f64 {
        self.candidate.score
    }
}

/// One page of selected results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPage {
    /// The hits on this page, in display order.
    pub hits: Vec<Hit>,
    /// Number of candidates surviving threshold and collapse.
    pub total_hits: usize,
    /// Whether surviving candidates remain beyond this page.
    pub more_results: bool,
    /// Whether `total_hits` reached the requested minimum.
    pub min_hits_met: bool,
    /// Offset the page was taken from.
    pub offset: usize,
    /// Requested page size.
    pub page_size: usize,
    /// Best relevance score among all candidates pulled from the source.
    pub max_score: f64,
}

impl ResultPage {
    /// An empty page for a request.
    pub fn empty(request: &PageRequest) -> Self {
        ResultPage {
            hits: Vec::new(),
            total_hits: 0,
            more_results: false,
            min_hits_met: request.min_hits == 0,
            offset: request.offset,
            page_size: request.page_size,
            max_score: 0.0,
        }
    }

    /// Number of hits on this page.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Check if the page has no hits.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Document IDs on this page, in order.
    pub fn doc_ids(&self) -> Vec<DocId> {
        self.hits.iter().map(Hit::doc_id).collect()
    }

    /// Offset of the following page, if there is one.
    pub fn next_offset(&self) -> Option<usize> {
        self.more_results.then(|| self.offset + self.hits.len())
    }

    /// Offset of the preceding page, if this is not the first one.
    pub fn previous_offset(&self) -> Option<usize> {
        (self.offset > 0).then(|| self.offset.saturating_sub(self.page_size))
    }

    /// One-based page number, or `None` for a zero page size.
    pub fn page_number(&self) -> Option<usize> {
        (self.page_size > 0).then(|| self.offset / self.page_size + 1)
    }

    /// Offset of the last non-empty page aligned to the page size.
    pub fn last_page_offset(&self) -> Option<usize> {
        if self.page_size == 0 || self.total_hits == 0 {
            return None;
        }
        Some((self.total_hits - 1) / self.page_size * self.page_size)
    }
}
