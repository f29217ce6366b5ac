//! # hitsieve
//!
//! Result post-processing for search front-ends layered over an external
//! retrieval engine.
//!
//! The engine hands over a relevance-ranked stream of candidates; hitsieve
//! turns it into the page a user actually sees.
//!
//! ## Features
//!
//! - Absolute or percentage relevance cutoffs, before or after reordering
//! - Stable multi-key value sorting with per-key and aggregate direction
//! - Collapsing on a value slot with per-survivor duplicate counts
//! - Pagination with "more results" and minimum-hit signalling
//! - Query-string and JSON configuration
//!
//! ```
//! use hitsieve::prelude::*;
//!
//! let candidates = vec![
//!     Candidate::new(1, 9.0).with_value(0, "x"),
//!     Candidate::new(2, 5.0).with_value(0, "x"),
//!     Candidate::new(3, 7.0).with_value(0, "y"),
//! ];
//!
//! let page = select(
//!     VecSource::new(candidates),
//!     &SortSpec::relevance(),
//!     &CollapseSpec::on(0),
//!     &PageRequest::new(0, 10),
//! )
//! .unwrap();
//!
//! assert_eq!(page.doc_ids(), vec![1, 3]);
//! assert_eq!(page.hits[0].collapse_count, 1);
//! ```

pub mod candidate;
pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod page;
pub mod selector;
pub mod sort;
pub mod testing;

pub mod prelude {
    pub use crate::candidate::{
        Candidate, CandidateSource, DocId, HydratedSource, ValueAccessor, ValueSlot, ValueStore,
        VecSource,
    };
    pub use crate::config::SelectorConfig;
    pub use crate::error::{Result, SieveError};
    pub use crate::page::{Hit, PageRequest, ResultPage};
    pub use crate::selector::{CollapseSpec, ResultSelector, select};
    pub use crate::sort::{DocidOrder, SortBy, SortKey, SortSpec, Threshold, ThresholdStage};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
