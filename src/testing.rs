//! Assertions for comparing ranked result pages.
//!
//! Useful both for this crate's tests and for callers checking that their
//! front-end produces the pages they expect.

use crate::candidate::DocId;
use crate::page::{Hit, ResultPage};

fn range(page: &ResultPage, first: usize, count: usize) -> Option<&[Hit]> {
    let end = first.checked_add(count)?;
    page.hits.get(first..end)
}

/// Check that `count` hits starting at `first1` and `first2` have the same
/// document IDs and scores.
pub fn page_range_is_same(
    page1: &ResultPage,
    first1: usize,
    page2: &ResultPage,
    first2: usize,
    count: usize,
) -> bool {
    match (range(page1, first1, count), range(page2, first2, count)) {
        (Some(a), Some(b)) => a
            .iter()
            .zip(b)
            .all(|(x, y)| x.doc_id() == y.doc_id() && x.score() == y.score()),
        _ => false,
    }
}

/// Check that hits starting at `first` match `(doc_id, score)` pairs.
pub fn page_range_matches(page: &ResultPage, first: usize, expected: &[(DocId, f64)]) -> bool {
    range(page, first, expected.len()).is_some_and(|hits| {
        hits.iter()
            .zip(expected)
            .all(|(hit, &(doc_id, score))| hit.doc_id() == doc_id && hit.score() == score)
    })
}

/// Check that two ranges have the same scores, ignoring document IDs.
pub fn page_range_is_same_weights(
    page1: &ResultPage,
    first1: usize,
    page2: &ResultPage,
    first2: usize,
    count: usize,
) -> bool {
    match (range(page1, first1, count), range(page2, first2, count)) {
        (Some(a), Some(b)) => a.iter().zip(b).all(|(x, y)| x.score() == y.score()),
        _ => false,
    }
}

/// Panic unless the page holds exactly `expected`, in order.
#[track_caller]
pub fn expect_order(page: &ResultPage, expected: &[DocId]) {
    let actual = page.doc_ids();
    assert_eq!(
        actual, expected,
        "page order mismatch: got {actual:?}, expected {expected:?}"
    );
}

/// Panic unless two pages hold the same document IDs in the same order.
#[track_caller]
pub fn pages_order_equal(page1: &ResultPage, page2: &ResultPage) {
    let a = page1.doc_ids();
    let b = page2.doc_ids();
    assert_eq!(a, b, "pages differ in order: {a:?} vs {b:?}");
}

/// Assert that a page holds exactly `n` hits.
#[macro_export]
macro_rules! assert_page_size {
    ($page:expr, $n:expr) => {{
        let page: &$crate::page::ResultPage = &$page;
        let expected: usize = $n;
        assert!(
            page.len() == expected,
            "page '{}' is not of expected size: was {}, expected {}: {:?}",
            stringify!($page),
            page.len(),
            expected,
            page.doc_ids()
        );
    }};
}

/// Assert that a page holds exactly the given document IDs, in order.
#[macro_export]
macro_rules! assert_page_order {
    ($page:expr $(, $doc_id:expr)* $(,)?) => {{
        let expected: ::std::vec::Vec<$crate::candidate::DocId> = ::std::vec![$($doc_id),*];
        $crate::testing::expect_order(&$page, &expected);
    }};
}
