//! Selector configuration.
//!
//! [`SelectorConfig`] replaces process-wide search settings with one
//! immutable value per request. It can be loaded from JSON, overlaid with
//! request parameters in the search front-end's query-string convention,
//! and finally resolved into the specs the selector consumes.
//!
//! | Parameter     | Effect                                                   |
//! |---------------|----------------------------------------------------------|
//! | `SORT`        | comma list of slots, `+` ascending / `-` descending      |
//! | `SORTREVERSE` | reverse the whole sort key                               |
//! | `SORTAFTER`   | apply the threshold after reordering                     |
//! | `DOCIDORDER`  | `A` ascending, `D` descending tie-break                  |
//! | `THRESHOLD`   | score (`2.5`) or percentage of the best score (`40%`)    |
//! | `COLLAPSE`    | slot to collapse on, empty to disable                    |
//! | `HITSPERPAGE` | page size, capped at [`MAX_HITS_PER_PAGE`]               |
//! | `TOPDOC`      | offset of the first hit                                  |
//! | `MINHITS`     | minimum surviving hits to report                         |

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::candidate::{CandidateSource, ValueSlot};
use crate::error::{Result, SieveError};
use crate::page::{DEFAULT_HITS_PER_PAGE, PageRequest, ResultPage};
use crate::selector::{CollapseSpec, DEFAULT_VALUE_SLOTS, ResultSelector};
use crate::sort::{DocidOrder, SortBy, SortKey, SortSpec, Threshold, ThresholdStage};

/// Upper bound applied to the requested page size.
pub const MAX_HITS_PER_PAGE: i64 = 1000;

/// Declarative selection controls for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Number of value slots configured for the collection.
    pub value_slots: ValueSlot,
    /// Single sort key, used when `sort_keys` is empty.
    pub sort_key: Option<SortKey>,
    /// Composite sort keys, most significant first.
    pub sort_keys: Vec<SortKey>,
    /// Reverse the whole sort key.
    pub reverse_sort: bool,
    /// Apply the threshold after reordering.
    pub sort_after: bool,
    /// Tie-break order on document IDs.
    pub docid_order: DocidOrder,
    /// Relevance cutoff.
    pub threshold: Option<Threshold>,
    /// Slot to collapse on.
    pub collapse_key: Option<ValueSlot>,
    /// Requested page size.
    pub hits_per_page: i64,
    /// Minimum surviving hits to report.
    pub min_hits: i64,
    /// Offset of the first hit.
    pub offset: i64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        SelectorConfig {
            value_slots: DEFAULT_VALUE_SLOTS,
            sort_key: None,
            sort_keys: Vec::new(),
            reverse_sort: false,
            sort_after: false,
            docid_order: DocidOrder::default(),
            threshold: None,
            collapse_key: None,
            hits_per_page: DEFAULT_HITS_PER_PAGE as i64,
            min_hits: 0,
            offset: 0,
        }
    }
}

impl SelectorConfig {
    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading selector config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Overlay request parameters given as an `application/x-www-form-urlencoded`
    /// query string.
    pub fn apply_query_string(&mut self, query: &str) -> Result<()> {
        self.apply_params(url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()))
    }

    /// Overlay request parameters. Unknown names are ignored.
    pub fn apply_params<I, K, V>(&mut self, params: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in params {
            let value = value.as_ref().trim();
            match name.as_ref() {
                "SORT" => {
                    self.sort_key = None;
                    self.sort_keys = parse_sort_keys(value)?;
                }
                "SORTREVERSE" => self.reverse_sort = parse_flag("SORTREVERSE", value)?,
                "SORTAFTER" => self.sort_after = parse_flag("SORTAFTER", value)?,
                "DOCIDORDER" => self.docid_order = parse_docid_order(value)?,
                "THRESHOLD" => self.threshold = parse_threshold(value)?,
                "COLLAPSE" => {
                    self.collapse_key = if value.is_empty() {
                        None
                    } else {
                        Some(parse_number("COLLAPSE", value)?)
                    }
                }
                "HITSPERPAGE" => self.hits_per_page = parse_number("HITSPERPAGE", value)?,
                "TOPDOC" => self.offset = parse_number("TOPDOC", value)?,
                "MINHITS" => self.min_hits = parse_number("MINHITS", value)?,
                other => debug!("Ignoring unknown parameter {other}"),
            }
        }
        Ok(())
    }

    /// The selector for this collection.
    pub fn selector(&self) -> ResultSelector {
        ResultSelector::new(self.value_slots)
    }

    /// Resolve into validated selector inputs.
    pub fn to_parts(&self) -> Result<(SortSpec, CollapseSpec, PageRequest)> {
        let sort_by = if !self.sort_keys.is_empty() {
            SortBy::Values(self.sort_keys.clone())
        } else if let Some(key) = self.sort_key {
            SortBy::Values(vec![key])
        } else {
            SortBy::Relevance
        };

        let sort = SortSpec {
            sort_by,
            reverse: self.reverse_sort,
            threshold: self.threshold,
            threshold_stage: ThresholdStage::from_sort_after(self.sort_after),
            docid_order: self.docid_order,
        };
        let collapse = CollapseSpec {
            slot: self.collapse_key,
        };
        self.selector().validate(&sort, &collapse)?;

        let page = PageRequest::try_new(
            self.offset,
            self.hits_per_page.min(MAX_HITS_PER_PAGE),
            self.min_hits,
        )?;

        Ok((sort, collapse, page))
    }

    /// Select one page from `source` with these controls.
    pub fn select<S: CandidateSource>(&self, source: S) -> Result<ResultPage> {
        let (sort, collapse, page) = self.to_parts()?;
        self.selector().select(source, &sort, &collapse, &page)
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| SieveError::parse(format!("{name}: expected a number, got '{value}'")))
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        _ => Err(SieveError::parse(format!(
            "{name}: expected a boolean, got '{value}'"
        ))),
    }
}

fn parse_docid_order(value: &str) -> Result<DocidOrder> {
    match value {
        "A" | "a" => Ok(DocidOrder::Ascending),
        "D" | "d" | "" => Ok(DocidOrder::Descending),
        _ => Err(SieveError::parse(format!(
            "DOCIDORDER: expected 'A' or 'D', got '{value}'"
        ))),
    }
}

fn parse_threshold(value: &str) -> Result<Option<Threshold>> {
    if value.is_empty() {
        return Ok(None);
    }
    if let Some(percent) = value.strip_suffix('%') {
        return Ok(Some(Threshold::Percent(parse_number(
            "THRESHOLD",
            percent.trim(),
        )?)));
    }
    Ok(Some(Threshold::Score(parse_number("THRESHOLD", value)?)))
}

/// Parse a `SORT` parameter such as `+3,-1,2`.
pub fn parse_sort_keys(value: &str) -> Result<Vec<SortKey>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (reverse, slot) = match part.as_bytes()[0] {
                b'-' => (true, &part[1..]),
                b'+' => (false, &part[1..]),
                _ => (false, part),
            };
            Ok(SortKey {
                slot: parse_number("SORT", slot)?,
                reverse,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_default_parts() {
        let (sort, collapse, page) = SelectorConfig::default().to_parts().unwrap();

        assert_eq!(sort, SortSpec::relevance());
        assert_eq!(collapse, CollapseSpec::none());
        assert_eq!(page, PageRequest::new(0, DEFAULT_HITS_PER_PAGE));
    }

    #[test]
    fn test_parse_sort_keys() {
        let keys = parse_sort_keys("+3, -1,2").unwrap();
        assert_eq!(
            keys,
            vec![SortKey::new(3), SortKey::reversed(1), SortKey::new(2)]
        );

        assert!(parse_sort_keys("").unwrap().is_empty());
        assert!(parse_sort_keys("x").is_err());
        assert!(parse_sort_keys("-").is_err());
    }

    #[test]
    fn test_apply_query_string() {
        let mut config = SelectorConfig::default();
        config
            .apply_query_string(
                "?SORT=1%2C-2&SORTREVERSE=1&SORTAFTER=true&DOCIDORDER=A&THRESHOLD=40%25\
                 &COLLAPSE=5&HITSPERPAGE=20&TOPDOC=40&MINHITS=100&P=ignored",
            )
            .unwrap();

        assert_eq!(config.sort_keys, vec![SortKey::new(1), SortKey::reversed(2)]);
        assert!(config.reverse_sort);
        assert!(config.sort_after);
        assert_eq!(config.docid_order, DocidOrder::Ascending);
        assert_eq!(config.threshold, Some(Threshold::Percent(40)));
        assert_eq!(config.collapse_key, Some(5));
        assert_eq!(config.hits_per_page, 20);
        assert_eq!(config.offset, 40);
        assert_eq!(config.min_hits, 100);
    }

    #[test]
    fn test_empty_params_reset() {
        let mut config = SelectorConfig {
            sort_key: Some(SortKey::new(1)),
            collapse_key: Some(2),
            threshold: Some(Threshold::Score(1.0)),
            ..SelectorConfig::default()
        };
        config
            .apply_params([("SORT", ""), ("COLLAPSE", ""), ("THRESHOLD", "")])
            .unwrap();

        assert_eq!(config.sort_key, None);
        assert!(config.sort_keys.is_empty());
        assert_eq!(config.collapse_key, None);
        assert_eq!(config.threshold, None);
    }

    #[test]
    fn test_bad_params() {
        let mut config = SelectorConfig::default();
        assert!(matches!(
            config.apply_params([("HITSPERPAGE", "lots")]),
            Err(SieveError::Parse(_))
        ));
        assert!(config.apply_params([("DOCIDORDER", "X")]).is_err());
        assert!(config.apply_params([("SORTREVERSE", "maybe")]).is_err());
        assert!(config.apply_params([("THRESHOLD", "high%")]).is_err());
    }

    #[test]
    fn test_sort_keys_win_over_sort_key() {
        let config = SelectorConfig {
            sort_key: Some(SortKey::new(9)),
            sort_keys: vec![SortKey::new(1)],
            ..SelectorConfig::default()
        };
        let (sort, _, _) = config.to_parts().unwrap();
        assert_eq!(sort.sort_by, SortBy::Values(vec![SortKey::new(1)]));

        let config = SelectorConfig {
            sort_key: Some(SortKey::new(9)),
            ..SelectorConfig::default()
        };
        let (sort, _, _) = config.to_parts().unwrap();
        assert_eq!(sort.sort_by, SortBy::Values(vec![SortKey::new(9)]));
    }

    #[test]
    fn test_to_parts_validation() {
        let config = SelectorConfig {
            value_slots: 4,
            collapse_key: Some(4),
            ..SelectorConfig::default()
        };
        assert!(matches!(
            config.to_parts(),
            Err(SieveError::InvalidConfiguration(_))
        ));

        let config = SelectorConfig {
            offset: -1,
            ..SelectorConfig::default()
        };
        assert!(matches!(
            config.to_parts(),
            Err(SieveError::InvalidRequest(_))
        ));

        let config = SelectorConfig {
            hits_per_page: -10,
            ..SelectorConfig::default()
        };
        assert!(matches!(
            config.to_parts(),
            Err(SieveError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_hits_per_page_is_capped() {
        let config = SelectorConfig {
            hits_per_page: 50_000,
            ..SelectorConfig::default()
        };
        let (_, _, page) = config.to_parts().unwrap();
        assert_eq!(page.page_size, MAX_HITS_PER_PAGE as usize);
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "value_slots": 8,
                "sort_keys": [{{"slot": 2, "reverse": true}}, {{"slot": 0}}],
                "threshold": {{"score": 1.5}},
                "collapse_key": 3,
                "hits_per_page": 5
            }}"#
        )
        .unwrap();

        let config = SelectorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.value_slots, 8);
        assert_eq!(
            config.sort_keys,
            vec![SortKey::reversed(2), SortKey::new(0)]
        );
        assert_eq!(config.threshold, Some(Threshold::Score(1.5)));
        assert_eq!(config.collapse_key, Some(3));
        assert_eq!(config.hits_per_page, 5);
        assert_eq!(config.docid_order, DocidOrder::Descending);
    }

    #[test]
    fn test_from_file_missing() {
        assert!(matches!(
            SelectorConfig::from_file("/nonexistent/hitsieve.json"),
            Err(SieveError::Io(_))
        ));
    }
}
