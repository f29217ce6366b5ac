//! Command line argument parsing for the hitsieve CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::sort::DocidOrder;

/// hitsieve - select a page of results from a ranked candidate stream
#[derive(Parser, Debug, Clone)]
#[command(name = "hitsieve")]
#[command(about = "Threshold, sort, collapse and paginate ranked search results")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct HitsieveArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", env = "HITSIEVE_FORMAT")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl HitsieveArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Select one page of results from a candidate stream
    Select(SelectArgs),

    /// Validate a selector configuration and print the resolved controls
    #[command(name = "check-config")]
    CheckConfig(CheckConfigArgs),
}

/// Selection controls shared by `select` and `check-config`.
#[derive(Parser, Debug, Clone, Default)]
pub struct ControlArgs {
    /// Selector configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE", env = "HITSIEVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Request parameters as a query string, e.g. "SORT=1&HITSPERPAGE=20"
    #[arg(long, value_name = "QUERY_STRING")]
    pub params: Option<String>,

    /// Number of value slots in the collection
    #[arg(long, env = "HITSIEVE_VALUE_SLOTS")]
    pub value_slots: Option<u32>,

    /// Sort keys, e.g. "+3,-1" (empty for relevance)
    #[arg(short, long, allow_hyphen_values = true, env = "HITSIEVE_SORT")]
    pub sort: Option<String>,

    /// Reverse the whole sort key
    #[arg(short, long)]
    pub reverse: bool,

    /// Apply the threshold after reordering
    #[arg(long)]
    pub sort_after: bool,

    /// Tie-break order on document IDs
    #[arg(long, env = "HITSIEVE_DOCID_ORDER")]
    pub docid_order: Option<DocidOrder>,

    /// Relevance threshold: a score, or a percentage such as "40%"
    #[arg(short, long, env = "HITSIEVE_THRESHOLD")]
    pub threshold: Option<String>,

    /// Value slot to collapse on
    #[arg(long, env = "HITSIEVE_COLLAPSE")]
    pub collapse: Option<u32>,

    /// Hits per page
    #[arg(short = 'n', long, allow_negative_numbers = true, env = "HITSIEVE_HITS_PER_PAGE")]
    pub hits_per_page: Option<i64>,

    /// Offset of the first hit
    #[arg(short, long, allow_negative_numbers = true)]
    pub offset: Option<i64>,

    /// Minimum number of surviving hits to check for
    #[arg(short, long, allow_negative_numbers = true, env = "HITSIEVE_MIN_HITS")]
    pub min_hits: Option<i64>,
}

impl ControlArgs {
    /// Flags as request parameters, in the order they override a config file.
    ///
    /// `docid_order` and `value_slots` are typed already and are applied
    /// directly by the caller.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(sort) = &self.sort {
            params.push(("SORT", sort.clone()));
        }
        if self.reverse {
            params.push(("SORTREVERSE", "1".to_string()));
        }
        if self.sort_after {
            params.push(("SORTAFTER", "1".to_string()));
        }
        if let Some(threshold) = &self.threshold {
            params.push(("THRESHOLD", threshold.clone()));
        }
        if let Some(collapse) = self.collapse {
            params.push(("COLLAPSE", collapse.to_string()));
        }
        if let Some(hits_per_page) = self.hits_per_page {
            params.push(("HITSPERPAGE", hits_per_page.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("TOPDOC", offset.to_string()));
        }
        if let Some(min_hits) = self.min_hits {
            params.push(("MINHITS", min_hits.to_string()));
        }
        params
    }
}

/// Arguments for selecting a page
#[derive(Parser, Debug, Clone)]
pub struct SelectArgs {
    /// Candidate file (JSONL, one candidate per line); stdin when omitted or "-"
    #[arg(value_name = "CANDIDATES")]
    pub candidates: Option<PathBuf>,

    /// Stored values file (JSONL) used to fill in missing value slots
    #[arg(long, value_name = "VALUES_FILE")]
    pub values: Option<PathBuf>,

    /// Selection controls
    #[command(flatten)]
    pub controls: ControlArgs,
}

/// Arguments for checking a configuration
#[derive(Parser, Debug, Clone)]
pub struct CheckConfigArgs {
    /// Selection controls
    #[command(flatten)]
    pub controls: ControlArgs,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
