//! Output formatting for CLI commands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cli::args::{HitsieveArgs, OutputFormat};
use crate::error::Result;
use crate::page::{PageRequest, ResultPage};
use crate::selector::CollapseSpec;
use crate::sort::{SortBy, SortSpec, Threshold};

/// One hit as printed by the CLI.
#[derive(Debug, Serialize, Deserialize)]
pub struct HitOutput {
    pub rank: usize,
    pub doc_id: u64,
    pub score: f64,
    pub collapse_count: u64,
    pub values: BTreeMap<u32, String>,
}

/// Result structure for the select command.
#[derive(Debug, Serialize, Deserialize)]
pub struct PageOutput {
    pub hits: Vec<HitOutput>,
    pub total_hits: usize,
    pub more_results: bool,
    pub min_hits_met: bool,
    pub offset: usize,
    pub page_size: usize,
    pub next_offset: Option<usize>,
    pub previous_offset: Option<usize>,
    pub duration_ms: u64,
}

impl PageOutput {
    /// Build the printable form of a page.
    pub fn from_page(page: &ResultPage, duration_ms: u64) -> Self {
        let hits = page
            .hits
            .iter()
            .enumerate()
            .map(|(i, hit)| HitOutput {
                rank: page.offset + i + 1,
                doc_id: hit.doc_id(),
                score: hit.score(),
                collapse_count: hit.collapse_count,
                values: hit
                    .candidate
                    .values
                    .iter()
                    .map(|(&slot, value)| (slot, String::from_utf8_lossy(value).into_owned()))
                    .collect(),
            })
            .collect();

        PageOutput {
            hits,
            total_hits: page.total_hits,
            more_results: page.more_results,
            min_hits_met: page.min_hits_met,
            offset: page.offset,
            page_size: page.page_size,
            next_offset: page.next_offset(),
            previous_offset: page.previous_offset(),
            duration_ms,
        }
    }
}

/// Result structure for the check-config command.
#[derive(Debug, Serialize, Deserialize)]
pub struct ControlsOutput {
    pub value_slots: u32,
    pub sort: String,
    pub reverse: bool,
    pub threshold: Option<String>,
    pub threshold_stage: String,
    pub docid_order: String,
    pub collapse: Option<u32>,
    pub offset: usize,
    pub page_size: usize,
    pub min_hits: usize,
}

impl ControlsOutput {
    /// Describe resolved selector controls.
    pub fn new(
        value_slots: u32,
        sort: &SortSpec,
        collapse: &CollapseSpec,
        page: &PageRequest,
    ) -> Self {
        let sort_desc = match &sort.sort_by {
            SortBy::Relevance => "relevance".to_string(),
            SortBy::Values(keys) => keys
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
        };
        let threshold = sort.threshold.map(|threshold| match threshold {
            Threshold::Score(score) => format!("{score}"),
            Threshold::Percent(percent) => format!("{percent}%"),
        });

        ControlsOutput {
            value_slots,
            sort: sort_desc,
            reverse: sort.reverse,
            threshold,
            threshold_stage: format!("{:?}", sort.threshold_stage),
            docid_order: format!("{:?}", sort.docid_order),
            collapse: collapse.slot,
            offset: page.offset,
            page_size: page.page_size,
            min_hits: page.min_hits,
        }
    }
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &HitsieveArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &HitsieveArgs) -> Result<()> {
    if args.verbosity() > 1 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;

    if std::any::type_name::<T>().contains("PageOutput") {
        output_page_human(&value)
    } else {
        output_generic_human(&value)
    }
}

/// Output a result page in human format.
fn output_page_human(value: &serde_json::Value) -> Result<()> {
    let Some(obj) = value.as_object() else {
        return Ok(());
    };

    println!("Results:");
    println!("════════");

    if let Some(hits) = obj.get("hits").and_then(|h| h.as_array()) {
        for hit in hits {
            println!();
            let rank = hit.get("rank").and_then(|r| r.as_u64()).unwrap_or(0);
            let doc_id = hit.get("doc_id").and_then(|d| d.as_u64()).unwrap_or(0);
            let score = hit.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0);
            println!("{rank}. doc {doc_id} (Score: {score:.3})");

            let collapsed = hit
                .get("collapse_count")
                .and_then(|c| c.as_u64())
                .unwrap_or(0);
            if collapsed > 0 {
                println!("   +{collapsed} similar");
            }

            if let Some(values) = hit.get("values").and_then(|v| v.as_object()) {
                for (slot, text) in values {
                    if let Some(text) = text.as_str() {
                        println!("   [{slot}] {text}");
                    }
                }
            }
        }
    }

    println!();

    let total = obj.get("total_hits").and_then(|t| t.as_u64()).unwrap_or(0);
    let more = obj
        .get("more_results")
        .and_then(|m| m.as_bool())
        .unwrap_or(false);
    println!(
        "Total hits: {total}{}",
        if more { " (more results)" } else { "" }
    );

    if obj.get("min_hits_met").and_then(|m| m.as_bool()) == Some(false) {
        println!("Minimum hit count not reached");
    }

    if let Some(duration) = obj.get("duration_ms").and_then(|d| d.as_u64()) {
        println!("Selection time: {duration}ms");
    }

    Ok(())
}

/// Output generic data in human format.
fn output_generic_human(value: &serde_json::Value) -> Result<()> {
    match value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                let formatted_val = format_value(val);
                println!("{key}: {formatted_val}");
            }
        }
        _ => {
            let formatted_value = format_value(value);
            println!("{formatted_value}");
        }
    }
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &HitsieveArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format a JSON value for display.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
