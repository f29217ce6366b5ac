//! Command implementations for the hitsieve CLI.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use log::{debug, info, warn};
use serde::Deserialize;

use crate::candidate::{Candidate, HydratedSource, ValueSlot, ValueStore, VecSource};
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::SelectorConfig;
use crate::error::{Result, SieveError};
use crate::page::ResultPage;

/// A candidate as read from a JSONL stream.
#[derive(Debug, Deserialize)]
pub struct CandidateRecord {
    pub doc_id: u64,
    pub score: f64,
    #[serde(default)]
    pub values: BTreeMap<ValueSlot, String>,
}

impl From<CandidateRecord> for Candidate {
    fn from(record: CandidateRecord) -> Self {
        Candidate {
            doc_id: record.doc_id,
            score: record.score,
            values: record
                .values
                .into_iter()
                .map(|(slot, value)| (slot, value.into_bytes()))
                .collect(),
        }
    }
}

/// Stored values for one document as read from a JSONL stream.
#[derive(Debug, Deserialize)]
pub struct ValueRecord {
    pub doc_id: u64,
    pub values: BTreeMap<ValueSlot, String>,
}

/// Execute a CLI command.
pub fn execute_command(args: HitsieveArgs) -> Result<()> {
    match &args.command {
        Command::Select(select_args) => select_page(select_args, &args),
        Command::CheckConfig(check_args) => check_config(check_args, &args),
    }
}

/// Resolve the effective configuration: file, then query string, then flags.
pub fn resolve_config(controls: &ControlArgs) -> Result<SelectorConfig> {
    let mut config = match &controls.config {
        Some(path) => SelectorConfig::from_file(path)?,
        None => SelectorConfig::default(),
    };

    if let Some(params) = &controls.params {
        config.apply_query_string(params)?;
    }
    config.apply_params(controls.to_params())?;

    if let Some(docid_order) = controls.docid_order {
        config.docid_order = docid_order;
    }
    if let Some(value_slots) = controls.value_slots {
        config.value_slots = value_slots;
    }

    debug!("Resolved selector config: {config:?}");
    Ok(config)
}

/// Read JSONL candidates. Blank lines are skipped.
pub fn read_candidates<R: BufRead>(reader: R) -> Result<Vec<Candidate>> {
    let mut candidates = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: CandidateRecord = serde_json::from_str(&line).map_err(|e| {
            SieveError::parse(format!("candidate on line {}: {e}", line_num + 1))
        })?;
        candidates.push(record.into());
    }
    Ok(candidates)
}

/// Read a JSONL value store. Blank lines are skipped.
pub fn read_value_store<R: BufRead>(reader: R) -> Result<ValueStore> {
    let mut store = ValueStore::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: ValueRecord = serde_json::from_str(&line).map_err(|e| {
            SieveError::parse(format!("values on line {}: {e}", line_num + 1))
        })?;
        for (slot, value) in record.values {
            store.insert(record.doc_id, slot, value);
        }
    }
    Ok(store)
}

fn open_candidates(path: Option<&Path>) -> Result<Vec<Candidate>> {
    match path {
        Some(path) if path != Path::new("-") => {
            info!("Reading candidates from {}", path.display());
            read_candidates(BufReader::new(File::open(path)?))
        }
        _ => {
            info!("Reading candidates from stdin");
            read_candidates(io::stdin().lock())
        }
    }
}

/// Run a selection as described by `args`.
pub fn run_select(args: &SelectArgs) -> Result<ResultPage> {
    let config = resolve_config(&args.controls)?;
    let (sort, collapse, page) = config.to_parts()?;

    let candidates = open_candidates(args.candidates.as_deref())?;
    let source = VecSource::new(candidates);
    let selector = config.selector();

    match &args.values {
        Some(path) => {
            let store = read_value_store(BufReader::new(File::open(path)?))?;
            if store.is_empty() {
                warn!("Value store {} is empty", path.display());
            }
            let mut slots = sort.slots();
            slots.extend(collapse.slot);
            let hydrated = HydratedSource::new(source, store, slots);
            selector.select(hydrated, &sort, &collapse, &page)
        }
        None => selector.select(source, &sort, &collapse, &page),
    }
}

/// Select a page and print it.
fn select_page(args: &SelectArgs, cli_args: &HitsieveArgs) -> Result<()> {
    let start_time = Instant::now();
    let page = run_select(args)?;
    let duration = start_time.elapsed();

    output_result(
        "Selection complete",
        &PageOutput::from_page(&page, duration.as_millis() as u64),
        cli_args,
    )
}

/// Validate the configuration and print the resolved controls.
fn check_config(args: &CheckConfigArgs, cli_args: &HitsieveArgs) -> Result<()> {
    let config = resolve_config(&args.controls)?;
    let (sort, collapse, page) = config.to_parts()?;

    output_result(
        "Configuration is valid",
        &ControlsOutput::new(config.value_slots, &sort, &collapse, &page),
        cli_args,
    )
}
