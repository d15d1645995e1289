//! CSV ingestion for the candidate table and the event log
//!
//! Columns are located by header name; unknown columns are ignored.
//! Every cell is parsed strictly so bad telemetry fails before scoring.

use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::activity::{ActivityId, Candidate, Event};
use crate::error::{RerankError, Result};

const CANDIDATE_TABLE: &str = "candidate";
const EVENT_TABLE: &str = "event";

/// Read a candidate table (`activity_id` or `id`, `title`, `sim`)
pub fn read_candidates<R: Read>(reader: R) -> Result<Vec<Candidate>> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let id_col = find_column(&headers, "activity_id")
        .or_else(|| find_column(&headers, "id"))
        .ok_or(RerankError::MissingColumn {
            table: CANDIDATE_TABLE,
            column: "activity_id",
        })?;
    let title_col = require_column(&headers, CANDIDATE_TABLE, "title")?;
    let sim_col = require_column(&headers, CANDIDATE_TABLE, "sim")?;

    let mut candidates = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        let row = idx + 1;

        let candidate = Candidate {
            activity_id: ActivityId::new(cell(&record, id_col)),
            title: cell(&record, title_col).to_string(),
            sim: parse_float(&record, sim_col, CANDIDATE_TABLE, "sim", row)?,
        };
        candidate.validate(row)?;
        candidates.push(candidate);
    }

    debug!("Read {} candidates", candidates.len());
    Ok(candidates)
}

/// Read an event log (`activity_id`, `dwell_sec`, `clicked`)
pub fn read_events<R: Read>(reader: R) -> Result<Vec<Event>> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let id_col = require_column(&headers, EVENT_TABLE, "activity_id")?;
    let dwell_col = require_column(&headers, EVENT_TABLE, "dwell_sec")?;
    let clicked_col = require_column(&headers, EVENT_TABLE, "clicked")?;

    let mut events = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        let row = idx + 1;

        let event = Event {
            activity_id: ActivityId::new(cell(&record, id_col)),
            dwell_sec: parse_float(&record, dwell_col, EVENT_TABLE, "dwell_sec", row)?,
            clicked: parse_clicked(&record, clicked_col, row)?,
        };
        event.validate(row)?;
        events.push(event);
    }

    debug!("Read {} events", events.len());
    Ok(events)
}

pub fn load_candidates(path: &Path) -> Result<Vec<Candidate>> {
    read_candidates(File::open(path)?)
}

pub fn load_events(path: &Path) -> Result<Vec<Event>> {
    read_events(File::open(path)?)
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn require_column(headers: &StringRecord, table: &'static str, column: &'static str) -> Result<usize> {
    find_column(headers, column).ok_or(RerankError::MissingColumn { table, column })
}

fn cell(record: &StringRecord, col: usize) -> &str {
    record.get(col).unwrap_or("")
}

fn parse_float(
    record: &StringRecord,
    col: usize,
    table: &'static str,
    column: &'static str,
    row: usize,
) -> Result<f64> {
    let raw = cell(record, col);
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(RerankError::InvalidValue {
            table,
            row,
            column,
            value: raw.to_string(),
        }),
    }
}

fn parse_clicked(record: &StringRecord, col: usize, row: usize) -> Result<bool> {
    match cell(record, col) {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(RerankError::InvalidValue {
            table: EVENT_TABLE,
            row,
            column: "clicked",
            value: other.to_string(),
        }),
    }
}
