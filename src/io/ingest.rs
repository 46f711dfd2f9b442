//! CSV ingest and validation.
//!
//! Turns a case-by-case table into a `Dataset`. Two columns are required:
//!
//! - `age`: subject age (finite, `>= 0`)
//! - `outcome` (or `died`): `1` for death, `0` for any other outcome
//!
//! Other columns are ignored. Rows that fail to parse are skipped and reported
//! so one bad line does not abort a large import.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{Dataset, Observation};
use crate::error::AppError;

const AGE_COLUMN: &str = "age";
const OUTCOME_COLUMNS: [&str; 2] = ["outcome", "died"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: validated dataset + row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub dataset: Dataset,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load observations from a CSV file.
pub fn load_observations(path: &Path) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_observations(file)
}

/// Load observations from any CSV source.
pub fn read_observations<R: Read>(source: R) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let age_idx = *header_map
        .get(AGE_COLUMN)
        .ok_or_else(|| AppError::new(2, format!("Missing required column: `{AGE_COLUMN}`")))?;
    let outcome_idx = OUTCOME_COLUMNS
        .iter()
        .find_map(|name| header_map.get(*name).copied())
        .ok_or_else(|| AppError::new(2, "Missing required column: `outcome` (or `died`)"))?;

    let mut observations = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header line; CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_row(&record, age_idx, outcome_idx));
        match parsed {
            Ok(obs) => observations.push(obs),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let rows_used = observations.len();
    if rows_used == 0 {
        return Err(AppError::new(2, "No valid rows remain after validation."));
    }
    let dataset = Dataset::from_observations(observations)?;

    Ok(IngestedData {
        dataset,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, age_idx: usize, outcome_idx: usize) -> Result<Observation, String> {
    let age_raw = get_required(record, age_idx, AGE_COLUMN)?;
    let age: f64 = age_raw
        .parse()
        .map_err(|_| format!("Invalid age '{age_raw}'"))?;
    if !(age.is_finite() && age >= 0.0) {
        return Err(format!("Age must be finite and >= 0, got {age}"));
    }

    let outcome_raw = get_required(record, outcome_idx, "outcome")?;
    let died = parse_outcome(outcome_raw)?;
    Ok(Observation { age, died })
}

fn get_required<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, String> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_outcome(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "died" | "deceased" => Ok(true),
        "0" | "false" | "no" | "survived" | "released" => Ok(false),
        _ => Err(format!("Invalid outcome '{s}' (expected 1 or 0)")),
    }
}
