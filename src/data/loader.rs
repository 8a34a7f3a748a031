use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::model::{artifact_reason, ConstraintRow, Dataset};
use crate::config::NOT_GIVEN;
use crate::error::DataFormatError;

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

const FRACTIONS: &str = "Fractions";
const TYPE: &str = "Type";
const TISSUE: &str = "Tissue";

const CONTOURING_ALIASES: &[&str] = &["Contouring instructions", "Metric"];
const VOLUME_ALIASES: &[&str] = &["Volume"];
const VOLUME_MAX_ALIASES: &[&str] = &["Volume max (Gy)"];
const MAX_POINT_ALIASES: &[&str] = &["Max point dose (Gy)"];
const ENDPOINT_ALIASES: &[&str] = &["Endpoint"];
const OCCURRENCE_ALIASES: &[&str] = &["Occ", "Occurrence"];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the constraint table from a CSV file on disk.
pub fn load_file(path: &Path) -> Result<Dataset, DataFormatError> {
    let file = File::open(path).map_err(|source| DataFormatError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = load_reader(file)?;
    log::info!(
        "Loaded {} constraint rows from {}",
        dataset.len(),
        path.display()
    );
    Ok(dataset)
}

/// Parse and normalise a constraint table from any CSV source.
///
/// Required columns are `Fractions`, `Type` and `Tissue`; all others are
/// optional and read as empty when absent. Footnote rows (`*…`), the
/// abbreviations legend and blank tissues are dropped.
pub fn load_reader<R: Read>(reader: R) -> Result<Dataset, DataFormatError> {
    // Rows extracted from PDF tables are often ragged.
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(normalise_header)
        .collect();
    let columns = ColumnMap::resolve(&headers)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for (source_index, result) in reader.records().enumerate() {
        let record = result?;
        let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).map(str::trim).unwrap_or("");

        let tissue = cell(Some(columns.tissue));
        if let Some(reason) = artifact_reason(tissue) {
            log::debug!("Skipping record {source_index} ({reason}): {tissue:?}");
            skipped += 1;
            continue;
        }

        let contouring = match cell(columns.contouring) {
            "" => NOT_GIVEN,
            text => text,
        };

        rows.push(ConstraintRow {
            fractions: parse_fractions(cell(Some(columns.fractions)), source_index),
            tissue: tissue.to_string(),
            type_label: cell(Some(columns.type_)).to_string(),
            contouring_instructions: contouring.to_string(),
            volume: cell(columns.volume).to_string(),
            volume_max_gy: cell(columns.volume_max).to_string(),
            max_point_dose_gy: cell(columns.max_point).to_string(),
            endpoint: cell(columns.endpoint).to_string(),
            occurrence: parse_occurrence(cell(columns.occurrence), source_index),
            source_index,
        });
    }

    log::debug!("Kept {} rows, skipped {skipped} artifact rows", rows.len());
    Ok(Dataset::new(rows, columns.occurrence.is_some()))
}

// ---------------------------------------------------------------------------
// Header resolution
// ---------------------------------------------------------------------------

/// Column positions resolved from the header row.
struct ColumnMap {
    fractions: usize,
    type_: usize,
    tissue: usize,
    contouring: Option<usize>,
    volume: Option<usize>,
    volume_max: Option<usize>,
    max_point: Option<usize>,
    endpoint: Option<usize>,
    occurrence: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &[String]) -> Result<Self, DataFormatError> {
        let fractions = find_column(headers, &[FRACTIONS]);
        let type_ = find_column(headers, &[TYPE]);
        let tissue = find_column(headers, &[TISSUE]);

        match (fractions, type_, tissue) {
            (Some(fractions), Some(type_), Some(tissue)) => Ok(ColumnMap {
                fractions,
                type_,
                tissue,
                contouring: find_column(headers, CONTOURING_ALIASES),
                volume: find_column(headers, VOLUME_ALIASES),
                volume_max: find_column(headers, VOLUME_MAX_ALIASES),
                max_point: find_column(headers, MAX_POINT_ALIASES),
                endpoint: find_column(headers, ENDPOINT_ALIASES),
                occurrence: find_column(headers, OCCURRENCE_ALIASES),
            }),
            _ => {
                let missing = [(FRACTIONS, fractions), (TYPE, type_), (TISSUE, tissue)]
                    .into_iter()
                    .filter(|(_, idx)| idx.is_none())
                    .map(|(name, _)| name)
                    .collect();
                Err(DataFormatError::MissingColumns { missing })
            }
        }
    }
}

/// Trim, drop a UTF-8 BOM and collapse runs of whitespace.
fn normalise_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// First header matching any alias (case-insensitive). Later duplicates are
/// ignored.
fn find_column(headers: &[String], aliases: &[&str]) -> Option<usize> {
    let mut hits = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| aliases.iter().any(|a| h.eq_ignore_ascii_case(a)))
        .map(|(i, _)| i);

    let first = hits.next()?;
    for dup in hits {
        log::warn!(
            "Column '{}' duplicates '{}'; using the first occurrence",
            headers[dup],
            headers[first]
        );
    }
    Some(first)
}

// ---------------------------------------------------------------------------
// Cell coercion
// ---------------------------------------------------------------------------

/// Whole, non-negative numbers only; `"3"` and `"3.0"` both give 3.
fn parse_fractions(s: &str, row: usize) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    if let Ok(n) = s.parse::<u32>() {
        return Some(n);
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => {
            Some(f as u32)
        }
        _ => {
            log::warn!("Record {row}: Fractions value {s:?} is not a whole number; ignored");
            None
        }
    }
}

fn parse_occurrence(s: &str, row: usize) -> Option<f64> {
    if s.is_empty() {
        return None;
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() => Some(f),
        _ => {
            log::warn!("Record {row}: Occ value {s:?} is not numeric; ignored");
            None
        }
    }
}
