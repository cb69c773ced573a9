//! Candidate URL loading from a CSV dataset.

use crate::error::DatasetError;
use itertools::Itertools;
use std::path::Path;
use tracing::{info, instrument};

/// Read the `column` of a headered CSV file as a list of candidate URLs.
///
/// Cells are trimmed, empty cells are dropped and duplicates are removed
/// while keeping first-seen order. Rows that are shorter than the header
/// count as empty for that column.
#[instrument(level = "info", skip_all, fields(path = %path.display(), %column))]
pub fn load_candidates(path: &Path, column: &str) -> Result<Vec<String>, DatasetError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let index = reader
        .headers()?
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| DatasetError::MissingColumn(column.to_string()))?;

    let mut rows = 0usize;
    let mut cells = Vec::new();
    for row in reader.records() {
        let row = row?;
        rows += 1;
        if let Some(url) = row.get(index).map(str::trim).filter(|u| !u.is_empty()) {
            cells.push(url.to_string());
        }
    }

    let candidates: Vec<String> = cells.into_iter().unique().collect();
    info!(rows, candidates = candidates.len(), "Loaded candidate URLs");
    Ok(candidates)
}
