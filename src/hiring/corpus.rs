//! Resume corpus loading from CSV.

use crate::hiring::types::Candidate;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

const RESUME_COLUMN: &str = "Resume";
const ID_COLUMN: &str = "ID";
const CATEGORY_COLUMN: &str = "Category";

/// Errors raised while reading the resume corpus.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// File could not be opened or parsed as CSV.
    #[error("Failed to read resume corpus: {0}")]
    Csv(#[from] csv::Error),
    /// Header row lacks the resume column.
    #[error("Resume corpus has no 'Resume' column")]
    MissingResumeColumn,
    /// Sampling step must be positive.
    #[error("Sampling step must be at least 1")]
    InvalidSampling,
}

/// Load candidates from the CSV at `path`, keeping every `every`-th row.
///
/// Rows are numbered from 1; a row is kept when `row_number % every == 0`. The `ID` column is
/// optional and falls back to the row number. When a `Category` column is present and filled,
/// the candidate text reads `Category: <label>. Resume: <resume>`. Blank resumes and repeated
/// resume texts are dropped, keeping the first occurrence.
pub fn load_candidates(path: &Path, every: usize) -> Result<Vec<Candidate>, CorpusError> {
    tracing::debug!(path = %path.display(), every, "Loading resume corpus");
    let reader = csv::Reader::from_path(path)?;
    collect_candidates(reader, every)
}

fn collect_candidates<R: Read>(
    mut reader: csv::Reader<R>,
    every: usize,
) -> Result<Vec<Candidate>, CorpusError> {
    if every == 0 {
        return Err(CorpusError::InvalidSampling);
    }

    let headers = reader.headers()?.clone();
    let resume_column = headers
        .iter()
        .position(|header| header.trim() == RESUME_COLUMN)
        .ok_or(CorpusError::MissingResumeColumn)?;
    let id_column = headers.iter().position(|header| header.trim() == ID_COLUMN);
    let category_column = headers
        .iter()
        .position(|header| header.trim() == CATEGORY_COLUMN);

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for (offset, record) in reader.records().enumerate() {
        let record = record?;
        let row_number = offset + 1;
        if row_number % every != 0 {
            continue;
        }

        let resume = record.get(resume_column).unwrap_or_default().trim();
        if resume.is_empty() || !seen.insert(resume.to_string()) {
            continue;
        }
        let text = match category_column
            .and_then(|column| record.get(column))
            .map(str::trim)
            .filter(|label| !label.is_empty())
        {
            Some(label) => format!("Category: {label}. Resume: {resume}"),
            None => resume.to_string(),
        };

        let id = id_column
            .and_then(|column| record.get(column))
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| row_number.to_string());
        candidates.push(Candidate::new(id, text));
    }

    tracing::debug!(candidates = candidates.len(), "Resume corpus loaded");
    Ok(candidates)
}
