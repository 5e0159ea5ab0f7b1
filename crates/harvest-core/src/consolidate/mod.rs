//! Last-writer-wins merge of partial result sets into the canonical dataset.
//!
//! Partials are folded oldest first (no timestamp counts as oldest, then
//! chunk number, then collision attempt, then file name), so for a shared key
//! the row from the most recent partial survives and ties resolve the same
//! way on every run.

use anyhow::Result;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::record::Row;
use crate::storage::{write_rows_atomic, PartialResultSet};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsolidateError {
    #[error("no partial result sets to consolidate")]
    NoInputData,
}

/// Merged rows, one per unique id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalDataset {
    pub rows: Vec<Row>,
}

impl CanonicalDataset {
    /// Replaces `path` atomically with the dataset.
    pub fn write(&self, path: &Path) -> Result<()> {
        write_rows_atomic(path, &self.rows)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidationReport {
    pub dataset: CanonicalDataset,
    pub partials: usize,
    pub input_rows: usize,
    pub output_rows: usize,
    pub duplicates_removed: usize,
}

fn fold_order(a: &PartialResultSet, b: &PartialResultSet) -> Ordering {
    let (pa, pb) = (&a.provenance, &b.provenance);
    pa.created_at
        .cmp(&pb.created_at)
        .then(pa.chunk.cmp(&pb.chunk))
        .then(pa.attempt.cmp(&pb.attempt))
        .then_with(|| pa.name.cmp(&pb.name))
}

/// Numeric ranks ascending, non-numeric ranks after them, then by id.
fn output_order(a: &Row, b: &Row) -> Ordering {
    let rank = |r: &Row| r.rank.trim().parse::<u64>().ok();
    match (rank(a), rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.unique_id.cmp(&b.unique_id))
}

pub fn consolidate(partials: &[PartialResultSet]) -> Result<ConsolidationReport, ConsolidateError> {
    if partials.is_empty() {
        return Err(ConsolidateError::NoInputData);
    }

    let mut ordered: Vec<&PartialResultSet> = partials.iter().collect();
    ordered.sort_by(|a, b| fold_order(a, b));

    let input_rows: usize = partials.iter().map(|p| p.rows.len()).sum();
    let mut by_id: HashMap<String, Row> = HashMap::with_capacity(input_rows);
    for partial in ordered {
        for row in &partial.rows {
            let mut row = row.clone();
            row.unique_id = row.key();
            if let Some(old) = by_id.insert(row.unique_id.clone(), row) {
                tracing::trace!(id = %old.unique_id, from = %partial.provenance.name, "row replaced");
            }
        }
    }

    let mut rows: Vec<Row> = by_id.into_values().collect();
    rows.sort_by(output_order);
    let output_rows = rows.len();
    let duplicates_removed = input_rows - output_rows;
    tracing::info!(
        partials = partials.len(),
        input_rows,
        output_rows,
        duplicates_removed,
        "consolidated partial results"
    );

    Ok(ConsolidationReport {
        dataset: CanonicalDataset { rows },
        partials: partials.len(),
        input_rows,
        output_rows,
        duplicates_removed,
    })
}
