//! Per-run counters and failure detail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::fetch::{FailureKind, FetchFailure};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlFailure {
    pub url: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome counters of one chunk run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub chunk: usize,
    pub total_urls: usize,
    pub successes: usize,
    pub failures: usize,
    pub rows: usize,
    pub failures_by_kind: BTreeMap<FailureKind, usize>,
    pub failed_urls: Vec<UrlFailure>,
    pub cancelled: bool,
    /// URLs never attempted because of cancellation.
    pub skipped: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    pub fn new(chunk: usize, total_urls: usize) -> Self {
        Self {
            chunk,
            total_urls,
            successes: 0,
            failures: 0,
            rows: 0,
            failures_by_kind: BTreeMap::new(),
            failed_urls: Vec::new(),
            cancelled: false,
            skipped: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn record_success(&mut self, rows: usize) {
        self.successes += 1;
        self.rows += rows;
    }

    pub fn record_failure(&mut self, url: &str, failure: &FetchFailure) {
        self.failures += 1;
        *self.failures_by_kind.entry(failure.kind).or_insert(0) += 1;
        self.failed_urls.push(UrlFailure {
            url: url.to_string(),
            kind: failure.kind,
            message: failure.message.clone(),
        });
    }

    pub fn count(&self, kind: FailureKind) -> usize {
        self.failures_by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Failures that need an operator (challenge pages, expired session).
    pub fn operator_failures(&self) -> usize {
        self.failures_by_kind
            .iter()
            .filter(|(k, _)| k.needs_operator())
            .map(|(_, n)| *n)
            .sum()
    }

    pub fn attempted(&self) -> usize {
        self.successes + self.failures
    }
}
