//! Sequential chunk execution: fetch, pause, repeat, then persist.

use anyhow::Result;
use chrono::Utc;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::pacing::{seeded_rng, Pacer};
use super::summary::RunSummary;
use crate::config::HarvestConfig;
use crate::driver::PageDriver;
use crate::fetch::{FetchEngine, FetchSettings};
use crate::partition::WorkChunk;
use crate::record::Row;
use crate::session::SessionHandle;
use crate::storage::{PartialResultSet, PartialStore, Provenance};

#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub fetch: FetchSettings,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub seed: Option<u64>,
}

impl RunnerSettings {
    pub fn from_config(cfg: &HarvestConfig) -> Self {
        Self {
            fetch: FetchSettings::from_config(cfg),
            min_delay: cfg.pacing.min_delay(),
            max_delay: cfg.pacing.max_delay(),
            seed: cfg.pacing.seed,
        }
    }
}

/// What one chunk run produced.
#[derive(Debug)]
pub struct ChunkOutcome {
    pub partial: PartialResultSet,
    pub path: PathBuf,
    pub summary: RunSummary,
}

/// Runs every URL of a chunk through one fetch engine with one driver.
pub struct ChunkRunner<D: PageDriver> {
    driver: D,
    engine: FetchEngine,
    pacer: Pacer,
    store: PartialStore,
    cancel: CancellationToken,
}

impl<D: PageDriver> ChunkRunner<D> {
    pub fn new(
        driver: D,
        settings: RunnerSettings,
        store: PartialStore,
        cancel: CancellationToken,
    ) -> Self {
        let mut rng = seeded_rng(settings.seed);
        let engine = FetchEngine::new(settings.fetch, &mut rng);
        let pacer = Pacer::new(settings.min_delay, settings.max_delay, rng);
        Self {
            driver,
            engine,
            pacer,
            store,
            cancel,
        }
    }

    /// Fetches every URL and accumulates rows. Page failures are counted,
    /// never returned; cancellation stops before the next fetch.
    pub async fn collect(&mut self, chunk: &WorkChunk, session: &SessionHandle) -> (Vec<Row>, RunSummary) {
        let total = chunk.len();
        let mut summary = RunSummary::new(chunk.sequence, total);
        let mut rows = Vec::new();

        tracing::info!(
            chunk = chunk.sequence,
            urls = total,
            user_agent = %self.engine.fingerprint().user_agent,
            "chunk run started"
        );

        for (i, url) in chunk.urls.iter().enumerate() {
            let go_on = if i == 0 {
                !self.cancel.is_cancelled()
            } else {
                self.pacer.pause(&self.cancel).await
            };
            if !go_on {
                summary.cancelled = true;
                summary.skipped = total - i;
                tracing::warn!(chunk = chunk.sequence, skipped = summary.skipped, "chunk run cancelled");
                break;
            }

            match self.engine.fetch(&mut self.driver, session, url).await {
                Ok(page_rows) => {
                    tracing::info!(url = %url, rows = page_rows.len(), "page ok");
                    summary.record_success(page_rows.len());
                    rows.extend(page_rows);
                }
                Err(failure) => {
                    if failure.kind.needs_operator() {
                        tracing::error!(url = %url, kind = %failure.kind, "page blocked: {}", failure.message);
                    } else {
                        tracing::warn!(url = %url, kind = %failure.kind, "page failed: {}", failure.message);
                    }
                    summary.record_failure(url, &failure);
                }
            }
        }

        (rows, summary)
    }

    /// [`collect`](Self::collect), then persist the rows as a partial result
    /// set (even when empty) tagged with the chunk number and completion time.
    pub async fn run(&mut self, chunk: &WorkChunk, session: &SessionHandle) -> Result<ChunkOutcome> {
        let (rows, mut summary) = self.collect(chunk, session).await;
        let finished_at = Utc::now();
        summary.finished_at = Some(finished_at);

        let path = self.store.write(chunk.sequence, finished_at, &rows)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let attempt = Provenance::from_file_name(&name).attempt;

        tracing::info!(
            chunk = chunk.sequence,
            successes = summary.successes,
            failures = summary.failures,
            rows = summary.rows,
            cancelled = summary.cancelled,
            "chunk run finished"
        );
        if summary.operator_failures() > 0 {
            tracing::error!(
                count = summary.operator_failures(),
                "pages hit a challenge or login page; refresh the session before rerunning"
            );
        }

        Ok(ChunkOutcome {
            partial: PartialResultSet {
                provenance: Provenance {
                    chunk: Some(chunk.sequence),
                    created_at: Some(finished_at),
                    attempt,
                    name,
                },
                rows,
            },
            path,
            summary,
        })
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }
}
