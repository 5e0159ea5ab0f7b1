//! `harvest chunk <ID>` – run one chunk with the built-in page driver.

use anyhow::{Context, Result};
use harvest_core::config::HarvestConfig;
use harvest_core::driver::CurlPageDriver;
use harvest_core::partition::load_chunk;
use harvest_core::runner::{ChunkRunner, RunSummary, RunnerSettings};
use harvest_core::session;
use harvest_core::storage::PartialStore;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

pub async fn run_chunk(cfg: &HarvestConfig, id: &str, summary_path: Option<&Path>) -> Result<()> {
    // Setup failures abort here, before any request goes out.
    let chunk = load_chunk(&cfg.chunks_dir, id)?;
    let session = session::from_env(&cfg.session_env)?;
    tracing::info!(chunk = chunk.sequence, tokens = session.len(), "session loaded");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; stopping before the next page");
            on_interrupt.cancel();
        }
    });

    let mut runner = ChunkRunner::new(
        CurlPageDriver::new(),
        RunnerSettings::from_config(cfg),
        PartialStore::new(&cfg.partials_dir),
        cancel,
    );
    let span = tracing::info_span!("chunk_run", chunk = chunk.sequence, pid = std::process::id());
    let outcome = runner.run(&chunk, &session).instrument(span).await?;
    print_summary(&outcome.summary);
    println!("Partial written to {}", outcome.path.display());

    if let Some(path) = summary_path {
        let json = serde_json::to_string_pretty(&outcome.summary).context("serialize run summary")?;
        std::fs::write(path, json)
            .with_context(|| format!("write run summary: {}", path.display()))?;
    }
    Ok(())
}

fn print_summary(s: &RunSummary) {
    println!(
        "Chunk {}: {} ok, {} failed, {} row(s) from {} URL(s)",
        s.chunk, s.successes, s.failures, s.rows, s.total_urls
    );
    for (kind, n) in &s.failures_by_kind {
        println!("  {:<20} {}", kind.as_str(), n);
    }
    if s.operator_failures() > 0 {
        println!("  challenge/login pages hit: refresh the session before rerunning this chunk");
    }
    if s.cancelled {
        println!("  cancelled; {} URL(s) not attempted", s.skipped);
    }
}
