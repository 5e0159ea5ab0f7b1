//! `harvest plan` – partition the page range into chunk files.

use anyhow::Result;
use harvest_core::config::HarvestConfig;
use harvest_core::partition::{partition, write_plan};
use std::path::Path;

pub fn run_plan(
    cfg: &HarvestConfig,
    total_pages: usize,
    quota: Option<usize>,
    out: Option<&Path>,
) -> Result<()> {
    let quota = quota.unwrap_or(cfg.quota);
    let dir = out.unwrap_or(cfg.chunks_dir.as_path());
    let chunks = partition(total_pages, quota, &cfg.url_template)?;
    let manifest = write_plan(dir, &chunks, total_pages, quota)?;
    println!(
        "Wrote {} chunk(s) of up to {} page(s) for {} page(s) to {}",
        manifest.total_chunks,
        quota,
        total_pages,
        dir.display()
    );
    Ok(())
}
