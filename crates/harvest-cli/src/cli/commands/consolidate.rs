//! `harvest consolidate` – merge partial files into the canonical dataset.

use anyhow::Result;
use harvest_core::config::HarvestConfig;
use harvest_core::consolidate::{consolidate, ConsolidateError};
use harvest_core::storage::PartialStore;
use std::path::Path;

pub fn run_consolidate(cfg: &HarvestConfig, input: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let store = PartialStore::new(input.unwrap_or(cfg.partials_dir.as_path()));
    let output = output.unwrap_or(cfg.output_path.as_path());
    let partials = store.load_all()?;

    let report = match consolidate(&partials) {
        Ok(report) => report,
        Err(ConsolidateError::NoInputData) => {
            tracing::warn!(dir = %store.dir().display(), "no partial result files found");
            println!(
                "No partial result files in {}; nothing to consolidate.",
                store.dir().display()
            );
            return Ok(());
        }
    };

    report.dataset.write(output)?;
    println!(
        "Merged {} partial(s): {} input row(s), {} output row(s), {} duplicate(s) removed -> {}",
        report.partials,
        report.input_rows,
        report.output_rows,
        report.duplicates_removed,
        output.display()
    );
    Ok(())
}
