//! `harvest status` – list partial result files.

use anyhow::Result;
use harvest_core::config::HarvestConfig;
use harvest_core::storage::PartialStore;

pub fn run_status(cfg: &HarvestConfig) -> Result<()> {
    let store = PartialStore::new(&cfg.partials_dir);
    let partials = store.load_all()?;
    if partials.is_empty() {
        println!("No partial result files in {}.", store.dir().display());
        return Ok(());
    }

    println!("{:<6} {:<22} {:<6} {}", "CHUNK", "CREATED", "ROWS", "FILE");
    let mut total = 0;
    for p in &partials {
        let chunk = p
            .provenance
            .chunk
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        let created = p
            .provenance
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<6} {:<22} {:<6} {}", chunk, created, p.rows.len(), p.provenance.name);
        total += p.rows.len();
    }
    println!("{} file(s), {} row(s) before consolidation", partials.len(), total);
    Ok(())
}
