//! Row files on disk.
//!
//! Every file is first written to a `.part` sibling, synced, then renamed
//! into place, so readers only ever see complete files.

mod partial;

pub use partial::{
    parse_partial_name, partial_file_name, PartialResultSet, PartialStore, Provenance,
    PARTIAL_PREFIX,
};

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::record::{write_rows, Row};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `dataset.csv` → `dataset.csv.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Writes `rows` (header included) to `final_path` through a synced temp file and rename.
pub fn write_rows_atomic(final_path: &Path, rows: &[Row]) -> Result<()> {
    if let Some(parent) = final_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    let tmp = temp_path(final_path);
    let file = File::options()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp)
        .with_context(|| format!("failed to create temp file: {}", tmp.display()))?;
    let mut w = BufWriter::new(file);
    write_rows(&mut w, rows).with_context(|| format!("failed to write {}", tmp.display()))?;
    w.flush().context("flush row file")?;
    w.get_ref().sync_all().context("row file sync failed")?;
    drop(w);

    std::fs::rename(&tmp, final_path).with_context(|| {
        format!(
            "failed to rename {} to {}",
            tmp.display(),
            final_path.display()
        )
    })?;
    Ok(())
}
