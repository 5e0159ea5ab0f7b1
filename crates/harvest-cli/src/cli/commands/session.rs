//! `harvest session encode|import-har` – build the encoded session string.

use anyhow::{Context, Result};
use harvest_core::session::{encode, parse_tokens_json, tokens_from_har};
use std::path::Path;

pub fn run_session_encode(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let tokens = parse_tokens_json(&bytes)?;
    tracing::info!(tokens = tokens.len(), "encoded session from cookie export");
    println!("{}", encode(&tokens));
    Ok(())
}

pub fn run_session_import_har(path: &Path, host: Option<&str>) -> Result<()> {
    let tokens = tokens_from_har(path, host)?;
    tracing::info!(tokens = tokens.len(), "encoded session from HAR capture");
    println!("{}", encode(&tokens));
    Ok(())
}
