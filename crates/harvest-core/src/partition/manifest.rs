//! On-disk chunk plan: `chunk_NNN.txt` files and `manifest.json`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::chunk::WorkChunk;

pub const MANIFEST_FILE: &str = "manifest.json";

const CHUNK_PREFIX: &str = "chunk_";
const CHUNK_SUFFIX: &str = ".txt";

/// Summary of a written plan, consumed by the external scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkManifest {
    pub total_pages: usize,
    pub quota: usize,
    pub total_chunks: usize,
    pub generated_at: DateTime<Utc>,
}

/// Zero-pad width for chunk ids: at least 3, wider for very large plans.
pub fn id_width(total_chunks: usize) -> usize {
    total_chunks.to_string().len().max(3)
}

pub fn chunk_file_name(sequence: usize, width: usize) -> String {
    format!("{}{:0width$}{}", CHUNK_PREFIX, sequence, CHUNK_SUFFIX, width = width)
}

/// Parses a chunk identifier as given on the command line: `7`, `007` or `chunk_007`.
pub fn parse_chunk_id(id: &str) -> Option<usize> {
    let id = id.trim();
    let id = id.strip_suffix(CHUNK_SUFFIX).unwrap_or(id);
    let id = id.strip_prefix(CHUNK_PREFIX).unwrap_or(id);
    match id.parse::<usize>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(n),
    }
}

/// Writes every chunk file and the manifest into `dir` (created if needed).
pub fn write_plan(
    dir: &Path,
    chunks: &[WorkChunk],
    total_pages: usize,
    quota: usize,
) -> Result<ChunkManifest> {
    fs::create_dir_all(dir).with_context(|| format!("create dir: {}", dir.display()))?;
    let width = id_width(chunks.len());

    for chunk in chunks {
        let path = dir.join(chunk_file_name(chunk.sequence, width));
        let mut body = chunk.urls.join("\n");
        body.push('\n');
        fs::write(&path, body).with_context(|| format!("write chunk: {}", path.display()))?;
    }

    let manifest = ChunkManifest {
        total_pages,
        quota,
        total_chunks: chunks.len(),
        generated_at: Utc::now(),
    };
    let path = dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(&manifest).context("serialize manifest")?;
    fs::write(&path, json).with_context(|| format!("write manifest: {}", path.display()))?;

    tracing::info!(
        dir = %dir.display(),
        chunks = chunks.len(),
        total_pages,
        quota,
        "wrote chunk plan"
    );
    Ok(manifest)
}

pub fn read_manifest(dir: &Path) -> Result<ChunkManifest> {
    let path = dir.join(MANIFEST_FILE);
    let bytes = fs::read(&path).with_context(|| format!("read manifest: {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse manifest: {}", path.display()))
}

/// Loads one chunk by identifier. Fails if the file is missing or lists no URLs.
///
/// The file is located by number, so any zero-padding width is accepted.
pub fn load_chunk(dir: &Path, id: &str) -> Result<WorkChunk> {
    let sequence =
        parse_chunk_id(id).with_context(|| format!("invalid chunk identifier: {:?}", id))?;

    let path = find_chunk_file(dir, sequence)?
        .with_context(|| format!("chunk {} not found in {}", sequence, dir.display()))?;
    let text = fs::read_to_string(&path)
        .with_context(|| format!("read chunk: {}", path.display()))?;

    let urls: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect();
    if urls.is_empty() {
        anyhow::bail!("chunk file has no URLs: {}", path.display());
    }

    Ok(WorkChunk { sequence, urls })
}

fn find_chunk_file(dir: &Path, sequence: usize) -> Result<Option<std::path::PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("read dir: {}", dir.display())),
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !(name.starts_with(CHUNK_PREFIX) && name.ends_with(CHUNK_SUFFIX)) {
            continue;
        }
        if parse_chunk_id(name) == Some(sequence) {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}
