//! Partial result sets: one file per chunk run, named by chunk and completion time.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs::File;
use std::path::{Path, PathBuf};

use super::write_rows_atomic;
use crate::record::{read_rows, Row};

pub const PARTIAL_PREFIX: &str = "partial_";
const PARTIAL_EXT: &str = "csv";
const STAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Where a partial came from. Files that do not follow the naming scheme
/// have no chunk and no timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub chunk: Option<usize>,
    pub created_at: Option<DateTime<Utc>>,
    /// 1 for the first write of a chunk in a given second, `N` for a `-N` collision suffix.
    pub attempt: u32,
    /// File name within the partials directory.
    pub name: String,
}

impl Provenance {
    pub fn from_file_name(name: &str) -> Self {
        match parse_partial_name(name) {
            Some((chunk, created_at, attempt)) => Self {
                chunk: Some(chunk),
                created_at: Some(created_at),
                attempt,
                name: name.to_string(),
            },
            None => Self {
                chunk: None,
                created_at: None,
                attempt: 1,
                name: name.to_string(),
            },
        }
    }
}

/// Rows from one chunk run plus their provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialResultSet {
    pub provenance: Provenance,
    pub rows: Vec<Row>,
}

/// `partial_NNN_YYYYMMDDTHHMMSSZ.csv`
pub fn partial_file_name(chunk: usize, created_at: DateTime<Utc>) -> String {
    format!(
        "{}{:03}_{}.{}",
        PARTIAL_PREFIX,
        chunk,
        created_at.format(STAMP_FORMAT),
        PARTIAL_EXT
    )
}

/// Chunk number, creation time and attempt from a partial file name. A
/// trailing `-N` collision suffix after the timestamp is attempt `N`;
/// without one the attempt is 1.
pub fn parse_partial_name(name: &str) -> Option<(usize, DateTime<Utc>, u32)> {
    let stem = name
        .strip_prefix(PARTIAL_PREFIX)?
        .strip_suffix(PARTIAL_EXT)?
        .strip_suffix('.')?;
    let (chunk, stamp) = stem.split_once('_')?;
    if chunk.is_empty() || !chunk.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let chunk: usize = chunk.parse().ok()?;
    let (stamp, attempt) = match stamp.split_once('-') {
        Some((s, n)) if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) => (s, n.parse().ok()?),
        Some(_) => return None,
        None => (stamp, 1),
    };
    let naive = NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()?;
    Some((chunk, naive.and_utc(), attempt))
}

/// The partials directory shared by all workers.
#[derive(Debug, Clone)]
pub struct PartialStore {
    dir: PathBuf,
}

impl PartialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persists `rows` for `chunk` and returns the written path. An existing
    /// file with the same name is never overwritten.
    pub fn write(&self, chunk: usize, created_at: DateTime<Utc>, rows: &[Row]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create partials dir: {}", self.dir.display()))?;

        let base = partial_file_name(chunk, created_at);
        let stem = base.trim_end_matches(".csv");
        let mut path = self.dir.join(&base);
        let mut attempt: u32 = 2;
        while path.exists() {
            path = self.dir.join(format!("{}-{}.{}", stem, attempt, PARTIAL_EXT));
            attempt += 1;
        }

        write_rows_atomic(&path, rows)?;
        tracing::info!(path = %path.display(), rows = rows.len(), "partial result written");
        Ok(path)
    }

    /// Every `.csv` file in the directory with its provenance, sorted by name.
    /// A missing directory is empty.
    pub fn list(&self) -> Result<Vec<(PathBuf, Provenance)>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read partials dir: {}", self.dir.display()))
            }
        };

        let mut out = Vec::new();
        for entry in entries {
            let entry = entry.context("read partials dir entry")?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(PARTIAL_EXT) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            out.push((path, Provenance::from_file_name(&name)));
        }
        out.sort_by(|a, b| a.1.name.cmp(&b.1.name));
        Ok(out)
    }

    /// Loads every partial. Files that cannot be opened or parsed are skipped with a warning.
    pub fn load_all(&self) -> Result<Vec<PartialResultSet>> {
        let mut sets = Vec::new();
        for (path, provenance) in self.list()? {
            match load_file(&path) {
                Ok(rows) => {
                    if provenance.chunk.is_none() {
                        tracing::debug!(file = %provenance.name, "partial without chunk/timestamp in name");
                    }
                    sets.push(PartialResultSet { provenance, rows });
                }
                Err(e) => tracing::warn!(path = %path.display(), "skipping unreadable partial: {:#}", e),
            }
        }
        Ok(sets)
    }
}

fn load_file(path: &Path) -> Result<Vec<Row>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    read_rows(file)
}
