//! Tracing setup: one append-only log file shared by every run on the machine,
//! or stderr when asked for (CI) or when the file cannot be opened.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,harvest_core=debug,harvest=debug";
const LOG_FILE: &str = "harvest.log";

/// Where log lines ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    File(PathBuf),
    Stderr,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// `~/.local/state/harvest/harvest.log`
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("harvest")?;
    Ok(xdg_dirs.get_state_home().join(LOG_FILE))
}

/// Opens `path` for appending, creating its directory first.
pub fn open_log_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create log dir: {}", dir.display()))?;
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file: {}", path.display()))
}

/// Installs the global subscriber. With `to_file`, lines go to the XDG log
/// file; if that cannot be opened the reason is logged to stderr instead.
/// Several chunk workers may append to the same file, so every run starts
/// with a line carrying its pid.
pub fn init_logging(to_file: bool) -> LogSink {
    if !to_file {
        init_stderr();
        return LogSink::Stderr;
    }

    match log_file_path().and_then(|p| open_log_file(&p).map(|f| (p, f))) {
        Ok((path, file)) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
            tracing::info!(
                pid = std::process::id(),
                version = env!("CARGO_PKG_VERSION"),
                "logging to {}",
                path.display()
            );
            LogSink::File(path)
        }
        Err(e) => {
            init_stderr();
            tracing::warn!("log file unavailable ({:#}); logging to stderr", e);
            LogSink::Stderr
        }
    }
}

fn init_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
