//! CLI for harvest.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use harvest_core::config::{self, HarvestConfig};
use std::path::PathBuf;

use commands::{
    run_chunk, run_consolidate, run_plan, run_session_encode, run_session_import_har, run_status,
};

/// Top-level CLI for harvest.
#[derive(Debug, Parser)]
#[command(name = "harvest")]
#[command(about = "harvest: quota-sized crawl chunks, paced page fetches, last-writer-wins merge", long_about = None)]
pub struct Cli {
    /// Use this config file instead of ~/.config/harvest/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log to stderr instead of the state-dir log file (CI runners).
    #[arg(long, global = true)]
    pub log_stderr: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Split the page range into chunk files plus a manifest.
    Plan {
        /// Number of pages to crawl.
        #[arg(long, value_name = "N")]
        total_pages: usize,
        /// Pages per chunk (defaults to `quota` from the config).
        #[arg(long, value_name = "Q")]
        quota: Option<usize>,
        /// Output directory (defaults to `chunks_dir` from the config).
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Fetch every page of one chunk and write a partial result file.
    Chunk {
        /// Chunk number or file name (`7`, `007`, `chunk_007.txt`).
        id: String,
        /// Also write the run summary as JSON to this path.
        #[arg(long, value_name = "PATH")]
        summary: Option<PathBuf>,
    },

    /// Merge all partial result files into the canonical dataset.
    Consolidate {
        /// Partials directory (defaults to `partials_dir` from the config).
        #[arg(long, value_name = "DIR")]
        input: Option<PathBuf>,
        /// Dataset path (defaults to `output_path` from the config).
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Produce the encoded session string for the session environment variable.
    Session {
        #[command(subcommand)]
        action: SessionCommand,
    },

    /// List partial result files with chunk, timestamp and row count.
    Status,
}

#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// Encode a JSON cookie export (array or `{"cookies": [...]}`).
    Encode {
        /// Path to the cookie JSON file.
        path: PathBuf,
    },
    /// Build the session from the Cookie headers captured in a HAR file.
    ImportHar {
        /// Path to the HAR file.
        path: PathBuf,
        /// Only use requests to this host.
        #[arg(long)]
        host: Option<String>,
    },
}

impl Cli {
    fn load_config(&self) -> Result<HarvestConfig> {
        match &self.config {
            Some(path) => config::load_from_path(path),
            None => config::load_or_init(),
        }
    }

    pub async fn run(self) -> Result<()> {
        let cfg = self.load_config()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match self.command {
            CliCommand::Plan {
                total_pages,
                quota,
                out,
            } => run_plan(&cfg, total_pages, quota, out.as_deref())?,
            CliCommand::Chunk { id, summary } => run_chunk(&cfg, &id, summary.as_deref()).await?,
            CliCommand::Consolidate { input, output } => {
                run_consolidate(&cfg, input.as_deref(), output.as_deref())?
            }
            CliCommand::Session { action } => match action {
                SessionCommand::Encode { path } => run_session_encode(&path)?,
                SessionCommand::ImportHar { path, host } => {
                    run_session_import_har(&path, host.as_deref())?
                }
            },
            CliCommand::Status => run_status(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
