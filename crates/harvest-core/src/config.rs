use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetch::FieldRule;

/// Longest pause or timeout accepted from the config file (one day).
pub const MAX_WAIT_SECS: u64 = 86_400;

/// Inter-request pacing (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Lower bound of the random pause between two fetches, in seconds.
    pub min_delay_secs: f64,
    /// Upper bound of the random pause between two fetches, in seconds.
    pub max_delay_secs: f64,
    /// Fixed RNG seed for pauses and fingerprint choice (None = seeded from the OS).
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: 5.0,
            max_delay_secs: 15.0,
            seed: None,
        }
    }
}

impl PacingConfig {
    pub fn min_delay(&self) -> Duration {
        secs_to_duration(self.min_delay_secs)
    }

    pub fn max_delay(&self) -> Duration {
        secs_to_duration(self.max_delay_secs)
    }
}

/// Negative and NaN become zero; values past `Duration::MAX` saturate.
fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
}

/// Page fetch settings: timeouts, the data table selector and detection markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Bound on navigation (request + page settle).
    pub navigation_timeout_secs: u64,
    /// Bound on waiting for the data table element.
    pub table_timeout_secs: u64,
    /// CSS selector of the data table.
    pub table_selector: String,
    /// Title substrings that mark an anti-automation interstitial.
    pub challenge_title_markers: Vec<String>,
    /// URL substrings (case-insensitive) that mark a verification page.
    pub challenge_url_markers: Vec<String>,
    /// URL or title substrings (case-insensitive) that mark a login page.
    pub login_markers: Vec<String>,
    /// Optional user-agent pool; the built-in desktop pool is used when missing.
    #[serde(default)]
    pub user_agents: Option<Vec<String>>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: 30,
            table_timeout_secs: 20,
            table_selector: "table".to_string(),
            challenge_title_markers: ["Verification", "CAPTCHA", "Bot", "Security Check"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            challenge_url_markers: ["/verify", "/verification", "/captcha", "/challenge"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            login_markers: ["/login", "/signin", "/sign-in", "log in", "sign in"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            user_agents: None,
        }
    }
}

impl FetchConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn table_timeout(&self) -> Duration {
        Duration::from_secs(self.table_timeout_secs)
    }
}

/// Global configuration loaded from `~/.config/harvest/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Target page URL with a `{page}` placeholder for the 1-based page number.
    pub url_template: String,
    /// Per-identity daily fetch quota; bounds chunk size.
    pub quota: usize,
    /// Environment variable holding the base64-encoded session.
    pub session_env: String,
    /// Directory with `chunk_NNN.txt` files and `manifest.json`.
    pub chunks_dir: PathBuf,
    /// Directory where chunk runs write partial result files.
    pub partials_dir: PathBuf,
    /// Canonical dataset written by consolidation.
    pub output_path: PathBuf,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Optional column layout override; the built-in layout is used when missing.
    #[serde(default)]
    pub schema: Option<Vec<FieldRule>>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            url_template: "https://example.com/ranking?page={page}".to_string(),
            quota: 50,
            session_env: "HARVEST_SESSION".to_string(),
            chunks_dir: PathBuf::from("chunks"),
            partials_dir: PathBuf::from("partials"),
            output_path: PathBuf::from("dataset.csv"),
            pacing: PacingConfig::default(),
            fetch: FetchConfig::default(),
            schema: None,
        }
    }
}

impl HarvestConfig {
    /// Rejects values no component can work with.
    pub fn validate(&self) -> Result<()> {
        if self.quota == 0 {
            anyhow::bail!("quota must be at least 1");
        }
        if !self.url_template.contains(crate::partition::PAGE_PLACEHOLDER) {
            anyhow::bail!(
                "url_template must contain {}: {}",
                crate::partition::PAGE_PLACEHOLDER,
                self.url_template
            );
        }
        if !self.pacing.min_delay_secs.is_finite()
            || !self.pacing.max_delay_secs.is_finite()
            || self.pacing.min_delay_secs < 0.0
            || self.pacing.min_delay_secs > self.pacing.max_delay_secs
            || self.pacing.max_delay_secs > MAX_WAIT_SECS as f64
        {
            anyhow::bail!(
                "pacing bounds invalid: min={} max={}",
                self.pacing.min_delay_secs,
                self.pacing.max_delay_secs
            );
        }
        for (name, secs) in [
            ("navigation_timeout_secs", self.fetch.navigation_timeout_secs),
            ("table_timeout_secs", self.fetch.table_timeout_secs),
        ] {
            if secs > MAX_WAIT_SECS {
                anyhow::bail!("{} must be at most {}: {}", name, MAX_WAIT_SECS, secs);
            }
        }
        if self.session_env.trim().is_empty() {
            anyhow::bail!("session_env must name an environment variable");
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("harvest")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<HarvestConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = HarvestConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load and validate configuration from an explicit path (must exist).
pub fn load_from_path(path: &Path) -> Result<HarvestConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: HarvestConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
