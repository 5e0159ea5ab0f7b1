//! Page driver capability.
//!
//! The fetch engine only depends on the [`PageDriver`] trait: apply
//! credentials, set a client fingerprint, navigate with a bounded wait, read
//! the resolved URL and title, wait for an element, and extract the data
//! table as raw cells. Any rendering engine can sit behind it; the crate ships
//! a libcurl-backed driver for static HTML.

mod curl_page;
pub mod html;
#[cfg(test)]
pub(crate) mod scripted;

pub use curl_page::CurlPageDriver;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::session::CredentialToken;

/// Browser window size reported to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Client identity presented to the target: user agent plus viewport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub user_agent: String,
    pub viewport: Viewport,
}

/// One table cell as found in the document, before field rules are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCell {
    /// Whitespace-normalized text of the whole cell.
    pub text: String,
    /// Text of the first anchor inside the cell, if any.
    pub anchor_text: Option<String>,
    /// `href` of the first anchor, resolved against the page URL.
    pub anchor_href: Option<String>,
}

impl RawCell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn link(text: impl Into<String>, href: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            anchor_text: Some(text.clone()),
            text,
            anchor_href: Some(href.into()),
        }
    }
}

pub type RawRow = Vec<RawCell>;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("no page loaded")]
    NoPage,
    #[error("invalid selector {0:?}")]
    Selector(String),
    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Attach the whole credential bundle to subsequent requests.
    async fn apply_credentials(&mut self, tokens: &[CredentialToken]) -> Result<(), DriverError>;

    async fn set_fingerprint(&mut self, fingerprint: &Fingerprint) -> Result<(), DriverError>;

    /// Load `url` and wait (at most `timeout`) for the page to settle.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), DriverError>;

    /// URL of the loaded document after redirects.
    async fn current_url(&self) -> Result<String, DriverError>;

    async fn title(&self) -> Result<String, DriverError>;

    /// Returns whether an element matching `selector` appeared within `timeout`.
    async fn wait_for_element(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, DriverError>;

    /// All rows (header included) of the first table matching `selector`.
    async fn extract_table(&self, selector: &str) -> Result<Vec<RawRow>, DriverError>;
}
