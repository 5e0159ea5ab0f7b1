//! In-memory page driver for unit tests: each URL maps to a scripted outcome.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use super::{DriverError, Fingerprint, PageDriver, RawCell, RawRow};
use crate::session::CredentialToken;

#[derive(Debug, Clone)]
pub enum ScriptedPage {
    /// A loaded page; `table` None means the table never appears.
    Page {
        final_url: Option<String>,
        title: String,
        table: Option<Vec<RawRow>>,
    },
    /// Navigation fails with a driver-reported timeout.
    NavTimeout,
    /// Navigation never completes.
    Hang,
    /// Navigation fails with an arbitrary error.
    Fail(String),
    /// The driver panics during navigation.
    Panic,
    /// Loads, but reading the title never completes.
    StalledTitle,
    /// Loads a data page whose table is present but never finishes extracting.
    StalledTable,
}

#[derive(Debug, Default)]
pub struct ScriptedDriver {
    pages: HashMap<String, ScriptedPage>,
    current: Option<(String, ScriptedPage)>,
    pub credential_calls: usize,
    pub fingerprint_calls: usize,
    pub applied_tokens: Vec<CredentialToken>,
    pub fingerprint: Option<Fingerprint>,
    pub visited: Vec<String>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, page: ScriptedPage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    /// A data page whose table holds a header plus the given body rows.
    pub fn with_table(self, url: &str, body: Vec<RawRow>) -> Self {
        let mut table = vec![header_row()];
        table.extend(body);
        self.with_page(
            url,
            ScriptedPage::Page {
                final_url: None,
                title: "Top Domains".to_string(),
                table: Some(table),
            },
        )
    }
}

pub fn header_row() -> RawRow {
    ["#", "Domain", "IP", "Location", "Owner", "Updated"]
        .iter()
        .map(|h| RawCell::text(*h))
        .collect()
}

/// A body row in the default column layout.
pub fn data_row(rank: &str, domain: &str, ip: &str) -> RawRow {
    vec![
        RawCell::text(rank),
        RawCell::link(domain, format!("https://table.example/domain/{}", domain)),
        RawCell::link(ip, format!("https://table.example/ip/{}", ip)),
        RawCell::text("Frankfurt, DE"),
        RawCell::link("Hosting GmbH", "https://table.example/owner/hosting"),
        RawCell::text("2026-10-01"),
    ]
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    async fn apply_credentials(&mut self, tokens: &[CredentialToken]) -> Result<(), DriverError> {
        self.credential_calls += 1;
        self.applied_tokens = tokens.to_vec();
        Ok(())
    }

    async fn set_fingerprint(&mut self, fingerprint: &Fingerprint) -> Result<(), DriverError> {
        self.fingerprint_calls += 1;
        self.fingerprint = Some(fingerprint.clone());
        Ok(())
    }

    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), DriverError> {
        self.visited.push(url.to_string());
        self.current = None;
        let page = self
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| ScriptedPage::Fail(format!("no script for {}", url)));
        match page {
            ScriptedPage::NavTimeout => Err(DriverError::Timeout(timeout)),
            ScriptedPage::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
            ScriptedPage::Fail(msg) => Err(DriverError::Navigation(msg)),
            ScriptedPage::Panic => panic!("scripted driver crash"),
            page @ (ScriptedPage::Page { .. }
            | ScriptedPage::StalledTitle
            | ScriptedPage::StalledTable) => {
                self.current = Some((url.to_string(), page));
                Ok(())
            }
        }
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        match &self.current {
            Some((url, ScriptedPage::Page { final_url, .. })) => {
                Ok(final_url.clone().unwrap_or_else(|| url.clone()))
            }
            Some((url, ScriptedPage::StalledTitle | ScriptedPage::StalledTable)) => Ok(url.clone()),
            _ => Err(DriverError::NoPage),
        }
    }

    async fn title(&self) -> Result<String, DriverError> {
        match &self.current {
            Some((_, ScriptedPage::Page { title, .. })) => Ok(title.clone()),
            Some((_, ScriptedPage::StalledTitle)) => {
                std::future::pending::<()>().await;
                Err(DriverError::NoPage)
            }
            Some((_, ScriptedPage::StalledTable)) => Ok("Top Domains".to_string()),
            _ => Err(DriverError::NoPage),
        }
    }

    async fn wait_for_element(
        &mut self,
        _selector: &str,
        _timeout: Duration,
    ) -> Result<bool, DriverError> {
        match &self.current {
            Some((_, ScriptedPage::Page { table, .. })) => Ok(table.is_some()),
            Some((_, ScriptedPage::StalledTable)) => Ok(true),
            _ => Err(DriverError::NoPage),
        }
    }

    async fn extract_table(&self, _selector: &str) -> Result<Vec<RawRow>, DriverError> {
        match &self.current {
            Some((_, ScriptedPage::Page { table, .. })) => Ok(table.clone().unwrap_or_default()),
            Some((_, ScriptedPage::StalledTable)) => {
                std::future::pending::<()>().await;
                Err(DriverError::NoPage)
            }
            _ => Err(DriverError::NoPage),
        }
    }
}
