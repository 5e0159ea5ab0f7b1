//! libcurl-backed page driver for server-rendered tables.
//!
//! Performs a plain GET (following redirects) with the session cookies and
//! fingerprint headers, keeps the final URL and body, and answers title,
//! element and table queries from the static HTML. No scripts are executed,
//! so `wait_for_element` is a single presence check.

use async_trait::async_trait;
use std::str;
use std::time::Duration;
use url::Url;

use super::{html, DriverError, Fingerprint, PageDriver, RawRow, Viewport};
use crate::session::CredentialToken;

const MAX_REDIRECTS: u32 = 10;
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
struct LoadedPage {
    url: String,
    status: u32,
    html: String,
}

#[derive(Debug, Clone)]
struct PageRequest {
    url: String,
    cookie: Option<String>,
    user_agent: Option<String>,
    viewport: Option<Viewport>,
    timeout: Duration,
}

/// Page driver backed by a fresh curl Easy handle per navigation.
#[derive(Debug, Default)]
pub struct CurlPageDriver {
    tokens: Vec<CredentialToken>,
    fingerprint: Option<Fingerprint>,
    page: Option<LoadedPage>,
}

impl CurlPageDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn page(&self) -> Result<&LoadedPage, DriverError> {
        self.page.as_ref().ok_or(DriverError::NoPage)
    }

    fn cookie_header(&self, url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        let pairs: Vec<String> = self
            .tokens
            .iter()
            .filter(|t| t.applies_to(&parsed))
            .map(|t| format!("{}={}", t.name, t.value))
            .collect();
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }
}

#[async_trait]
impl PageDriver for CurlPageDriver {
    async fn apply_credentials(&mut self, tokens: &[CredentialToken]) -> Result<(), DriverError> {
        self.tokens = tokens.to_vec();
        Ok(())
    }

    async fn set_fingerprint(&mut self, fingerprint: &Fingerprint) -> Result<(), DriverError> {
        self.fingerprint = Some(fingerprint.clone());
        Ok(())
    }

    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), DriverError> {
        let request = PageRequest {
            url: url.to_string(),
            cookie: self.cookie_header(url),
            user_agent: self.fingerprint.as_ref().map(|f| f.user_agent.clone()),
            viewport: self.fingerprint.as_ref().map(|f| f.viewport),
            timeout,
        };
        self.page = None;
        let page = tokio::task::spawn_blocking(move || fetch_page(&request))
            .await
            .map_err(|e| DriverError::Other(format!("page fetch task failed: {}", e)))??;
        tracing::debug!(url = %page.url, status = page.status, bytes = page.html.len(), "page loaded");
        self.page = Some(page);
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.page()?.url.clone())
    }

    async fn title(&self) -> Result<String, DriverError> {
        Ok(html::document_title(&self.page()?.html))
    }

    async fn wait_for_element(
        &mut self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<bool, DriverError> {
        html::has_element(&self.page()?.html, selector)
    }

    async fn extract_table(&self, selector: &str) -> Result<Vec<RawRow>, DriverError> {
        let page = self.page()?;
        html::table_rows(&page.html, selector, &page.url)
    }
}

fn curl_err(e: curl::Error) -> DriverError {
    DriverError::Other(format!("curl: {}", e))
}

/// Runs in a blocking thread; one GET with redirects, body kept in memory.
fn fetch_page(req: &PageRequest) -> Result<LoadedPage, DriverError> {
    let mut body: Vec<u8> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(&req.url)
        .map_err(|e| DriverError::Navigation(format!("invalid URL {}: {}", req.url, e)))?;
    easy.follow_location(true).map_err(curl_err)?;
    easy.max_redirections(MAX_REDIRECTS).map_err(curl_err)?;
    easy.connect_timeout(req.timeout.min(MAX_CONNECT_TIMEOUT))
        .map_err(curl_err)?;
    easy.timeout(req.timeout).map_err(curl_err)?;
    // Empty string enables every encoding libcurl supports.
    easy.accept_encoding("").map_err(curl_err)?;
    if let Some(ua) = req.user_agent.as_deref() {
        easy.useragent(ua).map_err(curl_err)?;
    }
    if let Some(cookie) = req.cookie.as_deref() {
        easy.cookie(cookie).map_err(curl_err)?;
    }

    let mut list = curl::easy::List::new();
    list.append("Accept: text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .map_err(curl_err)?;
    list.append("Accept-Language: en-US,en;q=0.9").map_err(curl_err)?;
    if let Some(vp) = req.viewport {
        list.append(&format!("Viewport-Width: {}", vp.width))
            .map_err(curl_err)?;
    }
    easy.http_headers(list).map_err(curl_err)?;

    {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(curl_err)?;
        transfer.perform().map_err(|e| {
            if e.is_operation_timedout() {
                DriverError::Timeout(req.timeout)
            } else {
                DriverError::Navigation(format!("GET {}: {}", req.url, e))
            }
        })?;
    }

    let status = easy.response_code().map_err(curl_err)?;
    let final_url = easy
        .effective_url()
        .map_err(curl_err)?
        .map(String::from)
        .unwrap_or_else(|| req.url.clone());

    Ok(LoadedPage {
        url: final_url,
        status,
        html: String::from_utf8_lossy(&body).into_owned(),
    })
}
