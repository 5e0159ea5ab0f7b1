//! Build session tokens from a HAR (HTTP Archive) capture of a logged-in browser.
//!
//! Reads the `Cookie` request headers of every entry and turns each
//! `name=value` pair into a token scoped to the request host. Later entries
//! win, so the freshest cookie values end up in the bundle.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use url::Url;

use super::codec::parse_tokens_json;
use super::token::CredentialToken;

#[derive(Debug, Deserialize)]
struct HarLog {
    log: HarRoot,
}

#[derive(Debug, Deserialize)]
struct HarRoot {
    entries: Vec<HarEntry>,
}

#[derive(Debug, Deserialize)]
struct HarEntry {
    request: HarRequest,
}

#[derive(Debug, Deserialize)]
struct HarRequest {
    url: String,
    #[serde(default)]
    headers: Vec<HarHeader>,
}

#[derive(Debug, Deserialize)]
struct HarHeader {
    name: String,
    value: String,
}

/// Extracts credential tokens from a HAR file.
///
/// If `host` is given, only requests to that host (or its subdomains) are used.
pub fn tokens_from_har(path: &Path, host: Option<&str>) -> Result<Vec<CredentialToken>> {
    let bytes = std::fs::read(path).with_context(|| format!("read HAR file: {}", path.display()))?;
    let har: HarLog = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse HAR JSON: {}", path.display()))?;

    if har.log.entries.is_empty() {
        anyhow::bail!("HAR file has no entries");
    }

    let mut tokens: Vec<CredentialToken> = Vec::new();
    for entry in &har.log.entries {
        let Ok(url) = Url::parse(&entry.request.url) else {
            continue;
        };
        let Some(request_host) = url.host_str() else {
            continue;
        };
        if let Some(wanted) = host {
            let wanted = wanted.trim_start_matches('.');
            if request_host != wanted && !request_host.ends_with(&format!(".{}", wanted)) {
                continue;
            }
        }
        let Some(cookie) = get_header(&entry.request.headers, "Cookie") else {
            continue;
        };
        for pair in cookie.split(';') {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let mut token = CredentialToken::new(name, value.trim());
            token.domain = Some(request_host.to_string());
            token.path = Some("/".to_string());
            match tokens
                .iter_mut()
                .find(|t| t.name == token.name && t.domain == token.domain)
            {
                Some(existing) => *existing = token,
                None => tokens.push(token),
            }
        }
    }

    // Same validation as a decoded session, so the output is always usable.
    let json = serde_json::to_vec(&tokens).context("serialize tokens")?;
    parse_tokens_json(&json).context("HAR file contains no usable cookies")
}

fn get_header<'a>(headers: &'a [HarHeader], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}
