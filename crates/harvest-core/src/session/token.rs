//! Credential tokens and the read-only session bundle.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// One cookie as exported by a browser automation tool.
///
/// Accepts both `expiry` (WebDriver) and `expires` (Playwright) spellings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialToken {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    #[serde(default, alias = "expires", skip_serializing_if = "Option::is_none")]
    pub expiry: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

impl CredentialToken {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            secure: None,
            http_only: None,
            expiry: None,
            same_site: None,
        }
    }

    /// True if a browser would send this cookie with a request to `url`.
    pub fn applies_to(&self, url: &Url) -> bool {
        if self.secure == Some(true) && url.scheme() != "https" {
            return false;
        }
        if let Some(domain) = self.domain.as_deref() {
            let domain = domain.trim_start_matches('.').to_ascii_lowercase();
            let Some(host) = url.host_str() else {
                return false;
            };
            let host = host.to_ascii_lowercase();
            if host != domain && !host.ends_with(&format!(".{}", domain)) {
                return false;
            }
        }
        if let Some(path) = self.path.as_deref() {
            if !path.is_empty() && !url.path().starts_with(path) {
                return false;
            }
        }
        true
    }
}

/// Immutable bundle of credential tokens shared by every fetch of one run.
#[derive(Clone, PartialEq)]
pub struct SessionHandle {
    tokens: Vec<CredentialToken>,
}

impl SessionHandle {
    pub(crate) fn from_tokens(tokens: Vec<CredentialToken>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[CredentialToken] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

// Token values are secrets; only names are printed.
impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field(
                "tokens",
                &self.tokens.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn token_without_domain_applies_everywhere() {
        let t = CredentialToken::new("sid", "abc");
        assert!(t.applies_to(&url("https://table.example/list")));
        assert!(t.applies_to(&url("http://127.0.0.1:8080/")));
    }

    #[test]
    fn token_domain_matches_host_and_subdomains() {
        let mut t = CredentialToken::new("sid", "abc");
        t.domain = Some(".table.example".to_string());
        assert!(t.applies_to(&url("https://table.example/list")));
        assert!(t.applies_to(&url("https://www.table.example/list")));
        assert!(!t.applies_to(&url("https://othertable.example/list")));
    }

    #[test]
    fn token_secure_and_path_rules() {
        let mut t = CredentialToken::new("sid", "abc");
        t.secure = Some(true);
        t.path = Some("/app".to_string());
        assert!(t.applies_to(&url("https://table.example/app/list")));
        assert!(!t.applies_to(&url("http://table.example/app/list")));
        assert!(!t.applies_to(&url("https://table.example/other")));
    }

    #[test]
    fn debug_output_hides_values() {
        let handle = SessionHandle::from_tokens(vec![CredentialToken::new("sid", "secret-value")]);
        let printed = format!("{:?}", handle);
        assert!(printed.contains("sid"));
        assert!(!printed.contains("secret-value"));
    }
}
