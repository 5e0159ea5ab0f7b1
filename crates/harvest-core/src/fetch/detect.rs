//! Challenge and login page detection from the resolved URL and title.

use crate::config::FetchConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMarkers {
    /// Matched case-sensitively against the title.
    pub challenge_title: Vec<String>,
    /// Matched case-insensitively against the URL.
    pub challenge_url: Vec<String>,
    /// Matched case-insensitively against both URL and title.
    pub login: Vec<String>,
}

impl PageMarkers {
    pub fn from_config(cfg: &FetchConfig) -> Self {
        Self {
            challenge_title: cfg.challenge_title_markers.clone(),
            challenge_url: cfg.challenge_url_markers.clone(),
            login: cfg.login_markers.clone(),
        }
    }
}

impl Default for PageMarkers {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageVerdict {
    /// Nothing suspicious; go on to table extraction.
    Data,
    /// Challenge page; carries the matched marker.
    Challenge(String),
    /// Login page; carries the matched marker.
    Login(String),
}

/// Classifies a loaded page. Challenge markers are checked before login markers.
pub fn inspect_page(markers: &PageMarkers, url: &str, title: &str) -> PageVerdict {
    let url_lc = url.to_lowercase();
    let title_lc = title.to_lowercase();

    if let Some(m) = markers
        .challenge_title
        .iter()
        .find(|m| !m.is_empty() && title.contains(m.as_str()))
    {
        return PageVerdict::Challenge(m.clone());
    }
    if let Some(m) = markers
        .challenge_url
        .iter()
        .find(|m| !m.is_empty() && url_lc.contains(&m.to_lowercase()))
    {
        return PageVerdict::Challenge(m.clone());
    }
    if let Some(m) = markers.login.iter().find(|m| {
        let m = m.to_lowercase();
        !m.is_empty() && (url_lc.contains(&m) || title_lc.contains(&m))
    }) {
        return PageVerdict::Login(m.clone());
    }
    PageVerdict::Data
}
