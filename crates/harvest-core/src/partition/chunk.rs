//! WorkChunk type and chunk planning.

use thiserror::Error;

/// Placeholder in the URL template replaced by the 1-based page number.
pub const PAGE_PLACEHOLDER: &str = "{page}";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PartitionError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// One worker's unit of work: up to `quota` page URLs in global page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkChunk {
    /// 1-based chunk number.
    pub sequence: usize,
    pub urls: Vec<String>,
}

impl WorkChunk {
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Expands the URL template for one page.
pub fn page_url(url_template: &str, page: usize) -> String {
    url_template.replace(PAGE_PLACEHOLDER, &page.to_string())
}

/// Builds the chunk plan for `total_pages` pages and a per-identity `quota`.
///
/// Page `i` lands at position `(i-1) % quota` of chunk `(i-1) / quota + 1`.
/// Every chunk holds `quota` URLs except the last, which holds the remainder.
pub fn partition(
    total_pages: usize,
    quota: usize,
    url_template: &str,
) -> Result<Vec<WorkChunk>, PartitionError> {
    if total_pages < 1 {
        return Err(PartitionError::InvalidConfiguration(
            "total pages must be at least 1".to_string(),
        ));
    }
    if quota < 1 {
        return Err(PartitionError::InvalidConfiguration(
            "quota must be at least 1".to_string(),
        ));
    }
    if !url_template.contains(PAGE_PLACEHOLDER) {
        return Err(PartitionError::InvalidConfiguration(format!(
            "url template has no {} placeholder: {}",
            PAGE_PLACEHOLDER, url_template
        )));
    }

    let chunk_count = total_pages.div_ceil(quota);
    let mut out = Vec::with_capacity(chunk_count);
    for index in 0..chunk_count {
        let first = index * quota + 1;
        let last = (first + quota - 1).min(total_pages);
        out.push(WorkChunk {
            sequence: index + 1,
            urls: (first..=last).map(|p| page_url(url_template, p)).collect(),
        });
    }

    Ok(out)
}
