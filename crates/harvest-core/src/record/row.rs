//! One scraped table record.

use serde::{Deserialize, Serialize};

/// A table row as persisted in partial and canonical files.
///
/// Every field is a plain string; missing values are empty, never absent.
/// Column names are the on-disk header names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    #[serde(rename = "Rank", default)]
    pub rank: String,
    #[serde(rename = "Domain", default)]
    pub domain: String,
    #[serde(rename = "Domain_URL", default)]
    pub domain_url: String,
    #[serde(rename = "IP_Address", default)]
    pub ip_address: String,
    #[serde(rename = "IP_Address_URL", default)]
    pub ip_address_url: String,
    #[serde(rename = "Location", default)]
    pub location: String,
    #[serde(rename = "Owner", default)]
    pub owner: String,
    #[serde(rename = "Owner_URL", default)]
    pub owner_url: String,
    #[serde(rename = "Last_Update", default)]
    pub last_update: String,
    #[serde(rename = "Source_URL", default)]
    pub source_url: String,
    #[serde(rename = "Scraped_At", default)]
    pub scraped_at: String,
    #[serde(rename = "Unique_ID", default)]
    pub unique_id: String,
}

impl Row {
    /// A row needs at least a domain or an IP address to identify anything.
    pub fn is_valid(&self) -> bool {
        !(self.domain.is_empty() && self.ip_address.is_empty())
    }

    /// Merge key: the stored id, or one derived from rank and domain when blank.
    pub fn key(&self) -> String {
        if self.unique_id.trim().is_empty() {
            unique_id(&self.rank, &self.domain)
        } else {
            self.unique_id.clone()
        }
    }

    /// Recomputes `unique_id` from rank and domain.
    pub fn derive_unique_id(&mut self) {
        self.unique_id = unique_id(&self.rank, &self.domain);
    }
}

/// `normalize(rank + "-" + domain)`.
pub fn unique_id(rank: &str, domain: &str) -> String {
    normalize_id(&format!("{}-{}", rank, domain))
}

/// Trims and collapses every whitespace run into a single hyphen.
pub fn normalize_id(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join("-")
}
