//! Row extraction from raw table cells through an ordered rule list.
//!
//! Each [`FieldRule`] names a field, the column it is read from and the cell
//! sources to try in order; the first non-empty source wins and a field with
//! no match is the empty string. Column reordering on the target is handled
//! by changing the rules (see `[[schema]]` in config.toml), not the code.

use serde::{Deserialize, Serialize};

use crate::driver::{RawCell, RawRow};
use crate::record::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Rank,
    Domain,
    DomainUrl,
    IpAddress,
    IpAddressUrl,
    Location,
    Owner,
    OwnerUrl,
    LastUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellSource {
    /// The cell's own text.
    Text,
    /// Text of the first anchor in the cell.
    AnchorText,
    /// Resolved `href` of the first anchor in the cell.
    AnchorHref,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub field: Field,
    pub column: usize,
    pub sources: Vec<CellSource>,
}

impl FieldRule {
    pub fn new(field: Field, column: usize, sources: &[CellSource]) -> Self {
        Self {
            field,
            column,
            sources: sources.to_vec(),
        }
    }

    fn read(&self, row: &RawRow) -> String {
        let Some(cell) = row.get(self.column) else {
            return String::new();
        };
        self.sources
            .iter()
            .filter_map(|src| source_value(cell, *src))
            .find(|v| !v.is_empty())
            .unwrap_or_default()
    }
}

fn source_value(cell: &RawCell, source: CellSource) -> Option<String> {
    let value = match source {
        CellSource::Text => Some(cell.text.as_str()),
        CellSource::AnchorText => cell.anchor_text.as_deref(),
        CellSource::AnchorHref => cell.anchor_href.as_deref(),
    };
    value.map(|v| v.trim().to_string())
}

/// Ordered field rules for one table layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    rules: Vec<FieldRule>,
}

impl TableSchema {
    pub fn from_rules(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }
}

impl Default for TableSchema {
    /// 0 rank, 1 domain (+link), 2 IP (+link), 3 location, 4 owner (+link), 5 last update.
    fn default() -> Self {
        use CellSource::{AnchorHref, AnchorText, Text};
        Self::from_rules(vec![
            FieldRule::new(Field::Rank, 0, &[Text]),
            FieldRule::new(Field::Domain, 1, &[Text, AnchorText]),
            FieldRule::new(Field::DomainUrl, 1, &[AnchorHref]),
            FieldRule::new(Field::IpAddress, 2, &[Text, AnchorText]),
            FieldRule::new(Field::IpAddressUrl, 2, &[AnchorHref]),
            FieldRule::new(Field::Location, 3, &[Text]),
            FieldRule::new(Field::Owner, 4, &[Text, AnchorText]),
            FieldRule::new(Field::OwnerUrl, 4, &[AnchorHref]),
            FieldRule::new(Field::LastUpdate, 5, &[Text]),
        ])
    }
}

fn field_mut(row: &mut Row, field: Field) -> &mut String {
    match field {
        Field::Rank => &mut row.rank,
        Field::Domain => &mut row.domain,
        Field::DomainUrl => &mut row.domain_url,
        Field::IpAddress => &mut row.ip_address,
        Field::IpAddressUrl => &mut row.ip_address_url,
        Field::Location => &mut row.location,
        Field::Owner => &mut row.owner,
        Field::OwnerUrl => &mut row.owner_url,
        Field::LastUpdate => &mut row.last_update,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub rows: Vec<Row>,
    /// Body rows dropped for having neither domain nor IP address.
    pub dropped: usize,
}

/// Applies `schema` to every row after the header.
pub fn extract_rows(
    table: &[RawRow],
    schema: &TableSchema,
    source_url: &str,
    scraped_at: &str,
) -> Extracted {
    let mut out = Extracted::default();
    for raw in table.iter().skip(1) {
        let mut row = Row::default();
        for rule in schema.rules() {
            let value = rule.read(raw);
            let slot = field_mut(&mut row, rule.field);
            if slot.is_empty() {
                *slot = value;
            }
        }
        if !row.is_valid() {
            out.dropped += 1;
            continue;
        }
        row.source_url = source_url.to_string();
        row.scraped_at = scraped_at.to_string();
        row.derive_unique_id();
        out.rows.push(row);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = "https://table.example/list?page=1";
    const AT: &str = "2026-10-18T10:00:00Z";

    fn header() -> RawRow {
        vec![RawCell::text("#"), RawCell::text("Domain"), RawCell::text("IP")]
    }

    fn extract(body: Vec<RawRow>) -> Extracted {
        let mut table = vec![header()];
        table.extend(body);
        extract_rows(&table, &TableSchema::default(), SRC, AT)
    }

    #[test]
    fn full_row_with_links() {
        let out = extract(vec![vec![
            RawCell::text("12"),
            RawCell::link("example.com", "https://table.example/d/example.com"),
            RawCell::link("93.184.216.34", "https://table.example/ip/93.184.216.34"),
            RawCell::text("Los Angeles, US"),
            RawCell::link("Edgecast", "https://table.example/o/edgecast"),
            RawCell::text("2026-10-01"),
        ]]);
        assert_eq!(out.dropped, 0);
        let row = &out.rows[0];
        assert_eq!(row.rank, "12");
        assert_eq!(row.domain, "example.com");
        assert_eq!(row.domain_url, "https://table.example/d/example.com");
        assert_eq!(row.ip_address_url, "https://table.example/ip/93.184.216.34");
        assert_eq!(row.owner, "Edgecast");
        assert_eq!(row.last_update, "2026-10-01");
        assert_eq!(row.source_url, SRC);
        assert_eq!(row.scraped_at, AT);
        assert_eq!(row.unique_id, "12-example.com");
    }

    #[test]
    fn empty_domain_with_ip_is_kept() {
        let out = extract(vec![vec![
            RawCell::text("3"),
            RawCell::text(""),
            RawCell::text("10.0.0.3"),
        ]]);
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].domain, "");
        assert_eq!(out.rows[0].ip_address, "10.0.0.3");
        assert_eq!(out.rows[0].unique_id, "3-");
    }

    #[test]
    fn row_without_domain_and_ip_is_dropped() {
        let out = extract(vec![
            vec![RawCell::text("4"), RawCell::text(""), RawCell::text("")],
            vec![],
        ]);
        assert!(out.rows.is_empty());
        assert_eq!(out.dropped, 2);
    }

    #[test]
    fn anchor_text_fallback_when_cell_text_is_empty() {
        let cell = RawCell {
            text: String::new(),
            anchor_text: Some("fallback.example".to_string()),
            anchor_href: None,
        };
        let out = extract(vec![vec![RawCell::text("5"), cell]]);
        assert_eq!(out.rows[0].domain, "fallback.example");
        assert_eq!(out.rows[0].domain_url, "");
    }

    #[test]
    fn missing_cells_become_empty_strings() {
        let out = extract(vec![vec![RawCell::text("6"), RawCell::text("short.example")]]);
        let row = &out.rows[0];
        assert_eq!(row.ip_address, "");
        assert_eq!(row.location, "");
        assert_eq!(row.owner_url, "");
        assert_eq!(row.last_update, "");
    }

    #[test]
    fn unique_id_has_no_spaces() {
        let out = extract(vec![vec![RawCell::text("1 2"), RawCell::text("a b.example")]]);
        assert_eq!(out.rows[0].unique_id, "1-2-a-b.example");
    }

    #[test]
    fn reordered_columns_via_rules() {
        let schema = TableSchema::from_rules(vec![
            FieldRule::new(Field::Domain, 0, &[CellSource::AnchorText, CellSource::Text]),
            FieldRule::new(Field::Rank, 1, &[CellSource::Text]),
        ]);
        let table = vec![
            header(),
            vec![RawCell::link("swapped.example", "/d"), RawCell::text("9")],
        ];
        let out = extract_rows(&table, &schema, SRC, AT);
        assert_eq!(out.rows[0].rank, "9");
        assert_eq!(out.rows[0].domain, "swapped.example");
        assert_eq!(out.rows[0].unique_id, "9-swapped.example");
    }

    #[test]
    fn header_only_table_yields_nothing() {
        let out = extract(vec![]);
        assert!(out.rows.is_empty());
        assert_eq!(out.dropped, 0);
    }
}
