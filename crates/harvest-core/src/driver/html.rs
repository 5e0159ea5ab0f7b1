//! Static HTML queries used by the curl driver.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{DriverError, RawCell, RawRow};

fn parse_selector(selector: &str) -> Result<Selector, DriverError> {
    Selector::parse(selector).map_err(|_| DriverError::Selector(selector.to_string()))
}

fn squash(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(el: &ElementRef<'_>) -> String {
    squash(&el.text().collect::<String>())
}

/// Text of the document `<title>`, whitespace-normalized; empty if none.
pub fn document_title(html: &str) -> String {
    let doc = Html::parse_document(html);
    let Ok(sel) = Selector::parse("title") else {
        return String::new();
    };
    doc.select(&sel)
        .next()
        .map(|t| element_text(&t))
        .unwrap_or_default()
}

pub fn has_element(html: &str, selector: &str) -> Result<bool, DriverError> {
    let sel = parse_selector(selector)?;
    let doc = Html::parse_document(html);
    let found = doc.select(&sel).next().is_some();
    Ok(found)
}

/// Rows of the first table matching `selector`, as raw cells (`td` and `th`).
/// Empty if no such table exists.
pub fn table_rows(html: &str, selector: &str, base_url: &str) -> Result<Vec<RawRow>, DriverError> {
    let table_sel = parse_selector(selector)?;
    let row_sel = parse_selector("tr")?;
    let anchor_sel = parse_selector("a")?;
    let base = Url::parse(base_url).ok();

    let doc = Html::parse_document(html);
    let Some(table) = doc.select(&table_sel).next() else {
        return Ok(Vec::new());
    };

    let mut rows = Vec::new();
    for tr in table.select(&row_sel) {
        let cells: RawRow = tr
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|c| matches!(c.value().name(), "td" | "th"))
            .map(|cell| {
                let anchor = cell.select(&anchor_sel).next();
                RawCell {
                    text: element_text(&cell),
                    anchor_text: anchor.map(|a| element_text(&a)),
                    anchor_href: anchor
                        .and_then(|a| a.value().attr("href"))
                        .map(|href| resolve_href(base.as_ref(), href)),
                }
            })
            .collect();
        rows.push(cells);
    }
    Ok(rows)
}

fn resolve_href(base: Option<&Url>, href: &str) -> String {
    let href = href.trim();
    match base.and_then(|b| b.join(href).ok()) {
        Some(u) => u.to_string(),
        None => href.to_string(),
    }
}
