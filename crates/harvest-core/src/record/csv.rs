//! Row file format: header line, fixed column order, comma-delimited, standard quoting.

use anyhow::{Context, Result};
use std::io::{Read, Write};

use super::row::Row;

/// Column order of every row file.
pub const COLUMNS: [&str; 12] = [
    "Rank",
    "Domain",
    "Domain_URL",
    "IP_Address",
    "IP_Address_URL",
    "Location",
    "Owner",
    "Owner_URL",
    "Last_Update",
    "Source_URL",
    "Scraped_At",
    "Unique_ID",
];

/// Writes the header and all rows. The header is written even for zero rows.
pub fn write_rows<W: Write>(writer: W, rows: &[Row]) -> Result<()> {
    let mut w = ::csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    w.write_record(COLUMNS).context("write header")?;
    for row in rows {
        w.serialize(row).context("write row")?;
    }
    w.flush().context("flush rows")?;
    Ok(())
}

/// Reads rows by header name. Short or ragged records fill missing columns
/// with empty strings; records that cannot be decoded at all are skipped.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<Row>> {
    let mut r = ::csv::ReaderBuilder::new()
        .flexible(true)
        .trim(::csv::Trim::None)
        .from_reader(reader);
    r.headers().context("read header")?;

    let mut out = Vec::new();
    for (index, record) in r.deserialize::<Row>().enumerate() {
        match record {
            Ok(row) => out.push(row),
            Err(e) => tracing::warn!(record = index + 1, "skipping unreadable row: {}", e),
        }
    }
    Ok(out)
}
