//! Scraped row model and its CSV file format.

mod csv;
mod row;

pub use self::csv::{read_rows, write_rows, COLUMNS};
pub use row::{normalize_id, unique_id, Row};
